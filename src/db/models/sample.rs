use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One raw sample in the append-only log that daily rollups are built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub city: String,
    pub captured_at: DateTime<Utc>,
    pub temperature: f64,
    pub condition: String,
}
