use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Aggregate of one city's samples over one UTC calendar day.
///
/// `avg_temperature` is the arithmetic mean of the day's samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub city: String,
    /// UTC midnight opening the half-open window `[day, day + 24h)`.
    pub day: DateTime<Utc>,
    pub avg_temperature: f64,
    pub max_temperature: f64,
    pub min_temperature: f64,
    pub dominant_condition: String,
    pub sample_count: i64,
}
