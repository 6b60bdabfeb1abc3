use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleMetrics {
    pub started_at: DateTime<Utc>,
    pub cities: usize,
    pub stored: usize,
    pub fetch_failures: usize,
    pub store_failures: usize,
    pub rollup_failures: usize,
    pub total_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub recent_cycles: Vec<CycleMetrics>,
    pub cycle_count: u64,
    pub samples_stored: u64,
    pub fetch_failures: u64,
    pub store_failures: u64,
    pub rollup_failures: u64,
}
