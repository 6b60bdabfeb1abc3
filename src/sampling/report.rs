use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::metrics::CycleMetrics;

/// Outcome of one step of a city's sampling pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Step {
    Done,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CityReport {
    pub city: String,
    pub fetch: Step,
    pub read: Step,
    pub write: Step,
    pub rollup: Step,
}

impl CityReport {
    pub fn new(city: &str) -> Self {
        Self {
            city: city.to_string(),
            fetch: Step::Skipped,
            read: Step::Skipped,
            write: Step::Skipped,
            rollup: Step::Skipped,
        }
    }

    pub fn stored(&self) -> bool {
        self.write == Step::Done
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub cities: Vec<CityReport>,
    pub total_ms: u64,
}

impl CycleReport {
    pub fn city(&self, city: &str) -> Option<&CityReport> {
        self.cities.iter().find(|report| report.city == city)
    }

    pub fn metrics(&self) -> CycleMetrics {
        let count = |pred: fn(&CityReport) -> bool| self.cities.iter().filter(|r| pred(r)).count();

        CycleMetrics {
            started_at: self.started_at,
            cities: self.cities.len(),
            stored: count(|r| r.stored()),
            fetch_failures: count(|r| r.fetch == Step::Failed),
            store_failures: count(|r| r.read == Step::Failed || r.write == Step::Failed),
            rollup_failures: count(|r| r.rollup == Step::Failed),
            total_ms: self.total_ms,
        }
    }
}
