//! Running lifetime statistics carried on each city's observation.

use chrono::{DateTime, SubsecRound, Utc};

use crate::db::Observation;
use crate::fetcher::WeatherReading;

/// Lifetime extrema. The empty state uses `+inf`/`-inf` so that the first
/// real value replaces both bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunningStats {
    pub min: f64,
    pub max: f64,
}

impl RunningStats {
    pub const EMPTY: RunningStats = RunningStats {
        min: f64::INFINITY,
        max: f64::NEG_INFINITY,
    };

    pub fn from_prior(prior: Option<&Observation>) -> Self {
        match prior {
            Some(observation) => Self {
                min: observation.min_temperature,
                max: observation.max_temperature,
            },
            None => Self::EMPTY,
        }
    }

    pub fn observe(self, value: f64) -> Self {
        Self {
            min: self.min.min(value),
            max: self.max.max(value),
        }
    }

    /// Midpoint of the extrema. This is what the live observation reports as
    /// its average; it is not a mean of the samples.
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

pub fn is_alert(temperature: f64, threshold: f64) -> bool {
    temperature > threshold
}

/// Build the next observation for `city` from its prior row (if any) and a
/// fresh reading taken at `now`.
pub fn next_observation(
    city: &str,
    prior: Option<&Observation>,
    reading: &WeatherReading,
    now: DateTime<Utc>,
    alert_threshold: f64,
) -> Observation {
    let stats = RunningStats::from_prior(prior).observe(reading.temperature);
    let source_time = if reading.source_timestamp > 0 {
        DateTime::from_timestamp(reading.source_timestamp, 0)
    } else {
        None
    };

    Observation {
        city: city.to_string(),
        captured_at: now.trunc_subsecs(0),
        temperature: reading.temperature,
        condition: reading.condition.clone(),
        source_time,
        // Stored with millisecond precision; keep the in-memory value equal.
        last_updated: now.trunc_subsecs(3),
        min_temperature: stats.min,
        max_temperature: stats.max,
        avg_temperature: stats.midpoint(),
        alert: is_alert(reading.temperature, alert_threshold),
    }
}
