//! Latest-wins observation per city.
//!
//! `avg_temperature` here is the midpoint of the lifetime extrema, not a mean
//! of the samples. The true daily mean lives on [`super::DailySummary`]. The
//! two are kept separate on purpose and must not be unified.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub city: String,
    /// Capture instant, truncated to whole seconds.
    pub captured_at: DateTime<Utc>,
    pub temperature: f64,
    pub condition: String,
    /// Timestamp reported by the upstream source, if it sent one.
    pub source_time: Option<DateTime<Utc>>,
    /// Millisecond precision, matching what the store keeps.
    pub last_updated: DateTime<Utc>,
    pub min_temperature: f64,
    pub max_temperature: f64,
    pub avg_temperature: f64,
    pub alert: bool,
}

impl Observation {
    pub fn has_finite_extrema(&self) -> bool {
        self.min_temperature.is_finite() && self.max_temperature.is_finite()
    }
}

/// Read-only projection handed to presentation clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationView {
    pub city: String,
    pub dominant_condition: String,
    pub temperature: f64,
    pub avg_temperature: f64,
    pub last_updated: DateTime<Utc>,
}

impl From<Observation> for ObservationView {
    fn from(observation: Observation) -> Self {
        Self {
            city: observation.city,
            dominant_condition: observation.condition,
            temperature: observation.temperature,
            avg_temperature: observation.avg_temperature,
            last_updated: observation.last_updated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn view_uses_presentation_field_names() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let observation = Observation {
            city: "Delhi".into(),
            captured_at: at,
            temperature: 31.5,
            condition: "Haze".into(),
            source_time: None,
            last_updated: at,
            min_temperature: 29.0,
            max_temperature: 33.0,
            avg_temperature: 31.0,
            alert: true,
        };

        let json = serde_json::to_value(ObservationView::from(observation)).unwrap();
        assert_eq!(json["city"], "Delhi");
        assert_eq!(json["dominant_condition"], "Haze");
        assert_eq!(json["temperature"], 31.5);
        assert_eq!(json["avg_temperature"], 31.0);
        assert_eq!(json["last_updated"], "2024-05-01T10:00:00Z");
        assert_eq!(json.as_object().unwrap().len(), 5);
    }
}
