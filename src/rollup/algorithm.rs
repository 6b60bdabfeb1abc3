use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::db::models::{DailySummary, Sample};

/// Half-open `[start, end)` UTC calendar day containing `reference`.
pub fn day_window(reference: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let midnight = reference.date_naive().and_hms_opt(0, 0, 0).unwrap_or_default();
    let start = Utc.from_utc_datetime(&midnight);
    (start, start + Duration::hours(24))
}

/// Label with the highest count. Ties go to whichever label shows up first
/// in `labels`.
pub fn dominant_condition<'a, I>(labels: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for label in labels {
        match counts.iter_mut().find(|(seen, _)| *seen == label) {
            Some((_, count)) => *count += 1,
            None => counts.push((label, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (label, count) in counts {
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((label, count));
        }
    }
    best.map(|(label, _)| label.to_string())
}

/// Aggregates one day's samples. Extrema are seeded from the first sample,
/// not from the city's lifetime values. Returns `None` for an empty day.
pub fn summarize_day(city: &str, day: DateTime<Utc>, samples: &[Sample]) -> Option<DailySummary> {
    let first = samples.first()?;

    let mut sum = 0.0;
    let mut max = first.temperature;
    let mut min = first.temperature;
    for sample in samples {
        sum += sample.temperature;
        max = max.max(sample.temperature);
        min = min.min(sample.temperature);
    }

    let dominant = dominant_condition(samples.iter().map(|s| s.condition.as_str()))?;

    Some(DailySummary {
        city: city.to_string(),
        day,
        avg_temperature: sum / samples.len() as f64,
        max_temperature: max,
        min_temperature: min,
        dominant_condition: dominant,
        sample_count: samples.len() as i64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, hour, minute, 0).unwrap()
    }

    fn sample(hour: u32, temperature: f64, condition: &str) -> Sample {
        Sample {
            city: "E".into(),
            captured_at: at(1, hour, 0),
            temperature,
            condition: condition.into(),
        }
    }

    #[test]
    fn window_is_utc_midnight_to_midnight() {
        let (start, end) = day_window(at(1, 17, 42));
        assert_eq!(start, at(1, 0, 0));
        assert_eq!(end, at(2, 0, 0));

        let (start, _) = day_window(at(2, 0, 0));
        assert_eq!(start, at(2, 0, 0), "midnight opens its own day");
    }

    #[test]
    fn three_sample_day() {
        let samples = vec![
            sample(10, 20.0, "Clear"),
            sample(14, 25.0, "Clouds"),
            sample(18, 22.0, "Clouds"),
        ];

        let summary = summarize_day("E", at(1, 0, 0), &samples).unwrap();
        assert!((summary.avg_temperature - 67.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.max_temperature, 25.0);
        assert_eq!(summary.min_temperature, 20.0);
        assert_eq!(summary.dominant_condition, "Clouds");
        assert_eq!(summary.sample_count, 3);
    }

    #[test]
    fn empty_day_has_no_summary() {
        assert_eq!(summarize_day("E", at(1, 0, 0), &[]), None);
    }

    #[test]
    fn extrema_come_from_the_day_only() {
        let samples = vec![sample(3, -4.0, "Snow")];
        let summary = summarize_day("E", at(1, 0, 0), &samples).unwrap();
        assert_eq!(summary.max_temperature, -4.0);
        assert_eq!(summary.min_temperature, -4.0);
        assert_eq!(summary.avg_temperature, -4.0);
    }

    #[test]
    fn ties_go_to_first_seen_label() {
        let labels = ["Rain", "Clear", "Clear", "Rain", "Haze"];
        assert_eq!(dominant_condition(labels), Some("Rain".into()));

        let labels = ["Haze", "Clear", "Clear"];
        assert_eq!(dominant_condition(labels), Some("Clear".into()));

        assert_eq!(dominant_condition(Vec::<&str>::new()), None);
    }
}
