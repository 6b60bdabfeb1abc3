//! Daily rollups.
//!
//! A summary is always rebuilt from the full set of the day's raw samples and
//! written with replace semantics, so running it again after a partial
//! failure or a corrected sample converges on the same row.

pub mod algorithm;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::db::{DailySummary, Database};

pub use algorithm::{day_window, dominant_condition, summarize_day};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_debug;

/// Recompute and store the summary for `city` on the UTC day containing
/// `reference`. Returns `None` when the day has no samples yet.
pub async fn rollup(
    db: &Database,
    city: &str,
    reference: DateTime<Utc>,
) -> Result<Option<DailySummary>> {
    let (day_start, day_end) = day_window(reference);

    let samples = db
        .get_samples_between(city, day_start, day_end)
        .await
        .with_context(|| format!("failed to load samples for {city}"))?;

    let Some(summary) = summarize_day(city, day_start, &samples) else {
        log_debug!("no samples for {city} on {}, skipping rollup", day_start.date_naive());
        return Ok(None);
    };

    db.upsert_daily_summary(&summary).await?;
    log_debug!(
        "rolled up {} samples for {city} on {}: avg={:.2} min={:.2} max={:.2} dominant={}",
        summary.sample_count,
        day_start.date_naive(),
        summary.avg_temperature,
        summary.min_temperature,
        summary.max_temperature,
        summary.dominant_condition
    );

    Ok(Some(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Sample;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap()
    }

    async fn seed(db: &Database, city: &str, captured_at: DateTime<Utc>, temp: f64, cond: &str) {
        db.insert_sample(&Sample {
            city: city.into(),
            captured_at,
            temperature: temp,
            condition: cond.into(),
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn rollup_stores_the_days_aggregate() {
        let dir = tempdir().expect("tempdir");
        let db = Database::new(dir.path().join("w.sqlite3")).expect("db");
        seed(&db, "E", at(1, 10), 20.0, "Clear").await;
        seed(&db, "E", at(1, 14), 25.0, "Clouds").await;
        seed(&db, "E", at(1, 18), 22.0, "Clouds").await;

        let summary = rollup(&db, "E", at(1, 19)).await.unwrap().unwrap();
        assert!((summary.avg_temperature - 22.333_333_333).abs() < 1e-6);
        assert_eq!(summary.max_temperature, 25.0);
        assert_eq!(summary.min_temperature, 20.0);
        assert_eq!(summary.dominant_condition, "Clouds");

        let stored = db.get_daily_summary("E", at(1, 0)).await.unwrap();
        assert_eq!(stored, Some(summary));
    }

    #[tokio::test]
    async fn repeated_rollup_is_identical() {
        let dir = tempdir().expect("tempdir");
        let db = Database::new(dir.path().join("w.sqlite3")).expect("db");
        seed(&db, "E", at(1, 6), 18.5, "Mist").await;
        seed(&db, "E", at(1, 9), 21.0, "Clear").await;

        let first = rollup(&db, "E", at(1, 12)).await.unwrap();
        let stored_first = db.list_daily_summaries("E").await.unwrap();
        let second = rollup(&db, "E", at(1, 12)).await.unwrap();
        let stored_second = db.list_daily_summaries("E").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_vec(&stored_first).unwrap(),
            serde_json::to_vec(&stored_second).unwrap()
        );
        assert_eq!(stored_second.len(), 1);
    }

    #[tokio::test]
    async fn sample_at_day_end_belongs_to_next_day() {
        let dir = tempdir().expect("tempdir");
        let db = Database::new(dir.path().join("w.sqlite3")).expect("db");
        seed(&db, "E", at(1, 12), 20.0, "Clear").await;
        seed(&db, "E", at(2, 0), 30.0, "Rain").await;

        let day_one = rollup(&db, "E", at(1, 12)).await.unwrap().unwrap();
        assert_eq!(day_one.sample_count, 1);
        assert_eq!(day_one.max_temperature, 20.0);

        let day_two = rollup(&db, "E", at(2, 0)).await.unwrap().unwrap();
        assert_eq!(day_two.sample_count, 1);
        assert_eq!(day_two.dominant_condition, "Rain");
        assert_eq!(day_two.day, at(2, 0));
    }

    #[tokio::test]
    async fn empty_day_is_a_no_op() {
        let dir = tempdir().expect("tempdir");
        let db = Database::new(dir.path().join("w.sqlite3")).expect("db");

        assert_eq!(rollup(&db, "E", at(1, 12)).await.unwrap(), None);
        assert!(db.list_daily_summaries("E").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn later_samples_are_reflected_on_the_next_pass() {
        let dir = tempdir().expect("tempdir");
        let db = Database::new(dir.path().join("w.sqlite3")).expect("db");
        seed(&db, "E", at(1, 8), 20.0, "Clear").await;
        rollup(&db, "E", at(1, 8)).await.unwrap();

        seed(&db, "E", at(1, 9), 30.0, "Clear").await;
        let summary = rollup(&db, "E", at(1, 9)).await.unwrap().unwrap();
        assert_eq!(summary.avg_temperature, 25.0);
        assert_eq!(summary.sample_count, 2);
        assert_eq!(db.list_daily_summaries("E").await.unwrap().len(), 1);
    }
}
