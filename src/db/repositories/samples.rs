use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use crate::db::{
    connection::Database,
    helpers::{conversion_error, format_datetime, parse_datetime},
    models::Sample,
};

fn row_to_sample(row: &Row) -> Result<Sample, rusqlite::Error> {
    let captured_at: String = row.get("captured_at")?;

    Ok(Sample {
        city: row.get("city")?,
        captured_at: parse_datetime(&captured_at, "captured_at").map_err(conversion_error)?,
        temperature: row.get("temperature")?,
        condition: row.get("condition")?,
    })
}

/// Keyed by (city, captured_at): replaying the same capture overwrites it.
pub(crate) fn write_sample(conn: &Connection, sample: &Sample) -> Result<()> {
    conn.execute(
        "INSERT INTO readings (city, captured_at, temperature, condition)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(city, captured_at) DO UPDATE SET
             temperature = excluded.temperature,
             condition = excluded.condition",
        params![
            sample.city,
            format_datetime(&sample.captured_at),
            sample.temperature,
            sample.condition,
        ],
    )
    .with_context(|| format!("failed to insert sample for {}", sample.city))?;
    Ok(())
}

impl Database {
    pub async fn insert_sample(&self, sample: &Sample) -> Result<()> {
        let record = sample.clone();
        self.execute(move |conn| write_sample(conn, &record)).await
    }

    /// Samples for `city` with `start <= captured_at < end`, oldest first.
    pub async fn get_samples_between(
        &self,
        city: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Sample>> {
        let city = city.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT city, captured_at, temperature, condition
                 FROM readings
                 WHERE city = ?1 AND captured_at >= ?2 AND captured_at < ?3
                 ORDER BY captured_at ASC",
            )?;

            let samples = stmt
                .query_map(
                    params![city, format_datetime(&start), format_datetime(&end)],
                    row_to_sample,
                )?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(samples)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn sample(city: &str, hour: u32, temperature: f64) -> Sample {
        Sample {
            city: city.into(),
            captured_at: Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap(),
            temperature,
            condition: "Clear".into(),
        }
    }

    #[tokio::test]
    async fn range_is_half_open_and_city_scoped() {
        let dir = tempdir().expect("tempdir");
        let db = Database::new(dir.path().join("w.sqlite3")).expect("db");

        db.insert_sample(&sample("Delhi", 8, 20.0)).await.unwrap();
        db.insert_sample(&sample("Delhi", 12, 24.0)).await.unwrap();
        db.insert_sample(&sample("Delhi", 16, 22.0)).await.unwrap();
        db.insert_sample(&sample("Mumbai", 12, 30.0)).await.unwrap();

        let start = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 5, 1, 16, 0, 0).unwrap();
        let samples = db.get_samples_between("Delhi", start, end).await.unwrap();

        let temps: Vec<f64> = samples.iter().map(|s| s.temperature).collect();
        assert_eq!(temps, vec![20.0, 24.0]);
        assert!(samples.iter().all(|s| s.city == "Delhi"));
    }

    #[tokio::test]
    async fn same_capture_instant_overwrites() {
        let dir = tempdir().expect("tempdir");
        let db = Database::new(dir.path().join("w.sqlite3")).expect("db");

        db.insert_sample(&sample("Delhi", 9, 20.0)).await.unwrap();
        let mut corrected = sample("Delhi", 9, 21.0);
        corrected.condition = "Haze".into();
        db.insert_sample(&corrected).await.unwrap();

        let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap();
        let samples = db.get_samples_between("Delhi", start, end).await.unwrap();
        assert_eq!(samples, vec![corrected]);
    }
}
