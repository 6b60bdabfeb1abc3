use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use crate::db::{
    connection::Database,
    helpers::{conversion_error, format_datetime, parse_datetime},
    models::DailySummary,
};

fn row_to_daily_summary(row: &Row) -> Result<DailySummary, rusqlite::Error> {
    let day: String = row.get("day")?;

    Ok(DailySummary {
        city: row.get("city")?,
        day: parse_datetime(&day, "day").map_err(conversion_error)?,
        avg_temperature: row.get("avg_temperature")?,
        max_temperature: row.get("max_temperature")?,
        min_temperature: row.get("min_temperature")?,
        dominant_condition: row.get("dominant_condition")?,
        sample_count: row.get("sample_count")?,
    })
}

impl Database {
    /// Create or fully replace the summary for `(city, day)`.
    pub async fn upsert_daily_summary(&self, summary: &DailySummary) -> Result<()> {
        let record = summary.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO daily_summaries (
                    city,
                    day,
                    avg_temperature,
                    max_temperature,
                    min_temperature,
                    dominant_condition,
                    sample_count
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(city, day) DO UPDATE SET
                    avg_temperature = excluded.avg_temperature,
                    max_temperature = excluded.max_temperature,
                    min_temperature = excluded.min_temperature,
                    dominant_condition = excluded.dominant_condition,
                    sample_count = excluded.sample_count",
                params![
                    record.city,
                    format_datetime(&record.day),
                    record.avg_temperature,
                    record.max_temperature,
                    record.min_temperature,
                    record.dominant_condition,
                    record.sample_count,
                ],
            )
            .with_context(|| {
                format!(
                    "failed to upsert daily summary for {} on {}",
                    record.city,
                    record.day.date_naive()
                )
            })?;
            Ok(())
        })
        .await
    }

    pub async fn get_daily_summary(
        &self,
        city: &str,
        day: DateTime<Utc>,
    ) -> Result<Option<DailySummary>> {
        let city = city.to_string();
        self.execute(move |conn| {
            let summary = conn
                .query_row(
                    "SELECT city, day, avg_temperature, max_temperature, min_temperature,
                            dominant_condition, sample_count
                     FROM daily_summaries
                     WHERE city = ?1 AND day = ?2",
                    params![city, format_datetime(&day)],
                    row_to_daily_summary,
                )
                .optional()?;
            Ok(summary)
        })
        .await
    }

    /// All stored summaries for `city`, newest day first.
    pub async fn list_daily_summaries(&self, city: &str) -> Result<Vec<DailySummary>> {
        let city = city.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT city, day, avg_temperature, max_temperature, min_temperature,
                        dominant_condition, sample_count
                 FROM daily_summaries
                 WHERE city = ?1
                 ORDER BY day DESC",
            )?;

            let summaries = stmt
                .query_map(params![city], row_to_daily_summary)?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(summaries)
        })
        .await
    }
}
