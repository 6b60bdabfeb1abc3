use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{
    connection::Database,
    helpers::{conversion_error, format_datetime, parse_datetime, parse_optional_datetime},
    models::{Observation, Sample},
    repositories::samples::write_sample,
};

const OBSERVATION_COLUMNS: &str = "city, captured_at, temperature, condition, source_time,
    last_updated, min_temperature, max_temperature, avg_temperature, alert";

fn row_to_observation(row: &Row) -> Result<Observation, rusqlite::Error> {
    let captured_at: String = row.get("captured_at")?;
    let source_time: Option<String> = row.get("source_time")?;
    let last_updated: String = row.get("last_updated")?;

    Ok(Observation {
        city: row.get("city")?,
        captured_at: parse_datetime(&captured_at, "captured_at").map_err(conversion_error)?,
        temperature: row.get("temperature")?,
        condition: row.get("condition")?,
        source_time: parse_optional_datetime(source_time, "source_time")
            .map_err(conversion_error)?,
        last_updated: parse_datetime(&last_updated, "last_updated").map_err(conversion_error)?,
        min_temperature: row.get("min_temperature")?,
        max_temperature: row.get("max_temperature")?,
        avg_temperature: row.get("avg_temperature")?,
        alert: row.get("alert")?,
    })
}

fn validate(observation: &Observation) -> Result<()> {
    if observation.city.trim().is_empty() {
        bail!("observation city is required");
    }
    if !observation.temperature.is_finite() {
        bail!(
            "refusing to store non-finite temperature {} for {}",
            observation.temperature,
            observation.city
        );
    }
    // Sentinel extrema mean "no sample yet" and must never reach disk.
    if !observation.has_finite_extrema() {
        bail!(
            "refusing to store sentinel extrema ({}, {}) for {}",
            observation.min_temperature,
            observation.max_temperature,
            observation.city
        );
    }
    Ok(())
}

fn write_observation(conn: &Connection, observation: &Observation) -> Result<()> {
    conn.execute(
        "INSERT INTO observations (
            city,
            captured_at,
            temperature,
            condition,
            source_time,
            last_updated,
            min_temperature,
            max_temperature,
            avg_temperature,
            alert
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        ON CONFLICT(city) DO UPDATE SET
            captured_at = excluded.captured_at,
            temperature = excluded.temperature,
            condition = excluded.condition,
            source_time = excluded.source_time,
            last_updated = excluded.last_updated,
            min_temperature = excluded.min_temperature,
            max_temperature = excluded.max_temperature,
            avg_temperature = excluded.avg_temperature,
            alert = excluded.alert",
        params![
            observation.city,
            format_datetime(&observation.captured_at),
            observation.temperature,
            observation.condition,
            observation.source_time.as_ref().map(format_datetime),
            format_datetime(&observation.last_updated),
            observation.min_temperature,
            observation.max_temperature,
            observation.avg_temperature,
            observation.alert,
        ],
    )
    .with_context(|| format!("failed to upsert observation for {}", observation.city))?;
    Ok(())
}

impl Database {
    /// Latest observation for `city`, or `None` if it was never sampled.
    pub async fn get_observation(&self, city: &str) -> Result<Option<Observation>> {
        let city = city.to_string();
        self.execute(move |conn| {
            let sql = format!("SELECT {OBSERVATION_COLUMNS} FROM observations WHERE city = ?1");
            let observation = conn
                .query_row(&sql, params![city], row_to_observation)
                .optional()?;
            Ok(observation)
        })
        .await
    }

    /// Create or fully replace the observation row keyed by city.
    pub async fn upsert_observation(&self, observation: &Observation) -> Result<()> {
        validate(observation)?;
        let record = observation.clone();
        self.execute(move |conn| write_observation(conn, &record)).await
    }

    /// Upsert the observation and append its raw sample in one transaction.
    pub async fn record_observation(&self, observation: &Observation) -> Result<()> {
        validate(observation)?;
        let record = observation.clone();
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            write_observation(&tx, &record)?;
            write_sample(
                &tx,
                &Sample {
                    city: record.city.clone(),
                    captured_at: record.captured_at,
                    temperature: record.temperature,
                    condition: record.condition.clone(),
                },
            )?;
            tx.commit()
                .with_context(|| format!("failed to commit sample for {}", record.city))?;
            Ok(())
        })
        .await
    }

    /// Every stored observation, ordered by city.
    pub async fn list_observations(&self) -> Result<Vec<Observation>> {
        self.execute(|conn| {
            let sql = format!("SELECT {OBSERVATION_COLUMNS} FROM observations ORDER BY city ASC");
            let mut stmt = conn.prepare(&sql)?;
            let observations = stmt
                .query_map([], row_to_observation)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(observations)
        })
        .await
    }
}
