pub mod config;
pub mod db;
pub mod fetcher;
pub mod metrics;
pub mod rollup;
pub mod sampling;
mod utils;

use anyhow::{Context, Result};
use log::{info, warn};

use config::MonitorConfig;
use db::{DailySummary, Database, ObservationView};
use fetcher::OpenWeatherFetcher;
use metrics::MetricsCollector;
use sampling::{Sampler, SamplingController};

/// Initialize logging (reads RUST_LOG env var, defaults to info).
pub fn init_logging() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}

/// Open the store and run the sampling loop until Ctrl-C.
pub async fn run(config: MonitorConfig) -> Result<()> {
    info!("weather monitor starting up...");

    if config.api_key.is_empty() {
        warn!(
            "no API key configured; set {} or api_key in the config file",
            config::API_KEY_ENV
        );
    }

    let database = Database::new(config.database_path.clone())?;
    let fetcher = OpenWeatherFetcher::new(
        &config.api_base_url,
        &config.api_key,
        config.fetch_timeout(),
    )
    .context("failed to build weather client")?;

    let metrics = MetricsCollector::new();
    let database_path = database.path().to_path_buf();
    let sampler = Sampler::new(database, fetcher, config, metrics.clone());

    let mut controller = SamplingController::new();
    controller.start_sampling(sampler)?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutdown requested");

    controller.stop_sampling().await?;

    let snapshot = metrics.get_snapshot().await;
    info!(
        "ran {} cycles against {}: {} samples stored, {} fetch failures, {} store failures, {} rollup failures",
        snapshot.cycle_count,
        database_path.display(),
        snapshot.samples_stored,
        snapshot.fetch_failures,
        snapshot.store_failures,
        snapshot.rollup_failures
    );
    Ok(())
}

/// Current observation for every city, in presentation form.
pub async fn current_observations(db: &Database) -> Result<Vec<ObservationView>> {
    let observations = db.list_observations().await?;
    Ok(observations.into_iter().map(ObservationView::from).collect())
}

/// Stored daily summaries for `city`, newest first.
pub async fn daily_summaries(db: &Database, city: &str) -> Result<Vec<DailySummary>> {
    db.list_daily_summaries(city).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::sampler::tests::{config, ScriptedFetcher};
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    #[tokio::test]
    async fn query_helpers_reflect_the_last_cycle() {
        let dir = tempdir().expect("tempdir");
        let db = Database::new(dir.path().join("w.sqlite3")).expect("db");
        let fetcher = ScriptedFetcher::default()
            .with("Mumbai", 31.0, "Haze")
            .with("Delhi", 35.0, "Clear");
        let sampler = Sampler::new(
            db.clone(),
            fetcher,
            config(&["Mumbai", "Delhi"]),
            MetricsCollector::new(),
        );

        let now = Utc.with_ymd_and_hms(2024, 5, 1, 15, 0, 0).unwrap();
        sampler.run_cycle_at(now).await;

        let views = current_observations(&db).await.unwrap();
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].city, "Delhi");
        assert_eq!(views[0].dominant_condition, "Clear");
        assert_eq!(views[1].avg_temperature, 31.0);

        let summaries = daily_summaries(&db, "Mumbai").await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].day, Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());
    }
}
