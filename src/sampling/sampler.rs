use std::{sync::Arc, time::Instant};

use chrono::{DateTime, Utc};

use crate::{
    config::MonitorConfig,
    db::Database,
    fetcher::{FetchError, ReadingFetcher, WeatherReading},
    metrics::MetricsCollector,
    rollup::rollup,
};

use super::report::{CityReport, CycleReport, Step};
use super::stats::next_observation;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

/// One pass over every configured city: fetch, fold into running stats,
/// persist, roll up. A failure in any step only affects the city it belongs
/// to.
pub struct Sampler<F> {
    db: Database,
    fetcher: Arc<F>,
    config: Arc<MonitorConfig>,
    metrics: MetricsCollector,
}

impl<F> Clone for Sampler<F> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            fetcher: Arc::clone(&self.fetcher),
            config: Arc::clone(&self.config),
            metrics: self.metrics.clone(),
        }
    }
}

impl<F: ReadingFetcher> Sampler<F> {
    pub fn new(db: Database, fetcher: F, config: MonitorConfig, metrics: MetricsCollector) -> Self {
        Self {
            db,
            fetcher: Arc::new(fetcher),
            config: Arc::new(config),
            metrics,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// Run a cycle stamping each city with the wall clock at its turn.
    pub async fn run_cycle(&self) -> CycleReport {
        self.run_cycle_with(Utc::now).await
    }

    /// Run a cycle with every city stamped at `now`.
    pub async fn run_cycle_at(&self, now: DateTime<Utc>) -> CycleReport {
        self.run_cycle_with(move || now).await
    }

    async fn run_cycle_with<C>(&self, clock: C) -> CycleReport
    where
        C: Fn() -> DateTime<Utc>,
    {
        let started = Instant::now();
        let started_at = clock();

        let mut cities = Vec::with_capacity(self.config.cities.len());
        for city in &self.config.cities {
            cities.push(self.sample_city(city, clock()).await);
        }

        let report = CycleReport {
            started_at,
            cities,
            total_ms: started.elapsed().as_millis() as u64,
        };

        let metrics = report.metrics();
        log_info!(
            "cycle finished in {}ms: {}/{} stored, {} fetch failures, {} store failures, {} rollup failures",
            metrics.total_ms,
            metrics.stored,
            metrics.cities,
            metrics.fetch_failures,
            metrics.store_failures,
            metrics.rollup_failures
        );
        self.metrics.record_cycle(metrics).await;

        report
    }

    pub async fn sample_city(&self, city: &str, now: DateTime<Utc>) -> CityReport {
        let mut report = CityReport::new(city);

        let reading = match self.fetch(city).await {
            Ok(reading) => {
                report.fetch = Step::Done;
                reading
            }
            Err(err) => {
                log_warn!("Error fetching weather for {city}: {err}");
                report.fetch = Step::Failed;
                return report;
            }
        };

        let prior = match self.db.get_observation(city).await {
            Ok(prior) => {
                report.read = Step::Done;
                prior
            }
            Err(err) => {
                log_error!("Error fetching last observation for {city}: {err:#}");
                report.read = Step::Failed;
                return report;
            }
        };

        let observation = next_observation(
            city,
            prior.as_ref(),
            &reading,
            now,
            self.config.alert_threshold,
        );

        match self.db.record_observation(&observation).await {
            Ok(()) => {
                report.write = Step::Done;
                log_info!(
                    "Stored weather data for {city}: {:.2} ({}) min={:.2} max={:.2} alert={}",
                    observation.temperature,
                    observation.condition,
                    observation.min_temperature,
                    observation.max_temperature,
                    observation.alert
                );
            }
            Err(err) => {
                report.write = Step::Failed;
                log_error!("Error storing weather data for {city}: {err:#}");
            }
        }

        report.rollup = match rollup(&self.db, city, now).await {
            Ok(Some(_)) => Step::Done,
            Ok(None) => Step::Skipped,
            Err(err) => {
                log_error!("Error calculating daily summary for {city}: {err:#}");
                Step::Failed
            }
        };

        report
    }

    async fn fetch(&self, city: &str) -> Result<WeatherReading, FetchError> {
        let timeout = self.config.fetch_timeout();
        match tokio::time::timeout(timeout, self.fetcher.fetch(city)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(timeout.as_secs())),
        }
    }
}
