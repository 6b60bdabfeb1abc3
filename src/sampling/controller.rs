use anyhow::{bail, Context, Result};
use log::info;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::fetcher::ReadingFetcher;

use super::loop_worker::sampling_loop;
use super::sampler::Sampler;

/// Owns the background sampling task.
pub struct SamplingController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl SamplingController {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }

    pub fn start_sampling<F: ReadingFetcher>(&mut self, sampler: Sampler<F>) -> Result<()> {
        if self.handle.is_some() {
            bail!("sampling already active");
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(sampling_loop(sampler, cancel_token.clone()));

        info!("sampling loop started");
        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    pub async fn stop_sampling(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("sampling loop task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}

impl Default for SamplingController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::metrics::MetricsCollector;
    use crate::sampling::sampler::tests::{config, ScriptedFetcher};
    use tempfile::tempdir;

    #[tokio::test]
    async fn refuses_double_start_and_stops_cleanly() {
        let dir = tempdir().expect("tempdir");
        let db = Database::new(dir.path().join("w.sqlite3")).expect("db");
        let mut cfg = config(&["Goa"]);
        cfg.poll_interval_secs = 3600;
        let sampler = Sampler::new(db, ScriptedFetcher::default(), cfg, MetricsCollector::new());

        let mut controller = SamplingController::new();
        controller.start_sampling(sampler.clone()).unwrap();
        assert!(controller.handle.is_some());
        assert!(controller.start_sampling(sampler).is_err());

        controller.stop_sampling().await.unwrap();
        assert!(controller.handle.is_none() && controller.cancel_token.is_none());
        controller.stop_sampling().await.unwrap();
    }
}
