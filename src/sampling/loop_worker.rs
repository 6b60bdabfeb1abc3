use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::fetcher::ReadingFetcher;

use super::sampler::Sampler;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

/// Samples every configured city once per poll interval until cancelled.
/// The first cycle runs immediately.
pub async fn sampling_loop<F: ReadingFetcher>(sampler: Sampler<F>, cancel_token: CancellationToken) {
    let mut ticker = tokio::time::interval(sampler.config().poll_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    log_info!(
        "sampling {} cities every {}s",
        sampler.config().cities.len(),
        sampler.config().poll_interval_secs
    );

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("sampling loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                // Store writes are atomic on the DB thread, so abandoning a
                // cycle halfway leaves every city either updated or untouched.
                tokio::select! {
                    biased;
                    _ = cancel_token.cancelled() => {
                        log_info!("sampling loop cancelled mid-cycle");
                        break;
                    }
                    report = sampler.run_cycle() => {
                        log_debug!("cycle report: {report:?}");
                        let snapshot = sampler.metrics().get_snapshot().await;
                        log_info!(
                            "totals after {} cycles: {} stored, {} fetch / {} store / {} rollup failures",
                            snapshot.cycle_count,
                            snapshot.samples_stored,
                            snapshot.fetch_failures,
                            snapshot.store_failures,
                            snapshot.rollup_failures
                        );
                    }
                }
            }
        }
    }
}
