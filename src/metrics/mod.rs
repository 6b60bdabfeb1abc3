mod types;

pub use types::{CycleMetrics, MetricsSnapshot};

use std::sync::Arc;
use tokio::sync::Mutex;

const MAX_RECENT_CYCLES: usize = 20;

/// Lifetime counters plus a short window of recent cycles. Clones share state.
#[derive(Clone, Default)]
pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsSnapshot>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record_cycle(&self, metrics: CycleMetrics) {
        let mut state = self.inner.lock().await;

        state.cycle_count += 1;
        state.samples_stored += metrics.stored as u64;
        state.fetch_failures += metrics.fetch_failures as u64;
        state.store_failures += metrics.store_failures as u64;
        state.rollup_failures += metrics.rollup_failures as u64;

        state.recent_cycles.push(metrics);
        if state.recent_cycles.len() > MAX_RECENT_CYCLES {
            state.recent_cycles.remove(0);
        }
    }

    pub async fn get_snapshot(&self) -> MetricsSnapshot {
        self.inner.lock().await.clone()
    }
}
