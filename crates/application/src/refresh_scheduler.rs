use std::sync::Arc;
use std::time::Duration;

use ports::secondary::metrics_port::MetricsPort;
use tokio_util::sync::CancellationToken;

use crate::aggregator::IntelAggregator;
use crate::source::ThreatSource;

/// Drives periodic, isolated refresh of a fixed set of sources.
///
/// Each cycle refreshes every source in order, then rebuilds the
/// aggregator once. A failing source is logged and counted but never
/// fatal: the remaining sources still refresh in the same cycle, and
/// the scheduler keeps running on its interval until cancelled.
pub struct RefreshScheduler {
    sources: Vec<Arc<dyn ThreatSource>>,
    aggregator: Arc<IntelAggregator>,
    interval: Duration,
    metrics: Arc<dyn MetricsPort>,
}

impl RefreshScheduler {
    pub fn new(
        sources: Vec<Arc<dyn ThreatSource>>,
        aggregator: Arc<IntelAggregator>,
        interval: Duration,
        metrics: Arc<dyn MetricsPort>,
    ) -> Self {
        Self {
            sources,
            aggregator,
            interval,
            metrics,
        }
    }

    /// Run until cancelled.
    ///
    /// The initial load happens immediately, before the interval timer
    /// starts; callers should treat the data as best-effort until that
    /// first cycle completes. Cancellation exits the wait promptly; an
    /// in-flight cycle is allowed to complete.
    pub async fn run(&self, cancel: CancellationToken) {
        self.refresh_cycle().await;

        let mut interval = tokio::time::interval(self.interval);
        interval.tick().await; // consume the immediate first tick
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = interval.tick() => {}
            }
            self.refresh_cycle().await;
        }
        tracing::debug!("refresh scheduler stopped");
    }

    /// One full cycle: refresh every source, then publish a fresh index.
    pub async fn refresh_cycle(&self) {
        for source in &self.sources {
            match source.refresh().await {
                Ok(()) => {
                    tracing::info!(
                        source = source.name(),
                        indicator_count = source.indicators().len(),
                        "feed refreshed"
                    );
                    self.metrics.record_feed_refresh(source.name(), "success");
                }
                Err(e) => {
                    tracing::warn!(
                        source = source.name(),
                        error = %e,
                        "feed refresh failed, keeping previous snapshot"
                    );
                    self.metrics.record_feed_refresh(source.name(), "failure");
                }
            }
        }

        self.aggregator.rebuild();
        let index = self.aggregator.current();
        self.metrics
            .set_indicators_loaded("ip", index.ip_count() as u64);
        self.metrics
            .set_indicators_loaded("ip_port", index.ip_port_count() as u64);
    }
}
