//! Prometheus metrics backing the feed and flow metric ports.

use std::sync::Mutex;

use ports::secondary::metrics_port::{FeedMetrics, FlowMetrics};
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct RefreshLabels {
    feed: String,
    result: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct KindLabels {
    kind: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct ReasonLabels {
    reason: String,
}

/// All agent metrics, registered under the `flowsentry` prefix.
pub struct AgentMetrics {
    registry: Mutex<Registry>,
    feed_refreshes_total: Family<RefreshLabels, Counter>,
    indicators_loaded: Family<KindLabels, Gauge>,
    flows_processed_total: Counter,
    flows_skipped_total: Family<ReasonLabels, Counter>,
    alerts_total: Family<ReasonLabels, Counter>,
}

impl AgentMetrics {
    pub fn new() -> Self {
        let mut registry = Registry::with_prefix("flowsentry");

        let feed_refreshes_total = Family::<RefreshLabels, Counter>::default();
        registry.register(
            "feed_refreshes",
            "Feed refresh attempts by feed and result",
            feed_refreshes_total.clone(),
        );

        let indicators_loaded = Family::<KindLabels, Gauge>::default();
        registry.register(
            "indicators_loaded",
            "Indicators currently served, by kind",
            indicators_loaded.clone(),
        );

        let flows_processed_total = Counter::default();
        registry.register(
            "flows_processed",
            "Flow records classified",
            flows_processed_total.clone(),
        );

        let flows_skipped_total = Family::<ReasonLabels, Counter>::default();
        registry.register(
            "flows_skipped",
            "Flow records dropped before classification, by reason",
            flows_skipped_total.clone(),
        );

        let alerts_total = Family::<ReasonLabels, Counter>::default();
        registry.register(
            "alerts",
            "Alerts emitted, by match reason",
            alerts_total.clone(),
        );

        Self {
            registry: Mutex::new(registry),
            feed_refreshes_total,
            indicators_loaded,
            flows_processed_total,
            flows_skipped_total,
            alerts_total,
        }
    }

    /// Render all metrics in the OpenMetrics text format.
    pub fn encode(&self) -> String {
        let mut output = String::new();
        let registry = self
            .registry
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Err(e) = prometheus_client::encoding::text::encode(&mut output, &registry) {
            tracing::warn!(error = %e, "metrics encoding failed");
        }
        output
    }
}

impl Default for AgentMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedMetrics for AgentMetrics {
    fn record_feed_refresh(&self, feed: &str, result: &str) {
        self.feed_refreshes_total
            .get_or_create(&RefreshLabels {
                feed: feed.to_string(),
                result: result.to_string(),
            })
            .inc();
    }

    fn set_indicators_loaded(&self, kind: &str, count: u64) {
        self.indicators_loaded
            .get_or_create(&KindLabels {
                kind: kind.to_string(),
            })
            .set(i64::try_from(count).unwrap_or(i64::MAX));
    }
}

impl FlowMetrics for AgentMetrics {
    fn record_flow_processed(&self) {
        self.flows_processed_total.inc();
    }

    fn record_flow_skipped(&self, reason: &str) {
        self.flows_skipped_total
            .get_or_create(&ReasonLabels {
                reason: reason.to_string(),
            })
            .inc();
    }

    fn record_alert(&self, reason: &str) {
        self.alerts_total
            .get_or_create(&ReasonLabels {
                reason: reason.to_string(),
            })
            .inc();
    }
}
