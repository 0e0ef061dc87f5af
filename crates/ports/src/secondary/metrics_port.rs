// Focused sub-traits for recording metrics, grouped by concern.
//
// All methods take `&self`; implementations use interior mutability.
// Default implementations are no-ops, allowing test mocks to implement
// only the sub-trait relevant to the service under test.

/// Feed refresh and index metrics.
pub trait FeedMetrics: Send + Sync {
    /// Record the outcome of one feed refresh ("success" or "failure").
    fn record_feed_refresh(&self, _feed: &str, _result: &str) {}

    /// Set the number of indicators currently served, by kind
    /// ("ip" or "ip_port").
    fn set_indicators_loaded(&self, _kind: &str, _count: u64) {}
}

/// Flow classification metrics.
pub trait FlowMetrics: Send + Sync {
    /// Record a classified flow record.
    fn record_flow_processed(&self) {}

    /// Record a flow record dropped before classification.
    fn record_flow_skipped(&self, _reason: &str) {}

    /// Record an emitted alert with its reason label.
    fn record_alert(&self, _reason: &str) {}
}

/// Umbrella port implemented by anything that provides all groups.
pub trait MetricsPort: FeedMetrics + FlowMetrics {}

impl<T: FeedMetrics + FlowMetrics> MetricsPort for T {}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopMetrics;
    impl FeedMetrics for NoopMetrics {}
    impl FlowMetrics for NoopMetrics {}

    #[test]
    fn blanket_impl_covers_full_port() {
        fn assert_port<T: MetricsPort>(_: &T) {}
        assert_port(&NoopMetrics);
    }

    #[test]
    fn defaults_are_noops() {
        let m = NoopMetrics;
        m.record_feed_refresh("feed", "success");
        m.set_indicators_loaded("ip", 1);
        m.record_flow_processed();
        m.record_flow_skipped("malformed");
        m.record_alert("tor-exit-nodes");
    }
}
