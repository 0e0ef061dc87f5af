use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use adapters::alert::LogAlertSink;
use adapters::flow::ndjson::read_stdin_flow_records;
use adapters::intel::HttpFeedTransport;
use anyhow::Context;
use application::aggregator::IntelAggregator;
use application::flow_classifier::{FlowClassifier, MatchReasons};
use application::refresh_scheduler::RefreshScheduler;
use application::source::{IpListSource, IpPortJsonSource, ThreatSource};
use infrastructure::config::{AgentConfig, FeedFormat};
use infrastructure::logging::init_logging;
use infrastructure::metrics::AgentMetrics;
use ports::secondary::alert_sink::AlertSink;
use ports::secondary::feed_transport::FeedTransport;
use ports::secondary::metrics_port::{FlowMetrics, MetricsPort};
use tokio::sync::mpsc;

/// Grace period for background tasks after cancellation.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Channel capacity between the flow reader and the classifier.
const FLOW_CHANNEL_CAPACITY: usize = 1024;

pub async fn run(config_path: &Path) -> anyhow::Result<()> {
    let config = AgentConfig::load(config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    init_logging(config.agent.log_level, config.agent.log_format)
        .context("initializing logging")?;

    tracing::info!(
        agent = %config.agent.name,
        version = env!("CARGO_PKG_VERSION"),
        "starting flowsentry agent"
    );

    let metrics = Arc::new(AgentMetrics::new());

    let transport: Arc<dyn FeedTransport> = Arc::new(
        HttpFeedTransport::new().map_err(|e| anyhow::anyhow!("HTTP transport init: {e}"))?,
    );

    let fetch_timeout = Duration::from_secs(config.intel.fetch_timeout_secs);
    let mut sources: Vec<Arc<dyn ThreatSource>> = Vec::new();
    let mut reasons = MatchReasons::default();

    for feed in config.intel.feeds.iter().filter(|f| f.enabled) {
        match feed.format {
            FeedFormat::IpList => {
                if reasons.ip == MatchReasons::default().ip {
                    reasons.ip = feed.id.clone();
                }
                sources.push(Arc::new(IpListSource::new(
                    &feed.id,
                    &feed.url,
                    fetch_timeout,
                    Arc::clone(&transport),
                )));
            }
            FeedFormat::IpPortJson => {
                if reasons.ip_port == MatchReasons::default().ip_port {
                    reasons.ip_port = feed.id.clone();
                }
                sources.push(Arc::new(IpPortJsonSource::new(
                    &feed.id,
                    &feed.url,
                    fetch_timeout,
                    Arc::clone(&transport),
                )));
            }
        }
        tracing::info!(feed = %feed.id, url = %feed.url, "feed configured");
    }

    if sources.is_empty() {
        anyhow::bail!("no enabled feeds configured, nothing to match against");
    }

    let aggregator = Arc::new(IntelAggregator::new(sources.clone()));
    let scheduler = Arc::new(RefreshScheduler::new(
        sources,
        Arc::clone(&aggregator),
        Duration::from_secs(config.intel.refresh_interval_secs),
        Arc::clone(&metrics) as Arc<dyn MetricsPort>,
    ));

    let cancel = crate::shutdown::create_shutdown_token();

    let scheduler_cancel = cancel.clone();
    let scheduler_task = {
        let scheduler = Arc::clone(&scheduler);
        tokio::spawn(async move { scheduler.run(scheduler_cancel).await })
    };

    let sink: Arc<dyn AlertSink> = Arc::new(LogAlertSink);
    let classifier = FlowClassifier::new(
        Arc::clone(&aggregator),
        sink,
        Arc::clone(&metrics) as Arc<dyn MetricsPort>,
        reasons,
    );

    let (flow_tx, flow_rx) = mpsc::channel(FLOW_CHANNEL_CAPACITY);

    let classifier_cancel = cancel.clone();
    let classifier_task =
        tokio::spawn(async move { classifier.run(flow_rx, classifier_cancel).await });

    let reader_cancel = cancel.clone();
    let reader_metrics = Arc::clone(&metrics) as Arc<dyn FlowMetrics>;
    let reader_task = tokio::spawn(async move {
        read_stdin_flow_records(flow_tx, reader_metrics, reader_cancel).await;
    });

    tracing::info!("agent ready, classifying flow records from stdin");
    cancel.cancelled().await;

    for (name, task) in [
        ("scheduler", scheduler_task),
        ("classifier", classifier_task),
        ("reader", reader_task),
    ] {
        if tokio::time::timeout(SHUTDOWN_TIMEOUT, task).await.is_err() {
            tracing::warn!(task = name, "task did not stop within shutdown timeout");
        }
    }

    tracing::debug!(metrics = %metrics.encode(), "final metrics");
    tracing::info!("agent stopped");
    Ok(())
}
