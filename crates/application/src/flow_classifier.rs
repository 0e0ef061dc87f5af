use std::sync::Arc;

use domain::flow::entity::{Alert, FlowRecord};
use ports::secondary::alert_sink::AlertSink;
use ports::secondary::metrics_port::MetricsPort;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::aggregator::IntelAggregator;

/// Reason labels attached to alerts, one per feed family.
#[derive(Debug, Clone)]
pub struct MatchReasons {
    /// Reason for IP-wide matches (typically the IP-list feed id).
    pub ip: String,
    /// Reason for IP:port matches (typically the JSON feed id).
    pub ip_port: String,
}

impl Default for MatchReasons {
    fn default() -> Self {
        Self {
            ip: "malicious-ip".to_string(),
            ip_port: "malicious-ip-port".to_string(),
        }
    }
}

/// Matches flow records against the intel index and emits alerts.
///
/// Lookups are pure in-memory set membership tests; the only await
/// point is the sink dispatch, whose outcome the classifier never
/// depends on.
pub struct FlowClassifier {
    aggregator: Arc<IntelAggregator>,
    sink: Arc<dyn AlertSink>,
    metrics: Arc<dyn MetricsPort>,
    reasons: MatchReasons,
}

impl FlowClassifier {
    pub fn new(
        aggregator: Arc<IntelAggregator>,
        sink: Arc<dyn AlertSink>,
        metrics: Arc<dyn MetricsPort>,
        reasons: MatchReasons,
    ) -> Self {
        Self {
            aggregator,
            sink,
            metrics,
            reasons,
        }
    }

    /// Run the four checks for one record, emitting 0–4 alerts in fixed
    /// order: source IP, destination IP, source pair, destination pair.
    /// Returns the number of alerts emitted.
    ///
    /// All four checks query one index handle, so a record sees a
    /// point-in-time consistent view even while a rebuild is in flight.
    pub async fn process_record(&self, record: &FlowRecord) -> usize {
        let index = self.aggregator.current();
        let mut emitted = 0;

        if index.is_malicious_ip(&record.source_ip) {
            self.emit(&self.reasons.ip, &record.source_ip, None, record)
                .await;
            emitted += 1;
        }
        if index.is_malicious_ip(&record.destination_ip) {
            self.emit(&self.reasons.ip, &record.destination_ip, None, record)
                .await;
            emitted += 1;
        }
        if index.is_malicious_ip_port(&record.source_ip, record.source_port) {
            self.emit(
                &self.reasons.ip_port,
                &record.source_ip,
                Some(record.source_port),
                record,
            )
            .await;
            emitted += 1;
        }
        if index.is_malicious_ip_port(&record.destination_ip, record.destination_port) {
            self.emit(
                &self.reasons.ip_port,
                &record.destination_ip,
                Some(record.destination_port),
                record,
            )
            .await;
            emitted += 1;
        }

        self.metrics.record_flow_processed();
        emitted
    }

    async fn emit(&self, reason: &str, ip: &str, port: Option<u16>, record: &FlowRecord) {
        let alert = Alert {
            reason: reason.to_string(),
            ip: ip.to_string(),
            port,
            flow: record.clone(),
        };
        self.metrics.record_alert(&alert.reason);
        // Fire and forget: sink failures are not the classifier's problem.
        if let Err(e) = self.sink.send(&alert).await {
            tracing::debug!(reason = %alert.reason, error = %e, "alert sink send failed");
        }
    }

    /// Consume flow records from a channel until it closes or the token
    /// is cancelled.
    pub async fn run(&self, mut records: mpsc::Receiver<FlowRecord>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                maybe_record = records.recv() => {
                    let Some(record) = maybe_record else { break };
                    self.process_record(&record).await;
                }
            }
        }
        tracing::debug!("flow classifier stopped");
    }
}
