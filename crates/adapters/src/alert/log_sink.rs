use std::future::Future;
use std::pin::Pin;

use domain::common::error::DomainError;
use domain::flow::entity::Alert;
use ports::secondary::alert_sink::AlertSink;

/// Alert sink that logs alerts via tracing.
///
/// The default sink when no external destination is configured.
pub struct LogAlertSink;

impl AlertSink for LogAlertSink {
    fn send<'a>(
        &'a self,
        alert: &'a Alert,
    ) -> Pin<Box<dyn Future<Output = Result<(), DomainError>> + Send + 'a>> {
        Box::pin(async move {
            tracing::info!(
                reason = %alert.reason,
                ip = %alert.ip,
                port = alert.port,
                source_ip = %alert.flow.source_ip,
                destination_ip = %alert.flow.destination_ip,
                source_port = alert.flow.source_port,
                destination_port = alert.flow.destination_port,
                flow_timestamp = alert.flow.timestamp,
                "flow matched threat indicator"
            );
            Ok(())
        })
    }
}
