use std::future::Future;
use std::pin::Pin;

use domain::common::error::DomainError;
use domain::flow::entity::Alert;

/// Secondary port for delivering alerts to an external consumer.
///
/// The core calls `send` once per emitted alert and does not depend on
/// its outcome; sink-side failures are the sink's problem. Uses
/// `Pin<Box<dyn Future>>` so the trait is dyn-compatible and can be
/// used as `Arc<dyn AlertSink>`.
pub trait AlertSink: Send + Sync {
    fn send<'a>(
        &'a self,
        alert: &'a Alert,
    ) -> Pin<Box<dyn Future<Output = Result<(), DomainError>> + Send + 'a>>;
}
