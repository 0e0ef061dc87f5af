use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use domain::common::error::DomainError;

/// Secondary port for downloading raw feed payloads.
///
/// Uses `Pin<Box<dyn Future>>` return type (instead of RPITIT) so the
/// trait is dyn-compatible and can be used as `Arc<dyn FeedTransport>`.
pub trait FeedTransport: Send + Sync {
    /// Fetch the body at `url` as text.
    ///
    /// Connection failures, timeouts and non-2xx statuses must all
    /// surface as [`DomainError::Fetch`].
    fn fetch<'a>(
        &'a self,
        url: &'a str,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<String, DomainError>> + Send + 'a>>;
}
