use thiserror::Error;

/// Recoverable errors raised inside the intel core.
///
/// There is deliberately no fatal variant: fetch and parse failures are
/// absorbed at the source boundary ("refresh failed, keep previous
/// snapshot") and the system keeps serving the last successfully loaded
/// data.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Transport failure: connection error, timeout, non-2xx status.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Payload arrived but its shape is invalid.
    #[error("parse error: {0}")]
    Parse(String),
}
