use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use domain::common::error::DomainError;
use ports::secondary::feed_transport::FeedTransport;

/// Maximum feed response size: 10 MiB. Guards against a compromised or
/// misconfigured feed returning unbounded data.
const MAX_FEED_RESPONSE_SIZE: usize = 10 * 1024 * 1024;

/// HTTP transport for feed downloads, backed by reqwest.
///
/// The per-request timeout comes from the caller, so one client serves
/// feeds with different timeout budgets.
pub struct HttpFeedTransport {
    client: reqwest::Client,
}

impl HttpFeedTransport {
    pub fn new() -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("flowsentry/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DomainError::Fetch(format!("HTTP client init failed: {e}")))?;
        Ok(Self { client })
    }

    /// Build from an existing reqwest client (testing, custom TLS).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn do_fetch(&self, url: &str, timeout: Duration) -> Result<String, DomainError> {
        let mut response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| DomainError::Fetch(format!("request to '{url}' failed: {e}")))?;

        if !response.status().is_success() {
            return Err(DomainError::Fetch(format!(
                "'{url}' returned HTTP {}",
                response.status()
            )));
        }

        let content_length: usize = response
            .content_length()
            .unwrap_or(0)
            .try_into()
            .unwrap_or(usize::MAX);
        if content_length > MAX_FEED_RESPONSE_SIZE {
            return Err(DomainError::Fetch(format!(
                "'{url}' response too large: {content_length} bytes (max {MAX_FEED_RESPONSE_SIZE})"
            )));
        }

        // Read the body in chunks with a hard cap; content-length alone
        // cannot be trusted for chunked responses.
        let mut body = Vec::with_capacity(content_length.min(MAX_FEED_RESPONSE_SIZE));
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| DomainError::Fetch(format!("'{url}' body read failed: {e}")))?
        {
            if body.len() + chunk.len() > MAX_FEED_RESPONSE_SIZE {
                return Err(DomainError::Fetch(format!(
                    "'{url}' response exceeded {MAX_FEED_RESPONSE_SIZE} byte limit"
                )));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

impl FeedTransport for HttpFeedTransport {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<String, DomainError>> + Send + 'a>> {
        Box::pin(self.do_fetch(url, timeout))
    }
}
