use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use domain::common::error::DomainError;
use domain::intel::entity::Indicator;
use domain::intel::parser::parse_ip_list;
use ports::secondary::feed_transport::FeedTransport;

/// A feed adapter producing indicators.
///
/// `refresh()` performs one fetch+parse cycle. On success the source's
/// snapshot is replaced atomically; on failure the previous snapshot is
/// left untouched and a recoverable error is returned. `indicators()`
/// may be called concurrently with `refresh()` and never observes a
/// partially written snapshot.
///
/// Uses `Pin<Box<dyn Future>>` return type so the trait is
/// dyn-compatible and sources can be held as `Arc<dyn ThreatSource>`.
pub trait ThreatSource: Send + Sync {
    /// Fetch and parse the feed, replacing the snapshot on success.
    fn refresh<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<(), DomainError>> + Send + 'a>>;

    /// The current snapshot's indicators.
    fn indicators(&self) -> Vec<Indicator>;

    /// Stable identifier used for logging and alert reason tagging.
    fn name(&self) -> &str;
}

/// Swap-on-write snapshot holder shared by both source variants.
type Snapshot = RwLock<Arc<HashSet<Indicator>>>;

fn publish(snapshot: &Snapshot, next: HashSet<Indicator>) {
    let mut guard = snapshot.write().unwrap_or_else(PoisonError::into_inner);
    *guard = Arc::new(next);
}

fn read_snapshot(snapshot: &Snapshot) -> Vec<Indicator> {
    let current = Arc::clone(&*snapshot.read().unwrap_or_else(PoisonError::into_inner));
    current.iter().cloned().collect()
}

// ── Plaintext IP-list source ────────────────────────────────────────

/// Plaintext IP-list source: one address per line, `#` comments.
///
/// Every surviving line becomes a port-less indicator; duplicate lines
/// collapse because the snapshot is a set.
pub struct IpListSource {
    name: String,
    url: String,
    timeout: Duration,
    transport: Arc<dyn FeedTransport>,
    snapshot: Snapshot,
}

impl IpListSource {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        timeout: Duration,
        transport: Arc<dyn FeedTransport>,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            timeout,
            transport,
            snapshot: RwLock::new(Arc::new(HashSet::new())),
        }
    }

    async fn do_refresh(&self) -> Result<(), DomainError> {
        let body = self.transport.fetch(&self.url, self.timeout).await?;
        let next: HashSet<Indicator> = parse_ip_list(&body)
            .into_iter()
            .map(|ip| Indicator::ip_only(ip, &self.name))
            .collect();
        publish(&self.snapshot, next);
        Ok(())
    }
}

impl ThreatSource for IpListSource {
    fn refresh<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<(), DomainError>> + Send + 'a>> {
        Box::pin(self.do_refresh())
    }

    fn indicators(&self) -> Vec<Indicator> {
        read_snapshot(&self.snapshot)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ── JSON IP:port source ─────────────────────────────────────────────

/// JSON IOC-export source.
///
/// Expects `{ "data": [ { "ioc_value": "<ip>", "port": <int|string> }, ... ] }`.
/// Entries missing `ioc_value`, or whose `port` is absent or not
/// coercible to an integer, are dropped per-entry; a handful of bad
/// records never fails the whole refresh.
pub struct IpPortJsonSource {
    name: String,
    url: String,
    timeout: Duration,
    transport: Arc<dyn FeedTransport>,
    snapshot: Snapshot,
}

impl IpPortJsonSource {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        timeout: Duration,
        transport: Arc<dyn FeedTransport>,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            timeout,
            transport,
            snapshot: RwLock::new(Arc::new(HashSet::new())),
        }
    }

    async fn do_refresh(&self) -> Result<(), DomainError> {
        let body = self.transport.fetch(&self.url, self.timeout).await?;
        let next = parse_ip_port_json(&body, &self.name)?;
        publish(&self.snapshot, next);
        Ok(())
    }
}

impl ThreatSource for IpPortJsonSource {
    fn refresh<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<(), DomainError>> + Send + 'a>> {
        Box::pin(self.do_refresh())
    }

    fn indicators(&self) -> Vec<Indicator> {
        read_snapshot(&self.snapshot)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Parse the JSON export into deduplicated indicators.
///
/// This lives in the application layer (rather than domain) to keep
/// `serde_json` out of the domain crate's production dependencies.
fn parse_ip_port_json(text: &str, source: &str) -> Result<HashSet<Indicator>, DomainError> {
    let payload: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| DomainError::Parse(format!("invalid JSON payload: {e}")))?;

    let items = payload
        .get("data")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| DomainError::Parse("missing top-level 'data' array".to_string()))?;

    let mut indicators = HashSet::with_capacity(items.len());
    for item in items {
        let ip = match item.get("ioc_value").and_then(serde_json::Value::as_str) {
            Some(ip) if !ip.is_empty() => ip,
            _ => continue,
        };
        let Some(port) = coerce_port(item.get("port")) else {
            continue;
        };
        indicators.insert(Indicator::ip_port(ip, port, source));
    }

    Ok(indicators)
}

/// Accept integer ports and numeric-string ports; reject everything
/// else, including null and out-of-range values.
fn coerce_port(value: Option<&serde_json::Value>) -> Option<u16> {
    match value? {
        serde_json::Value::Number(n) => n.as_u64().and_then(|p| u16::try_from(p).ok()),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
