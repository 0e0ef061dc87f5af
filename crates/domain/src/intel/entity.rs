use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// A single malicious-IP or malicious-IP:port observation from a feed.
///
/// Identity is `(ip, port)`: the same observation reported by two feeds
/// is one indicator. The source label is metadata carried along for
/// logging and alert tagging, not part of equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Indicator {
    /// The malicious IP address, as reported by the feed.
    pub ip: String,
    /// `None` means the indicator matches the IP on any port.
    pub port: Option<u16>,
    /// Name of the feed that produced this indicator.
    pub source: String,
}

impl Indicator {
    /// Build an IP-wide indicator (no port).
    pub fn ip_only(ip: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            port: None,
            source: source.into(),
        }
    }

    /// Build an IP:port-specific indicator.
    pub fn ip_port(ip: impl Into<String>, port: u16, source: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            port: Some(port),
            source: source.into(),
        }
    }

    pub fn validate(&self) -> Result<(), crate::common::error::DomainError> {
        if self.ip.is_empty() {
            return Err(crate::common::error::DomainError::Parse(
                "indicator ip must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl PartialEq for Indicator {
    fn eq(&self, other: &Self) -> bool {
        self.ip == other.ip && self.port == other.port
    }
}

impl Eq for Indicator {}

impl Hash for Indicator {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ip.hash(state);
        self.port.hash(state);
    }
}
