use std::collections::HashSet;

use crate::intel::entity::Indicator;

/// Immutable lookup index over all sources' indicators.
///
/// Built in one pass by [`IntelIndex::from_indicators`] and published
/// wholesale by the aggregator. It is never mutated in place, so any
/// shared reference always observes a complete pair of sets, either
/// wholly the previous index or wholly the new one.
#[derive(Debug, Default)]
pub struct IntelIndex {
    ip_set: HashSet<String>,
    ip_port_set: HashSet<(String, u16)>,
}

impl IntelIndex {
    /// Partition indicators by port presence into the two lookup sets.
    pub fn from_indicators<I>(indicators: I) -> Self
    where
        I: IntoIterator<Item = Indicator>,
    {
        let mut index = Self::default();
        for indicator in indicators {
            match indicator.port {
                Some(port) => {
                    index.ip_port_set.insert((indicator.ip, port));
                }
                None => {
                    index.ip_set.insert(indicator.ip);
                }
            }
        }
        index
    }

    /// Whether `ip` appears in any IP-wide indicator. O(1) expected.
    pub fn is_malicious_ip(&self, ip: &str) -> bool {
        self.ip_set.contains(ip)
    }

    /// Whether `(ip, port)` appears in any port-scoped indicator. O(1) expected.
    pub fn is_malicious_ip_port(&self, ip: &str, port: u16) -> bool {
        self.ip_port_set.contains(&(ip.to_string(), port))
    }

    pub fn ip_count(&self) -> usize {
        self.ip_set.len()
    }

    pub fn ip_port_count(&self) -> usize {
        self.ip_port_set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ip_set.is_empty() && self.ip_port_set.is_empty()
    }
}
