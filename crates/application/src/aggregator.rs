use std::sync::{Arc, PoisonError, RwLock};

use domain::intel::index::IntelIndex;

use crate::source::ThreatSource;

/// Merged, queryable lookup index over all sources.
///
/// `rebuild()` re-reads every source's current snapshot, builds a fresh
/// [`IntelIndex`] off to the side and publishes it with a single `Arc`
/// swap. Lookups load the currently published index and never block on
/// a rebuild in flight. A rebuild overlapping a source refresh may
/// combine old-A/new-B snapshots; each source's own snapshot is atomic,
/// so this is an accepted relaxation rather than an inconsistency.
pub struct IntelAggregator {
    sources: Vec<Arc<dyn ThreatSource>>,
    index: RwLock<Arc<IntelIndex>>,
}

impl IntelAggregator {
    /// Create an aggregator over a fixed set of sources. The index
    /// starts empty; call [`IntelAggregator::rebuild`] to populate it.
    pub fn new(sources: Vec<Arc<dyn ThreatSource>>) -> Self {
        Self {
            sources,
            index: RwLock::new(Arc::new(IntelIndex::default())),
        }
    }

    /// Re-read all sources and publish a fresh index.
    ///
    /// Pure and repeatable: rebuilding is a re-read of source
    /// snapshots, never a mutation of the sources themselves.
    pub fn rebuild(&self) {
        let next = IntelIndex::from_indicators(
            self.sources.iter().flat_map(|source| source.indicators()),
        );
        let mut guard = self.index.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(next);
    }

    /// Whether `ip` is in the current IP set.
    pub fn is_malicious_ip(&self, ip: &str) -> bool {
        self.current().is_malicious_ip(ip)
    }

    /// Whether `(ip, port)` is in the current IP:port set.
    pub fn is_malicious_ip_port(&self, ip: &str, port: u16) -> bool {
        self.current().is_malicious_ip_port(ip, port)
    }

    /// The currently published index.
    ///
    /// Callers performing several related lookups should take one
    /// `current()` handle and query it, giving a point-in-time
    /// consistent view across those lookups.
    pub fn current(&self) -> Arc<IntelIndex> {
        Arc::clone(&*self.index.read().unwrap_or_else(PoisonError::into_inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::intel::entity::Indicator;
    use std::collections::HashSet;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    use domain::common::error::DomainError;

    /// In-memory source with a directly settable snapshot.
    struct FixedSource {
        name: String,
        snapshot: Mutex<HashSet<Indicator>>,
    }

    impl FixedSource {
        fn new(name: &str, indicators: Vec<Indicator>) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                snapshot: Mutex::new(indicators.into_iter().collect()),
            })
        }

        fn set(&self, indicators: Vec<Indicator>) {
            *self.snapshot.lock().unwrap() = indicators.into_iter().collect();
        }
    }

    impl ThreatSource for FixedSource {
        fn refresh<'a>(
            &'a self,
        ) -> Pin<Box<dyn Future<Output = Result<(), DomainError>> + Send + 'a>> {
            Box::pin(async { Ok(()) })
        }

        fn indicators(&self) -> Vec<Indicator> {
            self.snapshot.lock().unwrap().iter().cloned().collect()
        }

        fn name(&self) -> &str {
            &self.name
        }
    }

    #[test]
    fn merges_ip_and_ip_port_sources() {
        let tor = FixedSource::new("tor", vec![Indicator::ip_only("1.1.1.1", "tor")]);
        let tfox = FixedSource::new("tfox", vec![Indicator::ip_port("9.9.9.9", 8080, "tfox")]);
        let aggregator = IntelAggregator::new(vec![tor, tfox]);
        aggregator.rebuild();

        assert!(aggregator.is_malicious_ip("1.1.1.1"));
        assert!(!aggregator.is_malicious_ip("2.2.2.2"));
        assert!(aggregator.is_malicious_ip_port("9.9.9.9", 8080));
        assert!(!aggregator.is_malicious_ip_port("9.9.9.9", 22));
    }

    #[test]
    fn rebuild_is_idempotent() {
        let source = FixedSource::new(
            "tor",
            vec![
                Indicator::ip_only("1.1.1.1", "tor"),
                Indicator::ip_port("9.9.9.9", 80, "tor"),
            ],
        );
        let aggregator = IntelAggregator::new(vec![source]);

        aggregator.rebuild();
        let first = aggregator.current();
        aggregator.rebuild();
        let second = aggregator.current();

        assert_eq!(first.ip_count(), second.ip_count());
        assert_eq!(first.ip_port_count(), second.ip_port_count());
        assert!(second.is_malicious_ip("1.1.1.1"));
        assert!(second.is_malicious_ip_port("9.9.9.9", 80));
    }

    #[test]
    fn rebuild_picks_up_changed_snapshots() {
        let source = FixedSource::new("tor", vec![Indicator::ip_only("1.1.1.1", "tor")]);
        let aggregator = IntelAggregator::new(vec![Arc::clone(&source) as _]);
        aggregator.rebuild();
        assert!(aggregator.is_malicious_ip("1.1.1.1"));

        source.set(vec![Indicator::ip_only("2.2.2.2", "tor")]);
        // Not visible until the next rebuild.
        assert!(aggregator.is_malicious_ip("1.1.1.1"));
        aggregator.rebuild();
        assert!(!aggregator.is_malicious_ip("1.1.1.1"));
        assert!(aggregator.is_malicious_ip("2.2.2.2"));
    }

    #[test]
    fn empty_source_list_serves_empty_index() {
        let aggregator = IntelAggregator::new(Vec::new());
        aggregator.rebuild();
        assert!(aggregator.current().is_empty());
    }

    /// Concurrent lookups during rebuilds must always see a wholly-old
    /// or wholly-new pair of sets, never a mixture. The source flips
    /// between "IP present" and "pair present"; every published index
    /// therefore satisfies exactly one of the two memberships.
    #[test]
    fn lookups_never_observe_half_updated_index() {
        let source = FixedSource::new("flip", vec![Indicator::ip_only("1.1.1.1", "flip")]);
        let aggregator = Arc::new(IntelAggregator::new(vec![Arc::clone(&source) as _]));
        aggregator.rebuild();

        let writer = {
            let source = Arc::clone(&source);
            let aggregator = Arc::clone(&aggregator);
            std::thread::spawn(move || {
                for round in 0..500 {
                    if round % 2 == 0 {
                        source.set(vec![Indicator::ip_port("1.1.1.1", 80, "flip")]);
                    } else {
                        source.set(vec![Indicator::ip_only("1.1.1.1", "flip")]);
                    }
                    aggregator.rebuild();
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let aggregator = Arc::clone(&aggregator);
                std::thread::spawn(move || {
                    for _ in 0..2000 {
                        let index = aggregator.current();
                        let ip_hit = index.is_malicious_ip("1.1.1.1");
                        let pair_hit = index.is_malicious_ip_port("1.1.1.1", 80);
                        assert!(
                            ip_hit != pair_hit,
                            "observed a mixed index: ip={ip_hit} pair={pair_hit}"
                        );
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
