//! Run statistics tracking.
//!
//! Thread-safe counters for per-seed failures and extraction-strategy matches,
//! reported in the run summary.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;

use super::types::FetchError;
use super::SeedFailureKind;

/// Thread-safe statistics tracker for a single run.
///
/// All counter kinds are initialized to zero on creation. The orchestrator is
/// sequential today, but the counters are atomic so the design survives a move
/// to bounded concurrency across seeds.
pub struct RunStats {
    failures: HashMap<SeedFailureKind, AtomicUsize>,
    scripts_scanned: AtomicUsize,
    strategy_matches: AtomicUsize,
}

impl RunStats {
    pub fn new() -> Self {
        let mut failures = HashMap::new();
        for kind in SeedFailureKind::iter() {
            failures.insert(kind, AtomicUsize::new(0));
        }
        RunStats {
            failures,
            scripts_scanned: AtomicUsize::new(0),
            strategy_matches: AtomicUsize::new(0),
        }
    }

    /// Increment the failure counter for the given kind.
    pub fn increment_failure(&self, kind: SeedFailureKind) {
        if let Some(counter) = self.failures.get(&kind) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "Failure counter for {:?} missing from RunStats; initialization bug",
                kind
            );
        }
    }

    /// Record that `n` script candidates were scanned for a page.
    pub fn add_scripts_scanned(&self, n: usize) {
        self.scripts_scanned.fetch_add(n, Ordering::Relaxed);
    }

    /// Record one successful strategy match.
    pub fn increment_strategy_match(&self) {
        self.strategy_matches.fetch_add(1, Ordering::Relaxed);
    }

    /// Count for one failure kind.
    pub fn failure_count(&self, kind: SeedFailureKind) -> usize {
        self.failures
            .get(&kind)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Total failures across all kinds.
    pub fn total_failures(&self) -> usize {
        self.failures
            .values()
            .map(|c| c.load(Ordering::SeqCst))
            .sum()
    }

    /// Total script candidates scanned.
    pub fn scripts_scanned(&self) -> usize {
        self.scripts_scanned.load(Ordering::SeqCst)
    }

    /// Total successful strategy matches.
    pub fn strategy_matches(&self) -> usize {
        self.strategy_matches.load(Ordering::SeqCst)
    }
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps a fetch error to the failure kind it is counted under.
pub fn failure_kind_for(error: &FetchError) -> SeedFailureKind {
    match error {
        FetchError::Network(_) => SeedFailureKind::Network,
        FetchError::ProxyTunnel { .. } => SeedFailureKind::ProxyTunnel,
        FetchError::Decode(_) => SeedFailureKind::Decode,
        FetchError::MalformedResponse(_) => SeedFailureKind::MalformedResponse,
        FetchError::InvalidUrl(_) => SeedFailureKind::InvalidUrl,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let stats = RunStats::new();
        for kind in SeedFailureKind::iter() {
            assert_eq!(stats.failure_count(kind), 0);
        }
        assert_eq!(stats.total_failures(), 0);
        assert_eq!(stats.scripts_scanned(), 0);
    }

    #[test]
    fn test_increment_failure() {
        let stats = RunStats::new();
        stats.increment_failure(SeedFailureKind::Network);
        stats.increment_failure(SeedFailureKind::Network);
        stats.increment_failure(SeedFailureKind::Decode);
        assert_eq!(stats.failure_count(SeedFailureKind::Network), 2);
        assert_eq!(stats.failure_count(SeedFailureKind::Decode), 1);
        assert_eq!(stats.total_failures(), 3);
    }

    #[test]
    fn test_failure_kind_mapping() {
        assert_eq!(
            failure_kind_for(&FetchError::ProxyTunnel { status: 502 }),
            SeedFailureKind::ProxyTunnel
        );
        assert_eq!(
            failure_kind_for(&FetchError::Network("x".into())),
            SeedFailureKind::Network
        );
    }
}
