//! Engine operation counters
//!
//! Collected only when `enable_metrics` is set in the engine options.
//! Counters are monotonically increasing for the engine's lifetime.

use std::sync::atomic::{AtomicU64, Ordering};

/// Accumulated operation counts
#[derive(Debug, Default)]
pub struct EngineMetrics {
    appends: AtomicU64,
    reads: AtomicU64,
    queries: AtomicU64,
    verifications: AtomicU64,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub appends: u64,
    pub reads: u64,
    pub queries: u64,
    pub verifications: u64,
}

impl EngineMetrics {
    pub(crate) fn record_append(&self) {
        self.appends.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_read(&self) {
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_query(&self) {
        self.queries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_verification(&self) {
        self.verifications.fetch_add(1, Ordering::Relaxed);
    }

    /// Current counter values
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            appends: self.appends.load(Ordering::Relaxed),
            reads: self.reads.load(Ordering::Relaxed),
            queries: self.queries.load(Ordering::Relaxed),
            verifications: self.verifications.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = EngineMetrics::default();

        metrics.record_append();
        metrics.record_append();
        metrics.record_read();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.appends, 2);
        assert_eq!(snapshot.reads, 1);
        assert_eq!(snapshot.queries, 0);
    }
}
