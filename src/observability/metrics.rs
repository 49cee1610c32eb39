//! Load counters
//!
//! - Counters only, monotonic
//! - Reset only when a new registry of counters is created
//! - Thread-safe, lock-free

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters for schema loading.
///
/// Relaxed ordering is enough: counters are never used to synchronize.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    loads_started: AtomicU64,
    loads_committed: AtomicU64,
    loads_checked: AtomicU64,
    loads_failed: AtomicU64,
    types_installed: AtomicU64,
    commit_conflicts: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_loads_started(&self) {
        self.loads_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_loads_committed(&self) {
        self.loads_committed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_loads_checked(&self) {
        self.loads_checked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_loads_failed(&self) {
        self.loads_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_types_installed(&self, count: u64) {
        self.types_installed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_commit_conflicts(&self) {
        self.commit_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            loads_started: self.loads_started.load(Ordering::Relaxed),
            loads_committed: self.loads_committed.load(Ordering::Relaxed),
            loads_checked: self.loads_checked.load(Ordering::Relaxed),
            loads_failed: self.loads_failed.load(Ordering::Relaxed),
            types_installed: self.types_installed.load(Ordering::Relaxed),
            commit_conflicts: self.commit_conflicts.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub loads_started: u64,
    pub loads_committed: u64,
    pub loads_checked: u64,
    pub loads_failed: u64,
    pub types_installed: u64,
    pub commit_conflicts: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_has_zero_values() {
        let snapshot = MetricsRegistry::new().snapshot();
        assert_eq!(snapshot.loads_started, 0);
        assert_eq!(snapshot.loads_committed, 0);
        assert_eq!(snapshot.types_installed, 0);
    }

    #[test]
    fn test_increment_counters() {
        let metrics = MetricsRegistry::new();

        metrics.increment_loads_started();
        metrics.increment_loads_started();
        metrics.increment_loads_committed();
        metrics.increment_loads_failed();
        metrics.add_types_installed(4);
        metrics.increment_commit_conflicts();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.loads_started, 2);
        assert_eq!(snapshot.loads_committed, 1);
        assert_eq!(snapshot.loads_failed, 1);
        assert_eq!(snapshot.types_installed, 4);
        assert_eq!(snapshot.commit_conflicts, 1);
    }

    #[test]
    fn test_snapshot_serializes() {
        let metrics = MetricsRegistry::new();
        metrics.add_types_installed(3);

        let json = serde_json::to_value(metrics.snapshot()).unwrap();
        assert_eq!(json["types_installed"], 3);
    }

    #[test]
    fn test_thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let metrics = Arc::new(MetricsRegistry::new());
        let mut handles = vec![];

        for _ in 0..8 {
            let m = Arc::clone(&metrics);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    m.increment_loads_started();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(metrics.snapshot().loads_started, 800);
    }
}
