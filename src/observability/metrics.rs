//! Counters for the record lifecycle
//!
//! Counters only, monotonic, relaxed atomics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Lifecycle counters shared by a repository
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    validations: AtomicU64,
    rejections: AtomicU64,
    persisted: AtomicU64,
    destroyed: AtomicU64,
    cascade_failures: AtomicU64,
    unique_conflicts: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_validations(&self) {
        self.validations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rejections(&self) {
        self.rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_persisted(&self) {
        self.persisted.fetch_add(1, Ordering::Relaxed);
    }

    /// Adds the size of a committed cascade set
    pub fn add_destroyed(&self, count: u64) {
        self.destroyed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_cascade_failures(&self) {
        self.cascade_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Commits refused by the storage-side unique index
    pub fn increment_unique_conflicts(&self) {
        self.unique_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all counters as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            validations: self.validations.load(Ordering::Relaxed),
            rejections: self.rejections.load(Ordering::Relaxed),
            persisted: self.persisted.load(Ordering::Relaxed),
            destroyed: self.destroyed.load(Ordering::Relaxed),
            cascade_failures: self.cascade_failures.load(Ordering::Relaxed),
            unique_conflicts: self.unique_conflicts.load(Ordering::Relaxed),
        }
    }

    /// Snapshot rendered as a JSON object
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }
}

/// A point-in-time copy of every counter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub validations: u64,
    pub rejections: u64,
    pub persisted: u64,
    pub destroyed: u64,
    pub cascade_failures: u64,
    pub unique_conflicts: u64,
}
