//! ember - Engine Metrics & Observability
//! Provides atomic counters for tracking command activity in a
//! lock-free manner using `AtomicU64`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Atomic operation counters for the ember engine.
///
/// All counters use `Ordering::Relaxed` since we only need eventual
/// consistency for observability — not synchronization.
#[derive(Debug)]
pub struct EngineMetrics {
    /// Total SET operations (MSET counts one per pair).
    pub sets: AtomicU64,
    /// Total read operations (GET, MGET per key, EXISTS, TTL).
    pub gets: AtomicU64,
    /// Total DEL operations.
    pub dels: AtomicU64,
    /// Total EXPIRE operations.
    pub expires: AtomicU64,
    /// Total PERSIST operations.
    pub persists: AtomicU64,
    /// Total RANGE operations.
    pub ranges: AtomicU64,
    /// Total committed transactions.
    pub commits: AtomicU64,
    /// Total aborted transactions.
    pub aborts: AtomicU64,
    /// Timestamp when the engine was opened.
    started: Instant,
}

impl EngineMetrics {
    /// Create a new metrics instance with all counters at zero.
    pub fn new() -> Self {
        Self {
            sets: AtomicU64::new(0),
            gets: AtomicU64::new(0),
            dels: AtomicU64::new(0),
            expires: AtomicU64::new(0),
            persists: AtomicU64::new(0),
            ranges: AtomicU64::new(0),
            commits: AtomicU64::new(0),
            aborts: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    pub fn record_set(&self) {
        self.sets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_get(&self) {
        self.gets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_del(&self) {
        self.dels.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_expire(&self) {
        self.expires.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_persist(&self) {
        self.persists.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_range(&self) {
        self.ranges.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_commit(&self) {
        self.commits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_abort(&self) {
        self.aborts.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            sets: self.sets.load(Ordering::Relaxed),
            gets: self.gets.load(Ordering::Relaxed),
            dels: self.dels.load(Ordering::Relaxed),
            expires: self.expires.load(Ordering::Relaxed),
            persists: self.persists.load(Ordering::Relaxed),
            ranges: self.ranges.load(Ordering::Relaxed),
            commits: self.commits.load(Ordering::Relaxed),
            aborts: self.aborts.load(Ordering::Relaxed),
            uptime: self.started.elapsed(),
        }
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A consistent-enough snapshot of the engine counters.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub sets: u64,
    pub gets: u64,
    pub dels: u64,
    pub expires: u64,
    pub persists: u64,
    pub ranges: u64,
    pub commits: u64,
    pub aborts: u64,
    pub uptime: Duration,
}
