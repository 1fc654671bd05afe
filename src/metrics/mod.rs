//! Operation Metrics Module
//!
//! Standardized operation counters for the map implementations. Counters are
//! plain relaxed atomics, so recording them costs one uncontended RMW per
//! operation and never takes part in the maps' locking protocol.
//!
//! On a sharded map the counters live inside each shard and are summed on
//! demand, so no shared cache line exists for writers on different shards to
//! fight over.

use core::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time operation counters for a map
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MapMetrics {
    /// Total number of point lookups (`at`, `get`, `contains_key`)
    pub lookups: u64,
    /// Lookups that did not find their key
    pub lookup_misses: u64,
    /// Insertions that added a new entry
    pub insertions: u64,
    /// Insertions rejected because the key was already present
    pub rejected_insertions: u64,
    /// Removals and extractions that detached an entry
    pub removals: u64,
    /// Removals and extractions that found nothing to detach
    pub removal_misses: u64,
}

impl MapMetrics {
    /// Fraction of lookups that found their key, as a percentage
    pub fn lookup_hit_rate(&self) -> f64 {
        if self.lookups == 0 {
            0.0
        } else {
            ((self.lookups - self.lookup_misses) as f64 / self.lookups as f64) * 100.0
        }
    }

    /// Fraction of insert attempts that added an entry, as a percentage
    pub fn insert_acceptance_rate(&self) -> f64 {
        let attempts = self.insertions + self.rejected_insertions;
        if attempts == 0 {
            0.0
        } else {
            (self.insertions as f64 / attempts as f64) * 100.0
        }
    }

    /// Fold another snapshot into this one, field by field
    ///
    /// Used to aggregate per-shard snapshots into a whole-map view.
    pub fn absorb(&mut self, other: &MapMetrics) {
        self.lookups += other.lookups;
        self.lookup_misses += other.lookup_misses;
        self.insertions += other.insertions;
        self.rejected_insertions += other.rejected_insertions;
        self.removals += other.removals;
        self.removal_misses += other.removal_misses;
    }
}

/// Internal atomic metrics collection
#[derive(Debug, Default)]
pub struct AtomicMapMetrics {
    lookups: AtomicU64,
    lookup_misses: AtomicU64,
    insertions: AtomicU64,
    rejected_insertions: AtomicU64,
    removals: AtomicU64,
    removal_misses: AtomicU64,
}

impl AtomicMapMetrics {
    /// Record a point lookup and whether it found its key
    pub fn record_lookup(&self, hit: bool) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        if !hit {
            self.lookup_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record an insert attempt and whether it added an entry
    pub fn record_insert(&self, inserted: bool) {
        if inserted {
            self.insertions.fetch_add(1, Ordering::Relaxed);
        } else {
            self.rejected_insertions.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a removal or extraction and whether it detached an entry
    pub fn record_removal(&self, removed: bool) {
        if removed {
            self.removals.fetch_add(1, Ordering::Relaxed);
        } else {
            self.removal_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MapMetrics {
        MapMetrics {
            lookups: self.lookups.load(Ordering::Relaxed),
            lookup_misses: self.lookup_misses.load(Ordering::Relaxed),
            insertions: self.insertions.load(Ordering::Relaxed),
            rejected_insertions: self.rejected_insertions.load(Ordering::Relaxed),
            removals: self.removals.load(Ordering::Relaxed),
            removal_misses: self.removal_misses.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero
    pub fn reset(&self) {
        self.lookups.store(0, Ordering::Relaxed);
        self.lookup_misses.store(0, Ordering::Relaxed);
        self.insertions.store(0, Ordering::Relaxed);
        self.rejected_insertions.store(0, Ordering::Relaxed);
        self.removals.store(0, Ordering::Relaxed);
        self.removal_misses.store(0, Ordering::Relaxed);
    }
}

/// Trait for maps that expose operation metrics
pub trait MetricsCollector {
    /// Get current operation metrics
    fn metrics(&self) -> MapMetrics;

    /// Reset all metrics
    fn reset_metrics(&self);
}
