//! Hit/miss/eviction counters.
//!
//! [`StatsCounter`] is a passive, increment-only recorder the engines report
//! events to. It carries no synchronization of its own: it lives inside the
//! engine and is guarded by the same lock as the lookup map and ordering
//! structures, so a [`StatsSnapshot`] taken under that lock is a consistent
//! point-in-time view.
//!
//! | Counter       | Incremented when                                            |
//! |---------------|-------------------------------------------------------------|
//! | `hits`        | `get` finds a live entry                                    |
//! | `misses`      | `get` finds nothing, or finds an entry that has expired     |
//! | `evictions`   | a live entry is removed because the cache is over capacity  |
//! | `expirations` | an expired entry is reclaimed (on `get` or `set` of its key, on `set` overflow, or by `purge_expired`) |
//!
//! `peek`, `contains` and `delete` never touch the counters.

use std::fmt;

/// Immutable point-in-time copy of the counters.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
}

impl StatsSnapshot {
    /// Number of `get` calls observed.
    #[inline]
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    /// `hits / (hits + misses)`, or `0.0` before the first lookup.
    pub fn hit_ratio(&self) -> f64 {
        let lookups = self.lookups();
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

impl fmt::Debug for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatsSnapshot")
            .field("hits", &self.hits)
            .field("misses", &self.misses)
            .field("hit_ratio", &format!("{:.2}%", self.hit_ratio() * 100.0))
            .field("evictions", &self.evictions)
            .field("expirations", &self.expirations)
            .finish()
    }
}

/// Increment-only event counters.
#[derive(Debug, Default)]
pub struct StatsCounter {
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
}

impl StatsCounter {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    #[inline]
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    #[inline]
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    #[inline]
    pub fn record_expiration(&mut self) {
        self.expirations += 1;
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            expirations: self.expirations,
        }
    }
}
