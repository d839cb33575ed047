//! # LFU (Least Frequently Used) Eviction Engine
//!
//! Evicts the entry with the lowest access frequency; among entries with the
//! same frequency, the least recently touched one goes first.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                            LfuCore<K, V>                             │
//!   │                                                                      │
//!   │   EntryTable (map, arena, expiry, stats)                             │
//!   │                                                                      │
//!   │   buckets: FxHashMap<u64, OrderList>      min_freq = 1               │
//!   │                                                                      │
//!   │     freq 1:  HEAD ─► [D] ◄──► [B] ◄── TAIL   ← next victim is B      │
//!   │     freq 3:  HEAD ─► [A] ◄── TAIL                                    │
//!   │     freq 7:  HEAD ─► [C] ◄── TAIL                                    │
//!   │                                                                      │
//!   │   Every bucket shares the table's arena; a node is linked into the   │
//!   │   bucket keyed by its own `frequency` and no other.                  │
//!   └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Frequency Lifecycle
//!
//! ```text
//!   set(new key)        frequency = 1, front of bucket 1, min_freq = 1
//!   get(key) hit        unlink from bucket f, front of bucket f+1
//!                       bucket f emptied and f == min_freq → min_freq = f+1
//!   set(present key)    value/deadline only, unless LfuWriteMode::BumpFrequency
//!   set(expired key)    old entry reclaimed, key re-enters at frequency 1
//!   remove / expire     unlink; emptied min bucket → min_freq recomputed
//! ```
//!
//! Empty buckets are dropped as soon as they empty, so `min_freq` always names
//! a live bucket while the cache is non-empty.
//!
//! ## Core Operations
//!
//! | Method           | Complexity | Notes                                     |
//! |------------------|------------|-------------------------------------------|
//! | `get`            | O(1)       | Moves the entry one bucket up             |
//! | `set`            | O(1)*      | *O(log n) when reclaiming an expired entry |
//! | `remove`         | O(1)*      | *O(buckets) if the min bucket empties     |
//! | `pop_lfu`        | O(1)*      | Tail of bucket `min_freq`                 |
//! | `peek_lfu`       | O(b log b) | Walks buckets in frequency order          |

use std::fmt;
use std::hash::Hash;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::builder::CacheConfig;
use crate::ds::{OrderList, SlotId};
use crate::error::ConfigError;
use crate::stats::StatsSnapshot;
use crate::table::{escalate, EntryArena, EntryTable};
use crate::traits::{CoreCache, FromConfig, LfuCacheTrait};

const POLICY: &str = "lfu";

/// How a write to a present key affects its frequency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LfuWriteMode {
    /// Only `get` counts as an access.
    #[default]
    KeepFrequency,
    /// `set` on a present key counts as an access too.
    BumpFrequency,
}

/// Single-threaded LFU engine with O(1) victim selection.
pub struct LfuCore<K, V> {
    table: EntryTable<K, V>,
    buckets: FxHashMap<u64, OrderList>,
    min_freq: u64,
    write_mode: LfuWriteMode,
}

impl<K, V> LfuCore<K, V>
where
    K: Eq + Hash + Clone,
{
    /// # Errors
    ///
    /// [`ConfigError`] if `capacity` is 0.
    pub fn try_new(capacity: usize) -> Result<Self, ConfigError> {
        Self::with_config(CacheConfig::new(capacity))
    }

    pub fn with_config(config: CacheConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        debug!(
            policy = POLICY,
            capacity = config.capacity,
            track_stats = config.track_stats,
            write_mode = ?config.lfu_write_mode,
            "cache engine created"
        );
        Ok(Self {
            table: EntryTable::new(POLICY, &config),
            buckets: FxHashMap::default(),
            min_freq: 0,
            write_mode: config.lfu_write_mode,
        })
    }

    pub fn write_mode(&self) -> LfuWriteMode {
        self.write_mode
    }

    /// Lowest frequency currently held, 0 when empty.
    pub fn min_frequency(&self) -> u64 {
        self.min_freq
    }

    fn link_at(&mut self, id: SlotId, freq: u64) {
        if let Some(entry) = self.table.entry_mut(id) {
            entry.frequency = freq;
        }
        let bucket = self.buckets.entry(freq).or_default();
        if let Err(err) = bucket.add_to_front(self.table.arena_mut(), id) {
            escalate(POLICY, err);
        }
    }

    /// Unlinks `id` from its bucket, dropping the bucket if it empties.
    /// Returns the frequency the entry had.
    fn detach(
        buckets: &mut FxHashMap<u64, OrderList>,
        arena: &mut EntryArena<K, V>,
        id: SlotId,
    ) -> Option<u64> {
        let freq = arena.get(id)?.frequency;
        if let Some(bucket) = buckets.get_mut(&freq) {
            bucket.unlink(arena, id);
            if bucket.is_empty() {
                buckets.remove(&freq);
            }
        }
        Some(freq)
    }

    fn bump(&mut self, id: SlotId) {
        let Some(freq) = Self::detach(&mut self.buckets, self.table.arena_mut(), id) else {
            return;
        };
        let next = freq.saturating_add(1);
        self.link_at(id, next);
        if freq == self.min_freq && !self.buckets.contains_key(&freq) {
            self.min_freq = next;
        }
    }

    fn refresh_min_freq(&mut self) {
        if !self.buckets.contains_key(&self.min_freq) {
            self.min_freq = self.buckets.keys().min().copied().unwrap_or(0);
        }
    }

    fn expire(&mut self, id: SlotId) -> bool {
        let buckets = &mut self.buckets;
        let expired = self.table.expire_with(id, |arena, id| {
            Self::detach(buckets, arena, id);
        });
        self.refresh_min_freq();
        expired
    }

    /// Unlinks the tail of the lowest-frequency bucket.
    fn pop_victim(&mut self) -> Option<SlotId> {
        self.refresh_min_freq();
        let freq = self.min_freq;
        let bucket = self.buckets.get_mut(&freq)?;
        let id = bucket.pop_tail(self.table.arena_mut());
        if bucket.is_empty() {
            self.buckets.remove(&freq);
            self.refresh_min_freq();
        }
        id
    }

    fn make_room(&mut self, now: Instant) {
        while self.table.is_full() {
            if let Some(id) = self.table.earliest_expired(now) {
                if self.expire(id) {
                    continue;
                }
            }
            let Some(id) = self.pop_victim() else {
                break;
            };
            if let Some(entry) = self.table.remove(id) {
                self.table.record_eviction();
                trace!(
                    policy = POLICY,
                    frequency = entry.frequency,
                    len = self.table.len(),
                    "evicted least frequently used entry"
                );
            }
        }
    }

    /// Panics on an empty bucket, a node filed under the wrong frequency,
    /// a stale `min_freq`, or any table inconsistency.
    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        let mut linked = 0usize;
        for (freq, bucket) in &self.buckets {
            assert!(!bucket.is_empty(), "empty bucket {freq} retained");
            bucket.debug_validate_invariants(self.table.arena());
            for id in bucket.iter_ids(self.table.arena()) {
                assert_eq!(
                    self.table.entry(id).map(|entry| entry.frequency),
                    Some(*freq),
                    "node filed under the wrong bucket"
                );
            }
            linked += bucket.len();
        }
        assert_eq!(linked, self.table.len());
        if let Some(min) = self.buckets.keys().min() {
            assert_eq!(self.min_freq, *min, "min_freq is stale");
        }
        self.table.debug_validate_invariants();
    }
}

impl<K, V> CoreCache<K, V> for LfuCore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn set(&mut self, key: K, value: V, ttl: Option<Duration>) -> Option<V> {
        let now = self.table.now();
        let expires_at = self.table.deadline_for(now, ttl);

        if let Some(id) = self.table.lookup(&key) {
            if !self.table.is_expired(id, now) {
                let previous = self.table.replace(id, value, expires_at);
                if self.write_mode == LfuWriteMode::BumpFrequency {
                    self.bump(id);
                }
                return previous;
            }
            // The dead entry's frequency does not carry over.
            self.expire(id);
        }

        self.make_room(now);
        let id = self.table.insert(key, value, expires_at);
        self.link_at(id, 1);
        self.min_freq = 1;
        None
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        let Some(id) = self.table.lookup(key) else {
            self.table.record_miss();
            return None;
        };
        if self.table.is_expired(id, self.table.now()) {
            self.expire(id);
            self.table.record_miss();
            return None;
        }

        self.bump(id);
        self.table.record_hit();
        self.table.entry(id).map(|entry| &entry.value)
    }

    fn peek(&self, key: &K) -> Option<&V> {
        self.table.peek(key)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let buckets = &mut self.buckets;
        let value = self.table.remove_with(key, |arena, id| {
            Self::detach(buckets, arena, id);
        });
        self.refresh_min_freq();
        value
    }

    fn len(&self) -> usize {
        self.table.len()
    }

    fn capacity(&self) -> usize {
        self.table.capacity()
    }

    fn clear(&mut self) {
        self.table.clear();
        self.buckets.clear();
        self.min_freq = 0;
    }

    fn purge_expired(&mut self) -> usize {
        let buckets = &mut self.buckets;
        let purged = self.table.purge_expired_with(|arena, id| {
            Self::detach(buckets, arena, id);
        });
        self.refresh_min_freq();
        purged
    }

    fn stats(&self) -> StatsSnapshot {
        self.table.stats()
    }
}

impl<K, V> LfuCacheTrait<K, V> for LfuCore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn pop_lfu(&mut self) -> Option<(K, V)> {
        let now = self.table.now();
        loop {
            let id = self.pop_victim()?;
            let entry = self.table.remove(id)?;
            if entry.is_expired(now) {
                self.table.record_expiration();
                continue;
            }
            return Some((entry.key, entry.value));
        }
    }

    fn peek_lfu(&self) -> Option<(&K, &V)> {
        let now = self.table.now();
        let mut freqs: Vec<u64> = self.buckets.keys().copied().collect();
        freqs.sort_unstable();
        freqs
            .into_iter()
            .filter_map(|freq| self.buckets.get(&freq))
            .flat_map(|bucket| bucket.iter_ids_rev(self.table.arena()))
            .filter_map(|id| self.table.entry(id))
            .find(|entry| !entry.is_expired(now))
            .map(|entry| (&entry.key, &entry.value))
    }

    fn frequency(&self, key: &K) -> Option<u64> {
        self.table
            .live_entry(key, self.table.now())
            .map(|entry| entry.frequency)
    }
}

impl<K, V> FromConfig for LfuCore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn from_config(config: CacheConfig) -> Result<Self, ConfigError> {
        Self::with_config(config)
    }
}

impl<K, V> fmt::Debug for LfuCore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LfuCore")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("buckets", &self.buckets.len())
            .field("min_freq", &self.min_freq)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::ManualClock;
    use std::sync::Arc;

    fn manual_with_mode(
        capacity: usize,
        mode: LfuWriteMode,
    ) -> (LfuCore<&'static str, i32>, ManualClock) {
        let clock = ManualClock::new();
        let mut config = CacheConfig::new(capacity);
        config.track_stats = true;
        config.lfu_write_mode = mode;
        config.clock = Arc::new(clock.clone());
        (LfuCore::with_config(config).unwrap(), clock)
    }

    fn manual(capacity: usize) -> (LfuCore<&'static str, i32>, ManualClock) {
        manual_with_mode(capacity, LfuWriteMode::default())
    }

    mod frequency_ordering {
        use super::*;

        #[test]
        fn new_entries_start_at_one() {
            let (mut cache, _) = manual(4);
            cache.insert("a", 1);
            assert_eq!(cache.frequency(&"a"), Some(1));
            assert_eq!(cache.min_frequency(), 1);
            assert_eq!(cache.frequency(&"zzz"), None);
            cache.debug_validate_invariants();
        }

        #[test]
        fn get_increments_frequency() {
            let (mut cache, _) = manual(4);
            cache.insert("a", 1);
            cache.get(&"a");
            cache.get(&"a");
            assert_eq!(cache.frequency(&"a"), Some(3));
            assert_eq!(cache.min_frequency(), 3);
            cache.debug_validate_invariants();
        }

        #[test]
        fn least_frequent_entry_is_evicted() {
            let (mut cache, _) = manual(2);
            cache.insert("a", 1);
            cache.insert("b", 2);
            cache.get(&"a");
            cache.insert("c", 3);

            assert!(cache.contains(&"a"));
            assert!(!cache.contains(&"b"));
            assert!(cache.contains(&"c"));
            assert_eq!(cache.stats().evictions, 1);
            cache.debug_validate_invariants();
        }

        #[test]
        fn ties_break_least_recently_used() {
            let (mut cache, _) = manual(3);
            cache.insert("a", 1);
            cache.insert("b", 2);
            cache.insert("c", 3);
            cache.insert("d", 4);
            assert!(!cache.contains(&"a"));

            cache.get(&"b");
            cache.get(&"c");
            cache.get(&"d");
            assert_eq!(cache.peek_lfu(), Some((&"b", &2)));
            cache.insert("e", 5);
            assert!(!cache.contains(&"b"));
            assert!(cache.contains(&"c"));
            assert!(cache.contains(&"d"));
            assert_eq!(cache.frequency(&"e"), Some(1));
            cache.debug_validate_invariants();
        }

        #[test]
        fn recency_orders_entries_within_a_bucket() {
            let (mut cache, _) = manual(2);
            cache.insert("a", 1);
            cache.insert("b", 2);
            cache.get(&"a");
            cache.get(&"b");
            assert_eq!(cache.peek_lfu(), Some((&"a", &1)));
            assert_eq!(cache.pop_lfu(), Some(("a", 1)));
            assert_eq!(cache.pop_lfu(), Some(("b", 2)));
            assert_eq!(cache.pop_lfu(), None);
            assert_eq!(cache.min_frequency(), 0);
            cache.debug_validate_invariants();
        }

        #[test]
        fn new_entry_is_not_its_own_victim() {
            let (mut cache, _) = manual(1);
            cache.insert("a", 1);
            cache.insert("b", 2);
            assert_eq!(cache.peek(&"b"), Some(&2));
            assert_eq!(cache.len(), 1);
            cache.debug_validate_invariants();
        }
    }

    mod write_mode {
        use super::*;

        #[test]
        fn writes_keep_frequency_by_default() {
            let (mut cache, _) = manual(2);
            assert_eq!(cache.write_mode(), LfuWriteMode::KeepFrequency);
            cache.insert("a", 1);
            cache.insert("b", 2);
            assert_eq!(cache.insert("a", 10), Some(1));
            assert_eq!(cache.frequency(&"a"), Some(1));

            cache.insert("c", 3);
            assert!(!cache.contains(&"a"));
            assert!(cache.contains(&"b"));
            cache.debug_validate_invariants();
        }

        #[test]
        fn bump_mode_counts_writes_as_accesses() {
            let (mut cache, _) = manual_with_mode(2, LfuWriteMode::BumpFrequency);
            cache.insert("a", 1);
            cache.insert("b", 2);
            cache.insert("a", 10);
            assert_eq!(cache.frequency(&"a"), Some(2));

            cache.insert("c", 3);
            assert_eq!(cache.peek(&"a"), Some(&10));
            assert!(!cache.contains(&"b"));
            assert_eq!(cache.stats().hits, 0);
            cache.debug_validate_invariants();
        }
    }

    mod min_freq {
        use super::*;

        #[test]
        fn removing_min_bucket_recomputes_minimum() {
            let (mut cache, _) = manual(4);
            cache.insert("a", 1);
            cache.get(&"a");
            cache.get(&"a");
            cache.insert("b", 2);
            assert_eq!(cache.min_frequency(), 1);

            assert_eq!(cache.remove(&"b"), Some(2));
            assert_eq!(cache.min_frequency(), 3);
            cache.debug_validate_invariants();

            cache.insert("c", 3);
            assert_eq!(cache.min_frequency(), 1);
            assert_eq!(cache.pop_lfu(), Some(("c", 3)));
            assert_eq!(cache.pop_lfu(), Some(("a", 1)));
            cache.debug_validate_invariants();
        }

        #[test]
        fn min_bucket_emptied_by_get_advances() {
            let (mut cache, _) = manual(4);
            cache.insert("a", 1);
            cache.insert("b", 2);
            cache.get(&"a");
            assert_eq!(cache.min_frequency(), 1);
            cache.get(&"b");
            assert_eq!(cache.min_frequency(), 2);
            cache.debug_validate_invariants();
        }

        #[test]
        fn clear_resets_buckets() {
            let (mut cache, _) = manual(4);
            cache.insert("a", 1);
            cache.get(&"a");
            cache.clear();
            assert!(cache.is_empty());
            assert_eq!(cache.min_frequency(), 0);
            assert_eq!(cache.peek_lfu(), None);
            cache.debug_validate_invariants();

            cache.insert("b", 2);
            assert_eq!(cache.frequency(&"b"), Some(1));
        }
    }

    mod expiry {
        use super::*;

        #[test]
        fn expired_get_is_miss_and_drops_bucket() {
            let (mut cache, clock) = manual(4);
            cache.set("a", 1, Some(Duration::from_millis(10)));
            cache.get(&"a");
            clock.advance(Duration::from_millis(10));

            assert_eq!(cache.get(&"a"), None);
            assert!(cache.is_empty());
            assert_eq!(cache.min_frequency(), 0);
            let stats = cache.stats();
            assert_eq!((stats.hits, stats.misses, stats.expirations), (1, 1, 1));
            cache.debug_validate_invariants();
        }

        #[test]
        fn expired_hot_entry_is_reclaimed_before_cold_live_one() {
            let (mut cache, clock) = manual(2);
            cache.set("hot", 1, Some(Duration::from_millis(5)));
            for _ in 0..5 {
                cache.get(&"hot");
            }
            cache.set("cold", 2, None);
            clock.advance(Duration::from_millis(5));
            cache.set("new", 3, None);

            assert!(cache.contains(&"cold"));
            assert!(cache.contains(&"new"));
            assert!(!cache.contains(&"hot"));
            assert_eq!(cache.stats().evictions, 0);
            cache.debug_validate_invariants();
        }

        #[test]
        fn peek_lfu_and_pop_lfu_skip_expired() {
            let (mut cache, clock) = manual(4);
            cache.set("a", 1, Some(Duration::from_millis(1)));
            cache.set("b", 2, None);
            cache.get(&"b");
            clock.advance(Duration::from_millis(1));

            assert_eq!(cache.frequency(&"a"), None);
            assert_eq!(cache.peek_lfu(), Some((&"b", &2)));
            assert_eq!(cache.pop_lfu(), Some(("b", 2)));
            assert!(cache.is_empty());
            assert_eq!(cache.stats().expirations, 1);
            cache.debug_validate_invariants();
        }

        #[test]
        fn purge_expired_keeps_min_freq_consistent() {
            let (mut cache, clock) = manual(4);
            cache.set("a", 1, Some(Duration::from_millis(1)));
            cache.set("b", 2, None);
            cache.get(&"b");
            clock.advance(Duration::from_millis(1));

            assert_eq!(cache.purge_expired(), 1);
            assert_eq!(cache.min_frequency(), 2);
            cache.debug_validate_invariants();
        }

        #[test]
        fn set_on_expired_key_restarts_at_frequency_one() {
            let (mut cache, clock) = manual(2);
            cache.set("a", 1, Some(Duration::from_millis(10)));
            for _ in 0..5 {
                cache.get(&"a");
            }
            clock.advance(Duration::from_millis(20));

            assert_eq!(cache.set("a", 100, None), None);
            assert_eq!(cache.frequency(&"a"), Some(1));
            assert_eq!(cache.min_frequency(), 1);
            assert_eq!(cache.stats().expirations, 1);

            cache.set("b", 2, None);
            cache.get(&"b");
            cache.set("c", 3, None);

            assert_eq!(cache.peek(&"a"), None);
            assert_eq!(cache.peek(&"b"), Some(&2));
            assert_eq!(cache.peek(&"c"), Some(&3));
            cache.debug_validate_invariants();
        }
    }
}
