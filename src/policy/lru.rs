//! Least Recently Used (LRU) eviction engine.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────┐
//!   │                          LruCore<K, V>                           │
//!   │                                                                  │
//!   │   EntryTable                          OrderList (recency)        │
//!   │   ┌───────────────────────────┐                                  │
//!   │   │ map: K -> SlotId          │       HEAD                       │
//!   │   │ arena: SlotArena<Entry>   │        │                         │
//!   │   │ expiry: ExpiryHeap        │        ▼                         │
//!   │   │ stats: Option<Counter>    │       [C] ◄──► [A] ◄──► [B]       │
//!   │   └───────────────────────────┘                        ▲         │
//!   │                                                        │         │
//!   │                                                       TAIL       │
//!   │                                                (next victim)     │
//!   └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Operations
//!
//! | Operation        | Effect on order                 | Stats                  |
//! |------------------|---------------------------------|------------------------|
//! | `get` (live)     | Move to front                   | hit                    |
//! | `get` (expired)  | Entry reclaimed                 | miss + expiration      |
//! | `get` (absent)   | -                               | miss                   |
//! | `set` (present)  | Value and deadline replaced, move to front | -           |
//! | `set` (expired)  | Entry reclaimed, re-inserted at front | expiration       |
//! | `set` (absent)   | Make room, insert at front      | eviction / expiration  |
//! | `peek`/`contains`| -                               | -                      |
//! | `touch`          | Move to front                   | -                      |
//! | `pop_lru`        | Remove tail                     | -                      |
//!
//! Making room prefers an entry whose deadline has already passed over the
//! least recently used live entry. Only the latter counts as an eviction.
//!
//! ## Example
//!
//! ```
//! use localcache::policy::lru::LruCore;
//! use localcache::traits::{CoreCache, LruCacheTrait};
//!
//! let mut cache = LruCore::try_new(2).unwrap();
//! cache.insert("a", 1);
//! cache.insert("b", 2);
//! cache.get(&"a");
//! cache.insert("c", 3);
//!
//! assert!(!cache.contains(&"b"));
//! assert_eq!(cache.peek_lru(), Some((&"a", &1)));
//! ```

use std::fmt;
use std::hash::Hash;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::builder::CacheConfig;
use crate::ds::{OrderList, SlotId};
use crate::error::ConfigError;
use crate::stats::StatsSnapshot;
use crate::table::{escalate, EntryTable};
use crate::traits::{CoreCache, FromConfig, LruCacheTrait};

const POLICY: &str = "lru";

/// Single-threaded LRU engine.
///
/// Front of the list is the most recently used entry, back is the least.
pub struct LruCore<K, V> {
    table: EntryTable<K, V>,
    list: OrderList,
}

impl<K, V> LruCore<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates an engine with stats off and no default TTL.
    ///
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
            "cache engine created"
        );
        Ok(Self {
            table: EntryTable::new(POLICY, &config),
            list: OrderList::new(),
        })
    }

    /// Live keys from most to least recently used.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        let now = self.table.now();
        self.list
            .iter_ids(self.table.arena())
            .filter_map(move |id| self.table.entry(id))
            .filter(move |entry| !entry.is_expired(now))
            .map(|entry| &entry.key)
    }

    fn promote(&mut self, id: SlotId) {
        if let Err(err) = self.list.move_to_front(self.table.arena_mut(), id) {
            escalate(POLICY, err);
        }
    }

    fn link_new(&mut self, id: SlotId) {
        if let Err(err) = self.list.add_to_front(self.table.arena_mut(), id) {
            escalate(POLICY, err);
        }
    }

    fn expire(&mut self, id: SlotId) -> bool {
        let list = &mut self.list;
        self.table.expire_with(id, |arena, id| {
            list.unlink(arena, id);
        })
    }

    /// Frees one slot if the table is full: an expired entry if any,
    /// otherwise the tail.
    fn make_room(&mut self, now: Instant) {
        while self.table.is_full() {
            if let Some(id) = self.table.earliest_expired(now) {
                if self.expire(id) {
                    continue;
                }
            }
            let Some(id) = self.list.pop_tail(self.table.arena_mut()) else {
                break;
            };
            if self.table.remove(id).is_some() {
                self.table.record_eviction();
                trace!(
                    policy = POLICY,
                    len = self.table.len(),
                    "evicted least recently used entry"
                );
            }
        }
    }

    /// Panics if the list, map, arena and expiry index disagree.
    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        self.list.debug_validate_invariants(self.table.arena());
        assert_eq!(self.list.len(), self.table.len());
        self.table.debug_validate_invariants();
    }
}

impl<K, V> CoreCache<K, V> for LruCore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn set(&mut self, key: K, value: V, ttl: Option<Duration>) -> Option<V> {
        let now = self.table.now();
        let expires_at = self.table.deadline_for(now, ttl);

        if let Some(id) = self.table.lookup(&key) {
            if !self.table.is_expired(id, now) {
                let previous = self.table.replace(id, value, expires_at);
                self.promote(id);
                return previous;
            }
            self.expire(id);
        }

        self.make_room(now);
        let id = self.table.insert(key, value, expires_at);
        self.link_new(id);
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

        self.promote(id);
        self.table.record_hit();
        self.table.entry(id).map(|entry| &entry.value)
    }

    fn peek(&self, key: &K) -> Option<&V> {
        self.table.peek(key)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let list = &mut self.list;
        self.table.remove_with(key, |arena, id| {
            list.unlink(arena, id);
        })
    }

    #[inline]
    fn len(&self) -> usize {
        self.table.len()
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.table.capacity()
    }

    fn clear(&mut self) {
        self.table.clear();
        self.list.reset();
    }

    fn purge_expired(&mut self) -> usize {
        let list = &mut self.list;
        self.table.purge_expired_with(|arena, id| {
            list.unlink(arena, id);
        })
    }

    fn stats(&self) -> StatsSnapshot {
        self.table.stats()
    }
}

impl<K, V> LruCacheTrait<K, V> for LruCore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn pop_lru(&mut self) -> Option<(K, V)> {
        let now = self.table.now();
        loop {
            let id = self.list.pop_tail(self.table.arena_mut())?;
            let entry = self.table.remove(id)?;
            if entry.is_expired(now) {
                self.table.record_expiration();
                continue;
            }
            return Some((entry.key, entry.value));
        }
    }

    fn peek_lru(&self) -> Option<(&K, &V)> {
        let now = self.table.now();
        self.list
            .iter_ids_rev(self.table.arena())
            .filter_map(|id| self.table.entry(id))
            .find(|entry| !entry.is_expired(now))
            .map(|entry| (&entry.key, &entry.value))
    }

    fn touch(&mut self, key: &K) -> bool {
        let Some(id) = self.table.lookup(key) else {
            return false;
        };
        if self.table.is_expired(id, self.table.now()) {
            self.expire(id);
            return false;
        }
        self.promote(id);
        true
    }
}

impl<K, V> FromConfig for LruCore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn from_config(config: CacheConfig) -> Result<Self, ConfigError> {
        Self::with_config(config)
    }
}

impl<K, V> Extend<(K, V)> for LruCore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V> fmt::Debug for LruCore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCore")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}
