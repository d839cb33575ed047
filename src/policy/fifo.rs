//! First In, First Out (FIFO) eviction engine.
//!
//! Entries are evicted in insertion order. Reads never reorder and writes to
//! a present key update value and deadline in place, so an entry's position
//! is fixed from the moment it is inserted until it leaves.
//!
//! ```text
//!   insert A, B, C          HEAD ─► [C] ◄──► [B] ◄──► [A] ◄── TAIL
//!   get(A), set(A, A')      HEAD ─► [C] ◄──► [B] ◄──► [A'] ◄── TAIL
//!   insert D (full)         A' evicted from the tail
//! ```
//!
//! Expired entries are reclaimed ahead of the oldest live entry when room is
//! needed, the same as the other engines.

use std::fmt;
use std::hash::Hash;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::builder::CacheConfig;
use crate::ds::{OrderList, SlotId};
use crate::error::ConfigError;
use crate::stats::StatsSnapshot;
use crate::table::{escalate, EntryTable};
use crate::traits::{CoreCache, FifoCacheTrait, FromConfig};

const POLICY: &str = "fifo";

/// Single-threaded FIFO engine.
pub struct FifoCore<K, V> {
    table: EntryTable<K, V>,
    queue: OrderList,
}

impl<K, V> FifoCore<K, V>
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
            "cache engine created"
        );
        Ok(Self {
            table: EntryTable::new(POLICY, &config),
            queue: OrderList::new(),
        })
    }

    /// Live keys from newest to oldest.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        let now = self.table.now();
        self.queue
            .iter_ids(self.table.arena())
            .filter_map(move |id| self.table.entry(id))
            .filter(move |entry| !entry.is_expired(now))
            .map(|entry| &entry.key)
    }

    fn expire(&mut self, id: SlotId) -> bool {
        let queue = &mut self.queue;
        self.table.expire_with(id, |arena, id| {
            queue.unlink(arena, id);
        })
    }

    fn make_room(&mut self, now: Instant) {
        while self.table.is_full() {
            if let Some(id) = self.table.earliest_expired(now) {
                if self.expire(id) {
                    continue;
                }
            }
            let Some(id) = self.queue.pop_tail(self.table.arena_mut()) else {
                break;
            };
            if self.table.remove(id).is_some() {
                self.table.record_eviction();
                trace!(
                    policy = POLICY,
                    len = self.table.len(),
                    "evicted oldest entry"
                );
            }
        }
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        self.queue.debug_validate_invariants(self.table.arena());
        assert_eq!(self.queue.len(), self.table.len());
        self.table.debug_validate_invariants();
    }
}

impl<K, V> CoreCache<K, V> for FifoCore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn set(&mut self, key: K, value: V, ttl: Option<Duration>) -> Option<V> {
        let now = self.table.now();
        let expires_at = self.table.deadline_for(now, ttl);

        if let Some(id) = self.table.lookup(&key) {
            if !self.table.is_expired(id, now) {
                return self.table.replace(id, value, expires_at);
            }
            // A dead entry gives up its queue slot; the key re-enters as new.
            self.expire(id);
        }

        self.make_room(now);
        let id = self.table.insert(key, value, expires_at);
        if let Err(err) = self.queue.add_to_front(self.table.arena_mut(), id) {
            escalate(POLICY, err);
        }
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
        self.table.record_hit();
        self.table.entry(id).map(|entry| &entry.value)
    }

    fn peek(&self, key: &K) -> Option<&V> {
        self.table.peek(key)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let queue = &mut self.queue;
        self.table.remove_with(key, |arena, id| {
            queue.unlink(arena, id);
        })
    }

    fn len(&self) -> usize {
        self.table.len()
    }

    fn capacity(&self) -> usize {
        self.table.capacity()
    }

    fn clear(&mut self) {
        self.table.clear();
        self.queue.reset();
    }

    fn purge_expired(&mut self) -> usize {
        let queue = &mut self.queue;
        self.table.purge_expired_with(|arena, id| {
            queue.unlink(arena, id);
        })
    }

    fn stats(&self) -> StatsSnapshot {
        self.table.stats()
    }
}

impl<K, V> FifoCacheTrait<K, V> for FifoCore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn pop_oldest(&mut self) -> Option<(K, V)> {
        let now = self.table.now();
        loop {
            let id = self.queue.pop_tail(self.table.arena_mut())?;
            let entry = self.table.remove(id)?;
            if entry.is_expired(now) {
                self.table.record_expiration();
                continue;
            }
            return Some((entry.key, entry.value));
        }
    }

    fn peek_oldest(&self) -> Option<(&K, &V)> {
        let now = self.table.now();
        self.queue
            .iter_ids_rev(self.table.arena())
            .filter_map(|id| self.table.entry(id))
            .find(|entry| !entry.is_expired(now))
            .map(|entry| (&entry.key, &entry.value))
    }
}

impl<K, V> FromConfig for FifoCore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn from_config(config: CacheConfig) -> Result<Self, ConfigError> {
        Self::with_config(config)
    }
}

impl<K, V> fmt::Debug for FifoCore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FifoCore")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}
