//! Engine state shared by every eviction policy.
//!
//! An [`EntryTable`] owns everything a policy engine needs except its
//! ordering structures: the key → [`SlotId`] lookup map, the arena holding
//! the [`Entry`] nodes, the expiry index, the capacity, the optional stats
//! counter and the clock. Policies own their `OrderList`s and thread them
//! through [`arena_mut`](EntryTable::arena_mut).
//!
//! ```text
//!   map: { "a" -> #0, "b" -> #2 }        arena: [ #0 a | #1 free | #2 b ]
//!                                        expiry: { #0 -> t+10ms }
//! ```
//!
//! Removal is two-phase: the policy unlinks the node from its list, then
//! calls [`remove`](EntryTable::remove), which drops the map entry, cancels
//! the deadline and frees the slot. A node is freed only once it is gone from
//! both the map and every list.

use std::hash::Hash;
use std::mem;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;
use tracing::{debug, error, trace};

use crate::builder::CacheConfig;
use crate::ds::{ExpiryHeap, Linked, SlotArena, SlotId};
use crate::entry::Entry;
use crate::error::InvariantError;
use crate::stats::{StatsCounter, StatsSnapshot};
use crate::time::Clock;

/// Upper bound on eager allocation; larger caches grow on demand.
const PREALLOC_LIMIT: usize = 1 << 16;

pub(crate) type EntryArena<K, V> = SlotArena<Entry<K, V>>;

pub(crate) struct EntryTable<K, V> {
    policy: &'static str,
    map: FxHashMap<K, SlotId>,
    arena: SlotArena<Entry<K, V>>,
    expiry: ExpiryHeap,
    capacity: usize,
    default_ttl: Option<Duration>,
    stats: Option<StatsCounter>,
    clock: Arc<dyn Clock>,
}

impl<K, V> EntryTable<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Builds an empty table for the named policy. `config` must already be
    /// validated.
    pub(crate) fn new(policy: &'static str, config: &CacheConfig) -> Self {
        let prealloc = config.capacity.min(PREALLOC_LIMIT);
        Self {
            policy,
            map: FxHashMap::with_capacity_and_hasher(prealloc, Default::default()),
            arena: SlotArena::with_capacity(prealloc),
            expiry: ExpiryHeap::new(),
            capacity: config.capacity,
            default_ttl: config.default_ttl,
            stats: config.track_stats.then(StatsCounter::new),
            clock: Arc::clone(&config.clock),
        }
    }

    #[inline]
    pub(crate) fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Absolute deadline for a write at `now`: the explicit TTL, else the
    /// configured default, else none. A deadline past the end of `Instant`
    /// means the entry never expires.
    pub(crate) fn deadline_for(&self, now: Instant, ttl: Option<Duration>) -> Option<Instant> {
        ttl.or(self.default_ttl)
            .and_then(|ttl| now.checked_add(ttl))
    }

    #[inline]
    pub(crate) fn lookup(&self, key: &K) -> Option<SlotId> {
        self.map.get(key).copied()
    }

    #[inline]
    pub(crate) fn entry(&self, id: SlotId) -> Option<&Entry<K, V>> {
        self.arena.get(id)
    }

    #[inline]
    pub(crate) fn entry_mut(&mut self, id: SlotId) -> Option<&mut Entry<K, V>> {
        self.arena.get_mut(id)
    }

    /// Entry for `key` if it is present and not expired at `now`.
    pub(crate) fn live_entry(&self, key: &K, now: Instant) -> Option<&Entry<K, V>> {
        let id = self.lookup(key)?;
        self.arena.get(id).filter(|entry| !entry.is_expired(now))
    }

    #[inline]
    pub(crate) fn is_expired(&self, id: SlotId, now: Instant) -> bool {
        self.arena
            .get(id)
            .is_some_and(|entry| entry.is_expired(now))
    }

    #[inline]
    pub(crate) fn arena(&self) -> &SlotArena<Entry<K, V>> {
        &self.arena
    }

    #[inline]
    pub(crate) fn arena_mut(&mut self) -> &mut SlotArena<Entry<K, V>> {
        &mut self.arena
    }

    /// Allocates an unlinked node for an absent key and maps it.
    pub(crate) fn insert(&mut self, key: K, value: V, expires_at: Option<Instant>) -> SlotId {
        debug_assert!(!self.map.contains_key(&key));
        let id = self.arena.insert(Entry::new(key.clone(), value, expires_at));
        self.map.insert(key, id);
        if let Some(deadline) = expires_at {
            self.expiry.schedule(id, deadline);
        }
        id
    }

    /// Overwrites value and deadline of a live entry in place, returning the
    /// previous value. Callers expire dead entries first.
    pub(crate) fn replace(&mut self, id: SlotId, value: V, expires_at: Option<Instant>) -> Option<V> {
        let entry = self.arena.get_mut(id)?;
        let previous = mem::replace(&mut entry.value, value);
        entry.expires_at = expires_at;
        match expires_at {
            Some(deadline) => {
                self.expiry.schedule(id, deadline);
            },
            None => {
                self.expiry.cancel(id);
            },
        }
        Some(previous)
    }

    /// Frees an already unlinked node: map entry, deadline and slot.
    pub(crate) fn remove(&mut self, id: SlotId) -> Option<Entry<K, V>> {
        let entry = self.arena.remove(id)?;
        debug_assert!(
            !entry.links().is_linked(),
            "entry freed while still linked"
        );
        self.map.remove(&entry.key);
        self.expiry.cancel(id);
        Some(entry)
    }

    /// Reclaims `id` as expired: `unlink` detaches it from the caller's
    /// ordering, then the node is freed and one expiration recorded.
    pub(crate) fn expire_with<F>(&mut self, id: SlotId, unlink: F) -> bool
    where
        F: FnOnce(&mut EntryArena<K, V>, SlotId),
    {
        if !self.arena.contains(id) {
            return false;
        }
        unlink(&mut self.arena, id);
        if self.remove(id).is_none() {
            return false;
        }
        self.record_expiration();
        trace!(policy = self.policy, "reclaimed expired entry");
        true
    }

    /// Removes `key`, returning its value only if it was still live.
    pub(crate) fn remove_with<F>(&mut self, key: &K, unlink: F) -> Option<V>
    where
        F: FnOnce(&mut EntryArena<K, V>, SlotId),
    {
        let id = self.lookup(key)?;
        let now = self.now();
        unlink(&mut self.arena, id);
        let entry = self.remove(id)?;
        (!entry.is_expired(now)).then_some(entry.value)
    }

    /// Reclaims every entry whose deadline has passed.
    pub(crate) fn purge_expired_with<F>(&mut self, mut unlink: F) -> usize
    where
        F: FnMut(&mut EntryArena<K, V>, SlotId),
    {
        let now = self.now();
        let mut purged = 0;
        while let Some(id) = self.earliest_expired(now) {
            if !self.expire_with(id, &mut unlink) {
                break;
            }
            purged += 1;
        }
        if purged > 0 {
            debug!(policy = self.policy, purged, "purged expired entries");
        }
        purged
    }

    /// Live value for `key`; no reordering, no stats.
    pub(crate) fn peek(&self, key: &K) -> Option<&V> {
        self.live_entry(key, self.now()).map(|entry| &entry.value)
    }

    /// Entry with the earliest deadline, if that deadline is `<= now`.
    pub(crate) fn earliest_expired(&mut self, now: Instant) -> Option<SlotId> {
        let (id, deadline) = self.expiry.peek_earliest()?;
        (deadline <= now).then_some(id)
    }

    /// `true` when inserting one more key requires making room first.
    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        self.map.len() >= self.capacity
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub(crate) fn record_hit(&mut self) {
        if let Some(stats) = self.stats.as_mut() {
            stats.record_hit();
        }
    }

    #[inline]
    pub(crate) fn record_miss(&mut self) {
        if let Some(stats) = self.stats.as_mut() {
            stats.record_miss();
        }
    }

    #[inline]
    pub(crate) fn record_eviction(&mut self) {
        if let Some(stats) = self.stats.as_mut() {
            stats.record_eviction();
        }
    }

    #[inline]
    pub(crate) fn record_expiration(&mut self) {
        if let Some(stats) = self.stats.as_mut() {
            stats.record_expiration();
        }
    }

    /// Zeroed when stats tracking is disabled.
    pub(crate) fn stats(&self) -> StatsSnapshot {
        self.stats
            .as_ref()
            .map(StatsCounter::snapshot)
            .unwrap_or_default()
    }

    /// Drops every entry. Callers reset their lists alongside.
    pub(crate) fn clear(&mut self) {
        self.map.clear();
        self.arena.clear();
        self.expiry.clear();
    }

    #[cfg(any(test, debug_assertions))]
    pub(crate) fn debug_validate_invariants(&self) {
        assert_eq!(self.map.len(), self.arena.len(), "map and arena disagree");
        assert!(self.map.len() <= self.capacity, "over capacity");
        for (key, id) in &self.map {
            let entry = self.arena.get(*id).expect("mapped slot is free");
            assert!(entry.key == *key, "slot holds another key");
            assert!(entry.links().is_linked(), "mapped entry not linked");
            assert_eq!(self.expiry.deadline(*id), entry.expires_at);
        }
        assert!(self.expiry.len() <= self.map.len());
        self.expiry.debug_validate_invariants();
    }
}

/// Logs an ordering-structure violation and aborts debug builds.
///
/// Release builds carry on with the list untouched; the failed operation
/// already left it consistent.
pub(crate) fn escalate(policy: &'static str, err: InvariantError) {
    error!(policy, error = %err, "ordering structure invariant violated");
    if cfg!(debug_assertions) {
        panic!("{policy}: {err}");
    }
}
