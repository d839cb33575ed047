//! # Cache Trait Hierarchy
//!
//! Uniform interface over the three eviction engines, plus one extension
//! trait per policy for the operations only that policy can answer.
//!
//! ## Architecture
//!
//! ```text
//!                     ┌─────────────────────────────────────────────┐
//!                     │              CoreCache<K, V>                │
//!                     │                                             │
//!                     │  set(&mut, K, V, Option<Duration>)          │
//!                     │  insert(&mut, K, V) → Option<V>             │
//!                     │  get(&mut, &K) → Option<&V>                 │
//!                     │  peek(&, &K) → Option<&V>                   │
//!                     │  contains(&, &K) → bool                     │
//!                     │  remove(&mut, &K) → Option<V>               │
//!                     │  len / is_empty / capacity / clear          │
//!                     │  purge_expired(&mut) → usize                │
//!                     │  stats(&) → StatsSnapshot                   │
//!                     └──────────────────────┬──────────────────────┘
//!                                            │
//!          ┌─────────────────────────────────┼─────────────────────────────────┐
//!          ▼                                 ▼                                 ▼
//!   ┌──────────────────────┐      ┌──────────────────────┐      ┌──────────────────────┐
//!   │ LruCacheTrait<K, V>  │      │ FifoCacheTrait<K, V> │      │ LfuCacheTrait<K, V>  │
//!   │                      │      │                      │      │                      │
//!   │ pop_lru() → (K, V)   │      │ pop_oldest() → (K, V)│      │ pop_lfu() → (K, V)   │
//!   │ peek_lru() → (&K,&V) │      │ peek_oldest()        │      │ peek_lfu()           │
//!   │ touch(&K) → bool     │      │                      │      │ frequency(&K) → u64  │
//!   └──────────────────────┘      └──────────────────────┘      └──────────────────────┘
//! ```
//!
//! ## Policy Comparison
//!
//! | Policy | Eviction victim                         | `get` reorders | `set` on present key       |
//! |--------|-----------------------------------------|----------------|----------------------------|
//! | LRU    | Least recently read or written          | Yes            | Moves to front             |
//! | FIFO   | Oldest insertion                        | No             | Updates in place           |
//! | LFU    | Lowest frequency, LRU among ties        | Yes (+1 freq)  | In place (mode-dependent)  |
//!
//! ## Expiry
//!
//! Every engine treats an expired entry as absent. `get` discovers and
//! reclaims it lazily; `peek` and `contains` report it absent without
//! touching it; `purge_expired` sweeps all of them at once.
//!
//! ## Thread Safety
//!
//! Engines are single-threaded and take `&mut self` for anything that can
//! reorder. Wrap them in [`SyncCache`](crate::sync::SyncCache) for shared
//! access.

use std::time::Duration;

use crate::builder::CacheConfig;
use crate::error::ConfigError;
use crate::stats::StatsSnapshot;

/// Core cache operations every eviction engine supports.
///
/// # Example
///
/// ```
/// use localcache::policy::lru::LruCore;
/// use localcache::traits::CoreCache;
///
/// fn warm_cache<C: CoreCache<u64, String>>(cache: &mut C, data: &[(u64, String)]) {
///     for (key, value) in data {
///         cache.insert(*key, value.clone());
///     }
/// }
///
/// let mut cache = LruCore::try_new(100).unwrap();
/// warm_cache(&mut cache, &[(1, "one".to_string()), (2, "two".to_string())]);
/// assert_eq!(cache.len(), 2);
/// ```
pub trait CoreCache<K, V> {
    /// Inserts or updates `key`, evicting if the cache is full.
    ///
    /// `ttl` overrides the configured default TTL for this write; `None`
    /// falls back to the default (or no expiry). Returns the previous live
    /// value of `key`, if any.
    fn set(&mut self, key: K, value: V, ttl: Option<Duration>) -> Option<V>;

    /// [`set`](Self::set) with the default TTL.
    ///
    /// ```
    /// use localcache::policy::fifo::FifoCore;
    /// use localcache::traits::CoreCache;
    ///
    /// let mut cache = FifoCore::try_new(10).unwrap();
    /// assert_eq!(cache.insert(1, "first"), None);
    /// assert_eq!(cache.insert(1, "second"), Some("first"));
    /// ```
    fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.set(key, value, None)
    }

    /// Looks up `key`, applying the policy's access rule and recording a
    /// hit or miss.
    fn get(&mut self, key: &K) -> Option<&V>;

    /// Looks up `key` without reordering, reclaiming or counting.
    fn peek(&self, key: &K) -> Option<&V>;

    /// `true` if `key` has a live entry. No side effects.
    fn contains(&self, key: &K) -> bool {
        self.peek(key).is_some()
    }

    /// Removes `key`, returning its value if it was live.
    fn remove(&mut self, key: &K) -> Option<V>;

    /// Stored entries, expired-but-undiscovered ones included.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn capacity(&self) -> usize;

    fn clear(&mut self);

    /// Reclaims every expired entry. Returns how many were dropped.
    fn purge_expired(&mut self) -> usize;

    /// Counter snapshot; all zeros when stats tracking is off.
    fn stats(&self) -> StatsSnapshot;
}

/// Engines constructible from a [`CacheConfig`].
pub trait FromConfig: Sized {
    fn from_config(config: CacheConfig) -> Result<Self, ConfigError>;
}

/// LRU-specific operations.
///
/// # Example
///
/// ```
/// use localcache::policy::lru::LruCore;
/// use localcache::traits::{CoreCache, LruCacheTrait};
///
/// let mut cache = LruCore::try_new(3).unwrap();
/// cache.insert(1, "a");
/// cache.insert(2, "b");
/// cache.touch(&1);
/// assert_eq!(cache.peek_lru(), Some((&2, &"b")));
/// ```
pub trait LruCacheTrait<K, V>: CoreCache<K, V> {
    /// Removes and returns the least recently used live entry.
    fn pop_lru(&mut self) -> Option<(K, V)>;

    /// Least recently used live entry, without reordering.
    fn peek_lru(&self) -> Option<(&K, &V)>;

    /// Marks `key` as most recently used without reading it or counting a hit.
    fn touch(&mut self, key: &K) -> bool;
}

/// FIFO-specific operations.
pub trait FifoCacheTrait<K, V>: CoreCache<K, V> {
    /// Removes and returns the oldest live entry.
    fn pop_oldest(&mut self) -> Option<(K, V)>;

    /// Oldest live entry.
    fn peek_oldest(&self) -> Option<(&K, &V)>;
}

/// LFU-specific operations.
///
/// # Example
///
/// ```
/// use localcache::policy::lfu::LfuCore;
/// use localcache::traits::{CoreCache, LfuCacheTrait};
///
/// let mut cache = LfuCore::try_new(3).unwrap();
/// cache.insert("hot", 1);
/// cache.insert("cold", 2);
/// cache.get(&"hot");
/// assert_eq!(cache.frequency(&"hot"), Some(2));
/// assert_eq!(cache.peek_lfu(), Some((&"cold", &2)));
/// ```
pub trait LfuCacheTrait<K, V>: CoreCache<K, V> {
    /// Removes and returns the live entry with the lowest frequency,
    /// least recently used among ties.
    fn pop_lfu(&mut self) -> Option<(K, V)>;

    /// Entry [`pop_lfu`](Self::pop_lfu) would return.
    fn peek_lfu(&self) -> Option<(&K, &V)>;

    /// Access frequency of a live entry.
    fn frequency(&self, key: &K) -> Option<u64>;
}
