//! Thread-safe cache handles.
//!
//! [`SyncCache`] puts one engine behind one `parking_lot::Mutex`. Every
//! operation, reads included, takes the lock exclusively: `get` reorders the
//! engine's lists and bumps counters, so there is no read-only fast path.
//! Operations are therefore linearizable, and a stats snapshot is always
//! consistent with the entries it describes.
//!
//! Values leave the lock by clone. Store `Arc<V>` when values are large.
//!
//! ```
//! use std::sync::Arc;
//! use std::thread;
//! use localcache::LruCache;
//!
//! let cache = Arc::new(LruCache::<u64, u64>::new(128, true).unwrap());
//! let handles: Vec<_> = (0..4)
//!     .map(|t| {
//!         let cache = Arc::clone(&cache);
//!         thread::spawn(move || {
//!             for i in 0..100 {
//!                 cache.set(t * 1000 + i, i, None);
//!                 cache.get(&(t * 1000 + i));
//!             }
//!         })
//!     })
//!     .collect();
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//! assert_eq!(cache.len(), 128);
//! assert_eq!(cache.get_stats().evictions, 400 - 128);
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::time::Duration;

use parking_lot::Mutex;

use crate::builder::CacheConfig;
use crate::error::ConfigError;
use crate::policy::fifo::FifoCore;
use crate::policy::lfu::LfuCore;
use crate::policy::lru::LruCore;
use crate::stats::StatsSnapshot;
use crate::traits::{CoreCache, FifoCacheTrait, FromConfig, LfuCacheTrait, LruCacheTrait};

/// Thread-safe LRU cache.
pub type LruCache<K, V> = SyncCache<K, V, LruCore<K, V>>;
/// Thread-safe FIFO cache.
pub type FifoCache<K, V> = SyncCache<K, V, FifoCore<K, V>>;
/// Thread-safe LFU cache.
pub type LfuCache<K, V> = SyncCache<K, V, LfuCore<K, V>>;

/// An eviction engine `C` behind a single mutex.
pub struct SyncCache<K, V, C> {
    inner: Mutex<C>,
    _marker: PhantomData<fn(K) -> V>,
}

impl<K, V, C> SyncCache<K, V, C>
where
    C: CoreCache<K, V> + FromConfig,
{
    /// Creates a cache holding at most `capacity` entries.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] if `capacity` is 0.
    ///
    /// # Example
    ///
    /// ```
    /// use localcache::FifoCache;
    ///
    /// let cache: FifoCache<&str, u32> = FifoCache::new(2, false).unwrap();
    /// cache.set("a", 1, None);
    /// assert_eq!(cache.get(&"a"), Some(1));
    /// assert!(FifoCache::<&str, u32>::new(0, false).is_err());
    /// ```
    pub fn new(capacity: usize, track_stats: bool) -> Result<Self, ConfigError> {
        let mut config = CacheConfig::new(capacity);
        config.track_stats = track_stats;
        Self::with_config(config)
    }

    pub fn with_config(config: CacheConfig) -> Result<Self, ConfigError> {
        C::from_config(config).map(Self::from_core)
    }
}

impl<K, V, C> SyncCache<K, V, C>
where
    C: CoreCache<K, V>,
{
    /// Wraps an already constructed engine.
    pub fn from_core(core: C) -> Self {
        Self {
            inner: Mutex::new(core),
            _marker: PhantomData,
        }
    }

    /// Unwraps the engine.
    pub fn into_inner(self) -> C {
        self.inner.into_inner()
    }

    /// Returns a clone of the live value for `key`, applying the policy's
    /// access rule. Expired and absent keys both yield `None`.
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.inner.lock().get(key).cloned()
    }

    /// Inserts or updates `key`. `ttl` overrides the default TTL.
    pub fn set(&self, key: K, value: V, ttl: Option<Duration>) {
        self.inner.lock().set(key, value, ttl);
    }

    /// Removes `key`. Returns `true` if a live entry was removed.
    pub fn delete(&self, key: &K) -> bool {
        self.inner.lock().remove(key).is_some()
    }

    /// Removes `key`, returning its live value.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.inner.lock().remove(key)
    }

    /// Like [`get`](Self::get) without reordering or counting.
    pub fn peek(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.inner.lock().peek(key).cloned()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.inner.lock().contains(key)
    }

    /// Stored entries, expired-but-undiscovered ones included.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Reclaims every expired entry, returning how many were dropped.
    pub fn purge_expired(&self) -> usize {
        self.inner.lock().purge_expired()
    }

    /// Counter snapshot taken under the lock; zeroed when stats are off.
    pub fn get_stats(&self) -> StatsSnapshot {
        self.inner.lock().stats()
    }
}

impl<K, V, C> SyncCache<K, V, C>
where
    K: Clone,
    V: Clone,
    C: LruCacheTrait<K, V>,
{
    pub fn pop_lru(&self) -> Option<(K, V)> {
        self.inner.lock().pop_lru()
    }

    pub fn peek_lru(&self) -> Option<(K, V)> {
        let guard = self.inner.lock();
        guard
            .peek_lru()
            .map(|(key, value)| (key.clone(), value.clone()))
    }

    pub fn touch(&self, key: &K) -> bool {
        self.inner.lock().touch(key)
    }
}

impl<K, V, C> SyncCache<K, V, C>
where
    K: Clone,
    V: Clone,
    C: FifoCacheTrait<K, V>,
{
    pub fn pop_oldest(&self) -> Option<(K, V)> {
        self.inner.lock().pop_oldest()
    }

    pub fn peek_oldest(&self) -> Option<(K, V)> {
        let guard = self.inner.lock();
        guard
            .peek_oldest()
            .map(|(key, value)| (key.clone(), value.clone()))
    }
}

impl<K, V, C> SyncCache<K, V, C>
where
    K: Clone,
    V: Clone,
    C: LfuCacheTrait<K, V>,
{
    pub fn pop_lfu(&self) -> Option<(K, V)> {
        self.inner.lock().pop_lfu()
    }

    pub fn peek_lfu(&self) -> Option<(K, V)> {
        let guard = self.inner.lock();
        guard
            .peek_lfu()
            .map(|(key, value)| (key.clone(), value.clone()))
    }

    pub fn frequency(&self, key: &K) -> Option<u64> {
        self.inner.lock().frequency(key)
    }
}

impl<K, V, C> fmt::Debug for SyncCache<K, V, C>
where
    C: CoreCache<K, V>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cache = self.inner.lock();
        f.debug_struct("SyncCache")
            .field("len", &cache.len())
            .field("capacity", &cache.capacity())
            .finish_non_exhaustive()
    }
}
