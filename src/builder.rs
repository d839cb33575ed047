//! Unified cache builder for all eviction policies.
//!
//! [`CacheBuilder`] collects a [`CacheConfig`] and produces either a
//! policy-specific handle (`build_lru`, `build_fifo`, `build_lfu`) or a
//! [`Cache`] that picks its policy at runtime.
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use localcache::builder::{CacheBuilder, CachePolicy};
//!
//! let cache = CacheBuilder::new(100)
//!     .track_stats(true)
//!     .default_ttl(Duration::from_secs(30))
//!     .build::<u64, String>(CachePolicy::Lru)
//!     .unwrap();
//! cache.set(1, "hello".to_string(), None);
//! assert_eq!(cache.get(&1), Some("hello".to_string()));
//! assert_eq!(cache.get_stats().hits, 1);
//! ```

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::error::ConfigError;
use crate::policy::lfu::LfuWriteMode;
use crate::stats::StatsSnapshot;
use crate::sync::{FifoCache, LfuCache, LruCache};
use crate::time::{self, Clock};

/// Settings shared by every engine.
///
/// | Field            | Default        | Meaning                                  |
/// |------------------|----------------|------------------------------------------|
/// | `capacity`       | (required)     | Maximum number of entries, must be > 0   |
/// | `track_stats`    | `false`        | Count hits, misses, evictions, expirations |
/// | `default_ttl`    | `None`         | TTL applied to writes that pass none     |
/// | `lfu_write_mode` | `KeepFrequency`| Whether LFU writes count as accesses     |
/// | `clock`          | `SystemClock`  | Time source for deadlines                |
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub capacity: usize,
    pub track_stats: bool,
    pub default_ttl: Option<Duration>,
    pub lfu_write_mode: LfuWriteMode,
    pub clock: Arc<dyn Clock>,
}

impl CacheConfig {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            track_stats: false,
            default_ttl: None,
            lfu_write_mode: LfuWriteMode::default(),
            clock: time::system(),
        }
    }

    /// # Errors
    ///
    /// [`ConfigError`] for a zero capacity or a zero default TTL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_capacity(self.capacity)?;
        if self.default_ttl == Some(Duration::ZERO) {
            return Err(ConfigError::new("default_ttl must be > 0"));
        }
        Ok(())
    }
}

/// Available cache eviction policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CachePolicy {
    /// Least Recently Used eviction.
    Lru,
    /// First In, First Out eviction.
    Fifo,
    /// Least Frequently Used eviction, LRU among equal frequencies.
    Lfu,
}

/// Thread-safe cache whose policy is chosen at runtime.
pub struct Cache<K, V> {
    inner: CacheInner<K, V>,
}

enum CacheInner<K, V> {
    Lru(LruCache<K, V>),
    Fifo(FifoCache<K, V>),
    Lfu(LfuCache<K, V>),
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Shorthand for `CacheBuilder::new(capacity).track_stats(track_stats).build(policy)`.
    pub fn new(policy: CachePolicy, capacity: usize, track_stats: bool) -> Result<Self, ConfigError> {
        CacheBuilder::new(capacity)
            .track_stats(track_stats)
            .build(policy)
    }

    pub fn policy(&self) -> CachePolicy {
        match &self.inner {
            CacheInner::Lru(_) => CachePolicy::Lru,
            CacheInner::Fifo(_) => CachePolicy::Fifo,
            CacheInner::Lfu(_) => CachePolicy::Lfu,
        }
    }

    /// Get a clone of the live value for `key`.
    pub fn get(&self, key: &K) -> Option<V> {
        match &self.inner {
            CacheInner::Lru(lru) => lru.get(key),
            CacheInner::Fifo(fifo) => fifo.get(key),
            CacheInner::Lfu(lfu) => lfu.get(key),
        }
    }

    /// Insert or update `key`; `ttl` overrides the default TTL.
    pub fn set(&self, key: K, value: V, ttl: Option<Duration>) {
        match &self.inner {
            CacheInner::Lru(lru) => lru.set(key, value, ttl),
            CacheInner::Fifo(fifo) => fifo.set(key, value, ttl),
            CacheInner::Lfu(lfu) => lfu.set(key, value, ttl),
        }
    }

    /// Remove `key`. Returns `true` if a live entry was removed.
    pub fn delete(&self, key: &K) -> bool {
        match &self.inner {
            CacheInner::Lru(lru) => lru.delete(key),
            CacheInner::Fifo(fifo) => fifo.delete(key),
            CacheInner::Lfu(lfu) => lfu.delete(key),
        }
    }

    /// Look up without reordering or counting.
    pub fn peek(&self, key: &K) -> Option<V> {
        match &self.inner {
            CacheInner::Lru(lru) => lru.peek(key),
            CacheInner::Fifo(fifo) => fifo.peek(key),
            CacheInner::Lfu(lfu) => lfu.peek(key),
        }
    }

    pub fn contains(&self, key: &K) -> bool {
        match &self.inner {
            CacheInner::Lru(lru) => lru.contains(key),
            CacheInner::Fifo(fifo) => fifo.contains(key),
            CacheInner::Lfu(lfu) => lfu.contains(key),
        }
    }

    pub fn len(&self) -> usize {
        match &self.inner {
            CacheInner::Lru(lru) => lru.len(),
            CacheInner::Fifo(fifo) => fifo.len(),
            CacheInner::Lfu(lfu) => lfu.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        match &self.inner {
            CacheInner::Lru(lru) => lru.capacity(),
            CacheInner::Fifo(fifo) => fifo.capacity(),
            CacheInner::Lfu(lfu) => lfu.capacity(),
        }
    }

    pub fn clear(&self) {
        match &self.inner {
            CacheInner::Lru(lru) => lru.clear(),
            CacheInner::Fifo(fifo) => fifo.clear(),
            CacheInner::Lfu(lfu) => lfu.clear(),
        }
    }

    pub fn purge_expired(&self) -> usize {
        match &self.inner {
            CacheInner::Lru(lru) => lru.purge_expired(),
            CacheInner::Fifo(fifo) => fifo.purge_expired(),
            CacheInner::Lfu(lfu) => lfu.purge_expired(),
        }
    }

    pub fn get_stats(&self) -> StatsSnapshot {
        match &self.inner {
            CacheInner::Lru(lru) => lru.get_stats(),
            CacheInner::Fifo(fifo) => fifo.get_stats(),
            CacheInner::Lfu(lfu) => lfu.get_stats(),
        }
    }
}

impl<K, V> fmt::Debug for Cache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("policy", &self.policy())
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}

/// Builder for creating cache instances.
#[derive(Debug, Clone)]
pub struct CacheBuilder {
    config: CacheConfig,
}

impl CacheBuilder {
    /// Create a new cache builder with the specified capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            config: CacheConfig::new(capacity),
        }
    }

    pub fn track_stats(mut self, enabled: bool) -> Self {
        self.config.track_stats = enabled;
        self
    }

    /// TTL for writes that do not pass one. Must be non-zero.
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.config.default_ttl = Some(ttl);
        self
    }

    pub fn lfu_write_mode(mut self, mode: LfuWriteMode) -> Self {
        self.config.lfu_write_mode = mode;
        self
    }

    /// Replaces the system clock, e.g. with a
    /// [`ManualClock`](crate::time::ManualClock) in tests.
    pub fn clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.config.clock = Arc::new(clock);
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Build a cache with the specified policy.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] if the capacity or default TTL is zero.
    ///
    /// # Example
    ///
    /// ```rust
    /// use localcache::builder::{CacheBuilder, CachePolicy};
    ///
    /// let cache = CacheBuilder::new(2).build::<u64, &str>(CachePolicy::Fifo).unwrap();
    /// cache.set(1, "one", None);
    /// cache.set(2, "two", None);
    /// cache.set(3, "three", None);
    /// assert!(!cache.contains(&1));
    /// ```
    pub fn build<K, V>(self, policy: CachePolicy) -> Result<Cache<K, V>, ConfigError>
    where
        K: Eq + Hash + Clone,
        V: Clone,
    {
        debug!(?policy, "building cache");
        let inner = match policy {
            CachePolicy::Lru => CacheInner::Lru(self.build_lru()?),
            CachePolicy::Fifo => CacheInner::Fifo(self.build_fifo()?),
            CachePolicy::Lfu => CacheInner::Lfu(self.build_lfu()?),
        };
        Ok(Cache { inner })
    }

    pub fn build_lru<K, V>(self) -> Result<LruCache<K, V>, ConfigError>
    where
        K: Eq + Hash + Clone,
    {
        LruCache::with_config(self.config)
    }

    pub fn build_fifo<K, V>(self) -> Result<FifoCache<K, V>, ConfigError>
    where
        K: Eq + Hash + Clone,
    {
        FifoCache::with_config(self.config)
    }

    pub fn build_lfu<K, V>(self) -> Result<LfuCache<K, V>, ConfigError>
    where
        K: Eq + Hash + Clone,
    {
        LfuCache::with_config(self.config)
    }
}
