//! localcache: bounded in-memory key-value caches with LRU, FIFO and LFU
//! eviction, optional per-entry TTL and hit/miss statistics.
//!
//! ```
//! use std::time::Duration;
//! use localcache::LruCache;
//!
//! let cache = LruCache::new(2, true).unwrap();
//! cache.set("a", 1, Some(Duration::from_secs(60)));
//! cache.set("b", 2, None);
//! cache.get(&"a");
//! cache.set("c", 3, None);
//!
//! assert_eq!(cache.get(&"b"), None);
//! assert_eq!(cache.len(), 2);
//! assert_eq!(cache.get_stats().evictions, 1);
//! ```
//!
//! Layers, bottom up: [`ds`] (slot arena, ordering list, expiry heap), the
//! single-threaded engines in [`policy`], [`sync::SyncCache`] for shared use
//! and [`builder`] for runtime policy selection.

pub mod builder;
pub mod ds;
pub mod error;
pub mod policy;
pub mod prelude;
pub mod stats;
pub mod sync;
pub mod time;
pub mod traits;

mod entry;
mod table;

pub use crate::builder::{Cache, CacheBuilder, CacheConfig, CachePolicy};
pub use crate::error::{ConfigError, InvariantError};
pub use crate::policy::lfu::LfuWriteMode;
pub use crate::stats::StatsSnapshot;
pub use crate::sync::{FifoCache, LfuCache, LruCache, SyncCache};
