//! Eviction engines.
//!
//! Each engine is a single-threaded core over a shared entry table; wrap it
//! in [`SyncCache`](crate::sync::SyncCache) for concurrent use.
//!
//! | Module   | Engine     | Victim                                  |
//! |----------|------------|-----------------------------------------|
//! | [`lru`]  | `LruCore`  | Least recently used                     |
//! | [`fifo`] | `FifoCore` | Oldest insertion                        |
//! | [`lfu`]  | `LfuCore`  | Lowest frequency, LRU among ties        |

pub mod fifo;
pub mod lfu;
pub mod lru;
