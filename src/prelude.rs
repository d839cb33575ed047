pub use crate::builder::{Cache, CacheBuilder, CacheConfig, CachePolicy};
pub use crate::error::ConfigError;
pub use crate::policy::fifo::FifoCore;
pub use crate::policy::lfu::{LfuCore, LfuWriteMode};
pub use crate::policy::lru::LruCore;
pub use crate::stats::StatsSnapshot;
pub use crate::sync::{FifoCache, LfuCache, LruCache, SyncCache};
pub use crate::time::{Clock, ManualClock, SystemClock};
pub use crate::traits::{CoreCache, FifoCacheTrait, FromConfig, LfuCacheTrait, LruCacheTrait};
