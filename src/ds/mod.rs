//! Storage building blocks shared by the eviction engines.
//!
//! - [`SlotArena`]: generation-checked node storage
//! - [`OrderList`]: sentinel-bounded ordering over arena nodes
//! - [`ExpiryHeap`]: lazy min-heap of entry deadlines

pub mod expiry_heap;
pub mod order_list;
pub mod slot_arena;

pub use expiry_heap::ExpiryHeap;
pub use order_list::{Link, Linked, Links, ListId, OrderList};
pub use slot_arena::{SlotArena, SlotId};
