//! Cache node stored in the slot arena.
//!
//! An [`Entry`] is owned by the arena; the lookup map and exactly one
//! [`OrderList`](crate::ds::OrderList) refer to it by
//! [`SlotId`](crate::ds::SlotId). Its [`Links`] are only ever written by the
//! ordering structure it is linked into.

use std::time::Instant;

use crate::ds::order_list::{Linked, Links};

#[derive(Debug)]
pub(crate) struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) expires_at: Option<Instant>,
    /// LFU bucket key. LRU and FIFO leave it at 0.
    pub(crate) frequency: u64,
    links: Links,
}

impl<K, V> Entry<K, V> {
    pub(crate) fn new(key: K, value: V, expires_at: Option<Instant>) -> Self {
        Self {
            key,
            value,
            expires_at,
            frequency: 0,
            links: Links::default(),
        }
    }

    #[inline]
    pub(crate) fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }
}

impl<K, V> Linked for Entry<K, V> {
    #[inline]
    fn links(&self) -> &Links {
        &self.links
    }

    #[inline]
    fn links_mut(&mut self) -> &mut Links {
        &mut self.links
    }
}
