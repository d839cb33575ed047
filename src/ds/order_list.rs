//! Sentinel-bounded doubly linked list threaded through a `SlotArena`.
//!
//! The list does not own its nodes. Nodes live in a [`SlotArena`] owned by the
//! cache engine and carry their own [`Links`]; the list only records the two
//! sentinel neighbours (`head.next` and `tail.prev`) and a length. This lets
//! several lists (one per LFU frequency bucket) share a single arena.
//!
//! ## Architecture
//!
//! ```text
//!   arena (SlotArena<T: Linked>)
//!   ┌────────┬──────────────────────────────────────────────────────┐
//!   │ SlotId │ Links { owner, prev, next }                          │
//!   ├────────┼──────────────────────────────────────────────────────┤
//!   │ id_1   │ { L, prev: Sentinel,   next: Node(id_2) }            │
//!   │ id_2   │ { L, prev: Node(id_1), next: Node(id_3) }            │
//!   │ id_3   │ { L, prev: Node(id_2), next: Sentinel }              │
//!   │ id_4   │ { None, None, None }   (unlinked)                    │
//!   └────────┴──────────────────────────────────────────────────────┘
//!
//!   HEAD ─► [id_1] ◄──► [id_2] ◄──► [id_3] ◄── TAIL
//!   (MRU / newest)                  (LRU / oldest)
//! ```
//!
//! `Link::Sentinel` in a `prev` slot means the head sentinel; in a `next`
//! slot it means the tail sentinel. Sentinels have no `SlotId`, so they can
//! never be returned, unlinked or freed.
//!
//! ## Invariants
//!
//! - empty ⇔ `head.next == TAIL` ⇔ `tail.prev == HEAD`
//! - for every linked node `a`: `a.next.prev == a` and `a.prev.next == a`
//! - a node is linked into at most one list (`owner`), and linking a node
//!   that already carries links is an [`InvariantError`]
//!
//! ## Operations
//!
//! | Operation       | Complexity | Notes                                   |
//! |-----------------|------------|-----------------------------------------|
//! | `add_to_front`  | O(1)       | Fails if the node is already linked     |
//! | `unlink`        | O(1)       | No-op for unlinked/foreign/stale nodes  |
//! | `move_to_front` | O(1)       | `unlink` + `add_to_front`               |
//! | `pop_tail`      | O(1)       | Oldest / least recently used node       |
//! | `is_empty`      | O(1)       | `head.next is tail`                     |
//! | `iter_ids`      | O(n)       | Front to back                           |
//! | `iter_ids_rev`  | O(n)       | Back to front                           |

use std::sync::atomic::{AtomicU64, Ordering};

use crate::ds::slot_arena::{SlotArena, SlotId};
use crate::error::InvariantError;

static NEXT_LIST_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of an [`OrderList`], recorded in the links of its nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListId(u64);

impl ListId {
    fn next() -> Self {
        Self(NEXT_LIST_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// One end of a link: a sentinel or a real node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    Sentinel,
    Node(SlotId),
}

/// Link slots embedded in every node. All `None` while unlinked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Links {
    owner: Option<ListId>,
    prev: Option<Link>,
    next: Option<Link>,
}

impl Links {
    #[inline]
    pub fn is_linked(&self) -> bool {
        self.owner.is_some() || self.prev.is_some() || self.next.is_some()
    }

    #[inline]
    pub fn owner(&self) -> Option<ListId> {
        self.owner
    }

    #[inline]
    pub fn prev(&self) -> Option<Link> {
        self.prev
    }

    #[inline]
    pub fn next(&self) -> Option<Link> {
        self.next
    }
}

/// Node types that can be threaded into an [`OrderList`].
pub trait Linked {
    fn links(&self) -> &Links;
    fn links_mut(&mut self) -> &mut Links;
}

/// Doubly linked ordering structure over arena-resident nodes.
#[derive(Debug)]
pub struct OrderList {
    id: ListId,
    head_next: Link,
    tail_prev: Link,
    len: usize,
}

impl OrderList {
    /// Creates an empty list: `head.next` is the tail and vice versa.
    pub fn new() -> Self {
        Self {
            id: ListId::next(),
            head_next: Link::Sentinel,
            tail_prev: Link::Sentinel,
            len: 0,
        }
    }

    pub fn id(&self) -> ListId {
        self.id
    }

    /// Returns `true` when `head.next` is the tail sentinel.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head_next == Link::Sentinel
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Node adjacent to the head sentinel (most recent).
    #[inline]
    pub fn front(&self) -> Option<SlotId> {
        match self.head_next {
            Link::Node(id) => Some(id),
            Link::Sentinel => None,
        }
    }

    /// Node adjacent to the tail sentinel (least recent).
    #[inline]
    pub fn back(&self) -> Option<SlotId> {
        match self.tail_prev {
            Link::Node(id) => Some(id),
            Link::Sentinel => None,
        }
    }

    /// Splices `id` immediately after the head sentinel.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantError`] if `id` is stale or the node already has
    /// link slots set (it is linked here or in another list). The list is
    /// left untouched in that case.
    pub fn add_to_front<T: Linked>(
        &mut self,
        arena: &mut SlotArena<T>,
        id: SlotId,
    ) -> Result<(), InvariantError> {
        let old_first = self.head_next;
        let node = arena.get_mut(id).ok_or_else(|| {
            InvariantError::new(format!("cannot link freed slot {}", id.index()))
        })?;
        if node.links().is_linked() {
            return Err(InvariantError::new(format!(
                "slot {} is already linked into an ordering structure",
                id.index()
            )));
        }
        *node.links_mut() = Links {
            owner: Some(self.id),
            prev: Some(Link::Sentinel),
            next: Some(old_first),
        };

        match old_first {
            Link::Node(first) => {
                if let Some(first_node) = arena.get_mut(first) {
                    first_node.links_mut().prev = Some(Link::Node(id));
                }
            },
            Link::Sentinel => self.tail_prev = Link::Node(id),
        }
        self.head_next = Link::Node(id);
        self.len += 1;
        Ok(())
    }

    /// Removes `id` from this list and clears its link slots.
    ///
    /// Returns `false` without touching anything if `id` is stale, unlinked,
    /// or linked into a different list, so a second `unlink` of the same node
    /// is harmless.
    pub fn unlink<T: Linked>(&mut self, arena: &mut SlotArena<T>, id: SlotId) -> bool {
        let Some(node) = arena.get_mut(id) else {
            return false;
        };
        let links = *node.links();
        if links.owner != Some(self.id) {
            return false;
        }
        let (Some(prev), Some(next)) = (links.prev, links.next) else {
            return false;
        };
        *node.links_mut() = Links::default();

        match prev {
            Link::Sentinel => self.head_next = next,
            Link::Node(prev_id) => {
                if let Some(prev_node) = arena.get_mut(prev_id) {
                    prev_node.links_mut().next = Some(next);
                }
            },
        }
        match next {
            Link::Sentinel => self.tail_prev = prev,
            Link::Node(next_id) => {
                if let Some(next_node) = arena.get_mut(next_id) {
                    next_node.links_mut().prev = Some(prev);
                }
            },
        }
        self.len -= 1;
        true
    }

    /// Moves a node of this list to the front.
    ///
    /// Returns `Ok(false)` if `id` is not linked into this list.
    pub fn move_to_front<T: Linked>(
        &mut self,
        arena: &mut SlotArena<T>,
        id: SlotId,
    ) -> Result<bool, InvariantError> {
        if self.head_next == Link::Node(id) {
            return Ok(true);
        }
        if !self.unlink(arena, id) {
            return Ok(false);
        }
        self.add_to_front(arena, id)?;
        Ok(true)
    }

    /// Unlinks and returns the node adjacent to the tail sentinel.
    pub fn pop_tail<T: Linked>(&mut self, arena: &mut SlotArena<T>) -> Option<SlotId> {
        let id = self.back()?;
        if self.unlink(arena, id) {
            Some(id)
        } else {
            None
        }
    }

    /// Forgets every node without touching the arena.
    ///
    /// Only valid when the caller is about to clear the arena as well.
    pub(crate) fn reset(&mut self) {
        self.head_next = Link::Sentinel;
        self.tail_prev = Link::Sentinel;
        self.len = 0;
    }

    /// Iterates node ids from front (head side) to back (tail side).
    pub fn iter_ids<'a, T: Linked>(&self, arena: &'a SlotArena<T>) -> OrderListIdIter<'a, T> {
        OrderListIdIter {
            arena,
            current: self.head_next,
            remaining: self.len,
            reverse: false,
        }
    }

    /// Iterates node ids from back (tail side) to front (head side).
    pub fn iter_ids_rev<'a, T: Linked>(&self, arena: &'a SlotArena<T>) -> OrderListIdIter<'a, T> {
        OrderListIdIter {
            arena,
            current: self.tail_prev,
            remaining: self.len,
            reverse: true,
        }
    }

    /// Walks the list and panics on any structural inconsistency.
    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants<T: Linked>(&self, arena: &SlotArena<T>) {
        assert_eq!(
            self.head_next == Link::Sentinel,
            self.tail_prev == Link::Sentinel,
            "head.next is tail iff tail.prev is head"
        );
        if self.is_empty() {
            assert_eq!(self.len, 0);
            return;
        }

        let mut count = 0usize;
        let mut expected_prev = Link::Sentinel;
        let mut current = self.head_next;
        while let Link::Node(id) = current {
            let node = arena.get(id).expect("linked node missing from arena");
            let links = node.links();
            assert_eq!(links.owner, Some(self.id), "node owned by another list");
            assert_eq!(links.prev, Some(expected_prev), "a.next.prev != a");
            expected_prev = Link::Node(id);
            current = links.next.expect("linked node without next slot");
            count += 1;
            assert!(count <= self.len, "cycle detected in ordering structure");
        }
        assert_eq!(self.tail_prev, expected_prev, "tail.prev is not the last node");
        assert_eq!(count, self.len);
    }
}

impl Default for OrderList {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the node ids of an [`OrderList`].
pub struct OrderListIdIter<'a, T> {
    arena: &'a SlotArena<T>,
    current: Link,
    remaining: usize,
    reverse: bool,
}

impl<'a, T: Linked> Iterator for OrderListIdIter<'a, T> {
    type Item = SlotId;

    fn next(&mut self) -> Option<Self::Item> {
        let Link::Node(id) = self.current else {
            return None;
        };
        if self.remaining == 0 {
            return None;
        }
        let links = self.arena.get(id)?.links();
        let step = if self.reverse { links.prev } else { links.next };
        self.current = step.unwrap_or(Link::Sentinel);
        self.remaining -= 1;
        Some(id)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}
