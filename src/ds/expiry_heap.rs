//! Lazy min-heap of entry deadlines.
//!
//! Tracks the expiry deadline of every TTL-carrying entry so the engine can
//! find the entry that expired first in O(log n) without scanning. Deadline
//! changes and cancellations only touch the authoritative `deadlines` map;
//! superseded heap entries go stale and are skipped when they surface.
//!
//! ```text
//!   deadlines: { id_a -> t+10ms, id_c -> t+50ms }       (authoritative)
//!
//!   heap (min first):
//!     (t+5ms,  id_b, seq=0)  <- STALE: id_b cancelled
//!     (t+10ms, id_a, seq=1)  <- live
//!     (t+30ms, id_a, seq=0)  <- STALE: id_a rescheduled to t+10ms
//!     (t+50ms, id_c, seq=2)  <- live
//!
//!   pop_expired(now = t+20ms):
//!     skip id_b (stale) -> id_a live and due -> return id_a
//! ```
//!
//! Entries are keyed by generation-checked [`SlotId`]s, so a slot reused by a
//! new entry never matches a stale heap record of the old one.
//!
//! Stale records are compacted with [`rebuild`](ExpiryHeap::rebuild) once
//! they outnumber live ones by [`REBUILD_FACTOR`].

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Instant;

use rustc_hash::FxHashMap;

use crate::ds::slot_arena::SlotId;

/// Heap is rebuilt once it holds this many times more records than live deadlines.
pub const REBUILD_FACTOR: usize = 4;

/// Below this size stale records are never worth compacting.
const REBUILD_FLOOR: usize = 64;

#[derive(Debug, Clone)]
struct HeapEntry {
    deadline: Instant,
    seq: u64,
    id: SlotId,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.deadline.cmp(&other.deadline) {
            Ordering::Equal => self.seq.cmp(&other.seq),
            ordering => ordering,
        }
    }
}

/// Min-heap of deadlines with O(1) cancellation via lazy deletion.
#[derive(Debug, Default)]
pub struct ExpiryHeap {
    deadlines: FxHashMap<SlotId, Instant>,
    heap: BinaryHeap<Reverse<HeapEntry>>,
    seq: u64,
}

impl ExpiryHeap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live deadlines.
    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }

    /// Number of heap records, stale ones included.
    pub fn heap_len(&self) -> usize {
        self.heap.len()
    }

    pub fn deadline(&self, id: SlotId) -> Option<Instant> {
        self.deadlines.get(&id).copied()
    }

    /// Sets (or replaces) the deadline of `id`. Returns the previous one.
    pub fn schedule(&mut self, id: SlotId, deadline: Instant) -> Option<Instant> {
        let previous = self.deadlines.insert(id, deadline);
        self.push_entry(id, deadline);
        self.maybe_rebuild();
        previous
    }

    /// Drops the deadline of `id`, if any.
    pub fn cancel(&mut self, id: SlotId) -> Option<Instant> {
        self.deadlines.remove(&id)
    }

    /// Earliest live deadline, discarding stale records on the way.
    pub fn peek_earliest(&mut self) -> Option<(SlotId, Instant)> {
        loop {
            let Reverse(top) = self.heap.peek()?;
            if self.deadlines.get(&top.id) == Some(&top.deadline) {
                return Some((top.id, top.deadline));
            }
            self.heap.pop();
        }
    }

    /// Removes and returns the earliest entry whose deadline is `<= now`.
    pub fn pop_expired(&mut self, now: Instant) -> Option<SlotId> {
        let (id, deadline) = self.peek_earliest()?;
        if deadline > now {
            return None;
        }
        self.heap.pop();
        self.deadlines.remove(&id);
        Some(id)
    }

    /// Rebuilds the heap from the authoritative map, dropping stale records.
    pub fn rebuild(&mut self) {
        self.heap.clear();
        let live: Vec<(SlotId, Instant)> = self
            .deadlines
            .iter()
            .map(|(id, deadline)| (*id, *deadline))
            .collect();
        for (id, deadline) in live {
            self.push_entry(id, deadline);
        }
    }

    pub fn clear(&mut self) {
        self.deadlines.clear();
        self.heap.clear();
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        assert!(self.heap.len() >= self.deadlines.len());
        for (id, deadline) in &self.deadlines {
            assert!(
                self.heap
                    .iter()
                    .any(|Reverse(entry)| entry.id == *id && entry.deadline == *deadline),
                "live deadline without heap record"
            );
        }
    }

    fn maybe_rebuild(&mut self) {
        if self.heap.len() > REBUILD_FLOOR
            && self.heap.len() > self.deadlines.len().saturating_mul(REBUILD_FACTOR)
        {
            self.rebuild();
        }
    }

    fn push_entry(&mut self, id: SlotId, deadline: Instant) {
        let entry = HeapEntry {
            deadline,
            seq: self.seq,
            id,
        };
        self.seq = self.seq.wrapping_add(1);
        self.heap.push(Reverse(entry));
    }
}
