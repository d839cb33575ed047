// ==============================================
// POLICY PROPERTY TESTS (integration)
// ==============================================
//
// Random operation sequences run against each engine. Every engine must keep
// len() <= capacity after every operation, and the ordering of each policy is
// checked against a small reference model.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use localcache::prelude::*;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Set(u8, u16),
    SetTtl(u8, u16, u8),
    Get(u8),
    Delete(u8),
    Advance(u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u8..32, any::<u16>()).prop_map(|(k, v)| Op::Set(k, v)),
        2 => (0u8..32, any::<u16>(), 1u8..20).prop_map(|(k, v, t)| Op::SetTtl(k, v, t)),
        3 => (0u8..32).prop_map(Op::Get),
        1 => (0u8..32).prop_map(Op::Delete),
        1 => (0u8..10).prop_map(Op::Advance),
    ]
}

fn engine_config(capacity: usize, clock: &ManualClock) -> CacheConfig {
    let mut config = CacheConfig::new(capacity);
    config.track_stats = true;
    config.clock = Arc::new(clock.clone());
    config
}

fn apply<C: CoreCache<u8, u16>>(cache: &mut C, clock: &ManualClock, op: &Op) {
    match *op {
        Op::Set(k, v) => {
            cache.set(k, v, None);
        },
        Op::SetTtl(k, v, ttl) => {
            cache.set(k, v, Some(Duration::from_millis(u64::from(ttl))));
        },
        Op::Get(k) => {
            cache.get(&k);
        },
        Op::Delete(k) => {
            cache.remove(&k);
        },
        Op::Advance(ms) => clock.advance(Duration::from_millis(u64::from(ms))),
    }
}

fn gets(ops: &[Op]) -> u64 {
    ops.iter().filter(|op| matches!(op, Op::Get(_))).count() as u64
}

// ==============================================
// Capacity invariant
// ==============================================

mod capacity {
    use super::*;

    proptest! {
        /// len() never exceeds capacity, with or without TTLs in play.
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_lru_len_within_capacity(
            capacity in 1usize..16,
            ops in prop::collection::vec(op_strategy(), 0..300)
        ) {
            let clock = ManualClock::new();
            let mut cache = LruCore::with_config(engine_config(capacity, &clock)).unwrap();
            for op in &ops {
                apply(&mut cache, &clock, op);
                prop_assert!(cache.len() <= cache.capacity());
            }
            #[cfg(debug_assertions)]
            cache.debug_validate_invariants();
            let stats = cache.stats();
            prop_assert_eq!(stats.hits + stats.misses, gets(&ops));
        }

        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_fifo_len_within_capacity(
            capacity in 1usize..16,
            ops in prop::collection::vec(op_strategy(), 0..300)
        ) {
            let clock = ManualClock::new();
            let mut cache = FifoCore::with_config(engine_config(capacity, &clock)).unwrap();
            for op in &ops {
                apply(&mut cache, &clock, op);
                prop_assert!(cache.len() <= cache.capacity());
            }
            #[cfg(debug_assertions)]
            cache.debug_validate_invariants();
            let stats = cache.stats();
            prop_assert_eq!(stats.hits + stats.misses, gets(&ops));
        }

        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_lfu_len_within_capacity(
            capacity in 1usize..16,
            bump_on_write in any::<bool>(),
            ops in prop::collection::vec(op_strategy(), 0..300)
        ) {
            let clock = ManualClock::new();
            let mut config = engine_config(capacity, &clock);
            if bump_on_write {
                config.lfu_write_mode = LfuWriteMode::BumpFrequency;
            }
            let mut cache = LfuCore::with_config(config).unwrap();
            for op in &ops {
                apply(&mut cache, &clock, op);
                prop_assert!(cache.len() <= cache.capacity());
                #[cfg(debug_assertions)]
                cache.debug_validate_invariants();
            }
            let stats = cache.stats();
            prop_assert_eq!(stats.hits + stats.misses, gets(&ops));
        }

        /// Nothing is evicted while distinct keys fit.
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_no_eviction_below_capacity(
            keys in prop::collection::vec(0u8..32, 0..200)
        ) {
            let clock = ManualClock::new();
            let mut lru = LruCore::with_config(engine_config(32, &clock)).unwrap();
            let mut fifo = FifoCore::with_config(engine_config(32, &clock)).unwrap();
            let mut lfu = LfuCore::with_config(engine_config(32, &clock)).unwrap();
            for key in keys {
                lru.insert(key, 0);
                fifo.insert(key, 0);
                lfu.insert(key, 0);
            }
            prop_assert_eq!(lru.stats().evictions, 0);
            prop_assert_eq!(fifo.stats().evictions, 0);
            prop_assert_eq!(lfu.stats().evictions, 0);
        }
    }
}

// ==============================================
// Ordering against reference models
// ==============================================

#[derive(Debug, Clone)]
enum PlainOp {
    Set(u8, u16),
    Get(u8),
    Delete(u8),
}

fn plain_op_strategy() -> impl Strategy<Value = PlainOp> {
    prop_oneof![
        3 => (0u8..12, any::<u16>()).prop_map(|(k, v)| PlainOp::Set(k, v)),
        3 => (0u8..12).prop_map(PlainOp::Get),
        1 => (0u8..12).prop_map(PlainOp::Delete),
    ]
}

mod lru_model {
    use super::*;

    /// Front is most recently used.
    #[derive(Default)]
    struct Model {
        entries: VecDeque<(u8, u16)>,
    }

    impl Model {
        fn position(&self, key: u8) -> Option<usize> {
            self.entries.iter().position(|(k, _)| *k == key)
        }

        fn set(&mut self, key: u8, value: u16, capacity: usize) {
            if let Some(pos) = self.position(key) {
                self.entries.remove(pos);
            } else if self.entries.len() == capacity {
                self.entries.pop_back();
            }
            self.entries.push_front((key, value));
        }

        fn get(&mut self, key: u8) -> Option<u16> {
            let pos = self.position(key)?;
            let entry = self.entries.remove(pos)?;
            self.entries.push_front(entry);
            Some(entry.1)
        }

        fn delete(&mut self, key: u8) -> Option<u16> {
            let pos = self.position(key)?;
            self.entries.remove(pos).map(|(_, v)| v)
        }

        fn keys(&self) -> Vec<u8> {
            self.entries.iter().map(|(k, _)| *k).collect()
        }
    }

    proptest! {
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_matches_recency_model(
            capacity in 1usize..8,
            ops in prop::collection::vec(plain_op_strategy(), 0..200)
        ) {
            let mut cache = LruCore::try_new(capacity).unwrap();
            let mut model = Model::default();
            for op in ops {
                match op {
                    PlainOp::Set(k, v) => {
                        cache.insert(k, v);
                        model.set(k, v, capacity);
                    },
                    PlainOp::Get(k) => {
                        prop_assert_eq!(cache.get(&k).copied(), model.get(k));
                    },
                    PlainOp::Delete(k) => {
                        prop_assert_eq!(cache.remove(&k), model.delete(k));
                    },
                }
                prop_assert_eq!(cache.keys().copied().collect::<Vec<_>>(), model.keys());
            }
        }
    }
}

mod fifo_model {
    use super::*;

    /// Front is newest.
    #[derive(Default)]
    struct Model {
        entries: VecDeque<(u8, u16)>,
    }

    impl Model {
        fn set(&mut self, key: u8, value: u16, capacity: usize) {
            if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
                entry.1 = value;
                return;
            }
            if self.entries.len() == capacity {
                self.entries.pop_back();
            }
            self.entries.push_front((key, value));
        }

        fn get(&self, key: u8) -> Option<u16> {
            self.entries.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
        }

        fn delete(&mut self, key: u8) -> Option<u16> {
            let pos = self.entries.iter().position(|(k, _)| *k == key)?;
            self.entries.remove(pos).map(|(_, v)| v)
        }

        fn keys(&self) -> Vec<u8> {
            self.entries.iter().map(|(k, _)| *k).collect()
        }
    }

    proptest! {
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_matches_insertion_model(
            capacity in 1usize..8,
            ops in prop::collection::vec(plain_op_strategy(), 0..200)
        ) {
            let mut cache = FifoCore::try_new(capacity).unwrap();
            let mut model = Model::default();
            for op in ops {
                match op {
                    PlainOp::Set(k, v) => {
                        cache.insert(k, v);
                        model.set(k, v, capacity);
                    },
                    PlainOp::Get(k) => {
                        prop_assert_eq!(cache.get(&k).copied(), model.get(k));
                    },
                    PlainOp::Delete(k) => {
                        prop_assert_eq!(cache.remove(&k), model.delete(k));
                    },
                }
                prop_assert_eq!(cache.keys().copied().collect::<Vec<_>>(), model.keys());
            }
        }
    }
}

mod lfu_model {
    use super::*;

    struct Slot {
        key: u8,
        value: u16,
        freq: u64,
        /// When the entry last changed frequency bucket.
        entered: u64,
    }

    #[derive(Default)]
    struct Model {
        slots: Vec<Slot>,
        tick: u64,
    }

    impl Model {
        fn next_tick(&mut self) -> u64 {
            self.tick += 1;
            self.tick
        }

        fn victim(&self) -> Option<usize> {
            self.slots
                .iter()
                .enumerate()
                .min_by_key(|(_, slot)| (slot.freq, slot.entered))
                .map(|(index, _)| index)
        }

        fn set(&mut self, key: u8, value: u16, capacity: usize) {
            if let Some(slot) = self.slots.iter_mut().find(|slot| slot.key == key) {
                slot.value = value;
                return;
            }
            if self.slots.len() == capacity {
                if let Some(index) = self.victim() {
                    self.slots.swap_remove(index);
                }
            }
            let entered = self.next_tick();
            self.slots.push(Slot {
                key,
                value,
                freq: 1,
                entered,
            });
        }

        fn get(&mut self, key: u8) -> Option<u16> {
            let tick = self.next_tick();
            let slot = self.slots.iter_mut().find(|slot| slot.key == key)?;
            slot.freq += 1;
            slot.entered = tick;
            Some(slot.value)
        }

        fn delete(&mut self, key: u8) -> Option<u16> {
            let index = self.slots.iter().position(|slot| slot.key == key)?;
            Some(self.slots.swap_remove(index).value)
        }

        fn frequency(&self, key: u8) -> Option<u64> {
            self.slots
                .iter()
                .find(|slot| slot.key == key)
                .map(|slot| slot.freq)
        }
    }

    proptest! {
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_matches_frequency_model(
            capacity in 1usize..8,
            ops in prop::collection::vec(plain_op_strategy(), 0..200)
        ) {
            let mut cache = LfuCore::try_new(capacity).unwrap();
            let mut model = Model::default();
            for op in ops {
                match op {
                    PlainOp::Set(k, v) => {
                        cache.insert(k, v);
                        model.set(k, v, capacity);
                    },
                    PlainOp::Get(k) => {
                        prop_assert_eq!(cache.get(&k).copied(), model.get(k));
                    },
                    PlainOp::Delete(k) => {
                        prop_assert_eq!(cache.remove(&k), model.delete(k));
                    },
                }
                prop_assert_eq!(cache.len(), model.slots.len());
                for key in 0u8..12 {
                    prop_assert_eq!(cache.frequency(&key), model.frequency(key));
                }
                let expected = model.victim().map(|index| model.slots[index].key);
                prop_assert_eq!(cache.peek_lfu().map(|(k, _)| *k), expected);
            }
        }
    }
}
