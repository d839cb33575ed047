//! Per-policy micro benchmarks on the single-threaded engines.
//!
//! Run with: `cargo bench --bench policies`

use std::hint::black_box;
use std::time::Duration;

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use localcache::prelude::*;

const CAPACITY: usize = 1024;

fn filled<C: CoreCache<u64, u64> + FromConfig>(capacity: usize) -> C {
    let config = CacheConfig::new(capacity);
    let mut cache = match C::from_config(config) {
        Ok(cache) => cache,
        Err(err) => panic!("bench config rejected: {err}"),
    };
    for i in 0..capacity as u64 {
        cache.insert(i, i);
    }
    cache
}

fn bench_insert_get<C: CoreCache<u64, u64> + FromConfig>(c: &mut Criterion, name: &str) {
    c.bench_function(&format!("{name}_insert_get"), |b| {
        b.iter_batched(
            || filled::<C>(CAPACITY),
            |mut cache| {
                for i in 0..CAPACITY as u64 {
                    cache.insert(black_box(i + 10_000), i);
                    let _ = black_box(cache.get(&black_box(i)));
                }
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_eviction_churn<C: CoreCache<u64, u64> + FromConfig>(c: &mut Criterion, name: &str) {
    c.bench_function(&format!("{name}_eviction_churn"), |b| {
        b.iter_batched(
            || filled::<C>(CAPACITY),
            |mut cache| {
                for i in 0..4 * CAPACITY as u64 {
                    cache.insert(black_box(10_000 + i), i);
                }
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_lru_ops(c: &mut Criterion) {
    bench_insert_get::<LruCore<u64, u64>>(c, "lru");
    bench_eviction_churn::<LruCore<u64, u64>>(c, "lru");

    c.bench_function("lru_pop_lru", |b| {
        b.iter_batched(
            || filled::<LruCore<u64, u64>>(CAPACITY),
            |mut cache| {
                for _ in 0..CAPACITY {
                    let _ = black_box(cache.pop_lru());
                }
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_fifo_ops(c: &mut Criterion) {
    bench_insert_get::<FifoCore<u64, u64>>(c, "fifo");
    bench_eviction_churn::<FifoCore<u64, u64>>(c, "fifo");
}

fn bench_lfu_ops(c: &mut Criterion) {
    bench_insert_get::<LfuCore<u64, u64>>(c, "lfu");
    bench_eviction_churn::<LfuCore<u64, u64>>(c, "lfu");

    c.bench_function("lfu_frequency_climb", |b| {
        b.iter_batched(
            || filled::<LfuCore<u64, u64>>(CAPACITY),
            |mut cache| {
                for round in 0..8u64 {
                    for i in 0..(CAPACITY as u64 >> round) {
                        let _ = black_box(cache.get(&i));
                    }
                }
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_ttl_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("purge_expired");
    for expired_share in [10u64, 50, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(expired_share), &expired_share, |b, &share| {
            b.iter_batched(
                || {
                    let clock = ManualClock::new();
                    let mut config = CacheConfig::new(CAPACITY);
                    config.clock = std::sync::Arc::new(clock.clone());
                    let mut cache = match LruCore::<u64, u64>::with_config(config) {
                        Ok(cache) => cache,
                        Err(err) => panic!("bench config rejected: {err}"),
                    };
                    for i in 0..CAPACITY as u64 {
                        let ttl = (i % 100 < share).then_some(Duration::from_millis(1));
                        cache.set(i, i, ttl);
                    }
                    clock.advance(Duration::from_millis(1));
                    cache
                },
                |mut cache| black_box(cache.purge_expired()),
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_lru_ops,
    bench_fifo_ops,
    bench_lfu_ops,
    bench_ttl_sweep
);
criterion_main!(benches);
