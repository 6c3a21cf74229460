//! ember - Performance Benchmarks
//! Measures throughput of core store operations using Criterion.

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use ember::engine::store::Store;

fn populated_store(n: usize) -> Store {
    let mut store = Store::new();
    for i in 0..n {
        store.set(format!("key_{i:06}"), format!("value_{i:06}"), None);
    }
    store
}

fn bench_store_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("store");

    // Benchmark: Sequential inserts
    group.bench_function("insert_1000", |b| {
        b.iter(|| {
            let mut store = Store::new();
            for i in 0..1000 {
                store.set(
                    black_box(format!("key_{i:06}")),
                    black_box(format!("value_{i:06}")),
                    None,
                );
            }
        });
    });

    // Benchmark: Point lookups
    group.bench_function("get_hit", |b| {
        let store = populated_store(1000);
        let now = Utc::now();
        b.iter(|| {
            black_box(store.get("key_000500", now));
        });
    });

    // Benchmark: Point lookup miss
    group.bench_function("get_miss", |b| {
        let store = populated_store(1000);
        let now = Utc::now();
        b.iter(|| {
            black_box(store.get("missing_key", now));
        });
    });

    // Benchmark: Bounded range over a tenth of the keyspace
    group.bench_function("range_100", |b| {
        let store = populated_store(1000);
        let now = Utc::now();
        b.iter(|| {
            black_box(store.range(Some("key_000400"), Some("key_000499"), now));
        });
    });

    group.finish();
}

fn bench_ttl_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("ttl");

    group.bench_function("remaining_ttl", |b| {
        let mut store = populated_store(1000);
        let now = Utc::now();
        store.set_expiry("key_000500", Some(now + chrono::Duration::seconds(60)));
        b.iter(|| {
            black_box(store.remaining_ttl("key_000500", now));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_store_operations, bench_ttl_operations);
criterion_main!(benches);
