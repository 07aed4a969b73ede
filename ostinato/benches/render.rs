//! Microbenchmarks for the rollup hot path: dump and render.
//!
//! Run with: `cargo bench -p ostinato -- render`

#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use ostinato::{Measurement, RollingStore, render};

/// Builds a store populated with `series_count` distinct series.
fn setup_store(series_count: u32) -> RollingStore {
    let mut store = RollingStore::new(2);
    for i in 0..series_count {
        store.insert(
            Measurement::new(format!("metric_{i}"), f64::from(i))
                .with_label("host", format!("host-{}", i % 16))
                .with_label("zone", "bench"),
        );
    }
    store
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render/series_count");

    for count in [10, 100, 1000] {
        let store = setup_store(count);
        let dumped = store.dump();

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| render(black_box(&dumped)));
        });
    }

    group.finish();
}

fn bench_dump(c: &mut Criterion) {
    let mut group = c.benchmark_group("dump/series_count");

    for count in [10, 100, 1000] {
        let store = setup_store(count);

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| black_box(store.dump()));
        });
    }

    group.finish();
}

fn bench_insert(c: &mut Criterion) {
    let mut store = RollingStore::new(2);

    c.bench_function("insert/single_series", |b| {
        b.iter(|| {
            store.insert(black_box(
                Measurement::new("latency", 1.5).with_label("host", "a"),
            ));
        });
    });
}

criterion_group!(benches, bench_render, bench_dump, bench_insert);
criterion_main!(benches);
