//! Benchmarks for pipeline pull throughput and state export.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use datapipe_rs::{read_sequence, Item, Pipeline, PipelineResult};

fn ints(n: i64) -> Vec<Item> {
    (0..n).map(Item::Int).collect()
}

fn drain(pipeline: &mut Pipeline) -> usize {
    let mut count = 0;
    while let Ok(Some(item)) = pipeline.pull() {
        black_box(item);
        count += 1;
    }
    count
}

fn bench_map_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_chain");

    for size in [1_000i64, 10_000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("pull_all", size), size, |b, &size| {
            let mut pipeline = read_sequence(ints(size))
                .map(|item| Ok(Item::Int(item.as_int().unwrap() + 1)))
                .map(|item| Ok(Item::Int(item.as_int().unwrap() * 2)))
                .and_return()
                .unwrap();
            b.iter(|| {
                pipeline.reset();
                black_box(drain(&mut pipeline))
            });
        });
    }

    group.finish();
}

fn range_mapper(item: &Item) -> PipelineResult<Pipeline> {
    let bounds = item.as_list().expect("pair");
    let a = bounds[0].as_int().unwrap();
    let b = bounds[1].as_int().unwrap();
    read_sequence((a..b).map(Item::Int).collect()).and_return()
}

fn bench_yield_from(c: &mut Criterion) {
    let mut group = c.benchmark_group("yield_from");

    for width in [10i64, 100].iter() {
        // 100 upstream items, each expanding to `width` sub-items.
        let pairs: Vec<Item> = (0..100)
            .map(|i| Item::List(vec![Item::Int(i * width), Item::Int((i + 1) * width)]))
            .collect();
        group.throughput(Throughput::Elements(100 * *width as u64));
        group.bench_with_input(BenchmarkId::new("pull_all", width), &pairs, |b, pairs| {
            let mut pipeline = read_sequence(pairs.clone())
                .yield_from(range_mapper)
                .and_return()
                .unwrap();
            b.iter(|| {
                pipeline.reset();
                black_box(drain(&mut pipeline))
            });
        });
    }

    group.finish();
}

fn bench_state_export(c: &mut Criterion) {
    let mut group = c.benchmark_group("state_export");

    // Park the cursor inside a nested sub-pipeline, then export repeatedly.
    let pairs: Vec<Item> = (0..50)
        .map(|i| Item::List(vec![Item::Int(i * 10), Item::Int((i + 1) * 10)]))
        .collect();
    let mut pipeline = read_sequence(pairs)
        .yield_from(range_mapper)
        .and_return()
        .unwrap();
    for _ in 0..255 {
        pipeline.pull().unwrap();
    }

    group.bench_function("export_mid_sub_pipeline", |b| {
        b.iter(|| black_box(pipeline.export_state().unwrap()));
    });

    group.bench_function("export_to_json", |b| {
        let state = pipeline.export_state().unwrap();
        b.iter(|| black_box(state.to_json().unwrap()));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_map_chain,
    bench_yield_from,
    bench_state_export
);
criterion_main!(benches);
