//! Benchmarks for store ingestion and queries

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use mavstore::{DecodedRecord, RawStore, RingBuffer, StoreConfig};

fn generate_records(count: usize) -> Vec<DecodedRecord> {
    (0..count)
        .map(|i| {
            DecodedRecord::new(i as u64 * 10, 1, (i % 3) as u8, (i % 20) as u32)
                .with_field("roll", (i as f64 * 0.01).sin())
                .with_field("pitch", (i as f64 * 0.01).cos())
                .with_field("time_boot_ms", i as u64)
        })
        .collect()
}

fn bench_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply");

    let records = generate_records(1000);
    group.throughput(Throughput::Elements(1000));

    group.bench_function("apply_1000_records", |b| {
        b.iter(|| {
            let mut store = RawStore::new();
            for r in &records {
                store.apply(r.clone());
            }
            black_box(store.entry_count());
        })
    });

    group.finish();
}

fn bench_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("queries");

    let mut store = RawStore::new();
    for r in generate_records(10_000) {
        store.apply(r);
    }

    group.bench_function("get_raw_cross_component", |b| {
        b.iter(|| black_box(store.get_raw(1, black_box(7), None)))
    });

    group.bench_function("list_msg_ids_union", |b| {
        b.iter(|| black_box(store.list_msg_ids(1, None)))
    });

    group.bench_function("detail_with_history", |b| {
        b.iter(|| black_box(store.get_msg_detail(1, 1, 7, true)))
    });

    group.finish();
}

fn bench_resize(c: &mut Criterion) {
    let mut group = c.benchmark_group("resize");

    group.bench_function("ring_buffer_shrink_grow", |b| {
        b.iter(|| {
            let mut buf = RingBuffer::new(256).unwrap();
            for i in 0..1000u32 {
                buf.push(i);
            }
            buf.set_capacity(16).unwrap();
            buf.set_capacity(256).unwrap();
            black_box(buf.len())
        })
    });

    group.bench_function("store_set_history_size", |b| {
        let records = generate_records(5000);
        b.iter(|| {
            let mut store =
                RawStore::with_config(StoreConfig::default().with_history_size(128)).unwrap();
            for r in &records {
                store.apply(r.clone());
            }
            store.set_history_size(8).unwrap();
            black_box(store.history_size())
        })
    });

    group.finish();
}

criterion_group!(benches, bench_apply, bench_queries, bench_resize);
criterion_main!(benches);
