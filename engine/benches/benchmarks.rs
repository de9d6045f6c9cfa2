//! Performance benchmarks for plank-engine

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use plank_engine::{
    decode, Change, ChangeEvent, Collection, Input, Record, ReconnectPolicy, SyncState,
};
use serde_json::json;

fn test_record(id: i64) -> Record {
    serde_json::from_value(json!({
        "id": id,
        "name": format!("item {}", id),
        "value": id * 10,
        "created_at": "2024-01-15T10:30:00.123456",
        "updated_at": "2024-01-15T10:30:00.123456"
    }))
    .unwrap()
}

fn populated(size: i64) -> Collection {
    (0..size).map(test_record).collect()
}

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");

    let insert = ChangeEvent::new("items", Change::Insert(test_record(1)))
        .to_notification()
        .encode();
    let delete = r#"{"action":"DELETE","table":"items","id":1}"#;

    group.bench_function("decode_insert", |b| b.iter(|| decode(black_box(&insert))));
    group.bench_function("decode_delete", |b| b.iter(|| decode(black_box(delete))));
    group.bench_function("decode_malformed", |b| {
        b.iter(|| decode(black_box("not json")))
    });

    group.finish();
}

fn bench_reducer(c: &mut Criterion) {
    let mut group = c.benchmark_group("reducer");

    for size in [100i64, 1_000, 10_000] {
        let collection = populated(size);

        group.bench_with_input(BenchmarkId::new("insert_new", size), &size, |b, &size| {
            let change = Change::Insert(test_record(size + 1));
            b.iter(|| collection.clone().apply(black_box(&change)))
        });

        group.bench_with_input(BenchmarkId::new("update_last", size), &size, |b, _| {
            let change = Change::Update(test_record(0));
            b.iter(|| collection.clone().apply(black_box(&change)))
        });

        group.bench_with_input(BenchmarkId::new("delete_middle", size), &size, |b, &size| {
            let change = Change::Delete(size / 2);
            b.iter(|| collection.clone().apply(black_box(&change)))
        });
    }

    group.finish();
}

fn bench_state(c: &mut Criterion) {
    let mut group = c.benchmark_group("state");

    group.bench_function("handle_insert_frame", |b| {
        let mut state = SyncState::new("items", ReconnectPolicy::default());
        state.handle(Input::Connect, 0);
        state.handle(Input::Opened, 0);
        let mut id = 0i64;

        b.iter(|| {
            id += 1;
            let frame = ChangeEvent::new("items", Change::Insert(test_record(id % 1000)))
                .to_notification()
                .encode();
            state.handle(black_box(Input::Message(frame)), 0)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_codec, bench_reducer, bench_state);
criterion_main!(benches);
