//! Performance benchmarks for goomaps-engine

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use goomaps_engine::headless::{HeadlessDocument, HeadlessService};
use goomaps_engine::{value, Config, Criteria, Goomaps, MapOptions, MarkerSpec, Operation};
use serde_json::{json, Value};
use std::rc::Rc;

fn marker_spec(i: usize) -> MarkerSpec {
    MarkerSpec::new(json!({
        "position": [50.0 + (i % 100) as f64 * 0.01, (i / 100) as f64 * 0.01],
        "title": format!("Marker {}", i),
        "uid": format!("id_{}", i),
        "data": {"group": i % 10, "tags": ["a", "b"], "meta": {"rank": i}}
    }))
}

fn populated(size: usize) -> Goomaps {
    let mut goomaps = Goomaps::new(
        Rc::new(HeadlessService::new()),
        Rc::new(HeadlessDocument::new()),
        Config::default(),
    );
    goomaps.init(&["map"], &MapOptions::new()).unwrap();
    let specs: Vec<_> = (0..size).map(marker_spec).collect();
    goomaps.set_markers(&["map"], &specs).unwrap();
    goomaps
}

fn bench_marker_building(c: &mut Criterion) {
    let mut group = c.benchmark_group("marker_building");

    for size in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("set_markers", size), size, |b, &size| {
            let specs: Vec<_> = (0..size).map(marker_spec).collect();
            b.iter(|| {
                let mut goomaps = populated(0);
                goomaps.set_markers(&["map"], black_box(&specs)).unwrap()
            })
        });
    }

    group.finish();
}

fn bench_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("selection");

    for size in [100, 1000].iter() {
        let goomaps = populated(*size);

        group.bench_with_input(BenchmarkId::new("all", size), size, |b, _| {
            b.iter(|| goomaps.get_markers(&["map"], black_box(&Criteria::All)))
        });

        group.bench_with_input(BenchmarkId::new("uid", size), size, |b, &size| {
            let criteria = Criteria::Uid(format!("id_{}", size / 2));
            b.iter(|| goomaps.get_markers(&["map"], black_box(&criteria)))
        });

        group.bench_with_input(BenchmarkId::new("subset", size), size, |b, _| {
            let criteria = Criteria::Subset(json!({"data": {"group": 3, "meta": {}}}));
            b.iter(|| goomaps.get_markers(&["map"], black_box(&criteria)))
        });
    }

    group.finish();
}

fn bench_subset(c: &mut Criterion) {
    let mut group = c.benchmark_group("subset");

    let mut haystack = json!({"leaf": true});
    for i in 0..16 {
        haystack = json!({ "level": i, "child": haystack, "noise": [1, 2, 3] });
    }
    let needle: Value = haystack.clone();

    group.bench_function("deep_match", |b| {
        b.iter(|| value::is_subset(black_box(&needle), black_box(&haystack), 32))
    });

    group.finish();
}

fn bench_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("parsing");

    let markers = Value::Array(
        (0..100)
            .map(|i| json!({"options": {"position": [i, i], "uid": format!("id_{}", i)}}))
            .collect(),
    );

    group.bench_function("setmarkers_from_json", |b| {
        b.iter(|| Operation::from_name("setmarkers", black_box(&markers)))
    });

    group.bench_function("criteria_from_json", |b| {
        let criteria = json!({"data": {"hello": "world"}});
        b.iter(|| Criteria::from_value(black_box(&criteria)))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_marker_building,
    bench_selection,
    bench_subset,
    bench_parsing,
);
criterion_main!(benches);
