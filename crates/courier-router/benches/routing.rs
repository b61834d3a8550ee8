//! Route lookup benchmarks.
//!
//! Run with: `cargo bench -p courier-router`

use courier_router::Router;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use http::Method;

fn build_router(resources: usize) -> Router {
    let mut router = Router::new();
    for i in 0..resources {
        let plugin = format!("resource{i}");
        let collection = format!("/{plugin}");
        let item = format!("/{plugin}/{{id}}");
        let _ = router.resource(&collection, Method::GET, &plugin, "index", None);
        let _ = router.resource(&collection, Method::POST, &plugin, "create", Some("hal_json"));
        let _ = router.resource(&item, Method::GET, &plugin, "read", None);
        let _ = router.resource(&item, Method::PATCH, &plugin, "update", None);
    }
    router
}

fn bench_lookup(c: &mut Criterion) {
    let router = build_router(100);

    c.bench_function("collection_match", |b| {
        b.iter(|| black_box(router.match_route(&Method::POST, "/resource50")));
    });
    c.bench_function("item_match", |b| {
        b.iter(|| black_box(router.match_route(&Method::PATCH, "/resource50/12345")));
    });
    c.bench_function("method_not_allowed", |b| {
        b.iter(|| black_box(router.lookup(&Method::DELETE, "/resource50/12345")));
    });
    c.bench_function("miss", |b| {
        b.iter(|| black_box(router.match_route(&Method::GET, "/missing/path")));
    });
}

fn bench_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("scaling");

    for resources in [10, 100, 1000] {
        let router = build_router(resources);
        let path = format!("/resource{}/42", resources / 2);
        group.bench_with_input(BenchmarkId::new("item_match", resources), &path, |b, path| {
            b.iter(|| black_box(router.match_route(&Method::GET, path)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_lookup, bench_scaling);
criterion_main!(benches);
