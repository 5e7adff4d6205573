//! Benchmarks for geodesic evaluation and parallel transport.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use secantopt_manifolds::{Geodesic, Grassmann};

fn bench_geodesic(c: &mut Criterion) {
    let mut group = c.benchmark_group("geodesic");
    for &(n, k) in &[(10, 2), (100, 5), (500, 10)] {
        let gr = Grassmann::<f64>::new(n, k).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let w = gr.random_point_with(&mut rng);
        let h = gr.random_tangent_with(&w, &mut rng).unwrap();
        let geo = Geodesic::new(&w, &h).unwrap();

        group.bench_with_input(BenchmarkId::new("construct", n), &(n, k), |b, _| {
            b.iter(|| Geodesic::new(black_box(&w), black_box(&h)).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("at", n), &(n, k), |b, _| {
            b.iter(|| geo.at(black_box(0.3)))
        });
        group.bench_with_input(BenchmarkId::new("transport", n), &(n, k), |b, _| {
            b.iter(|| geo.parallel_translate(black_box(&h), black_box(0.3)).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_geodesic);
criterion_main!(benches);
