use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pairclust::{compute, global_matrix, reorder, AlgorithmParams, FeatureTable, ReorderMethod};
use rand::prelude::*;

fn table(n: usize, d: usize) -> FeatureTable {
    let mut rng = StdRng::seed_from_u64(42);
    FeatureTable::from_columns((0..d).map(|f| {
        let col: Vec<f64> = (0..n).map(|_| rng.random::<f64>() * 10.0).collect();
        (format!("f{f}"), col)
    }))
    .unwrap()
}

fn bench_pairwise(c: &mut Criterion) {
    let mut group = c.benchmark_group("pairwise");

    let data = table(500, 8);
    let features = data.numeric_columns().to_vec();
    let kmeans = AlgorithmParams::Kmeans {
        k: 4,
        max_iterations: 50,
        seed: Some(42),
    };
    let dbscan = AlgorithmParams::Dbscan {
        eps: 0.5,
        min_samples: 5,
    };

    group.bench_function("kmeans_n500_f8_k4", |b| {
        b.iter(|| compute(black_box(&data), &features, &kmeans).unwrap())
    });
    group.bench_function("dbscan_n500_f8", |b| {
        b.iter(|| compute(black_box(&data), &features, &dbscan).unwrap())
    });

    let clusters = compute(&data, &features, &kmeans).unwrap();
    let matrix = global_matrix(&clusters);
    group.bench_function("global_matrix_112", |b| {
        b.iter(|| global_matrix(black_box(&clusters)))
    });
    group.bench_function("reorder_optimal_112", |b| {
        b.iter(|| reorder(black_box(&matrix), ReorderMethod::Optimal))
    });

    group.finish();
}

criterion_group!(benches, bench_pairwise);
criterion_main!(benches);
