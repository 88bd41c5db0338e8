use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use spkmeans::{JacobiConfig, JacobiSolver, PointSet, SpectralPipeline};

fn random_blobs(clusters: usize, per_cluster: usize, seed: u64) -> PointSet {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut rows = Vec::with_capacity(clusters * per_cluster);
    for c in 0..clusters {
        let center = (c as f64 * 12.0, (c % 2) as f64 * 12.0);
        for _ in 0..per_cluster {
            rows.push(vec![
                center.0 + rng.gen_range(-1.0..1.0),
                center.1 + rng.gen_range(-1.0..1.0),
            ]);
        }
    }
    PointSet::from_rows(rows).expect("points")
}

fn bench_spectral_pipeline(c: &mut Criterion) {
    let small = random_blobs(3, 10, 42);
    let medium = random_blobs(4, 24, 7);
    let pipeline = SpectralPipeline::default();

    let mut group = c.benchmark_group("spectral_pipeline");

    group.bench_function("laplacian_30", |b| {
        b.iter(|| {
            let lap = pipeline.laplacian(&small).expect("laplacian");
            black_box(lap);
        });
    });

    group.bench_function("jacobi_30", |b| {
        let lap = pipeline.laplacian(&small).expect("laplacian");
        let solver = JacobiSolver::new(JacobiConfig {
            max_rotations: 5_000,
            ..JacobiConfig::default()
        });
        b.iter(|| {
            let eigen = solver.solve(&lap).expect("eigen");
            black_box(eigen);
        });
    });

    group.bench_function("cluster_96", |b| {
        b.iter(|| {
            let summary = pipeline.cluster(&medium, Some(4), None).expect("cluster");
            black_box(summary.assignment);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_spectral_pipeline);
criterion_main!(benches);
