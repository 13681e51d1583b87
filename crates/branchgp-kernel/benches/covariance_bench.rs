use branchgp_kernel::prelude::*;
use branchgp_kernel::sampling::sample;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Positions per function
const SIZES: &[usize] = &[25, 50, 100, 200];

/// Function counts for a single fork
const FUNCTIONS: &[usize] = &[2, 4, 8];

fn positions(n: usize) -> Vec<f64> {
    (0..n).map(|i| i as f64 / n as f64).collect()
}

fn fork_kernel(functions: usize) -> BranchKernel<Matern32> {
    BranchKernel::new(
        Matern32::default(),
        BranchTopology::single_fork(functions).unwrap(),
        BranchLocations::new(vec![0.5]),
    )
    .unwrap()
}

fn bench_branch_covariance(c: &mut Criterion) {
    let mut group = c.benchmark_group("Branch covariance K(X, X)");

    for &f in FUNCTIONS {
        let kernel = fork_kernel(f);
        for &n in SIZES {
            let x = AugmentedInputs::expand(&positions(n), f);
            group.throughput(Throughput::Elements((x.len() * x.len()) as u64));
            group.bench_with_input(BenchmarkId::new(format!("F={f}"), n), &x, |bencher, x| {
                bencher.iter(|| kernel.covariance(black_box(x), None).unwrap());
            });
        }
    }

    group.finish();
}

fn bench_independent_covariance(c: &mut Criterion) {
    let mut group = c.benchmark_group("Independent covariance K(X, X)");
    let kernel = IndependentKernel::new(Matern32::default());

    for &n in SIZES {
        let x = AugmentedInputs::expand(&positions(n), 4);
        group.throughput(Throughput::Elements((x.len() * x.len()) as u64));
        group.bench_with_input(BenchmarkId::new("F=4", n), &x, |bencher, x| {
            bencher.iter(|| kernel.covariance(black_box(x), None).unwrap());
        });
    }

    group.finish();
}

fn bench_location_update(c: &mut Criterion) {
    let kernel = fork_kernel(3);
    let x = AugmentedInputs::expand(&positions(100), 3);
    let mut step = 0u32;

    c.bench_function("move branch point then evaluate", |bencher| {
        bencher.iter(|| {
            step = step.wrapping_add(1);
            kernel.locations().set(1, 0.4 + f64::from(step % 20) * 0.01);
            kernel.covariance(black_box(&x), None).unwrap()
        });
    });
}

fn bench_sampling(c: &mut Criterion) {
    let kernel = fork_kernel(3);
    let x = AugmentedInputs::expand(&positions(50), 3);
    let config = SamplingConfig::new().with_dims(4);
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    c.bench_function("sample 150 points, 4 dims", |bencher| {
        bencher.iter(|| sample(&kernel, black_box(&x), &config, &mut rng).unwrap());
    });
}

criterion_group!(
    benches,
    bench_branch_covariance,
    bench_independent_covariance,
    bench_location_update,
    bench_sampling
);
criterion_main!(benches);
