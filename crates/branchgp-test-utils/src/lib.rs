//! Testing utilities for the branchgp workspace
//!
//! Shared fixtures, numerical assertions and tracing setup.

#![allow(missing_docs)]

use branchgp_kernel::linalg::{max_asymmetry, min_eigenvalue};
use branchgp_kernel::{AugmentedInputs, BranchKernel, BranchLocations, BranchTopology, Matern32};
use ndarray::Array2;

/// Eigenvalues below this count as a PSD violation
pub const PSD_TOLERANCE: f64 = 1e-8;

/// Location of the branch point in every fixture
pub const FORK_AT: f64 = 0.5;

/// `n` evenly spaced values from `start` to `end` inclusive
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// A kernel together with the inputs it is evaluated on
#[derive(Debug, Clone)]
pub struct Fixture {
    pub kernel: BranchKernel<Matern32>,
    pub inputs: AugmentedInputs,
    pub locations: BranchLocations,
}

impl Fixture {
    pub fn new(topology: BranchTopology, locations: Vec<f64>, inputs: AugmentedInputs) -> Self {
        let locations = BranchLocations::new(locations);
        let kernel = BranchKernel::new(Matern32::default(), topology, locations.clone())
            .expect("fixture topology is symmetric");
        Self {
            kernel,
            inputs,
            locations,
        }
    }
}

/// Label positions up to the fork with the trunk (function 1) and deal the
/// rest round-robin over `after`
pub fn split_at_fork(positions: &[f64], after: &[usize]) -> AugmentedInputs {
    let mut dealt = 0;
    AugmentedInputs::from_pairs(positions.iter().map(|&p| {
        if p <= FORK_AT || after.is_empty() {
            (p, 1)
        } else {
            let f = after[dealt % after.len()];
            dealt += 1;
            (p, f)
        }
    }))
    .expect("fixture labels start at 1")
}

/// Two functions forking at 0.5; 20 positions in `[0, 1]`, those past the
/// fork alternating between the trunk and the branch
pub fn two_function_fork() -> Fixture {
    Fixture::new(
        BranchTopology::single_fork(2).expect("two functions"),
        vec![FORK_AT],
        split_at_fork(&linspace(0.0, 1.0, 20), &[2, 1]),
    )
}

/// Trunk (function 1) splitting into functions 2 and 3 at 0.5
pub fn three_function_fork() -> Fixture {
    Fixture::new(
        BranchTopology::single_fork(3).expect("three functions"),
        vec![FORK_AT],
        split_at_fork(&linspace(0.0, 1.0, 30), &[2, 3]),
    )
}

/// Functions 2 and 3 both meet the trunk at 0.5 but share no branch point
/// with each other
pub fn uncoupled_pair() -> Fixture {
    let topology = BranchTopology::builder(3, 1)
        .couple(1, 2, &[1])
        .couple(1, 3, &[1])
        .build()
        .expect("valid topology");
    let positions = linspace(0.0, 1.0, 12);
    let inputs = AugmentedInputs::expand(&positions, 3);
    Fixture::new(topology, vec![FORK_AT], inputs)
}

/// Topology referencing branch point 2 while only one location exists
pub fn out_of_range() -> Fixture {
    let topology = BranchTopology::builder(2, 1)
        .couple(1, 2, &[2])
        .build()
        .expect("valid topology");
    Fixture::new(
        topology,
        vec![FORK_AT],
        split_at_fork(&linspace(0.0, 1.0, 10), &[2]),
    )
}

/// Smallest eigenvalue is not below `-PSD_TOLERANCE`
pub fn is_psd(k: &Array2<f64>) -> bool {
    min_eigenvalue(k).is_ok_and(|v| v >= -PSD_TOLERANCE)
}

#[track_caller]
pub fn assert_psd(k: &Array2<f64>) {
    let min = min_eigenvalue(k).expect("square matrix");
    assert!(min >= -PSD_TOLERANCE, "matrix not PSD: min eigenvalue {min:e}");
}

#[track_caller]
pub fn assert_symmetric(k: &Array2<f64>, tol: f64) {
    let asym = max_asymmetry(k);
    assert!(asym <= tol, "matrix not symmetric: max |K - K^T| = {asym:e}");
}

/// Install a test subscriber honouring `RUST_LOG`; repeated calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("branchgp=trace")),
        )
        .with_test_writer()
        .try_init();
}
