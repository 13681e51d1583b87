use branchgp_kernel::linalg::max_asymmetry;
use branchgp_kernel::prelude::*;
use branchgp_kernel::{Matern52, TraceConfig};
use branchgp_test_utils::{assert_psd, init_tracing, linspace, three_function_fork, FORK_AT};
use ndarray::Array3;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn labelled_inputs() -> impl Strategy<Value = AugmentedInputs> {
    proptest::collection::vec((0.0..1.0f64, 1..=3usize), 1..25)
        .prop_map(|pairs| AugmentedInputs::from_pairs(pairs).unwrap())
}

fn fork_kernel(at: f64) -> BranchKernel<Matern32> {
    BranchKernel::new(
        Matern32::default(),
        BranchTopology::single_fork(3).unwrap(),
        BranchLocations::new(vec![at]),
    )
    .unwrap()
}

proptest! {
    #[test]
    fn prop_covariance_is_symmetric(x in labelled_inputs(), at in 0.05..0.95f64) {
        let k = fork_kernel(at).covariance(&x, None).unwrap();
        prop_assert!(max_asymmetry(&k) < 1e-10);
    }

    #[test]
    fn prop_same_function_entries_equal_base(x in labelled_inputs(), at in 0.05..0.95f64) {
        let kernel = fork_kernel(at);
        let k = kernel.covariance(&x, None).unwrap();
        let base = kernel.base().gram(x.positions());
        for i in 0..x.len() {
            for j in 0..x.len() {
                if x.functions()[i] == x.functions()[j] {
                    prop_assert_eq!(k[[i, j]], base[[i, j]]);
                }
            }
        }
    }

    #[test]
    fn prop_independent_cross_entries_are_zero(x in labelled_inputs()) {
        let k = IndependentKernel::new(Matern32::default()).covariance(&x, None).unwrap();
        for i in 0..x.len() {
            for j in 0..x.len() {
                if x.functions()[i] != x.functions()[j] {
                    prop_assert_eq!(k[[i, j]], 0.0);
                }
            }
        }
    }

    #[test]
    fn prop_fork_covariance_is_psd(x in labelled_inputs(), at in 0.05..0.95f64) {
        let k = fork_kernel(at).covariance(&x, None).unwrap();
        prop_assert!(branchgp_test_utils::is_psd(&k));
    }
}

#[test]
fn cross_covariance_converges_at_branch_point() {
    let kernel = fork_kernel(FORK_AT);
    let variance = kernel.base().variance();
    let mut previous = f64::INFINITY;
    for eps in [1e-1, 1e-2, 1e-3, 1e-4] {
        let k = kernel
            .pair_covariance(1, 2, &[FORK_AT - eps], &[FORK_AT + eps])
            .unwrap();
        let gap = (k[[0, 0]] - variance).abs();
        assert!(gap < previous, "gap {gap} did not shrink at eps {eps}");
        previous = gap;
    }
    assert!(previous < 1e-5);
}

#[test]
fn moving_branch_point_changes_only_cross_blocks() {
    let fixture = three_function_fork();
    let x = &fixture.inputs;
    let before = fixture.kernel.covariance(x, None).unwrap();

    fixture.locations.set(1, 0.3);
    let after = fixture.kernel.covariance(x, None).unwrap();

    let mut changed = 0;
    for i in 0..x.len() {
        for j in 0..x.len() {
            if x.functions()[i] == x.functions()[j] {
                assert_eq!(before[[i, j]], after[[i, j]]);
            } else if before[[i, j]] != after[[i, j]] {
                changed += 1;
            }
        }
    }
    assert!(changed > 0);
}

#[test]
fn evaluations_read_locations_at_call_time() {
    let locations = BranchLocations::new(vec![0.5]);
    let kernel = BranchKernel::new(
        Matern32::default(),
        BranchTopology::single_fork(2).unwrap(),
        locations.clone(),
    )
    .unwrap();
    let x = AugmentedInputs::from_pairs([(0.6, 1), (0.6, 2)]).unwrap();

    let at_half = kernel.covariance(&x, None).unwrap()[[0, 1]];
    locations.replace(vec![0.6]);
    let at_point = kernel.covariance(&x, None).unwrap()[[0, 1]];

    assert!(at_point > at_half);
    assert!((at_point - 1.0).abs() < 1e-5);
    assert_eq!(kernel.covariance_at(&[0.5], &x, None).unwrap()[[0, 1]], at_half);
}

#[test]
fn float_tensor_topology_matches_builder() {
    let mut t = Array3::from_elem((3, 3, 1), f64::NAN);
    for (i, j) in [(0, 1), (1, 0), (0, 2), (2, 0)] {
        t[[i, j, 0]] = 1.0;
    }
    let from_floats = BranchTopology::from_float_tensor(&t).unwrap();
    let built = BranchTopology::builder(3, 1)
        .couple(1, 2, &[1])
        .couple(1, 3, &[1])
        .build()
        .unwrap();
    assert_eq!(from_floats, built);
}

#[test]
fn multiple_branch_points_per_pair() {
    let topology = BranchTopology::builder(2, 2).couple(1, 2, &[1, 2]).build().unwrap();
    let kernel = BranchKernel::new(
        Matern52::default(),
        topology,
        BranchLocations::new(vec![0.3, 0.6]),
    )
    .unwrap();
    let x = AugmentedInputs::expand(&linspace(0.0, 1.0, 8), 2);
    let k = kernel.covariance(&x, None).unwrap();
    assert_psd(&k);
    assert!(max_asymmetry(&k) < 1e-10);

    // conditioning on both points: the pair agrees at either location
    let at_points = kernel.pair_covariance(1, 2, &[0.3, 0.6], &[0.3, 0.6]).unwrap();
    assert!((at_points[[0, 0]] - 1.0).abs() < 1e-4);
    assert!((at_points[[1, 1]] - 1.0).abs() < 1e-4);
}

#[test]
fn branch_kernel_plus_white_noise() {
    let fixture = three_function_fork();
    let noisy = CovarianceSum::new(&fixture.kernel, AugmentedWhite::new(White::new(0.01).unwrap()));
    let x = &fixture.inputs;
    let clean = fixture.kernel.covariance(x, None).unwrap();
    let k = noisy.covariance(x, None).unwrap();
    for i in 0..x.len() {
        assert!((k[[i, i]] - clean[[i, i]] - 0.01).abs() < 1e-12);
    }
    let kxy = noisy.covariance(x, Some(x)).unwrap();
    assert_eq!(kxy, fixture.kernel.covariance(x, Some(x)).unwrap());
}

#[test]
fn traced_evaluation_matches_untraced() {
    init_tracing();
    let topology = BranchTopology::single_fork(3).unwrap();
    let locations = BranchLocations::new(vec![0.5]);
    let quiet = BranchKernel::new(Matern32::default(), topology.clone(), locations.clone()).unwrap();
    let traced = BranchKernel::with_config(
        Matern32::default(),
        topology,
        locations,
        KernelConfig::new().with_trace(TraceConfig::on()),
    )
    .unwrap();

    let x = three_function_fork().inputs;
    assert_eq!(
        quiet.covariance(&x, None).unwrap(),
        traced.covariance(&x, None).unwrap()
    );
}

#[test]
fn config_from_toml_feeds_kernel() {
    let config = KernelConfig::from_toml_str(
        r"
        jitter = 1e-4
        validate_symmetry = false

        [trace]
        enabled = true
        summarize = 3
        ",
    )
    .unwrap();
    assert_eq!(config.jitter, 1e-4);
    assert!(!config.validate_symmetry);
    assert_eq!(config.trace.summarize, 3);

    let kernel = BranchKernel::with_config(
        SquaredExponential::default(),
        BranchTopology::single_fork(2).unwrap(),
        BranchLocations::new(vec![0.5]),
        config,
    )
    .unwrap();
    let k = kernel.pair_covariance(1, 2, &[0.5], &[0.5]).unwrap();
    assert!((k[[0, 0]] - 1.0 / (1.0 + 1e-4)).abs() < 1e-12);
}

#[test]
fn negative_jitter_is_rejected() {
    let err = BranchKernel::with_config(
        Matern32::default(),
        BranchTopology::single_fork(2).unwrap(),
        BranchLocations::new(vec![0.5]),
        KernelConfig::new().with_jitter(-1.0),
    )
    .unwrap_err();
    assert!(matches!(err, KernelError::Config(_)));
}
