//! Branching covariance
//!
//! Functions share one trajectory up to their branch point(s) and evolve
//! independently afterwards. For a pair of distinct functions `(fi, fj)`
//! coupled through branch coordinates `B`, the cross block is the GP
//! conditional covariance through the shared values at `B`:
//!
//! ```text
//! K(fi, fj) = K(X, B) (K(B, B) + jitter I)^-1 K(B, Y)
//! ```
//!
//! Same-function entries are the base kernel over raw positions. Pairs with
//! no branch point are fully independent (zero block).

use super::{label_mask, CovarianceFunction};
use crate::base::BaseKernel;
use crate::config::KernelConfig;
use crate::error::{KernelError, Result, Stage};
use crate::input::AugmentedInputs;
use crate::linalg::{add_jitter, invert_spd};
use crate::locations::BranchLocations;
use crate::topology::BranchTopology;
use crate::trace::Tracer;
use ndarray::{Array1, Array2};
use std::collections::HashMap;

/// Covariance over augmented inputs with GP conditioning at branch points
#[derive(Debug, Clone)]
pub struct BranchKernel<K> {
    base: K,
    topology: BranchTopology,
    locations: BranchLocations,
    config: KernelConfig,
    tracer: Tracer,
}

impl<K: BaseKernel> BranchKernel<K> {
    /// Create with default configuration
    ///
    /// # Errors
    /// `InvalidTopology` for an asymmetric topology.
    pub fn new(base: K, topology: BranchTopology, locations: BranchLocations) -> Result<Self> {
        Self::with_config(base, topology, locations, KernelConfig::default())
    }

    /// Create with explicit configuration
    ///
    /// # Errors
    /// `Config` for an invalid jitter, `InvalidTopology` for an asymmetric
    /// topology when symmetry validation is on.
    pub fn with_config(
        base: K,
        topology: BranchTopology,
        locations: BranchLocations,
        config: KernelConfig,
    ) -> Result<Self> {
        config.validate()?;
        if config.validate_symmetry {
            topology.check_symmetric()?;
        }
        let tracer = Tracer::new(config.trace);
        let resolved: Vec<_> = topology.pairs().map(|(pair, idx)| (pair, idx.to_vec())).collect();
        tracer.topology(topology.functions(), topology.depth(), &resolved);

        Ok(Self {
            base,
            topology,
            locations,
            config,
            tracer,
        })
    }

    /// Base kernel over raw positions
    #[inline]
    #[must_use]
    pub fn base(&self) -> &K {
        &self.base
    }

    /// Topology
    #[inline]
    #[must_use]
    pub fn topology(&self) -> &BranchTopology {
        &self.topology
    }

    /// Handle to the branch locations read on every evaluation
    #[inline]
    #[must_use]
    pub fn locations(&self) -> &BranchLocations {
        &self.locations
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// `K(X, Y)` against explicit branch coordinates
    ///
    /// Every topology reference is checked against `locations` before any
    /// block is assembled.
    ///
    /// # Errors
    /// `DimensionMismatch` for labels outside the topology, `OutOfRangeIndex`
    /// for references past `locations`, `NonPsd` when a `Kbb` block cannot
    /// be factorised.
    pub fn covariance_at(
        &self,
        locations: &[f64],
        x: &AugmentedInputs,
        y: Option<&AugmentedInputs>,
    ) -> Result<Array2<f64>> {
        let functions = self.topology.functions();
        let _span = tracing::debug_span!(
            "branch_kernel.covariance",
            n = x.len(),
            m = y.map_or(x.len(), AugmentedInputs::len),
            functions
        )
        .entered();

        x.check_functions(functions)?;
        if let Some(y) = y {
            y.check_functions(functions)?;
        }
        self.topology.check_locations(locations.len())?;

        let y_ref = y.unwrap_or(x);
        let mut result = match y {
            Some(y) => self.base.cross(x.positions(), y.positions()),
            None => self.base.gram(x.positions()),
        };

        // Kbb^-1 depends only on the index list; pairs of a fork share it
        let mut inverses: HashMap<&[usize], Array2<f64>> = HashMap::new();

        for ((fi, fj), indices) in self.topology.pairs() {
            let (rows, cols) = label_mask(x.functions(), y_ref.functions(), fi, fj);
            if rows.is_empty() || cols.is_empty() {
                continue;
            }

            if indices.is_empty() {
                for &r in &rows {
                    for &c in &cols {
                        result[[r, c]] = 0.0;
                    }
                }
                self.tracer.assembly(fi, fj, rows.len() * cols.len(), &Array2::zeros((0, 0)));
                continue;
            }

            let branch = self.topology.resolve(fi, fj, locations)?;
            if !inverses.contains_key(indices) {
                let inv = self.invert_branch_block(fi, fj, &branch)?;
                inverses.insert(indices, inv);
            }
            let kbb_inv = &inverses[indices];

            let xs: Vec<f64> = rows.iter().map(|&r| x.positions()[r]).collect();
            let ys: Vec<f64> = cols.iter().map(|&c| y_ref.positions()[c]).collect();
            let block = self.conditional_block(&xs, &ys, &branch, kbb_inv);

            for (bi, &r) in rows.iter().enumerate() {
                for (bj, &c) in cols.iter().enumerate() {
                    result[[r, c]] = block[[bi, bj]];
                }
            }
            self.tracer.assembly(fi, fj, block.len(), &block);
        }

        Ok(result)
    }

    /// Cross covariance between function `fi` at `x` and `fj` at `y`
    ///
    /// Reads the current branch locations. Equal labels give the base kernel.
    ///
    /// # Errors
    /// As [`BranchKernel::covariance_at`].
    pub fn pair_covariance(&self, fi: usize, fj: usize, x: &[f64], y: &[f64]) -> Result<Array2<f64>> {
        let functions = self.topology.functions();
        for f in [fi, fj] {
            if f == 0 || f > functions {
                return Err(KernelError::DimensionMismatch {
                    function: f,
                    functions,
                });
            }
        }
        if fi == fj {
            return Ok(self.base.cross(x, y));
        }
        let indices = self.topology.branch_indices(fi, fj);
        if indices.is_empty() {
            return Ok(Array2::zeros((x.len(), y.len())));
        }
        let branch = self.topology.resolve(fi, fj, &self.locations.snapshot())?;
        let kbb_inv = self.invert_branch_block(fi, fj, &branch)?;
        Ok(self.conditional_block(x, y, &branch, &kbb_inv))
    }

    fn invert_branch_block(&self, fi: usize, fj: usize, branch: &[f64]) -> Result<Array2<f64>> {
        let mut kbb = self.base.gram(branch);
        add_jitter(&mut kbb, self.config.jitter);
        let inv = invert_spd(
            &kbb,
            Stage::BranchBlock {
                row_function: fi,
                col_function: fj,
            },
        )?;
        self.tracer.inversion(fi, fj, branch, &kbb, self.config.jitter);
        Ok(inv)
    }

    fn conditional_block(&self, xs: &[f64], ys: &[f64], branch: &[f64], kbb_inv: &Array2<f64>) -> Array2<f64> {
        let kb1 = self.base.cross(xs, branch);
        let kb2 = self.base.cross(ys, branch);
        kb1.dot(kbb_inv).dot(&kb2.t())
    }
}

impl<K: BaseKernel> CovarianceFunction for BranchKernel<K> {
    fn covariance(&self, x: &AugmentedInputs, y: Option<&AugmentedInputs>) -> Result<Array2<f64>> {
        let locations = self.locations.snapshot();
        self.covariance_at(&locations, x, y)
    }

    /// Single-point self covariance never involves a branch point
    fn covariance_diag(&self, x: &AugmentedInputs) -> Result<Array1<f64>> {
        x.check_functions(self.topology.functions())?;
        Ok(self.base.diag(x.positions()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{Matern32, SquaredExponential};

    fn fork_inputs() -> AugmentedInputs {
        AugmentedInputs::from_pairs([(0.1, 1), (0.3, 1), (0.6, 2), (0.8, 2), (0.7, 3), (0.9, 3)]).unwrap()
    }

    #[test]
    fn same_function_entries_match_base() {
        let base = Matern32::default();
        let k = BranchKernel::new(base, BranchTopology::single_fork(3).unwrap(), vec![0.5].into()).unwrap();
        let x = fork_inputs();
        let cov = k.covariance(&x, None).unwrap();
        let gram = base.gram(x.positions());
        for i in 0..x.len() {
            for j in 0..x.len() {
                if x.functions()[i] == x.functions()[j] {
                    assert_eq!(cov[[i, j]], gram[[i, j]]);
                }
            }
        }
    }

    #[test]
    fn cross_block_matches_formula() {
        let base = SquaredExponential::default();
        let k = BranchKernel::new(base, BranchTopology::single_fork(2).unwrap(), vec![0.5].into()).unwrap();
        let x = AugmentedInputs::from_pairs([(0.2, 1), (0.9, 2)]).unwrap();
        let cov = k.covariance(&x, None).unwrap();

        let kbb = 1.0 + 1e-6;
        let expected = base.cross(&[0.2], &[0.5])[[0, 0]] * base.cross(&[0.9], &[0.5])[[0, 0]] / kbb;
        assert!((cov[[0, 1]] - expected).abs() < 1e-14);
        assert!((cov[[1, 0]] - expected).abs() < 1e-14);
    }

    #[test]
    fn diag_comes_from_base() {
        let base = Matern32::new(2.0, 0.4).unwrap();
        let k = BranchKernel::new(base, BranchTopology::single_fork(3).unwrap(), vec![0.5].into()).unwrap();
        let d = k.covariance_diag(&fork_inputs()).unwrap();
        assert_eq!(d.to_vec(), vec![2.0; 6]);
    }

    #[test]
    fn rejects_asymmetric_topology() {
        let topo = BranchTopology::builder(2, 1).entry(1, 2, 1, Some(1)).build().unwrap();
        let err = BranchKernel::new(Matern32::default(), topo.clone(), vec![0.5].into()).unwrap_err();
        assert!(matches!(err, KernelError::InvalidTopology { .. }));

        let relaxed = KernelConfig::new().with_symmetry_validation(false);
        assert!(BranchKernel::with_config(Matern32::default(), topo, vec![0.5].into(), relaxed).is_ok());
    }

    #[test]
    fn rejects_labels_beyond_topology() {
        let k = BranchKernel::new(Matern32::default(), BranchTopology::single_fork(2).unwrap(), vec![0.5].into()).unwrap();
        let x = AugmentedInputs::from_pairs([(0.1, 1), (0.2, 3)]).unwrap();
        let err = k.covariance(&x, None).unwrap_err();
        assert_eq!(
            err,
            KernelError::DimensionMismatch {
                function: 3,
                functions: 2
            }
        );
        assert!(k.covariance_diag(&x).is_err());
    }

    #[test]
    fn out_of_range_before_assembly() {
        let k = BranchKernel::new(Matern32::default(), BranchTopology::single_fork(2).unwrap(), BranchLocations::new(Vec::new())).unwrap();
        // inputs only touch function 1, yet the reference is still checked
        let x = AugmentedInputs::from_pairs([(0.1, 1)]).unwrap();
        let err = k.covariance(&x, None).unwrap_err();
        assert!(matches!(err, KernelError::OutOfRangeIndex { index: 1, available: 0, .. }));
    }

    #[test]
    fn coincident_branch_points_without_jitter_fail() {
        let topo = BranchTopology::builder(2, 2).couple(1, 2, &[1, 2]).build().unwrap();
        let config = KernelConfig::new().with_jitter(0.0);
        let k = BranchKernel::with_config(Matern32::default(), topo, vec![0.5, 0.5].into(), config).unwrap();
        let x = AugmentedInputs::from_pairs([(0.2, 1), (0.8, 2)]).unwrap();

        let err = k.covariance(&x, None).unwrap_err();
        assert!(err.is_numerical());
        assert!(matches!(
            err,
            KernelError::NonPsd {
                stage: Stage::BranchBlock {
                    row_function: 1,
                    col_function: 2
                },
                pivot: 1,
                ..
            }
        ));

        // the default jitter keeps the same block factorisable
        let jittered = BranchKernel::new(
            Matern32::default(),
            k.topology().clone(),
            vec![0.5, 0.5].into(),
        )
        .unwrap();
        assert!(jittered.covariance(&x, None).is_ok());
    }

    #[test]
    fn pair_covariance_variants() {
        let base = Matern32::default();
        let topo = BranchTopology::builder(3, 1).couple(1, 2, &[1]).build().unwrap();
        let k = BranchKernel::new(base, topo, vec![0.4].into()).unwrap();
        assert_eq!(k.pair_covariance(1, 1, &[0.1], &[0.2]).unwrap(), base.cross(&[0.1], &[0.2]));
        assert_eq!(k.pair_covariance(1, 3, &[0.1], &[0.2]).unwrap()[[0, 0]], 0.0);
        assert!(k.pair_covariance(1, 2, &[0.1], &[0.2]).unwrap()[[0, 0]] > 0.0);
        assert!(k.pair_covariance(0, 2, &[0.1], &[0.2]).is_err());
    }

    #[test]
    fn rectangular_evaluation() {
        let k = BranchKernel::new(Matern32::default(), BranchTopology::single_fork(3).unwrap(), vec![0.5].into()).unwrap();
        let x = fork_inputs();
        let y = AugmentedInputs::expand(&[0.5, 0.75], 3);
        let kxy = k.covariance(&x, Some(&y)).unwrap();
        let kyx = k.covariance(&y, Some(&x)).unwrap();
        assert_eq!(kxy.dim(), (6, 6));
        for i in 0..x.len() {
            for j in 0..y.len() {
                assert!((kxy[[i, j]] - kyx[[j, i]]).abs() < 1e-14);
            }
        }
    }
}
