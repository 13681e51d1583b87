//! Draw realisations from a covariance for validation and diagnostics
//!
//! Samples are `L Z` where `L` is the Cholesky factor of the jittered
//! covariance and `Z` is an `N x D` matrix of standard normals. Nothing on the
//! inference path depends on this module.

use crate::base::BaseKernel;
use crate::config::SamplingConfig;
use crate::covariance::{BranchKernel, CovarianceFunction};
use crate::error::{KernelError, Result, Stage};
use crate::input::AugmentedInputs;
use crate::linalg::{add_jitter, cholesky};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use std::collections::BTreeMap;

/// Sampled realisations, optionally with the factor and the covariance
#[derive(Debug, Clone, PartialEq)]
pub struct Samples {
    /// `N x D`, one column per output dimension
    pub values: Array2<f64>,
    /// Lower Cholesky factor of the jittered covariance
    pub factor: Option<Array2<f64>>,
    /// Covariance before jitter
    pub covariance: Option<Array2<f64>>,
}

impl Samples {
    /// Number of output dimensions
    #[inline]
    #[must_use]
    pub fn dims(&self) -> usize {
        self.values.ncols()
    }

    /// Per-function `(position, value)` series for one output dimension,
    /// ordered by position
    #[must_use]
    pub fn trajectories(&self, x: &AugmentedInputs, dim: usize) -> BTreeMap<usize, Vec<(f64, f64)>> {
        let mut out: BTreeMap<usize, Vec<(f64, f64)>> = BTreeMap::new();
        if dim >= self.dims() {
            return out;
        }
        for (input, value) in x.iter().zip(self.values.column(dim)) {
            out.entry(input.function)
                .or_default()
                .push((input.position, *value));
        }
        for series in out.values_mut() {
            series.sort_by(|a, b| a.0.total_cmp(&b.0));
        }
        out
    }
}

/// Sample from an explicit covariance matrix
///
/// # Errors
/// `ShapeMismatch` for a non-square matrix, `Config` for an invalid config,
/// `NonPsd` when the jittered matrix cannot be factorised.
pub fn sample_matrix<R: Rng + ?Sized>(
    covariance: &Array2<f64>,
    config: &SamplingConfig,
    rng: &mut R,
) -> Result<Samples> {
    config.validate()?;
    let (rows, cols) = covariance.dim();
    if rows != cols {
        return Err(KernelError::shape_mismatch(
            "square covariance",
            format!("{rows}x{cols}"),
        ));
    }

    let mut jittered = covariance.clone();
    add_jitter(&mut jittered, config.tolerance);
    let factor = cholesky(&jittered, Stage::Sampling)?;

    let normal = StandardNormal;
    let z = Array2::from_shape_simple_fn((rows, config.dims), || -> f64 { normal.sample(rng) });
    let values = factor.dot(&z);
    tracing::debug!(n = rows, dims = config.dims, "drew covariance samples");

    Ok(if config.keep_factor {
        Samples {
            values,
            factor: Some(factor),
            covariance: Some(covariance.clone()),
        }
    } else {
        Samples {
            values,
            factor: None,
            covariance: None,
        }
    })
}

/// Evaluate `K(X, X)` and sample from it
///
/// # Errors
/// Any error of the covariance evaluation, then as [`sample_matrix`].
pub fn sample<C, R>(kernel: &C, x: &AugmentedInputs, config: &SamplingConfig, rng: &mut R) -> Result<Samples>
where
    C: CovarianceFunction + ?Sized,
    R: Rng + ?Sized,
{
    let covariance = kernel.covariance(x, None)?;
    sample_matrix(&covariance, config, rng)
}

/// Sample using the RNG described by `config.seed`
///
/// A seed gives a reproducible `StdRng`; no seed uses the thread RNG.
///
/// # Errors
/// As [`sample`].
pub fn sample_with_config<C>(kernel: &C, x: &AugmentedInputs, config: &SamplingConfig) -> Result<Samples>
where
    C: CovarianceFunction + ?Sized,
{
    match config.seed {
        Some(seed) => sample(kernel, x, config, &mut StdRng::seed_from_u64(seed)),
        None => sample(kernel, x, config, &mut rand::rng()),
    }
}

/// Move branch point `index` (1-based) to `value`, then sample
///
/// The new location stays in place afterwards, as with any other writer of
/// the shared locations.
///
/// # Errors
/// `OutOfRangeIndex` with pair `(0, 0)` when `index` is not a branch point,
/// otherwise as [`sample`].
pub fn sample_at_branch<K, R>(
    kernel: &BranchKernel<K>,
    index: usize,
    value: f64,
    x: &AugmentedInputs,
    config: &SamplingConfig,
    rng: &mut R,
) -> Result<Samples>
where
    K: BaseKernel,
    R: Rng + ?Sized,
{
    let available = kernel.locations().len();
    if kernel.locations().set(index, value).is_none() {
        return Err(KernelError::OutOfRangeIndex {
            row_function: 0,
            col_function: 0,
            index,
            available,
        });
    }
    sample(kernel, x, config, rng)
}
