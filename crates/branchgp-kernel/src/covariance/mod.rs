//! Covariance functions over augmented `(position, function)` inputs
//!
//! - [`BranchKernel`]: functions coupled through shared branch points
//! - [`IndependentKernel`]: no coupling between functions
//! - [`CovarianceSum`] and [`AugmentedWhite`]: composition and noise

mod branch;
mod composite;
mod independent;

pub use branch::BranchKernel;
pub use composite::{AugmentedWhite, CovarianceSum};
pub use independent::IndependentKernel;

use crate::error::Result;
use crate::input::AugmentedInputs;
use ndarray::{Array1, Array2};
use std::sync::Arc;

/// Covariance over augmented inputs
pub trait CovarianceFunction {
    /// `K(X, Y)`; `y = None` evaluates `K(X, X)`
    ///
    /// A failed evaluation returns no matrix at all.
    ///
    /// # Errors
    /// Implementation specific; see [`KernelError`](crate::KernelError).
    fn covariance(&self, x: &AugmentedInputs, y: Option<&AugmentedInputs>) -> Result<Array2<f64>>;

    /// Diagonal of `K(X, X)`
    ///
    /// # Errors
    /// Implementation specific, typically label checks.
    fn covariance_diag(&self, x: &AugmentedInputs) -> Result<Array1<f64>>;
}

impl<C: CovarianceFunction + ?Sized> CovarianceFunction for &C {
    fn covariance(&self, x: &AugmentedInputs, y: Option<&AugmentedInputs>) -> Result<Array2<f64>> {
        (**self).covariance(x, y)
    }

    fn covariance_diag(&self, x: &AugmentedInputs) -> Result<Array1<f64>> {
        (**self).covariance_diag(x)
    }
}

impl<C: CovarianceFunction + ?Sized> CovarianceFunction for Arc<C> {
    fn covariance(&self, x: &AugmentedInputs, y: Option<&AugmentedInputs>) -> Result<Array2<f64>> {
        (**self).covariance(x, y)
    }

    fn covariance_diag(&self, x: &AugmentedInputs) -> Result<Array1<f64>> {
        (**self).covariance_diag(x)
    }
}

impl<C: CovarianceFunction + ?Sized> CovarianceFunction for Box<C> {
    fn covariance(&self, x: &AugmentedInputs, y: Option<&AugmentedInputs>) -> Result<Array2<f64>> {
        (**self).covariance(x, y)
    }

    fn covariance_diag(&self, x: &AugmentedInputs) -> Result<Array1<f64>> {
        (**self).covariance_diag(x)
    }
}

/// Rows of `x` and columns of `y` whose labels equal `fi` and `fj`
pub(crate) fn label_mask(x: &[usize], y: &[usize], fi: usize, fj: usize) -> (Vec<usize>, Vec<usize>) {
    let rows = x.iter().enumerate().filter(|(_, &f)| f == fi).map(|(i, _)| i).collect();
    let cols = y.iter().enumerate().filter(|(_, &f)| f == fj).map(|(j, _)| j).collect();
    (rows, cols)
}
