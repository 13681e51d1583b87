//! Composition of augmented-input covariances

use super::CovarianceFunction;
use crate::base::{BaseKernel, White};
use crate::error::Result;
use crate::input::AugmentedInputs;
use ndarray::{Array1, Array2};

/// Sum of two augmented-input covariances
///
/// A branching kernel plus [`AugmentedWhite`] controls the size of the gap
/// allowed at a branch point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CovarianceSum<A, B> {
    left: A,
    right: B,
}

impl<A: CovarianceFunction, B: CovarianceFunction> CovarianceSum<A, B> {
    /// Combine two covariances
    #[inline]
    #[must_use]
    pub fn new(left: A, right: B) -> Self {
        Self { left, right }
    }

    /// First summand
    #[inline]
    #[must_use]
    pub fn left(&self) -> &A {
        &self.left
    }

    /// Second summand
    #[inline]
    #[must_use]
    pub fn right(&self) -> &B {
        &self.right
    }
}

impl<A: CovarianceFunction, B: CovarianceFunction> CovarianceFunction for CovarianceSum<A, B> {
    fn covariance(&self, x: &AugmentedInputs, y: Option<&AugmentedInputs>) -> Result<Array2<f64>> {
        let left = self.left.covariance(x, y)?;
        let right = self.right.covariance(x, y)?;
        Ok(left + right)
    }

    fn covariance_diag(&self, x: &AugmentedInputs) -> Result<Array1<f64>> {
        Ok(self.left.covariance_diag(x)? + self.right.covariance_diag(x)?)
    }
}

/// White noise over augmented inputs, ignoring function labels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AugmentedWhite {
    white: White,
}

impl AugmentedWhite {
    /// Wrap a white kernel
    #[inline]
    #[must_use]
    pub fn new(white: White) -> Self {
        Self { white }
    }

    /// Noise variance
    #[inline]
    #[must_use]
    pub fn variance(&self) -> f64 {
        self.white.variance()
    }
}

impl CovarianceFunction for AugmentedWhite {
    fn covariance(&self, x: &AugmentedInputs, y: Option<&AugmentedInputs>) -> Result<Array2<f64>> {
        Ok(match y {
            Some(y) => self.white.cross(x.positions(), y.positions()),
            None => self.white.gram(x.positions()),
        })
    }

    fn covariance_diag(&self, x: &AugmentedInputs) -> Result<Array1<f64>> {
        Ok(self.white.diag(x.positions()))
    }
}
