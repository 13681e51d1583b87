//! Kernels built from, or added to, other kernels

use super::BaseKernel;
use crate::error::{KernelError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// White noise: `variance * I` on `K(X)`, zero between distinct input sets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct White {
    variance: f64,
}

impl White {
    /// Create with a non-negative noise variance
    ///
    /// # Errors
    /// `Config` for a negative or non-finite variance.
    pub fn new(variance: f64) -> Result<Self> {
        if variance.is_finite() && variance >= 0.0 {
            Ok(Self { variance })
        } else {
            Err(KernelError::Config(format!(
                "white variance must be finite and non-negative, got {variance}"
            )))
        }
    }

    /// Noise variance
    #[inline]
    #[must_use]
    pub fn variance(&self) -> f64 {
        self.variance
    }
}

impl BaseKernel for White {
    fn cross(&self, x: &[f64], y: &[f64]) -> Array2<f64> {
        Array2::zeros((x.len(), y.len()))
    }

    fn gram(&self, x: &[f64]) -> Array2<f64> {
        Array2::eye(x.len()) * self.variance
    }

    fn diag(&self, x: &[f64]) -> Array1<f64> {
        Array1::from_elem(x.len(), self.variance)
    }
}

/// Sum of two kernels over the same inputs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sum<A, B> {
    left: A,
    right: B,
}

impl<A, B> Sum<A, B> {
    /// Combine two kernels
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

impl<A: BaseKernel, B: BaseKernel> BaseKernel for Sum<A, B> {
    fn cross(&self, x: &[f64], y: &[f64]) -> Array2<f64> {
        self.left.cross(x, y) + self.right.cross(x, y)
    }

    fn gram(&self, x: &[f64]) -> Array2<f64> {
        self.left.gram(x) + self.right.gram(x)
    }

    fn diag(&self, x: &[f64]) -> Array1<f64> {
        self.left.diag(x) + self.right.diag(x)
    }
}
