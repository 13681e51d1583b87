//! Independent-output covariance: no coupling between functions

use super::CovarianceFunction;
use crate::base::BaseKernel;
use crate::error::Result;
use crate::input::AugmentedInputs;
use ndarray::{Array1, Array2};

/// Base kernel within a function, exactly zero across functions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndependentKernel<K> {
    base: K,
}

impl<K: BaseKernel> IndependentKernel<K> {
    /// Wrap a base kernel
    #[inline]
    #[must_use]
    pub fn new(base: K) -> Self {
        Self { base }
    }

    /// Base kernel over raw positions
    #[inline]
    #[must_use]
    pub fn base(&self) -> &K {
        &self.base
    }
}

impl<K: BaseKernel> CovarianceFunction for IndependentKernel<K> {
    fn covariance(&self, x: &AugmentedInputs, y: Option<&AugmentedInputs>) -> Result<Array2<f64>> {
        let (mut k, y_functions) = match y {
            Some(y) => (self.base.cross(x.positions(), y.positions()), y.functions()),
            None => (self.base.gram(x.positions()), x.functions()),
        };
        for (mut row, fi) in k.rows_mut().into_iter().zip(x.functions()) {
            for (v, fj) in row.iter_mut().zip(y_functions) {
                if fi != fj {
                    *v = 0.0;
                }
            }
        }
        Ok(k)
    }

    fn covariance_diag(&self, x: &AugmentedInputs) -> Result<Array1<f64>> {
        Ok(self.base.diag(x.positions()))
    }
}
