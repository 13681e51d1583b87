//! Base kernels over raw scalar positions
//!
//! [`BaseKernel`] is the capability the branch construction consumes: a
//! symmetric positive-semi-definite covariance with full, cross and diagonal
//! evaluation. Hyperparameters belong to the concrete kernel; the branch
//! machinery treats a base kernel as opaque.

mod composite;
mod stationary;

pub use composite::{Sum, White};
pub use stationary::{Matern12, Matern32, Matern52, SquaredExponential};

use ndarray::{Array1, Array2};
use std::sync::Arc;

/// Covariance function over raw positions
pub trait BaseKernel {
    /// `K(X, Y)`, an `N x M` matrix
    fn cross(&self, x: &[f64], y: &[f64]) -> Array2<f64>;

    /// `K(X)`, an `N x N` matrix
    ///
    /// Differs from `cross(x, x)` only for kernels that treat identical
    /// inputs specially, such as [`White`].
    fn gram(&self, x: &[f64]) -> Array2<f64> {
        self.cross(x, x)
    }

    /// `Kdiag(X)`, the diagonal of `K(X)`
    fn diag(&self, x: &[f64]) -> Array1<f64>;

    /// Sum with another kernel
    fn plus<B>(self, other: B) -> Sum<Self, B>
    where
        Self: Sized,
        B: BaseKernel,
    {
        Sum::new(self, other)
    }
}

impl<K: BaseKernel + ?Sized> BaseKernel for &K {
    fn cross(&self, x: &[f64], y: &[f64]) -> Array2<f64> {
        (**self).cross(x, y)
    }

    fn gram(&self, x: &[f64]) -> Array2<f64> {
        (**self).gram(x)
    }

    fn diag(&self, x: &[f64]) -> Array1<f64> {
        (**self).diag(x)
    }
}

impl<K: BaseKernel + ?Sized> BaseKernel for Arc<K> {
    fn cross(&self, x: &[f64], y: &[f64]) -> Array2<f64> {
        (**self).cross(x, y)
    }

    fn gram(&self, x: &[f64]) -> Array2<f64> {
        (**self).gram(x)
    }

    fn diag(&self, x: &[f64]) -> Array1<f64> {
        (**self).diag(x)
    }
}

impl<K: BaseKernel + ?Sized> BaseKernel for Box<K> {
    fn cross(&self, x: &[f64], y: &[f64]) -> Array2<f64> {
        (**self).cross(x, y)
    }

    fn gram(&self, x: &[f64]) -> Array2<f64> {
        (**self).gram(x)
    }

    fn diag(&self, x: &[f64]) -> Array1<f64> {
        (**self).diag(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forwarding_impls_agree() {
        let k = Matern32::default();
        let x = [0.0, 0.3, 0.9];
        let direct = k.gram(&x);
        let by_ref = (&k).gram(&x);
        let shared = Arc::new(k).gram(&x);
        let boxed: Box<dyn BaseKernel> = Box::new(k);
        assert_eq!(direct, by_ref);
        assert_eq!(direct, shared);
        assert_eq!(direct, boxed.gram(&x));
    }

    #[test]
    fn plus_builds_sum() {
        let k = SquaredExponential::default().plus(White::new(0.5).unwrap());
        let d = k.diag(&[0.0, 1.0]);
        assert!((d[0] - 1.5).abs() < 1e-12);
        assert!((d[1] - 1.5).abs() < 1e-12);
    }
}
