//! Stationary kernels: covariance depends only on `|x - y| / lengthscale`

use super::BaseKernel;
use crate::error::{KernelError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

const SQRT_3: f64 = 1.732_050_807_568_877_2;
const SQRT_5: f64 = 2.236_067_977_499_79;

fn check_positive(name: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(KernelError::Config(format!(
            "{name} must be finite and positive, got {value}"
        )))
    }
}

fn scaled_distances(
    x: &[f64],
    y: &[f64],
    lengthscale: f64,
    variance: f64,
    profile: impl Fn(f64) -> f64,
) -> Array2<f64> {
    Array2::from_shape_fn((x.len(), y.len()), |(i, j)| {
        variance * profile((x[i] - y[j]).abs() / lengthscale)
    })
}

macro_rules! stationary_kernel {
    ($(#[$meta:meta])* $name:ident, |$r:ident| $profile:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
        pub struct $name {
            variance: f64,
            lengthscale: f64,
        }

        impl $name {
            /// Create with signal variance and lengthscale, both positive
            ///
            /// # Errors
            /// `Config` when either is not finite and positive.
            pub fn new(variance: f64, lengthscale: f64) -> Result<Self> {
                Ok(Self {
                    variance: check_positive("variance", variance)?,
                    lengthscale: check_positive("lengthscale", lengthscale)?,
                })
            }

            /// Signal variance
            #[inline]
            #[must_use]
            pub fn variance(&self) -> f64 {
                self.variance
            }

            /// Lengthscale
            #[inline]
            #[must_use]
            pub fn lengthscale(&self) -> f64 {
                self.lengthscale
            }

            /// Correlation at scaled distance `r`
            #[inline]
            #[must_use]
            pub fn profile($r: f64) -> f64 {
                $profile
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    variance: 1.0,
                    lengthscale: 1.0,
                }
            }
        }

        impl BaseKernel for $name {
            fn cross(&self, x: &[f64], y: &[f64]) -> Array2<f64> {
                scaled_distances(x, y, self.lengthscale, self.variance, Self::profile)
            }

            fn diag(&self, x: &[f64]) -> Array1<f64> {
                Array1::from_elem(x.len(), self.variance)
            }
        }
    };
}

stationary_kernel!(
    /// Squared exponential (RBF): `v * exp(-r^2 / 2)`
    SquaredExponential,
    |r| (-0.5 * r * r).exp()
);

stationary_kernel!(
    /// Matern 1/2 (exponential): `v * exp(-r)`
    Matern12,
    |r| (-r).exp()
);

stationary_kernel!(
    /// Matern 3/2: `v * (1 + sqrt(3) r) * exp(-sqrt(3) r)`
    Matern32,
    |r| (1.0 + SQRT_3 * r) * (-SQRT_3 * r).exp()
);

stationary_kernel!(
    /// Matern 5/2: `v * (1 + sqrt(5) r + 5 r^2 / 3) * exp(-sqrt(5) r)`
    Matern52,
    |r| (1.0 + SQRT_5 * r + 5.0 / 3.0 * r * r) * (-SQRT_5 * r).exp()
);
