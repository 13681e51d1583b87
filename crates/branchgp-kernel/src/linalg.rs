//! Dense linear algebra helpers: Cholesky, SPD inverse, symmetric eigenvalues.
//!
//! Covariances live in `ndarray`; factorisations are delegated to `nalgebra`.
//! Factorisation never repairs a bad pivot. Callers add their fixed jitter
//! up front and a failing pivot surfaces as [`KernelError::NonPsd`].

use crate::error::{KernelError, Result, Stage};
use nalgebra::{Cholesky, DMatrix, Dyn, SymmetricEigen};
use ndarray::Array2;

const EIGEN_MAX_ITERATIONS: usize = 10_000;

fn check_square(a: &Array2<f64>) -> Result<usize> {
    let (rows, cols) = a.dim();
    if rows == cols {
        Ok(rows)
    } else {
        Err(KernelError::shape_mismatch(
            "square matrix",
            format!("{rows}x{cols}"),
        ))
    }
}

fn to_dmatrix(a: &Array2<f64>) -> DMatrix<f64> {
    let (rows, cols) = a.dim();
    DMatrix::from_fn(rows, cols, |i, j| a[[i, j]])
}

fn to_array(m: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn(m.shape(), |(i, j)| m[(i, j)])
}

fn leading_factor(a: &DMatrix<f64>, size: usize) -> Option<Cholesky<f64, Dyn>> {
    Cholesky::new(DMatrix::from_fn(size, size, |i, j| a[(i, j)]))
}

/// First pivot at which the factorisation breaks down, with its value
///
/// A pivot depends only on the leading block up to it, so the breakdown
/// point is found by bisection over leading blocks.
fn failing_pivot(a: &DMatrix<f64>) -> (usize, f64) {
    let (mut lo, mut hi) = (0, a.nrows().saturating_sub(1));
    while lo < hi {
        let mid = (lo + hi) / 2;
        if leading_factor(a, mid + 1).is_some() {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    let pivot = lo;
    if pivot == 0 {
        return (0, a[(0, 0)]);
    }
    let column = DMatrix::from_fn(pivot, 1, |i, _| a[(i, pivot)]);
    let value = leading_factor(a, pivot)
        .and_then(|chol| chol.l().solve_lower_triangular(&column))
        .map_or(f64::NAN, |y| a[(pivot, pivot)] - y.norm_squared());
    (pivot, value)
}

fn factor(a: &Array2<f64>, stage: Stage) -> Result<Cholesky<f64, Dyn>> {
    check_square(a)?;
    let m = to_dmatrix(a);
    let Some(chol) = Cholesky::new(m.clone()) else {
        let (pivot, value) = failing_pivot(&m);
        return Err(KernelError::NonPsd { stage, pivot, value });
    };
    let diagonal = chol.l_dirty().diagonal();
    if let Some((pivot, &value)) = diagonal.iter().enumerate().find(|(_, d)| !d.is_finite()) {
        return Err(KernelError::NonPsd { stage, pivot, value });
    }
    Ok(chol)
}

/// Add `jitter` to the diagonal in place
pub fn add_jitter(a: &mut Array2<f64>, jitter: f64) {
    a.diag_mut().mapv_inplace(|d| d + jitter);
}

/// Lower Cholesky factor `L` with `A = L L^T`
///
/// Only the lower triangle of `a` is read.
///
/// # Errors
/// `NonPsd` tagged with `stage` when a pivot is not strictly positive;
/// `ShapeMismatch` for non-square input.
pub fn cholesky(a: &Array2<f64>, stage: Stage) -> Result<Array2<f64>> {
    Ok(to_array(&factor(a, stage)?.l()))
}

/// Inverse of a symmetric positive-definite matrix
///
/// # Errors
/// As [`cholesky`].
pub fn invert_spd(a: &Array2<f64>, stage: Stage) -> Result<Array2<f64>> {
    Ok(to_array(&factor(a, stage)?.inverse()))
}

/// Largest `|A[i, j] - A[j, i]|`
#[must_use]
pub fn max_asymmetry(a: &Array2<f64>) -> f64 {
    let n = a.nrows().min(a.ncols());
    let mut worst = 0.0f64;
    for i in 0..n {
        for j in (i + 1)..n {
            worst = worst.max((a[[i, j]] - a[[j, i]]).abs());
        }
    }
    worst
}

/// Eigenvalues of a symmetric matrix, ascending
///
/// # Errors
/// `ShapeMismatch` for non-square input or when the decomposition does not
/// converge (non-finite entries).
pub fn symmetric_eigenvalues(a: &Array2<f64>) -> Result<Vec<f64>> {
    if check_square(a)? == 0 {
        return Ok(Vec::new());
    }
    let eigen = SymmetricEigen::try_new(to_dmatrix(a), f64::EPSILON, EIGEN_MAX_ITERATIONS)
        .ok_or_else(|| {
            KernelError::shape_mismatch(
                "finite symmetric matrix",
                "non-convergent eigen decomposition",
            )
        })?;
    let mut eig: Vec<f64> = eigen.eigenvalues.iter().copied().collect();
    eig.sort_by(f64::total_cmp);
    Ok(eig)
}

/// Smallest eigenvalue of a symmetric matrix, `+inf` when empty
///
/// # Errors
/// As [`symmetric_eigenvalues`].
pub fn min_eigenvalue(a: &Array2<f64>) -> Result<f64> {
    Ok(symmetric_eigenvalues(a)?
        .first()
        .copied()
        .unwrap_or(f64::INFINITY))
}
