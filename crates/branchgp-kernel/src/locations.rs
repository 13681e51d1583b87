//! Shared, externally mutated branch-point coordinates
//!
//! An optimiser owns the values and updates them between covariance
//! evaluations. Kernels hold a clone of the handle and take one snapshot per
//! evaluation; nothing derived from the values is cached.

use parking_lot::RwLock;
use std::sync::Arc;

/// Cloneable handle to the current branch-point coordinates
#[derive(Debug, Clone, Default)]
pub struct BranchLocations {
    inner: Arc<RwLock<Vec<f64>>>,
}

impl BranchLocations {
    /// Create from initial coordinates
    #[must_use]
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(values)),
        }
    }

    /// Copy of the current coordinates
    #[must_use]
    pub fn snapshot(&self) -> Vec<f64> {
        self.inner.read().clone()
    }

    /// Number of branch points
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether there are no branch points
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Coordinate of a 1-based branch index
    #[must_use]
    pub fn get(&self, index: usize) -> Option<f64> {
        index
            .checked_sub(1)
            .and_then(|i| self.inner.read().get(i).copied())
    }

    /// Update a 1-based branch index; returns the previous value
    pub fn set(&self, index: usize, value: f64) -> Option<f64> {
        let i = index.checked_sub(1)?;
        let mut guard = self.inner.write();
        let slot = guard.get_mut(i)?;
        Some(std::mem::replace(slot, value))
    }

    /// Replace every coordinate
    pub fn replace(&self, values: Vec<f64>) -> Vec<f64> {
        std::mem::replace(&mut *self.inner.write(), values)
    }

    /// Whether two handles share the same storage
    #[must_use]
    pub fn shares_storage(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl From<Vec<f64>> for BranchLocations {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}
