//! Branch topology: which branch points couple which pairs of functions
//!
//! The topology is an `F x F x B` tensor. Entry `[i, j, k]` is either a
//! 1-based index into the branch locations or missing. Only off-diagonal
//! entries carry meaning.
//!
//! The tensor is fixed for a model run, so the per-pair index lists are
//! resolved once here and reused by every covariance evaluation.

use crate::error::{KernelError, Result};
use ndarray::Array3;

/// Validated topology tensor with a precomputed pair map
#[derive(Debug, Clone, PartialEq)]
pub struct BranchTopology {
    tensor: Array3<Option<usize>>,
    /// Row-major over 0-based `(fi, fj)`; 1-based branch indices, deduplicated
    pairs: Vec<Vec<usize>>,
}

impl BranchTopology {
    /// Validate a tensor and resolve its pair map
    ///
    /// # Errors
    /// `InvalidTopology` when the tensor is not `F x F x B` with `F, B > 0`
    /// or when an entry is the index 0.
    pub fn new(tensor: Array3<Option<usize>>) -> Result<Self> {
        let (rows, cols, depth) = tensor.dim();
        if rows != cols {
            return Err(KernelError::invalid_topology(format!(
                "tensor must be square in its first two axes, got {rows}x{cols}x{depth}"
            )));
        }
        if rows == 0 {
            return Err(KernelError::invalid_topology("tensor describes no functions"));
        }
        if depth == 0 {
            return Err(KernelError::invalid_topology("tensor has zero branch-point depth"));
        }
        if let Some(((i, j, k), _)) = tensor.indexed_iter().find(|(_, v)| **v == Some(0)) {
            return Err(KernelError::invalid_topology(format!(
                "entry [{}, {}, {}] is 0; branch indices are 1-based",
                i + 1,
                j + 1,
                k + 1
            )));
        }

        let mut pairs = Vec::with_capacity(rows * rows);
        for fi in 0..rows {
            for fj in 0..rows {
                let mut indices: Vec<usize> = Vec::new();
                if fi != fj {
                    for idx in (0..depth).filter_map(|k| tensor[[fi, fj, k]]) {
                        if !indices.contains(&idx) {
                            indices.push(idx);
                        }
                    }
                }
                pairs.push(indices);
            }
        }

        Ok(Self { tensor, pairs })
    }

    /// Build from a float tensor where `NaN` marks a missing entry
    ///
    /// # Errors
    /// `InvalidTopology` when a present entry is not a positive integer.
    pub fn from_float_tensor(tensor: &Array3<f64>) -> Result<Self> {
        let mut converted = Array3::from_elem(tensor.dim(), None);
        for ((i, j, k), &v) in tensor.indexed_iter() {
            if v.is_nan() {
                continue;
            }
            if v < 1.0 || v.fract() != 0.0 || !v.is_finite() {
                return Err(KernelError::invalid_topology(format!(
                    "entry [{}, {}, {}] = {v} is not a 1-based branch index",
                    i + 1,
                    j + 1,
                    k + 1
                )));
            }
            // integral and >= 1, checked above
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let idx = v as usize;
            converted[[i, j, k]] = Some(idx);
        }
        Self::new(converted)
    }

    /// Every pair of distinct functions shares branch point 1
    ///
    /// This is the tensor of a single fork: a trunk and its branches, all
    /// meeting at one location.
    ///
    /// # Errors
    /// `InvalidTopology` when `functions` is 0.
    pub fn single_fork(functions: usize) -> Result<Self> {
        let tensor = Array3::from_shape_fn((functions, functions, 1), |(i, j, _)| {
            (i != j).then_some(1)
        });
        Self::new(tensor)
    }

    /// Start a topology with no couplings
    #[must_use]
    pub fn builder(functions: usize, depth: usize) -> TopologyBuilder {
        TopologyBuilder {
            tensor: Array3::from_elem((functions, functions, depth), None),
        }
    }

    /// Number of functions `F`
    #[inline]
    #[must_use]
    pub fn functions(&self) -> usize {
        self.tensor.dim().0
    }

    /// Number of branch-point slots `B`
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.tensor.dim().2
    }

    /// Raw tensor
    #[inline]
    #[must_use]
    pub fn tensor(&self) -> &Array3<Option<usize>> {
        &self.tensor
    }

    /// Branch indices coupling `fi` and `fj` (1-based labels)
    ///
    /// Empty for `fi == fj`, for uncoupled pairs and for labels outside `1..=F`.
    #[must_use]
    pub fn branch_indices(&self, fi: usize, fj: usize) -> &[usize] {
        let f = self.functions();
        if fi == 0 || fj == 0 || fi > f || fj > f {
            return &[];
        }
        &self.pairs[(fi - 1) * f + (fj - 1)]
    }

    /// Iterate over distinct ordered pairs `((fi, fj), indices)`, 1-based
    pub fn pairs(&self) -> impl Iterator<Item = ((usize, usize), &[usize])> + '_ {
        let f = self.functions();
        self.pairs
            .iter()
            .enumerate()
            .map(move |(n, idx)| ((n / f + 1, n % f + 1), idx.as_slice()))
            .filter(|((fi, fj), _)| fi != fj)
    }

    /// Largest branch index referenced, 0 when nothing is coupled
    #[must_use]
    pub fn max_index(&self) -> usize {
        self.pairs.iter().flatten().copied().max().unwrap_or(0)
    }

    /// Whether `[i, j, k] == [j, i, k]` for every entry
    #[must_use]
    pub fn is_symmetric(&self) -> bool {
        self.asymmetric_entry().is_none()
    }

    /// Fail on the first entry that differs from its transpose
    ///
    /// # Errors
    /// `InvalidTopology` naming the first asymmetric entry.
    pub fn check_symmetric(&self) -> Result<()> {
        match self.asymmetric_entry() {
            Some((i, j, k)) => Err(KernelError::invalid_topology(format!(
                "entry [{}, {}, {}] differs from [{}, {}, {}]",
                i + 1,
                j + 1,
                k + 1,
                j + 1,
                i + 1,
                k + 1
            ))),
            None => Ok(()),
        }
    }

    /// Fail if any referenced index exceeds `available` locations
    ///
    /// # Errors
    /// `OutOfRangeIndex` for the first offending pair in row-major order.
    pub fn check_locations(&self, available: usize) -> Result<()> {
        for ((fi, fj), indices) in self.pairs() {
            if let Some(&index) = indices.iter().find(|&&i| i > available) {
                return Err(KernelError::OutOfRangeIndex {
                    row_function: fi,
                    col_function: fj,
                    index,
                    available,
                });
            }
        }
        Ok(())
    }

    /// Resolve a pair's indices into coordinates
    ///
    /// # Errors
    /// `OutOfRangeIndex` when an index is past the end of `locations`.
    pub fn resolve(&self, fi: usize, fj: usize, locations: &[f64]) -> Result<Vec<f64>> {
        self.branch_indices(fi, fj)
            .iter()
            .map(|&index| {
                locations
                    .get(index - 1)
                    .copied()
                    .ok_or(KernelError::OutOfRangeIndex {
                        row_function: fi,
                        col_function: fj,
                        index,
                        available: locations.len(),
                    })
            })
            .collect()
    }

    fn asymmetric_entry(&self) -> Option<(usize, usize, usize)> {
        self.tensor
            .indexed_iter()
            .find(|((i, j, k), v)| self.tensor[[*j, *i, *k]] != **v)
            .map(|(pos, _)| pos)
    }
}

/// Builder for topologies assembled pair by pair
#[derive(Debug, Clone)]
pub struct TopologyBuilder {
    tensor: Array3<Option<usize>>,
}

impl TopologyBuilder {
    /// Couple `fi` and `fj` (both directions) through `indices`
    ///
    /// Labels and indices are 1-based; indices fill slots from the front and
    /// extra indices beyond the tensor depth are dropped by `build`'s shape.
    #[must_use]
    pub fn couple(mut self, fi: usize, fj: usize, indices: &[usize]) -> Self {
        let (f, _, depth) = self.tensor.dim();
        if fi == 0 || fj == 0 || fi > f || fj > f {
            return self;
        }
        for (k, &idx) in indices.iter().take(depth).enumerate() {
            self.tensor[[fi - 1, fj - 1, k]] = Some(idx);
            self.tensor[[fj - 1, fi - 1, k]] = Some(idx);
        }
        self
    }

    /// Set a single directed entry, leaving its transpose untouched
    #[must_use]
    pub fn entry(mut self, fi: usize, fj: usize, slot: usize, index: Option<usize>) -> Self {
        let (f, _, depth) = self.tensor.dim();
        if (1..=f).contains(&fi) && (1..=f).contains(&fj) && (1..=depth).contains(&slot) {
            self.tensor[[fi - 1, fj - 1, slot - 1]] = index;
        }
        self
    }

    /// Validate and resolve
    ///
    /// # Errors
    /// As [`BranchTopology::new`].
    pub fn build(self) -> Result<BranchTopology> {
        BranchTopology::new(self.tensor)
    }
}
