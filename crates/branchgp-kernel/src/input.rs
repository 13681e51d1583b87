//! Augmented inputs: positions tagged with the function they belong to

use crate::error::{KernelError, Result};
use serde::{Deserialize, Serialize};

/// A raw position paired with a 1-based function label
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AugmentedInput {
    /// Raw position, e.g. pseudotime
    pub position: f64,
    /// Function (branch) label, starting at 1
    pub function: usize,
}

impl AugmentedInput {
    /// Create a new augmented input
    #[inline]
    #[must_use]
    pub fn new(position: f64, function: usize) -> Self {
        Self { position, function }
    }
}

/// Ordered sequence of augmented inputs, stored column-wise
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AugmentedInputs {
    positions: Vec<f64>,
    functions: Vec<usize>,
}

impl AugmentedInputs {
    /// Build from parallel position and label vectors
    ///
    /// # Errors
    /// `ShapeMismatch` for vectors of different length, `DimensionMismatch`
    /// for a label of 0.
    pub fn new(positions: Vec<f64>, functions: Vec<usize>) -> Result<Self> {
        if positions.len() != functions.len() {
            return Err(KernelError::shape_mismatch(
                format!("{} function labels", positions.len()),
                format!("{} function labels", functions.len()),
            ));
        }
        if let Some(&bad) = functions.iter().find(|&&f| f == 0) {
            return Err(KernelError::DimensionMismatch {
                function: bad,
                functions: functions.iter().copied().max().unwrap_or(0),
            });
        }
        Ok(Self {
            positions,
            functions,
        })
    }

    /// Build from `(position, function)` pairs
    ///
    /// # Errors
    /// `DimensionMismatch` for a label of 0.
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (f64, usize)>,
    {
        let (positions, functions) = pairs.into_iter().unzip();
        Self::new(positions, functions)
    }

    /// Pair every position with every label in `1..=functions`
    ///
    /// Output is ordered by function first, then position.
    #[must_use]
    pub fn expand(positions: &[f64], functions: usize) -> Self {
        let mut out = Self {
            positions: Vec::with_capacity(positions.len() * functions),
            functions: Vec::with_capacity(positions.len() * functions),
        };
        for f in 1..=functions {
            out.positions.extend_from_slice(positions);
            out.functions.extend(std::iter::repeat(f).take(positions.len()));
        }
        out
    }

    /// Number of inputs
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether there are no inputs
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Raw positions
    #[inline]
    #[must_use]
    pub fn positions(&self) -> &[f64] {
        &self.positions
    }

    /// Function labels
    #[inline]
    #[must_use]
    pub fn functions(&self) -> &[usize] {
        &self.functions
    }

    /// Input at `index`
    #[must_use]
    pub fn get(&self, index: usize) -> Option<AugmentedInput> {
        Some(AugmentedInput::new(
            *self.positions.get(index)?,
            *self.functions.get(index)?,
        ))
    }

    /// Iterate over inputs
    pub fn iter(&self) -> impl Iterator<Item = AugmentedInput> + '_ {
        self.positions
            .iter()
            .zip(&self.functions)
            .map(|(&p, &f)| AugmentedInput::new(p, f))
    }

    /// Largest function label, 0 when empty
    #[must_use]
    pub fn max_function(&self) -> usize {
        self.functions.iter().copied().max().unwrap_or(0)
    }

    /// Fail if any label exceeds `functions`
    ///
    /// # Errors
    /// `DimensionMismatch` naming the first offending label.
    pub fn check_functions(&self, functions: usize) -> Result<()> {
        match self.functions.iter().find(|&&f| f > functions) {
            Some(&function) => Err(KernelError::DimensionMismatch {
                function,
                functions,
            }),
            None => Ok(()),
        }
    }
}

impl FromIterator<AugmentedInput> for AugmentedInputs {
    /// Labels are taken as given; use [`AugmentedInputs::new`] to reject label 0.
    fn from_iter<I: IntoIterator<Item = AugmentedInput>>(iter: I) -> Self {
        let (positions, functions) = iter.into_iter().map(|x| (x.position, x.function)).unzip();
        Self {
            positions,
            functions,
        }
    }
}
