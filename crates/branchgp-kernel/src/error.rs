//! Error types for branchgp
//!
//! Provides error handling for:
//! - Malformed branch topologies (checked once, at construction)
//! - Topology references outside the current branch locations
//! - Factorisation failures on jittered covariance blocks
//! - Function labels outside the topology's function range

use std::fmt;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, KernelError>;

/// Main kernel error type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum KernelError {
    /// Topology tensor has the wrong shape or inconsistent entries
    #[error("invalid topology: {reason}")]
    InvalidTopology {
        /// What is wrong with the tensor
        reason: String,
    },

    /// A topology entry points past the end of the branch locations
    #[error(
        "branch index {index} for function pair ({row_function}, {col_function}) \
         is out of range ({available} branch locations)"
    )]
    OutOfRangeIndex {
        /// Function label of the row block (1-based, 0 outside any pair)
        row_function: usize,
        /// Function label of the column block (1-based, 0 outside any pair)
        col_function: usize,
        /// Offending branch index (1-based)
        index: usize,
        /// Number of branch locations available
        available: usize,
    },

    /// Cholesky factorisation failed after the fixed jitter was applied
    #[error("matrix is not positive definite ({stage}): pivot {pivot} = {value:e}")]
    NonPsd {
        /// Which matrix was being factorised
        stage: Stage,
        /// Row at which the factorisation broke down
        pivot: usize,
        /// Value of the failing pivot
        value: f64,
    },

    /// An input carries a function label the topology does not know
    #[error("function index {function} outside 1..={functions}")]
    DimensionMismatch {
        /// Offending function label
        function: usize,
        /// Number of functions the topology describes
        functions: usize,
    },

    /// A caller-supplied array has an unexpected shape
    #[error("shape mismatch: expected {expected}, found {found}")]
    ShapeMismatch {
        /// Expected shape description
        expected: String,
        /// Actual shape description
        found: String,
    },

    /// Configuration could not be parsed or is out of range
    #[error("configuration error: {0}")]
    Config(String),
}

impl KernelError {
    /// Check if the error comes from numerical breakdown
    #[inline]
    #[must_use]
    pub fn is_numerical(&self) -> bool {
        matches!(self, Self::NonPsd { .. })
    }

    /// Check if the error is raised while building a kernel, not while evaluating it
    #[inline]
    #[must_use]
    pub fn is_construction(&self) -> bool {
        matches!(self, Self::InvalidTopology { .. } | Self::Config(_))
    }

    /// Create an invalid topology error
    #[inline]
    pub fn invalid_topology(reason: impl Into<String>) -> Self {
        Self::InvalidTopology {
            reason: reason.into(),
        }
    }

    /// Create a shape mismatch error
    #[inline]
    pub fn shape_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }
}

/// Matrix being factorised when a [`KernelError::NonPsd`] is raised
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Branch-point block `Kbb` for a function pair (1-based labels)
    BranchBlock {
        /// Row function
        row_function: usize,
        /// Column function
        col_function: usize,
    },
    /// Full covariance handed to the sampler
    Sampling,
    /// Standalone factorisation requested by a caller
    Standalone,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::BranchBlock {
                row_function,
                col_function,
            } => write!(f, "Kbb for functions ({row_function}, {col_function})"),
            Stage::Sampling => write!(f, "sampling covariance"),
            Stage::Standalone => write!(f, "standalone"),
        }
    }
}
