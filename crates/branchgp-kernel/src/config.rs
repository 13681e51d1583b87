//! Kernel and sampler configuration
//!
//! Plain data with builder-style setters. Both configs can be read from TOML
//! and are checked with `validate()` before use.

use crate::error::{KernelError, Result};
use serde::{Deserialize, Serialize};

/// Jitter added to every branch-point block before inversion
pub const DEFAULT_JITTER: f64 = 1e-6;

/// Default number of matrix values rendered into a trace event
pub const DEFAULT_SUMMARIZE: usize = 10;

/// Configuration for [`BranchKernel`](crate::BranchKernel)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Fixed diagonal jitter for `Kbb`; never escalated on failure
    pub jitter: f64,
    /// Reject topologies where `[i, j, k] != [j, i, k]`
    pub validate_symmetry: bool,
    /// Trace-point logging
    pub trace: TraceConfig,
}

impl KernelConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With jitter
    #[inline]
    #[must_use]
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    /// With symmetry validation on or off
    #[inline]
    #[must_use]
    pub fn with_symmetry_validation(mut self, enabled: bool) -> Self {
        self.validate_symmetry = enabled;
        self
    }

    /// With trace configuration
    #[inline]
    #[must_use]
    pub fn with_trace(mut self, trace: TraceConfig) -> Self {
        self.trace = trace;
        self
    }

    /// Parse from a TOML document and validate
    ///
    /// # Errors
    /// `Config` for malformed TOML or out-of-range values.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).map_err(|e| KernelError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// `Config` naming the first out-of-range field.
    pub fn validate(&self) -> Result<()> {
        check_non_negative("jitter", self.jitter)
    }
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            jitter: DEFAULT_JITTER,
            validate_symmetry: true,
            trace: TraceConfig::default(),
        }
    }
}

/// Gate for the trace points emitted during covariance construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    /// Emit trace-point events
    pub enabled: bool,
    /// How many matrix values to render per event
    pub summarize: usize,
}

impl TraceConfig {
    /// Tracing switched on with the default summary width
    #[inline]
    #[must_use]
    pub fn on() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    /// Whether trace-point events should be emitted
    #[inline]
    #[must_use]
    pub fn active(&self) -> bool {
        self.enabled || cfg!(feature = "strict-debug")
    }
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            summarize: DEFAULT_SUMMARIZE,
        }
    }
}

/// Configuration for [`sampling`](crate::sampling)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Number of independent output dimensions
    pub dims: usize,
    /// Jitter added to the covariance diagonal before factorisation
    pub tolerance: f64,
    /// Seed for the default RNG; `None` draws from the thread RNG
    pub seed: Option<u64>,
    /// Return the Cholesky factor and covariance alongside the samples
    pub keep_factor: bool,
}

impl SamplingConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With number of output dimensions
    #[inline]
    #[must_use]
    pub fn with_dims(mut self, dims: usize) -> Self {
        self.dims = dims;
        self
    }

    /// With sampling jitter
    #[inline]
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// With RNG seed
    #[inline]
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Keep the Cholesky factor and covariance in the result
    #[inline]
    #[must_use]
    pub fn keep_factor(mut self) -> Self {
        self.keep_factor = true;
        self
    }

    /// Parse from a TOML document and validate
    ///
    /// # Errors
    /// `Config` for malformed TOML or out-of-range values.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).map_err(|e| KernelError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// `Config` naming the first out-of-range field.
    pub fn validate(&self) -> Result<()> {
        if self.dims == 0 {
            return Err(KernelError::Config("dims must be at least 1".into()));
        }
        check_non_negative("tolerance", self.tolerance)
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            dims: 1,
            tolerance: DEFAULT_JITTER,
            seed: None,
            keep_factor: false,
        }
    }
}

fn check_non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(KernelError::Config(format!(
            "{name} must be finite and non-negative, got {value}"
        )))
    }
}
