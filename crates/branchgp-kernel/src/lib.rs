//! branchgp kernel
//!
//! Multi-output covariance for functions that share one trajectory up to
//! their branch points and evolve independently afterwards.
//!
//! # Overview
//!
//! - **[`BaseKernel`]**: covariance over raw positions (`K(X)`, `K(X, Y)`, `Kdiag`)
//! - **[`BranchTopology`]**: which branch points couple each pair of functions
//! - **[`BranchLocations`]**: shared branch-point coordinates, updated externally
//! - **[`BranchKernel`]**: block covariance conditioned at the branch points
//! - **[`IndependentKernel`]**: zero-coupling baseline
//! - **[`sampling`]**: draw realisations for validation
//!
//! # Example
//!
//! ```rust
//! use branchgp_kernel::prelude::*;
//!
//! let topology = BranchTopology::single_fork(3).unwrap();
//! let locations = BranchLocations::new(vec![0.5]);
//! let kernel = BranchKernel::new(Matern32::default(), topology, locations.clone()).unwrap();
//!
//! let x = AugmentedInputs::from_pairs([(0.2, 1), (0.8, 2), (0.8, 3)]).unwrap();
//! let k = kernel.covariance(&x, None).unwrap();
//! assert_eq!(k.dim(), (3, 3));
//!
//! // the optimiser moves the branch point; the next evaluation sees it
//! locations.set(1, 0.4);
//! let moved = kernel.covariance(&x, None).unwrap();
//! assert_ne!(k[[1, 2]], moved[[1, 2]]);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod base;
pub mod config;
pub mod covariance;
pub mod error;
pub mod input;
pub mod linalg;
pub mod locations;
pub mod sampling;
pub mod topology;

mod trace;

// Re-exports
pub use base::{BaseKernel, Matern12, Matern32, Matern52, SquaredExponential, Sum, White};
pub use config::{KernelConfig, SamplingConfig, TraceConfig, DEFAULT_JITTER};
pub use covariance::{
    AugmentedWhite, BranchKernel, CovarianceFunction, CovarianceSum, IndependentKernel,
};
pub use error::{KernelError, Result, Stage};
pub use input::{AugmentedInput, AugmentedInputs};
pub use locations::BranchLocations;
pub use sampling::Samples;
pub use topology::{BranchTopology, TopologyBuilder};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for building and evaluating branching covariances
    pub use crate::{
        AugmentedInput, AugmentedInputs, AugmentedWhite, BaseKernel, BranchKernel,
        BranchLocations, BranchTopology, CovarianceFunction, CovarianceSum, IndependentKernel,
        KernelConfig, KernelError, Matern32, SamplingConfig, SquaredExponential, White,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
