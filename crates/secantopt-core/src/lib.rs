//! Core traits and types for secant-based Grassmannian optimization.
//!
//! This crate provides the foundations shared by the rest of the workspace:
//! numeric scalar abstractions, error types, the cost function interface,
//! the geodesic line search and the result/stopping types used by the
//! optimizers.
//!
//! # Modules
//!
//! - [`cost_function`]: Cost function interface for optimization
//! - [`error`]: Error types for manifold operations and optimizers
//! - [`line_search`]: Line search along a geodesic
//! - [`optimizer`]: Optimization results and stopping criteria
//! - [`callback`]: Per-iteration callbacks
//! - [`parallel`]: Worker pool used for data-parallel evaluation
//! - [`types`]: The `Scalar` trait and matrix aliases

pub mod compute;
pub mod core;
pub mod optimization;

pub use self::compute::parallel;
pub use self::core::{cost_function, error, types};
pub use self::optimization::{callback, line_search, optimizer};

// Re-export commonly used items at the crate root
pub use error::{ManifoldError, OptimizerError, OptimizerResult, Result};

/// Prelude module for convenient imports.
///
/// # Example
/// ```
/// use secantopt_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::callback::{
        CallbackInfo, NoOpCallback, OptimizationCallback, ProgressCallback, StopAfter,
    };
    pub use crate::cost_function::{
        CostFunction, CountingCostFunction, DerivativeChecker, RayleighTraceCost,
    };
    pub use crate::error::{ManifoldError, OptimizerError, OptimizerResult, Result};
    pub use crate::line_search::{GeodesicLineSearch, LineSearchParams, LineSearchResult};
    pub use crate::optimizer::{OptimizationResult, StoppingCriterion, TerminationReason};
    pub use crate::parallel::{ParallelConfig, WorkerPool};
    pub use crate::types::{DMatrix, DVector, Point, Scalar, TangentVector};
}
