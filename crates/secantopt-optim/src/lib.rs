//! Riemannian optimization algorithms for the secant projection problem.
//!
//! This crate provides the nonlinear conjugate gradient optimizer that moves
//! a projection along closed-form Grassmann geodesics.
//!
//! # Example
//!
//! ```rust
//! use secantopt_core::prelude::*;
//! use secantopt_manifolds::Grassmann;
//! use secantopt_optim::{CGConfig, ConjugateGradient};
//!
//! // The minimizer of -tr(XᵀAX) spans the dominant eigenvectors of A.
//! let cost = RayleighTraceCost::diagonal(&[3.0, 2.0, 1.0]);
//! let manifold = Grassmann::<f64>::new(3, 1)?;
//! let start = DMatrix::from_column_slice(3, 1, &[0.6, 0.0, 0.8]);
//!
//! let mut optimizer = ConjugateGradient::new(CGConfig::hestenes_stiefel());
//! let result = optimizer.optimize(&cost, &manifold, &start, &StoppingCriterion::new())?;
//! assert!(result.converged);
//! assert!((result.value + 3.0).abs() < 1e-8);
//! # Ok::<(), OptimizerError>(())
//! ```

pub mod conjugate_gradient;

pub use conjugate_gradient::{
    steepest_descent, CGConfig, ConjugateGradient, ConjugateGradientMethod,
    ConjugateGradientState,
};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::conjugate_gradient::{
        CGConfig, ConjugateGradient, ConjugateGradientMethod, ConjugateGradientState,
    };
}
