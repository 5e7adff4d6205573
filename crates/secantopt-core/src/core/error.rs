//! Error types for manifold operations and optimization.
//!
//! This module defines the core error types used throughout the workspace
//! for manifold-specific operations, numerical computations and the
//! optimizer itself. Conditions that merely end an optimization run (a
//! non-descent direction, an exhausted line search) are still errors at the
//! line-search level; [`OptimizerError::is_expected_termination`] lets the
//! optimizer tell them apart from fatal failures.

use thiserror::Error;

/// Errors that can occur during manifold operations.
#[derive(Debug, Clone, Error)]
pub enum ManifoldError {
    /// Point is not on the manifold.
    ///
    /// This error occurs when a point fails to satisfy the manifold constraints
    /// within numerical tolerance.
    #[error("Point is not on the manifold: {reason}")]
    InvalidPoint {
        /// Description of why the point is invalid
        reason: String,
    },

    /// Vector is not in the tangent space.
    #[error("Vector is not in the tangent space: {reason}")]
    InvalidTangent {
        /// Description of why the tangent vector is invalid
        reason: String,
    },

    /// Dimension mismatch between tensors.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimensions
        expected: String,
        /// Actual dimensions
        actual: String,
    },

    /// Numerical instability detected.
    ///
    /// This error occurs when numerical operations become unstable,
    /// such as division by near-zero values or a failed decomposition.
    #[error("Numerical instability detected: {reason}")]
    NumericalError {
        /// Description of the numerical issue
        reason: String,
    },

    /// A constructor or operation received an out-of-range parameter.
    #[error("Invalid parameter: {reason}")]
    InvalidParameter {
        /// Description of the invalid parameter
        reason: String,
    },
}

impl ManifoldError {
    /// Create an InvalidPoint error with a custom reason.
    pub fn invalid_point<S: Into<String>>(reason: S) -> Self {
        Self::InvalidPoint {
            reason: reason.into(),
        }
    }

    /// Create an InvalidTangent error with a custom reason.
    pub fn invalid_tangent<S: Into<String>>(reason: S) -> Self {
        Self::InvalidTangent {
            reason: reason.into(),
        }
    }

    /// Create a DimensionMismatch error.
    pub fn dimension_mismatch<S1, S2>(expected: S1, actual: S2) -> Self
    where
        S1: std::fmt::Display,
        S2: std::fmt::Display,
    {
        Self::DimensionMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create a NumericalError with a custom reason.
    pub fn numerical_error<S: Into<String>>(reason: S) -> Self {
        Self::NumericalError {
            reason: reason.into(),
        }
    }

    /// Create an InvalidParameter error.
    pub fn invalid_parameter<S: Into<String>>(reason: S) -> Self {
        Self::InvalidParameter {
            reason: reason.into(),
        }
    }
}

/// Errors that can occur during optimization.
#[derive(Debug, Clone, Error)]
pub enum OptimizerError {
    /// Line search failed to find an acceptable step.
    ///
    /// Neither the Wolfe conditions nor a plain decrease of the cost could be
    /// obtained within the iteration budget.
    #[error("Line search failed: {reason}")]
    LineSearchFailed {
        /// Description of why the line search failed
        reason: String,
        /// Number of iterations attempted
        iterations: usize,
        /// Last step size tried
        last_step_size: f64,
        /// Function value at the starting point
        initial_value: f64,
    },

    /// The search direction does not decrease the cost.
    ///
    /// The directional derivative at the origin of the line was non-negative.
    #[error("Invalid search direction: not a descent direction (slope {slope})")]
    InvalidSearchDirection {
        /// Directional derivative at step zero
        slope: f64,
    },

    /// Maximum number of iterations reached without convergence.
    #[error("Maximum iterations ({max_iterations}) reached without convergence")]
    MaxIterationsReached {
        /// Maximum number of iterations allowed
        max_iterations: usize,
        /// Final function value
        final_value: f64,
        /// Final gradient norm
        final_gradient_norm: f64,
    },

    /// Invalid optimizer configuration.
    #[error("Invalid optimizer configuration: {reason}")]
    InvalidConfiguration {
        /// Description of the configuration error
        reason: String,
        /// Name of the invalid parameter
        parameter: String,
        /// Value that was invalid
        value: String,
    },

    /// Propagated manifold error.
    #[error("Manifold operation failed: {0}")]
    ManifoldError(#[from] ManifoldError),
}

impl OptimizerError {
    /// Create a LineSearchFailed error with detailed context.
    pub fn line_search_failed<S: Into<String>>(
        reason: S,
        iterations: usize,
        last_step_size: f64,
        initial_value: f64,
    ) -> Self {
        Self::LineSearchFailed {
            reason: reason.into(),
            iterations,
            last_step_size,
            initial_value,
        }
    }

    /// Create a MaxIterationsReached error with convergence information.
    pub fn max_iterations_reached(
        max_iterations: usize,
        final_value: f64,
        final_gradient_norm: f64,
    ) -> Self {
        Self::MaxIterationsReached {
            max_iterations,
            final_value,
            final_gradient_norm,
        }
    }

    /// Create an InvalidConfiguration error.
    pub fn invalid_configuration<S1, S2, S3>(reason: S1, parameter: S2, value: S3) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        Self::InvalidConfiguration {
            reason: reason.into(),
            parameter: parameter.into(),
            value: value.into(),
        }
    }

    /// Returns true for failures that only mean "no further descent is possible".
    ///
    /// The conjugate gradient optimizer ends a run normally on these.
    pub fn is_expected_termination(&self) -> bool {
        matches!(
            self,
            Self::LineSearchFailed { .. } | Self::InvalidSearchDirection { .. }
        )
    }
}

/// Result type alias for operations that can produce ManifoldError.
pub type Result<T> = std::result::Result<T, ManifoldError>;

/// Result type alias for optimizer operations.
pub type OptimizerResult<T> = std::result::Result<T, OptimizerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = ManifoldError::invalid_point("columns are not orthonormal");
        assert!(matches!(err, ManifoldError::InvalidPoint { .. }));
        assert_eq!(
            err.to_string(),
            "Point is not on the manifold: columns are not orthonormal"
        );

        let err = ManifoldError::dimension_mismatch("(5, 2)", "(4, 2)");
        assert_eq!(err.to_string(), "Dimension mismatch: expected (5, 2), got (4, 2)");

        let err = ManifoldError::invalid_parameter("k must be positive");
        assert!(matches!(err, ManifoldError::InvalidParameter { .. }));
    }

    #[test]
    fn test_optimizer_error_context() {
        let err = OptimizerError::line_search_failed("no decrease", 5, 1e-8, 42.0);
        if let OptimizerError::LineSearchFailed {
            reason,
            iterations,
            last_step_size,
            initial_value,
        } = err
        {
            assert_eq!(reason, "no decrease");
            assert_eq!(iterations, 5);
            assert_eq!(last_step_size, 1e-8);
            assert_eq!(initial_value, 42.0);
        } else {
            panic!("Expected LineSearchFailed variant");
        }

        let err = OptimizerError::max_iterations_reached(500, 1.23, 0.456);
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn test_expected_termination_classification() {
        assert!(OptimizerError::InvalidSearchDirection { slope: 0.0 }.is_expected_termination());
        assert!(OptimizerError::line_search_failed("x", 1, 0.0, 0.0).is_expected_termination());
        assert!(!OptimizerError::max_iterations_reached(1, 0.0, 0.0).is_expected_termination());
        assert!(!OptimizerError::from(ManifoldError::numerical_error("svd")).is_expected_termination());
    }

    #[test]
    fn test_manifold_error_propagation() {
        let manifold_err = ManifoldError::invalid_point("not orthonormal");
        let optimizer_err: OptimizerError = manifold_err.into();

        assert!(matches!(optimizer_err, OptimizerError::ManifoldError(_)));
        assert!(optimizer_err.to_string().contains("Manifold operation failed"));
        assert!(optimizer_err.to_string().contains("not orthonormal"));
    }
}
