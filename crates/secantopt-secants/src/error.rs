//! Error types for secant construction, the projection driver and persistence.

use secantopt_core::error::{ManifoldError, OptimizerError};
use thiserror::Error;

/// Errors raised by the secant pipeline.
#[derive(Debug, Error)]
pub enum SecantError {
    /// Two points coincide, so their secant has no direction.
    #[error("Degenerate secant between points {first} and {second}")]
    DegenerateSecant {
        /// Index of the first point of the pair
        first: usize,
        /// Index of the second point of the pair
        second: usize,
    },

    /// The secant set holds no usable secant.
    #[error("Secant set is empty")]
    EmptySecantSet,

    /// An argument is out of range.
    #[error("Invalid parameter: {reason}")]
    InvalidParameter {
        /// Description of the invalid parameter
        reason: String,
    },

    /// Shapes of the inputs do not agree.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimensions
        expected: String,
        /// Actual dimensions
        actual: String,
    },

    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A text file could not be parsed.
    #[error("Parse error on line {line}: {message}")]
    Parse {
        /// One-based line number
        line: usize,
        /// What went wrong
        message: String,
    },

    /// Propagated manifold error.
    #[error("Manifold operation failed: {0}")]
    Manifold(#[from] ManifoldError),

    /// Propagated optimizer error.
    #[error("Optimization failed: {0}")]
    Optimizer(#[from] OptimizerError),
}

impl SecantError {
    /// Create an InvalidParameter error.
    pub fn invalid_parameter<S: Into<String>>(reason: S) -> Self {
        Self::InvalidParameter {
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

    /// Create a Parse error.
    pub fn parse<S: Into<String>>(line: usize, message: S) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}

/// Result type alias for the secant pipeline.
pub type SecantResult<T> = std::result::Result<T, SecantError>;
