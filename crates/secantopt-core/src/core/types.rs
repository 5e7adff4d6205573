//! The scalar trait and the matrix aliases shared by the workspace.
//!
//! Points of `Gr(k, n)` and their tangent vectors are both stored as dynamic
//! `n × k` matrices; the aliases below only document which role a matrix plays.

use nalgebra::{RealField, Scalar as NalgebraScalar};
use num_traits::{Float, FromPrimitive};
use std::fmt::{Debug, Display};

pub use nalgebra::{DMatrix, DVector};

/// Floating-point type the optimizer runs on (`f32` or `f64`).
///
/// The tolerances are per precision: a secant, a manifold check and a
/// stopping rule each need a different notion of "numerically zero".
pub trait Scalar:
    NalgebraScalar + RealField + Float + FromPrimitive + Display + Debug + Default + Copy + Send + Sync + 'static
{
    /// Machine epsilon.
    const EPSILON: Self;

    /// Gradient norm at which conjugate gradient stops by default.
    const DEFAULT_GRADIENT_TOLERANCE: Self;

    /// Allowed deviation of `WᵀW` from the identity.
    const MANIFOLD_TOLERANCE: Self;

    /// Difference norm below which two samples coincide.
    const DEGENERATE_TOLERANCE: Self;

    /// Converts a literal. Every `f64` literal used in the workspace is
    /// representable, so a failure is a bug.
    fn from_f64(v: f64) -> Self {
        <Self as FromPrimitive>::from_f64(v).expect("Failed to convert from f64")
    }

    /// Widens to `f64` for logs and files.
    fn to_f64(self) -> f64 {
        num_traits::cast(self).expect("Failed to convert to f64")
    }

    /// Converts a count or weight.
    fn from_usize(v: usize) -> Self {
        <Self as FromPrimitive>::from_usize(v).expect("Failed to convert from usize")
    }
}

impl Scalar for f32 {
    const EPSILON: Self = f32::EPSILON;
    const DEFAULT_GRADIENT_TOLERANCE: Self = 1e-5;
    const MANIFOLD_TOLERANCE: Self = 1e-5;
    const DEGENERATE_TOLERANCE: Self = 1e-6;
}

impl Scalar for f64 {
    const EPSILON: Self = f64::EPSILON;
    const DEFAULT_GRADIENT_TOLERANCE: Self = 1e-8;
    const MANIFOLD_TOLERANCE: Self = 1e-10;
    const DEGENERATE_TOLERANCE: Self = 1e-14;
}

/// A point of `Gr(k, n)`: an `n × k` matrix with orthonormal columns.
pub type Point<T> = DMatrix<T>;

/// A horizontal tangent vector at a point of `Gr(k, n)`.
pub type TangentVector<T> = DMatrix<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_conversions() {
        assert_eq!(<f64 as Scalar>::from_f64(0.25), 0.25);
        assert_eq!(<f32 as Scalar>::from_f64(0.5), 0.5f32);
        assert_eq!(<f64 as Scalar>::from_usize(7), 7.0);
        assert_eq!(Scalar::to_f64(1.5f32), 1.5);
    }

    #[test]
    fn test_tolerances_are_ordered() {
        assert!(<f64 as Scalar>::DEGENERATE_TOLERANCE < <f64 as Scalar>::MANIFOLD_TOLERANCE);
        assert!(<f64 as Scalar>::MANIFOLD_TOLERANCE < <f64 as Scalar>::DEFAULT_GRADIENT_TOLERANCE);
        assert!(<f32 as Scalar>::EPSILON < <f32 as Scalar>::DEGENERATE_TOLERANCE);
    }
}
