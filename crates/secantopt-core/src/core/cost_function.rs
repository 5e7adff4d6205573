//! Cost function interface for optimization algorithms.
//!
//! Cost functions are evaluated on `n × k` matrices. The gradient they
//! return is the Euclidean (ambient) gradient, i.e. the gradient of the cost
//! viewed as a function of a free `n × k` matrix. The manifold turns it into
//! a Riemannian gradient by projecting onto the horizontal space.

use crate::{
    error::{ManifoldError, Result},
    types::{DMatrix, Point, Scalar, TangentVector},
};
use num_traits::Float;
use std::cell::Cell;
use std::fmt::Debug;

/// Trait for cost functions defined on projection matrices.
///
/// This is the main trait that optimization algorithms use to evaluate
/// the objective function and its derivatives.
pub trait CostFunction<T: Scalar>: Debug {
    /// Evaluates the cost function at a point.
    fn cost(&self, point: &Point<T>) -> Result<T>;

    /// Evaluates the cost and Euclidean gradient at a point.
    ///
    /// # Default Implementation
    ///
    /// Uses central finite differences if not overridden.
    fn cost_and_gradient(&self, point: &Point<T>) -> Result<(T, TangentVector<T>)> {
        let cost = self.cost(point)?;
        let gradient = self.gradient_fd(point)?;
        Ok((cost, gradient))
    }

    /// Computes only the Euclidean gradient at a point.
    fn gradient(&self, point: &Point<T>) -> Result<TangentVector<T>> {
        self.cost_and_gradient(point).map(|(_, grad)| grad)
    }

    /// Computes the gradient using central finite differences.
    fn gradient_fd(&self, point: &Point<T>) -> Result<TangentVector<T>> {
        let (nrows, ncols) = point.shape();
        let mut gradient = DMatrix::<T>::zeros(nrows, ncols);
        let h = <T as Float>::cbrt(T::EPSILON);
        let two_h = h + h;

        let mut shifted = point.clone();
        for j in 0..ncols {
            for i in 0..nrows {
                let original = shifted[(i, j)];

                shifted[(i, j)] = original + h;
                let f_plus = self.cost(&shifted)?;
                shifted[(i, j)] = original - h;
                let f_minus = self.cost(&shifted)?;
                shifted[(i, j)] = original;

                gradient[(i, j)] = (f_plus - f_minus) / two_h;
            }
        }

        Ok(gradient)
    }
}

impl<T: Scalar, C: CostFunction<T> + ?Sized> CostFunction<T> for &C {
    fn cost(&self, point: &Point<T>) -> Result<T> {
        (**self).cost(point)
    }

    fn cost_and_gradient(&self, point: &Point<T>) -> Result<(T, TangentVector<T>)> {
        (**self).cost_and_gradient(point)
    }

    fn gradient(&self, point: &Point<T>) -> Result<TangentVector<T>> {
        (**self).gradient(point)
    }
}

/// Negated Rayleigh trace `f(X) = -tr(XᵀAX)`.
///
/// Its minimizers over `Gr(k, n)` span the dominant `k`-dimensional
/// eigenspace of the symmetric matrix `A`, which makes it a convenient
/// reference problem for optimizer tests.
#[derive(Debug, Clone)]
pub struct RayleighTraceCost<T: Scalar> {
    /// Symmetric matrix A
    pub a: DMatrix<T>,
}

impl<T: Scalar> RayleighTraceCost<T> {
    /// Creates the cost for a symmetric matrix.
    pub fn new(a: DMatrix<T>) -> Result<Self> {
        if !a.is_square() {
            return Err(ManifoldError::dimension_mismatch(
                format!("square matrix, got {} rows", a.nrows()),
                format!("{} columns", a.ncols()),
            ));
        }
        Ok(Self { a })
    }

    /// Diagonal matrix with the given eigenvalues.
    pub fn diagonal(eigenvalues: &[T]) -> Self {
        let n = eigenvalues.len();
        let mut a = DMatrix::<T>::zeros(n, n);
        for (i, &lambda) in eigenvalues.iter().enumerate() {
            a[(i, i)] = lambda;
        }
        Self { a }
    }
}

impl<T: Scalar> CostFunction<T> for RayleighTraceCost<T> {
    fn cost(&self, point: &Point<T>) -> Result<T> {
        if point.nrows() != self.a.nrows() {
            return Err(ManifoldError::dimension_mismatch(self.a.nrows(), point.nrows()));
        }
        let ax = &self.a * point;
        Ok(-point.dot(&ax))
    }

    fn cost_and_gradient(&self, point: &Point<T>) -> Result<(T, TangentVector<T>)> {
        if point.nrows() != self.a.nrows() {
            return Err(ManifoldError::dimension_mismatch(self.a.nrows(), point.nrows()));
        }
        let ax = &self.a * point;
        let cost = -point.dot(&ax);
        let two = <T as Scalar>::from_f64(2.0);
        Ok((cost, ax * (-two)))
    }
}

/// Wrapper that counts function evaluations.
///
/// Useful for reporting evaluation counts and for testing.
#[derive(Debug)]
pub struct CountingCostFunction<F> {
    /// The underlying cost function
    pub inner: F,
    cost_count: Cell<usize>,
    gradient_count: Cell<usize>,
}

impl<F> CountingCostFunction<F> {
    /// Creates a new counting wrapper around a cost function.
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            cost_count: Cell::new(0),
            gradient_count: Cell::new(0),
        }
    }

    /// Resets all counters to zero.
    pub fn reset_counts(&self) {
        self.cost_count.set(0);
        self.gradient_count.set(0);
    }

    /// Returns the current (cost, gradient) evaluation counts.
    pub fn counts(&self) -> (usize, usize) {
        (self.cost_count.get(), self.gradient_count.get())
    }
}

impl<T: Scalar, F: CostFunction<T>> CostFunction<T> for CountingCostFunction<F> {
    fn cost(&self, point: &Point<T>) -> Result<T> {
        self.cost_count.set(self.cost_count.get() + 1);
        self.inner.cost(point)
    }

    fn cost_and_gradient(&self, point: &Point<T>) -> Result<(T, TangentVector<T>)> {
        self.cost_count.set(self.cost_count.get() + 1);
        self.gradient_count.set(self.gradient_count.get() + 1);
        self.inner.cost_and_gradient(point)
    }

    fn gradient(&self, point: &Point<T>) -> Result<TangentVector<T>> {
        self.gradient_count.set(self.gradient_count.get() + 1);
        self.inner.gradient(point)
    }
}

/// Utilities for checking gradient implementations.
pub struct DerivativeChecker;

impl DerivativeChecker {
    /// Checks an analytic gradient against central finite differences.
    ///
    /// # Returns
    ///
    /// A tuple of (passes, max_error) where max_error is the largest
    /// entrywise deviation relative to `max(1, |fd|)`.
    pub fn check_gradient<T: Scalar>(
        cost_fn: &impl CostFunction<T>,
        point: &Point<T>,
        tol: T,
    ) -> Result<(bool, T)> {
        let analytic = cost_fn.gradient(point)?;
        let numeric = cost_fn.gradient_fd(point)?;

        let mut max_error = T::zero();
        for (a, n) in analytic.iter().zip(numeric.iter()) {
            let scale = <T as Float>::max(T::one(), <T as Float>::abs(*n));
            let err = <T as Float>::abs(*a - *n) / scale;
            if err > max_error {
                max_error = err;
            }
        }

        Ok((max_error <= tol, max_error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_point() -> DMatrix<f64> {
        DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 0.0, 0.6, 0.0, 0.8])
    }

    #[test]
    fn test_rayleigh_cost_value() {
        let cost = RayleighTraceCost::diagonal(&[3.0, 2.0, 1.0]);
        let x = sample_point();
        // tr(XᵀAX) = 3·1 + 2·0.36 + 1·0.64
        assert_relative_eq!(cost.cost(&x).unwrap(), -(3.0 + 0.72 + 0.64), epsilon = 1e-12);
    }

    #[test]
    fn test_rayleigh_gradient_matches_fd() {
        let cost = RayleighTraceCost::diagonal(&[3.0, 2.0, 1.0]);
        let (ok, err) = DerivativeChecker::check_gradient(&cost, &sample_point(), 1e-6).unwrap();
        assert!(ok, "max error {}", err);
    }

    #[test]
    fn test_rejects_non_square() {
        assert!(RayleighTraceCost::new(DMatrix::<f64>::zeros(3, 2)).is_err());
        let cost = RayleighTraceCost::diagonal(&[1.0, 2.0]);
        assert!(cost.cost(&sample_point()).is_err());
    }

    #[test]
    fn test_counting_wrapper() {
        let cost = CountingCostFunction::new(RayleighTraceCost::diagonal(&[3.0, 2.0, 1.0]));
        let x = sample_point();

        assert_eq!(cost.counts(), (0, 0));
        cost.cost(&x).unwrap();
        cost.cost_and_gradient(&x).unwrap();
        cost.gradient(&x).unwrap();
        assert_eq!(cost.counts(), (2, 2));

        cost.reset_counts();
        assert_eq!(cost.counts(), (0, 0));
    }
}
