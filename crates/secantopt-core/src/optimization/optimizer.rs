//! Optimizer result, termination and stopping criterion types.
//!
//! The optimizers of this workspace minimize a cost `f: Gr(k, n) → ℝ` and
//! report their outcome through [`OptimizationResult`]. A run ends for one
//! of the reasons listed in [`TerminationReason`]; the checks that depend
//! only on counters, time and gradient norm live in [`StoppingCriterion`].
//!
//! # Example
//!
//! ```rust
//! # use secantopt_core::prelude::*;
//! let criterion = StoppingCriterion::<f64>::new()
//!     .with_max_iterations(200)
//!     .with_gradient_tolerance(1e-10);
//! assert_eq!(criterion.max_iterations, Some(200));
//! ```

use crate::types::{Point, Scalar};
use std::time::Duration;

/// Result of an optimization run.
///
/// The final point is always reported, even when the run did not converge:
/// callers decide whether to accept it, extend the run, or restart.
#[derive(Debug, Clone)]
pub struct OptimizationResult<T: Scalar> {
    /// The final point found by the optimizer
    pub point: Point<T>,

    /// The cost at the final point
    pub value: T,

    /// Riemannian gradient norm at the final point (if computed)
    pub gradient_norm: Option<T>,

    /// Number of accepted steps
    pub iterations: usize,

    /// Total number of cost evaluations
    pub function_evaluations: usize,

    /// Total number of gradient evaluations
    pub gradient_evaluations: usize,

    /// Wall-clock time elapsed during optimization
    pub duration: Duration,

    /// Reason for termination
    pub termination_reason: TerminationReason,

    /// True if the run ended at a (local) optimum
    pub converged: bool,

    /// Cost at the initial point followed by the cost after every accepted step
    pub cost_history: Vec<T>,
}

impl<T: Scalar> OptimizationResult<T> {
    /// Creates a new optimization result.
    pub fn new(
        point: Point<T>,
        value: T,
        iterations: usize,
        duration: Duration,
        termination_reason: TerminationReason,
    ) -> Self {
        Self {
            point,
            value,
            gradient_norm: None,
            iterations,
            function_evaluations: 0,
            gradient_evaluations: 0,
            duration,
            termination_reason,
            converged: termination_reason.is_converged(),
            cost_history: Vec::new(),
        }
    }

    /// Sets the gradient norm at the final point.
    pub fn with_gradient_norm(mut self, norm: T) -> Self {
        self.gradient_norm = Some(norm);
        self
    }

    /// Sets the function and gradient evaluation counts.
    pub fn with_evaluations(mut self, function_evaluations: usize, gradient_evaluations: usize) -> Self {
        self.function_evaluations = function_evaluations;
        self.gradient_evaluations = gradient_evaluations;
        self
    }

    /// Sets the cost history.
    pub fn with_cost_history(mut self, history: Vec<T>) -> Self {
        self.cost_history = history;
        self
    }
}

/// Reasons for optimization termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// Gradient norm fell below the tolerance
    Converged,
    /// The line search found no further descent; a local optimum was reached
    NoFurtherDescent,
    /// Cost change between accepted steps fell below the tolerance
    FunctionTolerance,
    /// Maximum iteration count exhausted without convergence
    MaxIterations,
    /// Wall-clock time limit exceeded
    MaxTime,
    /// A callback requested early termination
    CallbackRequest,
}

impl TerminationReason {
    /// Whether this reason counts as a successful (converged) run.
    pub fn is_converged(self) -> bool {
        matches!(
            self,
            Self::Converged | Self::NoFurtherDescent | Self::FunctionTolerance
        )
    }
}

/// Stopping criteria for optimization algorithms.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StoppingCriterion<T: Scalar> {
    /// Maximum number of accepted steps
    pub max_iterations: Option<usize>,

    /// Maximum wall-clock time
    pub max_time: Option<Duration>,

    /// Tolerance on the Riemannian gradient norm
    pub gradient_tolerance: Option<T>,

    /// Tolerance on the absolute cost change of an accepted step
    pub function_tolerance: Option<T>,
}

impl<T: Scalar> Default for StoppingCriterion<T> {
    fn default() -> Self {
        Self {
            max_iterations: Some(1000),
            max_time: None,
            gradient_tolerance: Some(T::DEFAULT_GRADIENT_TOLERANCE),
            function_tolerance: None,
        }
    }
}

impl<T: Scalar> StoppingCriterion<T> {
    /// Creates a new stopping criterion with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iter: usize) -> Self {
        self.max_iterations = Some(max_iter);
        self
    }

    /// Sets the maximum optimization time.
    pub fn with_max_time(mut self, max_time: Duration) -> Self {
        self.max_time = Some(max_time);
        self
    }

    /// Sets the gradient tolerance.
    pub fn with_gradient_tolerance(mut self, tol: T) -> Self {
        self.gradient_tolerance = Some(tol);
        self
    }

    /// Sets the function value change tolerance.
    pub fn with_function_tolerance(mut self, tol: T) -> Self {
        self.function_tolerance = Some(tol);
        self
    }

    /// Checks the gradient-based criterion.
    pub fn gradient_converged(&self, gradient_norm: T) -> bool {
        self.gradient_tolerance
            .is_some_and(|tol| gradient_norm < tol)
    }

    /// Checks the budget-based and progress-based criteria after a step.
    ///
    /// `value_change` is the absolute cost decrease of the last accepted step.
    pub fn check(
        &self,
        iterations: usize,
        elapsed: Duration,
        value_change: Option<T>,
    ) -> Option<TerminationReason> {
        if let (Some(tol), Some(change)) = (self.function_tolerance, value_change) {
            if change < tol {
                return Some(TerminationReason::FunctionTolerance);
            }
        }
        if self.max_iterations.is_some_and(|max| iterations >= max) {
            return Some(TerminationReason::MaxIterations);
        }
        if self.max_time.is_some_and(|max| elapsed >= max) {
            return Some(TerminationReason::MaxTime);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DMatrix;

    #[test]
    fn test_result_convergence_flag() {
        let point = DMatrix::<f64>::identity(3, 2);
        let result = OptimizationResult::new(
            point.clone(),
            1.0,
            4,
            Duration::from_millis(1),
            TerminationReason::NoFurtherDescent,
        );
        assert!(result.converged);

        let result = OptimizationResult::new(
            point,
            1.0,
            4,
            Duration::from_millis(1),
            TerminationReason::MaxIterations,
        )
        .with_gradient_norm(0.5)
        .with_evaluations(10, 8)
        .with_cost_history(vec![2.0, 1.0]);
        assert!(!result.converged);
        assert_eq!(result.gradient_norm, Some(0.5));
        assert_eq!(result.function_evaluations, 10);
        assert_eq!(result.cost_history.len(), 2);
    }

    #[test]
    fn test_stopping_criterion_checks() {
        let criterion = StoppingCriterion::<f64>::new()
            .with_max_iterations(10)
            .with_gradient_tolerance(1e-6)
            .with_function_tolerance(1e-12);

        assert!(criterion.gradient_converged(1e-7));
        assert!(!criterion.gradient_converged(1e-3));
        assert_eq!(criterion.check(3, Duration::ZERO, Some(1.0)), None);
        assert_eq!(
            criterion.check(10, Duration::ZERO, Some(1.0)),
            Some(TerminationReason::MaxIterations)
        );
        assert_eq!(
            criterion.check(3, Duration::ZERO, Some(1e-14)),
            Some(TerminationReason::FunctionTolerance)
        );

        let timed = StoppingCriterion::<f64>::new().with_max_time(Duration::from_secs(1));
        assert_eq!(
            timed.check(0, Duration::from_secs(2), None),
            Some(TerminationReason::MaxTime)
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_stopping_criterion_serde() {
        let criterion = StoppingCriterion::<f64>::new()
            .with_max_iterations(25)
            .with_max_time(Duration::from_millis(1500));
        let json = serde_json::to_string(&criterion).unwrap();
        let back: StoppingCriterion<f64> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, criterion);
    }
}
