//! Line search along a geodesic.
//!
//! The line search works on the pullback of the cost to a scalar parameter:
//! given `φ(t) = f(γ(t))` and `φ'(t) = ⟨grad f(γ(t)), γ'(t)⟩_g` for a geodesic
//! `γ` with `γ(0) = x`, it finds a step `α > 0` satisfying
//!
//! ```text
//! φ(α) - φ(0) ≤ c₁ α φ'(0)          (sufficient decrease)
//! |φ'(α)|     ≤ c₂ |φ'(0)|          (curvature)
//! ```
//!
//! # Algorithm
//!
//! 1. Reject non-descent directions (`φ'(0) ≥ 0`).
//! 2. Bracket a sign change of `φ'` by doubling the step from the initial
//!    guess, capped by `max_step_size`.
//! 3. Refine the bracket with secant steps on `φ'`
//!    (`c = a - φ'(a)(b - a)/(φ'(b) - φ'(a))`), accepting the first step that
//!    satisfies both conditions.
//! 4. When the budget runs out, accept the last step only if it decreased
//!    the cost.
//!
//! # Example
//!
//! ```rust
//! use secantopt_core::prelude::*;
//!
//! // φ(t) = (t - 1)², minimum at t = 1
//! let search = GeodesicLineSearch::new();
//! let params = LineSearchParams::<f64>::default();
//! let result = search
//!     .search(&params, 0.1, |t| Ok((t - 1.0) * (t - 1.0)), |t| Ok(2.0 * (t - 1.0)))
//!     .unwrap();
//! assert!(result.wolfe_satisfied);
//! assert!((result.step_size - 1.0).abs() < 1e-8);
//! ```

use crate::{
    error::{ManifoldError, OptimizerError, OptimizerResult, Result},
    types::Scalar,
};
use num_traits::Float;
use tracing::{debug, warn};

/// Result of a successful line search.
#[derive(Debug, Clone)]
pub struct LineSearchResult<T: Scalar> {
    /// The accepted step size α
    pub step_size: T,

    /// The cost φ(α) at the accepted step
    pub new_value: T,

    /// Number of evaluations of φ
    pub function_evals: usize,

    /// Number of evaluations of φ'
    pub gradient_evals: usize,

    /// True if both Wolfe-like conditions held at the accepted step.
    ///
    /// False means the step was accepted only because it decreased the cost.
    pub wolfe_satisfied: bool,
}

/// Parameters of the geodesic line search.
///
/// # Parameter Guidelines
///
/// - `c1` is the sufficient decrease constant, `c2` the curvature constant,
///   with `0 < c1 < c2 < 1`.
/// - `max_iterations` bounds the number of secant refinements.
/// - `growth_factor` multiplies the step while bracketing.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineSearchParams<T: Scalar> {
    /// Step used when the caller does not supply a positive initial guess
    pub initial_step_size: T,

    /// Upper bound on the step size
    pub max_step_size: T,

    /// Maximum number of secant refinements
    pub max_iterations: usize,

    /// Sufficient decrease constant c₁ ∈ (0, 1)
    pub c1: T,

    /// Curvature constant c₂ ∈ (c₁, 1)
    pub c2: T,

    /// Bracketing growth factor (> 1)
    pub growth_factor: T,
}

impl<T: Scalar> Default for LineSearchParams<T> {
    fn default() -> Self {
        Self {
            initial_step_size: <T as Scalar>::from_f64(1e-2),
            max_step_size: <T as Scalar>::from_f64(10.0),
            max_iterations: 5,
            c1: <T as Scalar>::from_f64(1e-5),
            c2: <T as Scalar>::from_f64(0.9),
            growth_factor: <T as Scalar>::from_f64(2.0),
        }
    }
}

impl<T: Scalar> LineSearchParams<T> {
    /// Creates the default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default initial step size.
    pub fn with_initial_step_size(mut self, step: T) -> Self {
        self.initial_step_size = step;
        self
    }

    /// Sets the maximum step size.
    pub fn with_max_step_size(mut self, step: T) -> Self {
        self.max_step_size = step;
        self
    }

    /// Sets the maximum number of secant refinements.
    pub fn with_max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = iterations;
        self
    }

    /// Sets the Wolfe constants.
    pub fn with_wolfe_constants(mut self, c1: T, c2: T) -> Self {
        self.c1 = c1;
        self.c2 = c2;
        self
    }

    /// Validates the parameters.
    ///
    /// # Errors
    ///
    /// Returns `ManifoldError::InvalidParameter` if steps are not positive and
    /// ordered, if `0 < c1 < c2 < 1` fails, if the growth factor is not above
    /// one, or if no refinement is allowed.
    pub fn validate(&self) -> Result<()> {
        if self.initial_step_size <= T::zero() {
            return Err(ManifoldError::invalid_parameter(
                "Initial step size must be positive",
            ));
        }
        if self.max_step_size < self.initial_step_size {
            return Err(ManifoldError::invalid_parameter(
                "Maximum step size must not be below the initial step size",
            ));
        }
        if self.c1 <= T::zero() || self.c1 >= T::one() {
            return Err(ManifoldError::invalid_parameter(
                "Sufficient decrease constant c1 must be in (0, 1)",
            ));
        }
        if self.c2 <= self.c1 || self.c2 >= T::one() {
            return Err(ManifoldError::invalid_parameter(
                "Curvature constant c2 must satisfy c1 < c2 < 1",
            ));
        }
        if self.growth_factor <= T::one() {
            return Err(ManifoldError::invalid_parameter(
                "Growth factor must be greater than 1",
            ));
        }
        if self.max_iterations == 0 {
            return Err(ManifoldError::invalid_parameter(
                "Maximum iterations must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Bracketing plus secant-method line search on a scalar pullback.
#[derive(Debug, Clone, Default)]
pub struct GeodesicLineSearch;

impl GeodesicLineSearch {
    /// Creates a new line search.
    pub fn new() -> Self {
        Self
    }

    /// Searches for a step along a descent direction.
    ///
    /// `phi` is the cost along the curve and `dphi` its derivative.
    /// `initial_step` is the first bracketing trial; a non-positive or
    /// non-finite value falls back to `params.initial_step_size`.
    ///
    /// # Errors
    ///
    /// - `OptimizerError::InvalidSearchDirection` if `dphi(0) ≥ 0`
    /// - `OptimizerError::LineSearchFailed` if no step decreased the cost
    /// - any error produced by `phi` or `dphi`
    pub fn search<T, F, G>(
        &self,
        params: &LineSearchParams<T>,
        initial_step: T,
        mut phi: F,
        mut dphi: G,
    ) -> OptimizerResult<LineSearchResult<T>>
    where
        T: Scalar,
        F: FnMut(T) -> Result<T>,
        G: FnMut(T) -> Result<T>,
    {
        params.validate()?;

        let phi0 = phi(T::zero())?;
        let d0 = dphi(T::zero())?;
        let mut function_evals = 1;
        let mut gradient_evals = 1;

        if !(d0 < T::zero()) {
            warn!(
                slope = Scalar::to_f64(d0),
                "line search direction is not a descent direction"
            );
            return Err(OptimizerError::InvalidSearchDirection {
                slope: Scalar::to_f64(d0),
            });
        }

        let max_step = params.max_step_size;
        let start = if initial_step > T::zero() && <T as Float>::is_finite(initial_step) {
            initial_step
        } else {
            params.initial_step_size
        };

        // Bracketing: a always has a negative slope.
        let mut a = T::zero();
        let mut ga = d0;
        let mut b = <T as Float>::min(start, max_step);
        let mut gb;
        loop {
            gb = dphi(b)?;
            gradient_evals += 1;

            if <T as Float>::is_nan(gb) {
                return Err(OptimizerError::line_search_failed(
                    "directional derivative is not a number",
                    0,
                    Scalar::to_f64(b),
                    Scalar::to_f64(phi0),
                ));
            }
            if gb >= T::zero() {
                break;
            }
            if b >= max_step {
                let value = phi(b)?;
                function_evals += 1;
                if value < phi0 {
                    debug!(step = Scalar::to_f64(b), "line search hit the maximum step");
                    return Ok(LineSearchResult {
                        step_size: b,
                        new_value: value,
                        function_evals,
                        gradient_evals,
                        wolfe_satisfied: false,
                    });
                }
                return Err(OptimizerError::line_search_failed(
                    "maximum step reached without decrease",
                    0,
                    Scalar::to_f64(b),
                    Scalar::to_f64(phi0),
                ));
            }
            a = b;
            ga = gb;
            b = <T as Float>::min(b * params.growth_factor, max_step);
        }

        let mut c = T::zero();
        let mut value_c = phi0;
        for iteration in 0..params.max_iterations {
            c = a - ga * (b - a) / (gb - ga);
            if !<T as Float>::is_finite(c) || c <= a || c > b {
                c = (a + b) * <T as Scalar>::from_f64(0.5);
            }

            value_c = phi(c)?;
            let gc = dphi(c)?;
            function_evals += 1;
            gradient_evals += 1;

            let sufficient_decrease = value_c - phi0 <= params.c1 * d0 * c;
            let curvature = <T as Float>::abs(gc) <= params.c2 * <T as Float>::abs(d0);
            if sufficient_decrease && curvature {
                debug!(
                    step = Scalar::to_f64(c),
                    iterations = iteration + 1,
                    "line search satisfied the Wolfe conditions"
                );
                return Ok(LineSearchResult {
                    step_size: c,
                    new_value: value_c,
                    function_evals,
                    gradient_evals,
                    wolfe_satisfied: true,
                });
            }

            if gc < T::zero() {
                a = c;
                ga = gc;
            } else {
                b = c;
                gb = gc;
            }
        }

        if value_c < phi0 {
            debug!(
                step = Scalar::to_f64(c),
                "line search budget exhausted, accepting decrease"
            );
            return Ok(LineSearchResult {
                step_size: c,
                new_value: value_c,
                function_evals,
                gradient_evals,
                wolfe_satisfied: false,
            });
        }

        Err(OptimizerError::line_search_failed(
            "no decrease within the iteration budget",
            params.max_iterations,
            Scalar::to_f64(c),
            Scalar::to_f64(phi0),
        ))
    }
}
