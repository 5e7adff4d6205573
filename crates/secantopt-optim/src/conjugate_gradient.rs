//! Riemannian Conjugate Gradient optimizer on the Grassmann manifold.
//!
//! # Algorithm Overview
//!
//! At each iteration, the conjugate gradient method:
//! 1. Computes the Riemannian gradient (horizontal part of the Euclidean one)
//! 2. Determines a conjugate direction using the chosen beta formula, with
//!    the previous gradient and direction parallel-transported along the
//!    last geodesic
//! 3. Performs a line search along the closed-form geodesic
//! 4. Moves to the accepted point of the geodesic
//!
//! A line search that cannot find further descent ends the run normally:
//! the current point is a local optimum.
//!
//! # Supported Methods
//!
//! With `g` the current gradient, `τg⁻` and `τΛ⁻` the transported previous
//! gradient and direction, and `y = g − τg⁻`:
//!
//! - **Fletcher-Reeves (FR)**: β = ⟨g, g⟩ / ⟨g⁻, g⁻⟩
//! - **Polak-Ribière (PR)**: β = ⟨g, y⟩ / ⟨g⁻, g⁻⟩
//! - **Hestenes-Stiefel (HS)**: β = ⟨g, y⟩ / ⟨τΛ⁻, y⟩
//!
//! # References
//!
//! - Edelman, Arias & Smith, "The geometry of algorithms with orthogonality
//!   constraints" (1998)
//! - Hager & Zhang, "A survey of nonlinear conjugate gradient methods" (2006)

use nalgebra::DMatrix;
use num_traits::Float;
use secantopt_core::{
    callback::{CallbackInfo, NoOpCallback, OptimizationCallback},
    cost_function::CostFunction,
    error::{OptimizerError, OptimizerResult, Result},
    line_search::{GeodesicLineSearch, LineSearchParams},
    optimizer::{OptimizationResult, StoppingCriterion, TerminationReason},
    types::{Point, Scalar, TangentVector},
};
use secantopt_manifolds::{Geodesic, Grassmann};
use std::cell::Cell;
use std::time::Instant;
use tracing::{debug, info};

/// Conjugate gradient method variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConjugateGradientMethod {
    /// Fletcher-Reeves
    FletcherReeves,
    /// Polak-Ribière
    PolakRibiere,
    /// Hestenes-Stiefel
    #[default]
    HestenesStiefel,
}

/// Configuration for the Conjugate Gradient optimizer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CGConfig<T: Scalar> {
    /// The CG method variant to use
    pub method: ConjugateGradientMethod,
    /// Period for automatic restarts (0 = no automatic restart)
    pub restart_period: usize,
    /// Whether to clamp the Polak-Ribière beta at zero (PR+)
    pub use_pr_plus: bool,
    /// Line search parameters
    pub line_search_params: LineSearchParams<T>,
    /// First trial step of the first line search
    /// (None = `line_search_params.initial_step_size`)
    pub initial_step_size: Option<T>,
}

impl<T: Scalar> Default for CGConfig<T> {
    fn default() -> Self {
        Self {
            method: ConjugateGradientMethod::default(),
            restart_period: 0,
            use_pr_plus: false,
            line_search_params: LineSearchParams::default(),
            initial_step_size: None,
        }
    }
}

impl<T: Scalar> CGConfig<T> {
    /// Creates a new configuration with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the CG method variant.
    pub fn with_method(mut self, method: ConjugateGradientMethod) -> Self {
        self.method = method;
        self
    }

    /// Sets the restart period (n means restart every n iterations).
    pub fn with_restart_period(mut self, period: usize) -> Self {
        self.restart_period = period;
        self
    }

    /// Enables or disables PR+ (non-negative Polak-Ribière).
    pub fn with_pr_plus(mut self, use_pr_plus: bool) -> Self {
        self.use_pr_plus = use_pr_plus;
        self
    }

    /// Sets the line search parameters.
    pub fn with_line_search(mut self, params: LineSearchParams<T>) -> Self {
        self.line_search_params = params;
        self
    }

    /// Sets the first trial step of the first line search.
    pub fn with_initial_step_size(mut self, step: T) -> Self {
        self.initial_step_size = Some(step);
        self
    }

    /// Creates a configuration for Fletcher-Reeves method.
    pub fn fletcher_reeves() -> Self {
        Self::new().with_method(ConjugateGradientMethod::FletcherReeves)
    }

    /// Creates a configuration for Polak-Ribière method.
    pub fn polak_ribiere() -> Self {
        Self::new().with_method(ConjugateGradientMethod::PolakRibiere)
    }

    /// Creates a configuration for Hestenes-Stiefel method.
    pub fn hestenes_stiefel() -> Self {
        Self::new().with_method(ConjugateGradientMethod::HestenesStiefel)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> OptimizerResult<()> {
        self.line_search_params.validate()?;
        if let Some(step) = self.initial_step_size {
            if !(step > T::zero()) || !<T as Float>::is_finite(step) {
                return Err(OptimizerError::invalid_configuration(
                    "initial step size must be positive and finite",
                    "initial_step_size",
                    step.to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// The last accepted step, kept for transporting into the next iteration.
#[derive(Debug, Clone)]
struct PreviousStep<T: Scalar> {
    geodesic: Geodesic<T>,
    step: T,
    gradient: TangentVector<T>,
}

/// State carried between conjugate gradient iterations.
#[derive(Debug, Clone)]
pub struct ConjugateGradientState<T: Scalar> {
    previous: Option<PreviousStep<T>>,
    /// Beta formula
    pub method: ConjugateGradientMethod,
    /// Number of iterations since last restart
    pub iterations_since_restart: usize,
    /// Restart period (0 means no periodic restart)
    pub restart_period: usize,
    /// Clamp PR beta at zero
    pub use_pr_plus: bool,
}

impl<T: Scalar> ConjugateGradientState<T> {
    /// Creates a fresh state.
    pub fn new(method: ConjugateGradientMethod, restart_period: usize) -> Self {
        Self {
            previous: None,
            method,
            iterations_since_restart: 0,
            restart_period,
            use_pr_plus: false,
        }
    }

    /// Forgets the previous step; the next direction is steepest descent.
    pub fn reset(&mut self) {
        self.previous = None;
        self.iterations_since_restart = 0;
    }

    /// Records the step just accepted along `geodesic`.
    ///
    /// `gradient` is the Riemannian gradient at the geodesic's base point.
    pub fn record_step(&mut self, geodesic: Geodesic<T>, step: T, gradient: TangentVector<T>) {
        self.previous = Some(PreviousStep {
            geodesic,
            step,
            gradient,
        });
    }

    /// Computes the conjugate direction at `point`.
    ///
    /// The result is always a descent direction: whenever the conjugate
    /// update is unusable the state restarts with `−gradient`.
    pub fn compute_direction(
        &mut self,
        manifold: &Grassmann<T>,
        point: &Point<T>,
        gradient: &TangentVector<T>,
    ) -> Result<TangentVector<T>> {
        let restart_due =
            self.restart_period > 0 && self.iterations_since_restart >= self.restart_period;
        let previous = match self.previous.take() {
            Some(previous) if !restart_due => previous,
            _ => return Ok(self.restart(gradient)),
        };

        let transported_grad = previous
            .geodesic
            .parallel_translate(&previous.gradient, previous.step)?;
        let transported_dir = previous.geodesic.velocity_at(previous.step)?;

        let beta = match self.beta(manifold, point, gradient, &transported_grad, &transported_dir)? {
            Some(beta) => beta,
            None => return Ok(self.restart(gradient)),
        };

        let direction = &transported_dir * beta - gradient;

        if manifold.inner_product(point, &direction, gradient)? >= T::zero() {
            debug!("conjugate direction is not a descent direction, restarting");
            return Ok(self.restart(gradient));
        }

        self.iterations_since_restart += 1;
        Ok(direction)
    }

    fn restart(&mut self, gradient: &TangentVector<T>) -> TangentVector<T> {
        self.iterations_since_restart = 1;
        -gradient
    }

    /// Beta from the configured formula; `None` requests a restart.
    fn beta(
        &self,
        manifold: &Grassmann<T>,
        point: &Point<T>,
        gradient: &TangentVector<T>,
        transported_grad: &TangentVector<T>,
        transported_dir: &TangentVector<T>,
    ) -> Result<Option<T>> {
        let (numerator, denominator) = match self.method {
            ConjugateGradientMethod::FletcherReeves => (
                manifold.inner_product(point, gradient, gradient)?,
                manifold.inner_product(point, transported_grad, transported_grad)?,
            ),
            ConjugateGradientMethod::PolakRibiere => {
                let g_diff = gradient - transported_grad;
                (
                    manifold.inner_product(point, gradient, &g_diff)?,
                    manifold.inner_product(point, transported_grad, transported_grad)?,
                )
            }
            ConjugateGradientMethod::HestenesStiefel => {
                let g_diff = gradient - transported_grad;
                (
                    manifold.inner_product(point, gradient, &g_diff)?,
                    manifold.inner_product(point, transported_dir, &g_diff)?,
                )
            }
        };

        if <T as Float>::abs(denominator) <= T::EPSILON {
            return Ok(None);
        }
        let beta = numerator / denominator;
        if !<T as Float>::is_finite(beta) {
            return Ok(None);
        }

        Ok(Some(match self.method {
            ConjugateGradientMethod::PolakRibiere if self.use_pr_plus => {
                <T as Float>::max(beta, T::zero())
            }
            _ => beta,
        }))
    }
}

/// Conjugate Gradient optimizer on the Grassmann manifold.
#[derive(Debug, Clone)]
pub struct ConjugateGradient<T: Scalar> {
    config: CGConfig<T>,
    line_search: GeodesicLineSearch,
}

impl<T: Scalar> ConjugateGradient<T> {
    /// Creates a new Conjugate Gradient optimizer with the given configuration.
    pub fn new(config: CGConfig<T>) -> Self {
        Self {
            config,
            line_search: GeodesicLineSearch::new(),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &CGConfig<T> {
        &self.config
    }

    /// Short name of the configured variant.
    pub fn name(&self) -> &str {
        match self.config.method {
            ConjugateGradientMethod::FletcherReeves => "Riemannian CG-FR",
            ConjugateGradientMethod::PolakRibiere => {
                if self.config.use_pr_plus {
                    "Riemannian CG-PR+"
                } else {
                    "Riemannian CG-PR"
                }
            }
            ConjugateGradientMethod::HestenesStiefel => "Riemannian CG-HS",
        }
    }

    /// Minimizes `cost_fn` over `manifold` starting from `initial_point`.
    pub fn optimize<C>(
        &mut self,
        cost_fn: &C,
        manifold: &Grassmann<T>,
        initial_point: &Point<T>,
        stopping_criterion: &StoppingCriterion<T>,
    ) -> OptimizerResult<OptimizationResult<T>>
    where
        C: CostFunction<T> + ?Sized,
    {
        self.optimize_with_callback(
            cost_fn,
            manifold,
            initial_point,
            stopping_criterion,
            &mut NoOpCallback,
        )
    }

    /// Minimizes `cost_fn`, reporting every accepted step to `callback`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, if the initial point
    /// is not on the manifold, or if the cost function or a callback fails.
    /// Running out of descent is not an error: it ends the run with
    /// [`TerminationReason::NoFurtherDescent`].
    pub fn optimize_with_callback<C, CB>(
        &mut self,
        cost_fn: &C,
        manifold: &Grassmann<T>,
        initial_point: &Point<T>,
        stopping_criterion: &StoppingCriterion<T>,
        callback: &mut CB,
    ) -> OptimizerResult<OptimizationResult<T>>
    where
        C: CostFunction<T> + ?Sized,
        CB: OptimizationCallback<T> + ?Sized,
    {
        self.config.validate()?;
        manifold.check_point(initial_point)?;

        let start_time = Instant::now();
        let function_evals = Cell::new(1usize);
        let gradient_evals = Cell::new(1usize);

        let mut point = initial_point.clone();
        let (mut value, euclidean_grad) = cost_fn.cost_and_gradient(&point)?;
        let mut gradient = manifold.euclidean_to_riemannian_gradient(&point, &euclidean_grad)?;
        let mut grad_norm = manifold.norm(&point, &gradient)?;

        let mut cg_state = ConjugateGradientState::new(self.config.method, self.config.restart_period);
        cg_state.use_pr_plus = self.config.use_pr_plus;

        let mut cost_history = vec![value];
        let mut iteration = 0usize;
        let mut last_step = T::zero();
        let mut last_change: Option<T> = None;
        let mut step_guess = self
            .config
            .initial_step_size
            .unwrap_or(self.config.line_search_params.initial_step_size);

        callback.on_optimization_start()?;
        debug!(
            method = self.name(),
            cost = Scalar::to_f64(value),
            gradient_norm = Scalar::to_f64(grad_norm),
            "starting conjugate gradient"
        );

        let reason = loop {
            if stopping_criterion.gradient_converged(grad_norm) {
                break TerminationReason::Converged;
            }
            if let Some(reason) =
                stopping_criterion.check(iteration, start_time.elapsed(), last_change)
            {
                break reason;
            }

            let direction = cg_state.compute_direction(manifold, &point, &gradient)?;
            let slope = manifold.inner_product(&point, &gradient, &direction)?;
            let geodesic = Geodesic::new(&point, &direction)?;

            let search = {
                let phi = |t: T| -> Result<T> {
                    if t == T::zero() {
                        return Ok(value);
                    }
                    function_evals.set(function_evals.get() + 1);
                    cost_fn.cost(&geodesic.at(t))
                };
                let dphi = |t: T| -> Result<T> {
                    if t == T::zero() {
                        return Ok(slope);
                    }
                    gradient_evals.set(gradient_evals.get() + 1);
                    let moved = geodesic.at(t);
                    let euclidean = cost_fn.gradient(&moved)?;
                    let riemannian = manifold.euclidean_to_riemannian_gradient(&moved, &euclidean)?;
                    let velocity = geodesic.velocity_at(t)?;
                    manifold.inner_product(&moved, &riemannian, &velocity)
                };
                self.line_search
                    .search(&self.config.line_search_params, step_guess, phi, dphi)
            };

            let accepted = match search {
                Ok(result) => result,
                Err(err) if err.is_expected_termination() => {
                    debug!(iteration, reason = %err, "line search found no further descent");
                    break TerminationReason::NoFurtherDescent;
                }
                Err(err) => return Err(err),
            };

            let step = accepted.step_size;
            let new_point = manifold.ensure_orthonormal(geodesic.at(step))?;
            let (new_value, euclidean_grad) = cost_fn.cost_and_gradient(&new_point)?;
            function_evals.set(function_evals.get() + 1);
            gradient_evals.set(gradient_evals.get() + 1);

            if new_value > value {
                // Only re-orthonormalization can undo the line search's decrease.
                debug!(iteration, "step lost its decrease, stopping");
                break TerminationReason::NoFurtherDescent;
            }

            let new_gradient = manifold.euclidean_to_riemannian_gradient(&new_point, &euclidean_grad)?;
            cg_state.record_step(geodesic, step, gradient);

            last_change = Some(value - new_value);
            point = new_point;
            value = new_value;
            gradient = new_gradient;
            grad_norm = manifold.norm(&point, &gradient)?;
            last_step = step;
            step_guess = step;
            iteration += 1;
            cost_history.push(value);

            debug!(
                iteration,
                cost = Scalar::to_f64(value),
                gradient_norm = Scalar::to_f64(grad_norm),
                step = Scalar::to_f64(step),
                wolfe = accepted.wolfe_satisfied,
                "conjugate gradient step"
            );

            let info = CallbackInfo {
                iteration,
                value,
                gradient_norm: grad_norm,
                step_size: step,
                elapsed: start_time.elapsed(),
            };
            if !callback.on_iteration_end(&info)? {
                break TerminationReason::CallbackRequest;
            }
        };

        let duration = start_time.elapsed();
        callback.on_optimization_end(&CallbackInfo {
            iteration,
            value,
            gradient_norm: grad_norm,
            step_size: last_step,
            elapsed: duration,
        })?;

        info!(
            method = self.name(),
            iterations = iteration,
            cost = Scalar::to_f64(value),
            gradient_norm = Scalar::to_f64(grad_norm),
            reason = ?reason,
            "conjugate gradient finished"
        );

        Ok(OptimizationResult::new(point, value, iteration, duration, reason)
            .with_gradient_norm(grad_norm)
            .with_evaluations(function_evals.get(), gradient_evals.get())
            .with_cost_history(cost_history))
    }
}

impl<T: Scalar> Default for ConjugateGradient<T> {
    fn default() -> Self {
        Self::new(CGConfig::default())
    }
}

/// Steepest descent direction for a Euclidean gradient at `point`.
pub fn steepest_descent<T: Scalar>(
    manifold: &Grassmann<T>,
    point: &Point<T>,
    euclidean_grad: &DMatrix<T>,
) -> Result<TangentVector<T>> {
    Ok(-manifold.euclidean_to_riemannian_gradient(point, euclidean_grad)?)
}
