//! Callback support for optimization algorithms.
//!
//! Callbacks observe every accepted step and may stop a run early.

use crate::error::Result;
use crate::types::Scalar;
use std::time::Duration;
use tracing::info;

/// Information passed to callbacks after each accepted step.
#[derive(Clone, Debug)]
pub struct CallbackInfo<T: Scalar> {
    /// Number of accepted steps so far
    pub iteration: usize,

    /// Cost at the current point
    pub value: T,

    /// Riemannian gradient norm at the previous point
    pub gradient_norm: T,

    /// Step size accepted by the line search
    pub step_size: T,

    /// Elapsed time since optimization start
    pub elapsed: Duration,
}

/// Trait for optimization callbacks.
pub trait OptimizationCallback<T: Scalar> {
    /// Called at the start of optimization.
    fn on_optimization_start(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called at the end of each iteration.
    ///
    /// Returns `true` to continue optimization, `false` to stop early.
    fn on_iteration_end(&mut self, info: &CallbackInfo<T>) -> Result<bool> {
        let _ = info;
        Ok(true)
    }

    /// Called at the end of optimization.
    fn on_optimization_end(&mut self, info: &CallbackInfo<T>) -> Result<()> {
        let _ = info;
        Ok(())
    }
}

/// A no-op callback that does nothing.
pub struct NoOpCallback;

impl<T: Scalar> OptimizationCallback<T> for NoOpCallback {}

/// A callback that logs progress through `tracing`.
pub struct ProgressCallback {
    log_every: usize,
}

impl ProgressCallback {
    /// Create a callback logging every `log_every` iterations.
    pub fn new(log_every: usize) -> Self {
        Self {
            log_every: log_every.max(1),
        }
    }
}

impl<T: Scalar> OptimizationCallback<T> for ProgressCallback {
    fn on_optimization_start(&mut self) -> Result<()> {
        info!("starting optimization");
        Ok(())
    }

    fn on_iteration_end(&mut self, info: &CallbackInfo<T>) -> Result<bool> {
        if info.iteration % self.log_every == 0 {
            info!(
                iteration = info.iteration,
                cost = Scalar::to_f64(info.value),
                gradient_norm = Scalar::to_f64(info.gradient_norm),
                step = Scalar::to_f64(info.step_size),
                "optimization progress"
            );
        }
        Ok(true)
    }

    fn on_optimization_end(&mut self, info: &CallbackInfo<T>) -> Result<()> {
        info!(
            iterations = info.iteration,
            cost = Scalar::to_f64(info.value),
            "optimization complete"
        );
        Ok(())
    }
}

/// Stops after a fixed number of iterations.
pub struct StopAfter {
    iterations: usize,
}

impl StopAfter {
    /// Creates a callback that stops once `iterations` steps were accepted.
    pub fn new(iterations: usize) -> Self {
        Self { iterations }
    }
}

impl<T: Scalar> OptimizationCallback<T> for StopAfter {
    fn on_iteration_end(&mut self, info: &CallbackInfo<T>) -> Result<bool> {
        Ok(info.iteration < self.iterations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(iteration: usize) -> CallbackInfo<f64> {
        CallbackInfo {
            iteration,
            value: 1.0,
            gradient_norm: 0.1,
            step_size: 0.01,
            elapsed: Duration::ZERO,
        }
    }

    #[test]
    fn test_stop_after() {
        let mut cb = StopAfter::new(3);
        assert!(OptimizationCallback::<f64>::on_iteration_end(&mut cb, &info(2)).unwrap());
        assert!(!OptimizationCallback::<f64>::on_iteration_end(&mut cb, &info(3)).unwrap());
    }

    #[test]
    fn test_progress_never_stops() {
        let mut cb = ProgressCallback::new(0);
        for i in 0..5 {
            assert!(cb.on_iteration_end(&info(i)).unwrap());
        }
        let mut noop = NoOpCallback;
        assert!(OptimizationCallback::<f64>::on_iteration_end(&mut noop, &info(1)).unwrap());
    }
}
