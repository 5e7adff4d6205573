//! The secant projection driver.
//!
//! [`SecantProjection`] owns a projection `W ∈ Gr(k, n)` and runs the whole
//! workflow around it: a coordinate-axis initial guess, conjugate gradient
//! on the secant cost, diagnostics and persistence. Mutating steps return
//! `&mut Self` so they chain:
//!
//! ```rust
//! use nalgebra::DVector;
//! use secantopt_secants::{DataSet, ProjectionConfig, SecantConfig, SecantProjection, Secants};
//!
//! let points: Vec<DVector<f64>> = (0..20)
//!     .map(|i| {
//!         let t = i as f64 * 0.3;
//!         DVector::from_vec(vec![t.cos(), 0.5 * t.sin(), 0.01 * t.cos()])
//!     })
//!     .collect();
//! let data = DataSet::from_points(points, 0.0)?;
//! let secants = Secants::from_cloud(&data, &SecantConfig::default())?;
//!
//! let mut projection = SecantProjection::new(3, 2, ProjectionConfig::default())?;
//! let stats = projection
//!     .compute_initial(&[data])?
//!     .find(&secants)?
//!     .analyse_secants(&secants)?;
//! assert!(stats.min > 0.0);
//! # Ok::<(), secantopt_secants::SecantError>(())
//! ```

use std::cmp::Ordering;
use std::path::Path;

use nalgebra::DMatrix;
use num_traits::Float;
use secantopt_core::cost_function::CostFunction;
use secantopt_core::error::{ManifoldError, OptimizerError};
use secantopt_core::optimizer::{OptimizationResult, StoppingCriterion};
use secantopt_core::parallel::{ParallelConfig, WorkerPool};
use secantopt_core::types::Scalar;
use secantopt_manifolds::{Geodesic, Grassmann};
use secantopt_optim::{CGConfig, ConjugateGradient};
use tracing::{debug, info, warn};

use crate::cost::{MultiSecantCost, SecantCost};
use crate::dataset::PointCloud;
use crate::error::{SecantError, SecantResult};
use crate::io;
use crate::reduction::{ReducedData, VectorField};
use crate::secants::{SecantConfig, SecantStatistics, Secants};

/// Geodesic distance moved to take a start point off a secant's kernel.
const KERNEL_ESCAPE_STEP: f64 = 1e-3;

/// Tilts tried before a kernel secant is reported as an error.
const KERNEL_ESCAPE_ATTEMPTS: usize = 4;

/// Configuration of the projection workflow.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProjectionConfig<T: Scalar> {
    /// Conjugate gradient settings
    pub cg: CGConfig<T>,

    /// When to stop optimizing
    pub stopping: StoppingCriterion<T>,

    /// Report a run that hits its limits as an error
    pub require_convergence: bool,

    /// How secants are built by [`SecantProjection::find_from_data`]
    pub secants: SecantConfig<T>,

    /// Angular culling tolerance in degrees applied by `find_from_data`
    pub cull_degrees: Option<T>,

    /// Worker pool for multi-slice work
    pub parallel: ParallelConfig,
}

impl<T: Scalar> Default for ProjectionConfig<T> {
    fn default() -> Self {
        Self {
            cg: CGConfig::default(),
            stopping: StoppingCriterion::default(),
            require_convergence: false,
            secants: SecantConfig::default(),
            cull_degrees: None,
            parallel: ParallelConfig::default(),
        }
    }
}

impl<T: Scalar> ProjectionConfig<T> {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the conjugate gradient settings.
    pub fn with_cg(mut self, cg: CGConfig<T>) -> Self {
        self.cg = cg;
        self
    }

    /// Sets the stopping criterion.
    pub fn with_stopping(mut self, stopping: StoppingCriterion<T>) -> Self {
        self.stopping = stopping;
        self
    }

    /// Shorthand for the iteration limit of the stopping criterion.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.stopping = self.stopping.with_max_iterations(max_iterations);
        self
    }

    /// Makes non-convergence an error.
    pub fn with_require_convergence(mut self, require: bool) -> Self {
        self.require_convergence = require;
        self
    }

    /// Sets how secants are built from data.
    pub fn with_secants(mut self, secants: SecantConfig<T>) -> Self {
        self.secants = secants;
        self
    }

    /// Culls secants built from data at `degrees`.
    pub fn with_cull_degrees(mut self, degrees: T) -> Self {
        self.cull_degrees = Some(degrees);
        self
    }

    /// Sets the worker pool configuration.
    pub fn with_parallel(mut self, parallel: ParallelConfig) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Owner of a projection matrix and the workflow that optimizes it.
#[derive(Debug, Clone)]
pub struct SecantProjection<T: Scalar> {
    projection: DMatrix<T>,
    manifold: Grassmann<T>,
    config: ProjectionConfig<T>,
    last_result: Option<OptimizationResult<T>>,
}

impl<T: Scalar> SecantProjection<T> {
    /// Projection from `Rⁿ` onto the first `k` coordinates.
    pub fn new(ambient_dim: usize, target_dim: usize, config: ProjectionConfig<T>) -> SecantResult<Self> {
        let manifold = Grassmann::new(ambient_dim, target_dim)?;
        Ok(Self {
            projection: DMatrix::identity(ambient_dim, target_dim),
            manifold,
            config,
            last_result: None,
        })
    }

    /// Wraps an existing projection, which must have orthonormal columns.
    pub fn from_matrix(projection: DMatrix<T>, config: ProjectionConfig<T>) -> SecantResult<Self> {
        let manifold = Grassmann::new(projection.nrows(), projection.ncols())?;
        manifold.check_point(&projection)?;
        Ok(Self {
            projection,
            manifold,
            config,
            last_result: None,
        })
    }

    /// The current projection `W`.
    pub fn projection(&self) -> &DMatrix<T> {
        &self.projection
    }

    /// Consumes the driver, returning `W`.
    pub fn into_projection(self) -> DMatrix<T> {
        self.projection
    }

    /// The Grassmann manifold `W` lives on.
    pub fn manifold(&self) -> &Grassmann<T> {
        &self.manifold
    }

    /// The workflow configuration.
    pub fn config(&self) -> &ProjectionConfig<T> {
        &self.config
    }

    /// Result of the most recent optimization run.
    pub fn last_result(&self) -> Option<&OptimizationResult<T>> {
        self.last_result.as_ref()
    }

    /// Dimension `n` of the full state space.
    pub fn ambient_dim(&self) -> usize {
        self.manifold.ambient_dim()
    }

    /// Dimension `k` of the reduced space.
    pub fn target_dim(&self) -> usize {
        self.manifold.subspace_dim()
    }

    /// Sets `W` to the `k` coordinate axes along which the data spreads most.
    ///
    /// Spread is `max − min` of a coordinate over every sample of every
    /// cloud. Ties go to the lower axis index.
    pub fn compute_initial<P>(&mut self, clouds: &[P]) -> SecantResult<&mut Self>
    where
        P: PointCloud<T>,
    {
        let n = self.ambient_dim();
        let mut low = vec![<T as Float>::infinity(); n];
        let mut high = vec![<T as Float>::neg_infinity(); n];
        let mut seen = 0usize;

        for cloud in clouds {
            if cloud.dimension() != n {
                return Err(SecantError::dimension_mismatch(n, cloud.dimension()));
            }
            for point in cloud.points() {
                for (axis, &value) in point.iter().enumerate() {
                    low[axis] = <T as Float>::min(low[axis], value);
                    high[axis] = <T as Float>::max(high[axis], value);
                }
                seen += 1;
            }
        }
        if seen == 0 {
            return Err(SecantError::invalid_parameter(
                "initial projection needs at least one sample",
            ));
        }

        let spread: Vec<T> = high.iter().zip(&low).map(|(&h, &l)| h - l).collect();
        let mut axes: Vec<usize> = (0..n).collect();
        axes.sort_by(|&a, &b| spread[b].partial_cmp(&spread[a]).unwrap_or(Ordering::Equal));
        axes.truncate(self.target_dim());

        let mut projection = DMatrix::zeros(n, axes.len());
        for (column, &axis) in axes.iter().enumerate() {
            projection[(axis, column)] = T::one();
        }
        info!(samples = seen, axes = ?axes, "Initial projection from coordinate spread");

        self.projection = projection;
        self.last_result = None;
        Ok(self)
    }

    /// Minimizes the secant cost of one secant set, updating `W`.
    pub fn find(&mut self, secants: &Secants<T>) -> SecantResult<&mut Self> {
        let cost = SecantCost::new(secants)?;
        self.optimize(&cost)?;
        Ok(self)
    }

    /// Minimizes the mean secant cost over several parameter slices.
    pub fn find_many(&mut self, sets: &[Secants<T>]) -> SecantResult<&mut Self> {
        let cost = MultiSecantCost::new(sets)?;
        if self.config.parallel.should_parallelize(sets.len()) {
            let pool = WorkerPool::new(self.config.parallel.clone())?;
            self.optimize(&cost.with_pool(&pool))?;
        } else {
            self.optimize(&cost)?;
        }
        Ok(self)
    }

    /// Builds (and optionally culls) one secant set per cloud, then runs
    /// [`find_many`](Self::find_many).
    pub fn find_from_data<P>(&mut self, clouds: &[P]) -> SecantResult<&mut Self>
    where
        P: PointCloud<T> + Sync,
    {
        let pool = WorkerPool::new(self.config.parallel.clone())?;
        let mut sets = Secants::compute_many(clouds, &self.config.secants, &pool)?;
        if let Some(degrees) = self.config.cull_degrees {
            sets = sets
                .iter()
                .map(|set| set.cull_degrees(degrees))
                .collect::<SecantResult<Vec<_>>>()?;
        }
        self.find_many(&sets)
    }

    fn optimize<C>(&mut self, cost: &C) -> SecantResult<()>
    where
        C: CostFunction<T> + ?Sized,
    {
        self.escape_kernel(cost)?;
        let mut optimizer = ConjugateGradient::new(self.config.cg.clone());
        let result = optimizer.optimize(cost, &self.manifold, &self.projection, &self.config.stopping)?;
        self.projection = result.point.clone();

        let final_value = Scalar::to_f64(result.value);
        let gradient_norm = result.gradient_norm.map_or(f64::NAN, <T as Scalar>::to_f64);
        if result.converged {
            info!(
                iterations = result.iterations,
                cost = final_value,
                reason = ?result.termination_reason,
                "Projection converged"
            );
        } else {
            warn!(
                iterations = result.iterations,
                cost = final_value,
                gradient_norm,
                reason = ?result.termination_reason,
                "Projection did not converge"
            );
        }

        let converged = result.converged;
        let iterations = result.iterations;
        self.last_result = Some(result);
        if !converged && self.config.require_convergence {
            return Err(OptimizerError::max_iterations_reached(iterations, final_value, gradient_norm).into());
        }
        Ok(())
    }

    /// Moves `W` a short way along a fixed horizontal direction while some
    /// secant projects to zero, which happens when the coordinate start of
    /// [`compute_initial`](Self::compute_initial) drops the axis a secant
    /// lies on.
    fn escape_kernel<C>(&mut self, cost: &C) -> SecantResult<()>
    where
        C: CostFunction<T> + ?Sized,
    {
        let (n, k) = self.projection.shape();
        for attempt in 0..=KERNEL_ESCAPE_ATTEMPTS {
            match cost.cost(&self.projection) {
                Ok(_) => return Ok(()),
                Err(ManifoldError::NumericalError { .. }) if attempt < KERNEL_ESCAPE_ATTEMPTS => {
                    let tilt = DMatrix::from_fn(n, k, |r, c| {
                        <T as Scalar>::from_f64((((r + 1) * (c + 2) + attempt) as f64).sin())
                    });
                    let direction = self.manifold.horizontal_component(&self.projection, &tilt)?;
                    let norm = self.manifold.norm(&self.projection, &direction)?;
                    if norm <= T::EPSILON {
                        continue;
                    }
                    let geodesic = Geodesic::new(&self.projection, &(direction / norm))?;
                    self.projection = geodesic.at(<T as Scalar>::from_f64(KERNEL_ESCAPE_STEP));
                    debug!(attempt, "Start projection annihilates a secant, tilting");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }

    /// Projected secant lengths under the current `W`. Does not modify `W`.
    pub fn analyse_secants(&self, secants: &Secants<T>) -> SecantResult<SecantStatistics<T>> {
        let stats = secants.analyse(&self.projection)?;
        info!(
            count = stats.count,
            min = Scalar::to_f64(stats.min),
            max = Scalar::to_f64(stats.max),
            mean = Scalar::to_f64(stats.mean),
            "Projected secant lengths"
        );
        Ok(stats)
    }

    /// Projects a data set and its vector field through `W`.
    pub fn reduce<F, P>(&self, field: &F, data: &P) -> SecantResult<ReducedData<T>>
    where
        F: VectorField<T> + ?Sized,
        P: PointCloud<T> + ?Sized,
    {
        ReducedData::compute(field, data, &self.projection)
    }

    /// Saves `W` as raw row-major `f64` values.
    pub fn write_binary<Q: AsRef<Path>>(&self, path: Q) -> SecantResult<()> {
        io::save_binary(&self.projection, path)
    }

    /// Loads `W` from a binary file of the current shape.
    pub fn read_binary<Q: AsRef<Path>>(&mut self, path: Q) -> SecantResult<&mut Self> {
        let projection = io::load_binary(path, self.ambient_dim(), self.target_dim())?;
        self.replace_projection(projection)
    }

    /// Saves `W` as CSV.
    pub fn write_csv<Q: AsRef<Path>>(&self, path: Q) -> SecantResult<()> {
        io::save_csv(&self.projection, path)
    }

    /// Loads `W` from a CSV file; the shape must match.
    pub fn read_csv<Q: AsRef<Path>>(&mut self, path: Q) -> SecantResult<&mut Self> {
        let projection = io::load_csv(path)?;
        self.replace_projection(projection)
    }

    fn replace_projection(&mut self, projection: DMatrix<T>) -> SecantResult<&mut Self> {
        if projection.shape() != self.projection.shape() {
            return Err(SecantError::dimension_mismatch(
                format!("{} × {}", self.ambient_dim(), self.target_dim()),
                format!("{} × {}", projection.nrows(), projection.ncols()),
            ));
        }
        self.manifold.check_point(&projection)?;
        self.projection = projection;
        self.last_result = None;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DataSet;
    use nalgebra::DVector;

    fn cloud(points: &[[f64; 3]]) -> DataSet<f64> {
        DataSet::from_points(points.iter().map(|p| DVector::from_column_slice(p)).collect(), 0.0).unwrap()
    }

    #[test]
    fn test_compute_initial_picks_widest_axes() {
        let a = cloud(&[[0.0, 0.0, 0.0], [0.1, 5.0, 1.0]]);
        let b = cloud(&[[0.0, 0.0, -2.0]]);
        let mut projection = SecantProjection::new(3, 2, ProjectionConfig::default()).unwrap();
        projection.compute_initial(&[a, b]).unwrap();

        let mut expected = DMatrix::zeros(3, 2);
        expected[(1, 0)] = 1.0;
        expected[(2, 1)] = 1.0;
        assert_eq!(projection.projection(), &expected);
    }

    #[test]
    fn test_compute_initial_ties_prefer_lower_axis() {
        let a = cloud(&[[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]]);
        let mut projection = SecantProjection::new(3, 1, ProjectionConfig::default()).unwrap();
        projection.compute_initial(&[a]).unwrap();
        assert_eq!(projection.projection(), &DMatrix::identity(3, 1));
    }

    #[test]
    fn test_find_leaves_kernel_of_coordinate_start() {
        // x and y have the widest spread; the first pair differs only in z.
        let data = cloud(&[[0.0, 0.0, 0.0], [0.0, 0.0, 0.5], [2.0, 0.3, 0.1], [0.4, 2.0, 0.2]]);
        let secants = Secants::from_cloud(&data, &SecantConfig::default()).unwrap();
        let mut projection = SecantProjection::new(3, 2, ProjectionConfig::default()).unwrap();
        projection.compute_initial(&[data]).unwrap();
        assert!(SecantCost::new(&secants).unwrap().cost(projection.projection()).is_err());

        let stats = projection.find(&secants).unwrap().analyse_secants(&secants).unwrap();
        assert!(stats.min > 0.0);
        assert!(projection.manifold().is_point_on_manifold(projection.projection(), 1e-10));
        assert!(projection.last_result().is_some());
    }

    #[test]
    fn test_compute_initial_errors() {
        let mut projection = SecantProjection::<f64>::new(3, 2, ProjectionConfig::default()).unwrap();
        assert!(projection.compute_initial::<DataSet<f64>>(&[]).is_err());
        let wrong = DataSet::from_points(vec![DVector::from_vec(vec![1.0, 2.0])], 0.0).unwrap();
        assert!(projection.compute_initial(&[wrong]).is_err());
    }

    #[test]
    fn test_constructor_validation() {
        assert!(SecantProjection::<f64>::new(3, 0, ProjectionConfig::default()).is_err());
        assert!(SecantProjection::<f64>::new(2, 3, ProjectionConfig::default()).is_err());
        let not_orthonormal = DMatrix::from_column_slice(2, 1, &[1.0, 1.0]);
        assert!(SecantProjection::from_matrix(not_orthonormal, ProjectionConfig::default()).is_err());
    }

    #[test]
    fn test_require_convergence() {
        let points: Vec<DVector<f64>> = (0..12)
            .map(|i| {
                let t = i as f64 * 0.5;
                DVector::from_vec(vec![t.cos(), t.sin(), 0.3 * (2.0 * t).sin(), 0.2 * t.cos()])
            })
            .collect();
        let secants = Secants::compute_from_data(&points, &SecantConfig::default()).unwrap();
        let start = DMatrix::from_column_slice(4, 2, &[0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0]);

        let config = ProjectionConfig::default()
            .with_max_iterations(1)
            .with_require_convergence(true);
        let mut projection = SecantProjection::from_matrix(start.clone(), config).unwrap();
        let err = projection.find(&secants).unwrap_err();
        assert!(matches!(
            err,
            SecantError::Optimizer(OptimizerError::MaxIterationsReached { .. })
        ));
        // The partial result is kept.
        assert!(projection.last_result().is_some());
        assert_ne!(projection.projection(), &start);

        let config = ProjectionConfig::default().with_max_iterations(1);
        let mut lenient = SecantProjection::from_matrix(start, config).unwrap();
        lenient.find(&secants).unwrap();
        assert!(!lenient.last_result().unwrap().converged);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_serde_round_trip() {
        let config = ProjectionConfig::<f64>::default()
            .with_cull_degrees(2.0)
            .with_require_convergence(true);
        let json = serde_json::to_string(&config).unwrap();
        let back: ProjectionConfig<f64> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
