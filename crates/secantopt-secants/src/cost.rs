//! Secant cost and its gradient.
//!
//! For a candidate projection `X` (an `n × k` matrix) and weighted unit
//! secants `s_j` with weights `w_j`:
//!
//! ```text
//! S(X) = (1/Σw) · Σ_j w_j / ‖Xᵀ s_j‖
//! G(X) = −(1/Σw) · Σ_j (w_j / ‖Xᵀ s_j‖³) · s_j (Xᵀ s_j)ᵀ
//! ```
//!
//! `S` grows without bound as a secant approaches the kernel of `Xᵀ`, so
//! minimizing it keeps every secant visible through the projection. `G` is
//! the Euclidean gradient; the optimizer takes its horizontal component.

use nalgebra::{DMatrix, DVectorView};
use num_traits::Float;
use secantopt_core::cost_function::CostFunction;
use secantopt_core::error::{ManifoldError, Result};
use secantopt_core::parallel::WorkerPool;
use secantopt_core::types::{Point, Scalar, TangentVector};

use crate::error::{SecantError, SecantResult};
use crate::secants::Secants;

fn check_shape<T: Scalar>(point: &Point<T>, dimension: usize) -> Result<()> {
    if point.nrows() != dimension || point.ncols() == 0 {
        return Err(ManifoldError::dimension_mismatch(
            format!("{} × k matrix with k ≥ 1", dimension),
            format!("{} × {}", point.nrows(), point.ncols()),
        ));
    }
    Ok(())
}

fn check_length<T: Scalar>(length: T) -> Result<()> {
    if length <= T::EPSILON || !<T as Float>::is_finite(length) {
        return Err(ManifoldError::numerical_error(format!(
            "secant projected onto (numerically) zero length {}",
            length
        )));
    }
    Ok(())
}

/// Inverse projected-length cost of a single secant set.
#[derive(Debug, Clone, Copy)]
pub struct SecantCost<'a, T: Scalar> {
    secants: &'a Secants<T>,
    normalization: T,
}

impl<'a, T: Scalar> SecantCost<'a, T> {
    /// Wraps a secant set.
    ///
    /// # Errors
    ///
    /// `EmptySecantSet` if the set has no usable secant.
    pub fn new(secants: &'a Secants<T>) -> SecantResult<Self> {
        if secants.is_empty() {
            return Err(SecantError::EmptySecantSet);
        }
        Ok(Self {
            secants,
            normalization: T::one() / <T as Scalar>::from_usize(secants.total_weight()),
        })
    }

    /// The wrapped secant set.
    pub fn secants(&self) -> &'a Secants<T> {
        self.secants
    }

    fn evaluate(&self, point: &Point<T>, with_gradient: bool) -> Result<(T, Option<TangentVector<T>>)> {
        check_shape(point, self.secants.dimension())?;

        // All secants at once when they are materialized.
        if let (Some(matrix), Some(weights)) = (self.secants.matrix(), self.secants.weights()) {
            let projected = point.tr_mul(matrix);
            let mut scaled = projected.clone();
            let mut total = T::zero();
            for ((column, mut out), &weight) in projected
                .column_iter()
                .zip(scaled.column_iter_mut())
                .zip(weights)
            {
                let length = column.norm();
                check_length(length)?;
                let w = <T as Scalar>::from_usize(weight);
                total += w / length;
                out *= w / (length * length * length);
            }
            let gradient = with_gradient.then(|| matrix * scaled.transpose() * (-self.normalization));
            return Ok((total * self.normalization, gradient));
        }

        let mut total = T::zero();
        let mut gradient = with_gradient.then(|| DMatrix::zeros(point.nrows(), point.ncols()));
        self.secants.try_for_each(|secant, weight| -> Result<()> {
            let s = DVectorView::from_slice(secant, secant.len());
            let projected = point.tr_mul(&s);
            let length = projected.norm();
            check_length(length)?;
            let w = <T as Scalar>::from_usize(weight);
            total += w / length;
            if let Some(g) = gradient.as_mut() {
                g.ger(-w / (length * length * length), &s, &projected, T::one());
            }
            Ok(())
        })?;
        let gradient = gradient.map(|g| g * self.normalization);
        Ok((total * self.normalization, gradient))
    }
}

impl<T: Scalar> CostFunction<T> for SecantCost<'_, T> {
    fn cost(&self, point: &Point<T>) -> Result<T> {
        self.evaluate(point, false).map(|(cost, _)| cost)
    }

    fn cost_and_gradient(&self, point: &Point<T>) -> Result<(T, TangentVector<T>)> {
        match self.evaluate(point, true)? {
            (cost, Some(gradient)) => Ok((cost, gradient)),
            (_, None) => Err(ManifoldError::numerical_error("gradient was not evaluated")),
        }
    }
}

/// Mean of the secant costs of several parameter slices sharing one projection.
///
/// Slices are evaluated on the worker pool when one is given.
#[derive(Debug)]
pub struct MultiSecantCost<'a, T: Scalar> {
    slices: Vec<SecantCost<'a, T>>,
    pool: Option<&'a WorkerPool>,
}

impl<'a, T: Scalar> MultiSecantCost<'a, T> {
    /// Builds the averaged cost over `sets`.
    ///
    /// # Errors
    ///
    /// `EmptySecantSet` if `sets` is empty or any slice is empty, and
    /// `DimensionMismatch` if the slices live in different spaces.
    pub fn new(sets: &'a [Secants<T>]) -> SecantResult<Self> {
        let first = sets.first().ok_or(SecantError::EmptySecantSet)?;
        if let Some(other) = sets.iter().find(|s| s.dimension() != first.dimension()) {
            return Err(SecantError::dimension_mismatch(first.dimension(), other.dimension()));
        }
        let slices = sets.iter().map(SecantCost::new).collect::<SecantResult<Vec<_>>>()?;
        Ok(Self { slices, pool: None })
    }

    /// Evaluates the slices on `pool`.
    pub fn with_pool(mut self, pool: &'a WorkerPool) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Number of slices.
    pub fn len(&self) -> usize {
        self.slices.len()
    }

    /// Always false; construction rejects an empty slice list.
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    fn per_slice<R, F>(&self, f: F) -> Result<Vec<R>>
    where
        R: Send,
        F: Fn(&SecantCost<'a, T>) -> Result<R> + Sync + Send,
    {
        match self.pool {
            Some(pool) => pool.try_map(&self.slices, f),
            None => self.slices.iter().map(f).collect(),
        }
    }

    fn scale(&self) -> T {
        T::one() / <T as Scalar>::from_usize(self.slices.len())
    }
}

impl<T: Scalar> CostFunction<T> for MultiSecantCost<'_, T> {
    fn cost(&self, point: &Point<T>) -> Result<T> {
        let costs = self.per_slice(|slice| slice.cost(point))?;
        Ok(costs.into_iter().fold(T::zero(), |acc, c| acc + c) * self.scale())
    }

    fn cost_and_gradient(&self, point: &Point<T>) -> Result<(T, TangentVector<T>)> {
        let parts = self.per_slice(|slice| slice.cost_and_gradient(point))?;
        let mut cost = T::zero();
        let mut gradient = DMatrix::zeros(point.nrows(), point.ncols());
        for (c, g) in parts {
            cost += c;
            gradient += g;
        }
        let scale = self.scale();
        Ok((cost * scale, gradient * scale))
    }
}
