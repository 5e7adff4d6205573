//! Point clouds sampled from a full model.
//!
//! A point cloud is an ordered sequence of state vectors of a fixed
//! dimension, tagged with the model parameter value that produced it.
//! Everything downstream only reads point clouds, so the [`PointCloud`]
//! trait is all the secant pipeline asks of a data provider.

use nalgebra::DVector;
use secantopt_core::types::Scalar;

use crate::error::{SecantError, SecantResult};

/// Read-only access to an ordered set of samples.
pub trait PointCloud<T: Scalar> {
    /// The samples, in order.
    fn points(&self) -> &[DVector<T>];

    /// Dimension of every sample.
    fn dimension(&self) -> usize;

    /// Model parameter value the samples were produced with.
    fn parameter(&self) -> T;

    /// Number of samples.
    fn len(&self) -> usize {
        self.points().len()
    }

    /// True if there are no samples.
    fn is_empty(&self) -> bool {
        self.points().is_empty()
    }
}

/// An owned point cloud.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSet<T: Scalar> {
    points: Vec<DVector<T>>,
    dimension: usize,
    parameter: T,
}

impl<T: Scalar> DataSet<T> {
    /// Creates an empty data set for samples of the given dimension.
    pub fn new(dimension: usize, parameter: T) -> Self {
        Self {
            points: Vec::new(),
            dimension,
            parameter,
        }
    }

    /// Builds a data set from samples, checking that they share one dimension.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for an empty input (the dimension would be
    /// unknown) and `DimensionMismatch` for a ragged input.
    pub fn from_points(points: Vec<DVector<T>>, parameter: T) -> SecantResult<Self> {
        let dimension = points
            .first()
            .map(|p| p.len())
            .ok_or_else(|| SecantError::invalid_parameter("cannot infer dimension of an empty point list"))?;
        let mut data = Self::new(dimension, parameter);
        data.points.reserve(points.len());
        for point in points {
            data.push(point)?;
        }
        Ok(data)
    }

    /// Appends a sample.
    pub fn push(&mut self, point: DVector<T>) -> SecantResult<()> {
        if point.len() != self.dimension {
            return Err(SecantError::dimension_mismatch(self.dimension, point.len()));
        }
        self.points.push(point);
        Ok(())
    }

    /// Keeps at most `max_points` samples, evenly spaced along the sequence.
    ///
    /// The first sample is always kept. Returns a clone when the set is
    /// already small enough.
    pub fn subsample(&self, max_points: usize) -> Self {
        let len = self.points.len();
        if max_points == 0 {
            return Self::new(self.dimension, self.parameter);
        }
        if len <= max_points {
            return self.clone();
        }
        let points = (0..max_points)
            .map(|i| self.points[i * len / max_points].clone())
            .collect();
        Self {
            points,
            dimension: self.dimension,
            parameter: self.parameter,
        }
    }

    /// Consumes the data set, returning its samples.
    pub fn into_points(self) -> Vec<DVector<T>> {
        self.points
    }
}

impl<T: Scalar> PointCloud<T> for DataSet<T> {
    fn points(&self) -> &[DVector<T>] {
        &self.points
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn parameter(&self) -> T {
        self.parameter
    }
}
