//! Secant-based projection finding for model reduction.
//!
//! Given samples of a high-dimensional trajectory, this crate looks for the
//! `k`-dimensional linear projection that shortens the unit secants between
//! samples the least, and then expresses the data and the model in the
//! reduced coordinates.
//!
//! # Modules
//!
//! - [`dataset`]: Point clouds and the [`PointCloud`] provider trait
//! - [`secants`]: Secant sets, lazy or precomputed
//! - [`culling`]: Greedy merging of near-parallel secants
//! - [`cost`]: The inverse projected-length cost and its gradient
//! - [`projection`]: The [`SecantProjection`] workflow driver
//! - [`io`]: Binary and CSV persistence of projections
//! - [`reduction`]: Reduced data and trajectory diagnostics
//! - [`error`]: The [`SecantError`] type

pub mod cost;
pub mod culling;
pub mod dataset;
pub mod error;
pub mod io;
pub mod projection;
pub mod reduction;
pub mod secants;

pub use cost::{MultiSecantCost, SecantCost};
pub use dataset::{DataSet, PointCloud};
pub use error::{SecantError, SecantResult};
pub use projection::{ProjectionConfig, SecantProjection};
pub use reduction::{write_comparisons_csv, Jacobian, ReducedData, TrajectoryComparison, VectorField};
pub use secants::{
    index_from_pair, pair_count, pair_from_index, DegeneratePolicy, SecantConfig, SecantStatistics,
    Secants,
};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::cost::{MultiSecantCost, SecantCost};
    pub use crate::dataset::{DataSet, PointCloud};
    pub use crate::error::{SecantError, SecantResult};
    pub use crate::projection::{ProjectionConfig, SecantProjection};
    pub use crate::reduction::{Jacobian, ReducedData, TrajectoryComparison, VectorField};
    pub use crate::secants::{DegeneratePolicy, SecantConfig, SecantStatistics, Secants};
}
