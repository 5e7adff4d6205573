//! Secant-based Grassmannian projections for model reduction.
//!
//! This crate re-exports the workspace:
//!
//! - [`core`]: scalar trait, errors, cost functions, line search, worker pool
//! - [`manifolds`]: the Grassmann manifold, geodesics and parallel transport
//! - [`optim`]: Riemannian conjugate gradient
//! - [`secants`]: secant sets, culling, the secant cost and the projection driver
//!
//! # Example
//!
//! ```rust
//! use secantopt::prelude::*;
//!
//! // A circle in the (x, z) plane of R³.
//! let points: Vec<DVector<f64>> = (0..16)
//!     .map(|i| {
//!         let t = i as f64 * std::f64::consts::PI / 8.0;
//!         DVector::from_vec(vec![t.cos(), 0.0, t.sin()])
//!     })
//!     .collect();
//! let data = DataSet::from_points(points, 0.0)?;
//! let secants = Secants::from_cloud(&data, &SecantConfig::default())?;
//!
//! let mut projection = SecantProjection::new(3, 2, ProjectionConfig::default())?;
//! projection.compute_initial(&[data])?.find(&secants)?;
//!
//! // The y axis carries no information and is projected away.
//! let w = projection.projection();
//! assert!((w[(1, 0)].powi(2) + w[(1, 1)].powi(2)).sqrt() < 1e-6);
//! # Ok::<(), SecantError>(())
//! ```

pub use secantopt_core as core;
pub use secantopt_manifolds as manifolds;
pub use secantopt_optim as optim;
pub use secantopt_secants as secants;

pub use nalgebra;

/// Everything needed for the usual workflow.
pub mod prelude {
    pub use secantopt_core::prelude::*;
    pub use secantopt_manifolds::prelude::*;
    pub use secantopt_optim::prelude::*;
    pub use secantopt_secants::prelude::*;
}
