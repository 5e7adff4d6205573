//! Grassmann manifold geometry for secant-based projection optimization.
//!
//! This crate provides the Grassmann manifold `Gr(k, n)` of `k`-dimensional
//! subspaces of `ℝⁿ`, represented by `n × k` matrices with orthonormal
//! columns, together with its closed-form geodesics and parallel transport.
//!
//! # Example
//!
//! ```rust
//! use secantopt_manifolds::{Geodesic, Grassmann};
//!
//! let grassmann = Grassmann::<f64>::new(4, 2)?;
//! let w = grassmann.random_point();
//! let h = grassmann.random_tangent(&w)?;
//!
//! let geodesic = Geodesic::new(&w, &h)?;
//! let moved = geodesic.at(0.3);
//! assert!(grassmann.is_point_on_manifold(&moved, 1e-10));
//! # Ok::<(), secantopt_core::error::ManifoldError>(())
//! ```

pub mod grassmann;
pub mod utils;

pub use grassmann::{Geodesic, Grassmann};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::grassmann::{Geodesic, Grassmann};
}
