//! Optimization algorithms and utilities.

pub mod callback;
pub mod line_search;
pub mod optimizer;

// Re-export optimization components
pub use callback::*;
pub use line_search::*;
pub use optimizer::*;
