//! Computational backends and utilities.

pub mod parallel;

pub use parallel::*;
