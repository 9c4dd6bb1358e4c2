//! Numeric routines shared across the pipeline.

pub mod ols;
pub mod swilk;

pub use ols::solve_least_squares;
pub use swilk::{ShapiroWilk, shapiro_wilk};
