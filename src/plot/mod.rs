//! Stress-strain chart rendering.

pub mod svg;

pub use svg::{write_experiment_plot, write_overlay_plot};
