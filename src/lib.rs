//! `tensile-lab` library crate.
//!
//! The binary (`tlab`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - modules are reusable (e.g., future GUI, notebooks, lab dashboards)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod io;
pub mod math;
pub mod metrics;
pub mod plot;
pub mod report;
