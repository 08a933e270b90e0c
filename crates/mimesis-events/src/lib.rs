//! Shared metric and event types for the scapegoat simulation.
//!
//! This crate contains pure data structures with no simulation logic.
//! It is a dependency for all other crates in the workspace.

pub mod expulsion;
pub mod metrics;
pub mod summary;

pub use expulsion::ExpulsionEvent;
pub use metrics::StepMetrics;
pub use summary::{
    fraction_converged_steps, time_to_threshold, RunSummary, DEFAULT_CONSECUTIVE_STEPS,
    DEFAULT_CONVERGENCE_THRESHOLD,
};
