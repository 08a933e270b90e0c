//! Output Generation
//!
//! Per-step metrics, the run log they accumulate in, and JSON writers.

pub mod log;
pub mod metrics;
pub mod writer;

pub use log::*;
pub use metrics::*;
pub use writer::*;
