//! Run Setup
//!
//! Topology generation and initial agent state.

pub mod agents;
pub mod topology;

pub use agents::*;
pub use topology::*;
