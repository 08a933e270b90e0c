//! Simulation Data
//!
//! The network, the per-agent vectors, and the buffers they are swapped through.

pub mod matrix;
pub mod network;
pub mod state;

pub use matrix::Matrix;
pub use network::{Graph, Network};
pub use state::{AliveSet, SimState, StepBuffers};
