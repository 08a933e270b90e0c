//! Mimetic Scapegoat Simulation Engine Library
//!
//! Agents on a social network imitate each other's desires and hostility.
//! Rivalry produces aggression, mimetic spread concentrates it, and the
//! most-targeted agent is eventually expelled.

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;

pub mod components;
pub mod config;
pub mod driver;
pub mod error;
pub mod output;
pub mod setup;
pub mod systems;

pub use components::*;
pub use config::{EarlyStopConfig, SimConfig, SourceMode, SpreadMode, Variant};
pub use driver::{run_replicates, RunResult, Simulation};
pub use error::ConfigError;
pub use setup::{initialize_state, TopologyConfig, TopologyProvider};

pub use mimesis_events::{ExpulsionEvent, RunSummary, StepMetrics};

/// Seeded random number generator resource
#[derive(Resource)]
pub struct SimRng(pub SmallRng);

/// Current timestep, 1-based once the first step has started
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct StepClock {
    pub current_step: u64,
}

impl StepClock {
    pub fn advance(&mut self) -> u64 {
        self.current_step += 1;
        self.current_step
    }
}
