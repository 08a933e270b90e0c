//! Simulation Driver
//!
//! Owns the world and the stage schedule for one run, steps it for up to
//! `n_steps` timesteps and collects a [`RunResult`].

use bevy_ecs::prelude::*;
use bevy_ecs::schedule::ExecutorKind;
use mimesis_events::{ExpulsionEvent, RunSummary, StepMetrics};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info};

use crate::components::{Network, SimState, StepBuffers};
use crate::config::{EarlyStopConfig, SimConfig};
use crate::error::ConfigError;
use crate::output::{record_metrics, RunLog};
use crate::setup::{initialize_state, TopologyProvider};
use crate::systems::{
    decay_aggression, expel_scapegoat, refresh_prestige_for_desire, refresh_prestige_for_spread,
    source_aggression, spread_aggression, status_rivalry_active, update_desires, update_status,
    Prestige,
};
use crate::{SimRng, StepClock};

/// Seed offset between consecutive replicates
pub const REPLICATE_SEED_STRIDE: u64 = 1000;

/// Trailing window averaged into the summary's final modal agreement
pub const SUMMARY_FINAL_WINDOW: usize = 50;

/// Everything a finished run produced
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub config: SimConfig,
    pub steps_run: u64,
    /// Per-step metrics; empty when history recording is off
    pub metrics: Vec<StepMetrics>,
    pub expulsions: Vec<ExpulsionEvent>,
    pub final_state: SimState,
    /// First step of the sustained consensus streak that stopped the run
    pub converged_at: Option<u64>,
    pub stopped_early: bool,
}

impl RunResult {
    pub fn summary(&self) -> RunSummary {
        RunSummary::from_series(
            &self.metrics,
            &self.expulsions,
            self.final_state.alive.len(),
            self.steps_run,
            SUMMARY_FINAL_WINDOW,
        )
    }
}

/// Tracks consecutive steps at or above the modal agreement threshold
#[derive(Debug, Clone)]
struct ConsensusStreak {
    threshold: f64,
    required: usize,
    length: usize,
    started: u64,
}

impl ConsensusStreak {
    fn new(config: &EarlyStopConfig) -> Self {
        Self {
            threshold: config.modal_threshold,
            required: config.consecutive_steps,
            length: 0,
            started: 0,
        }
    }

    /// Returns the streak's first step once it is long enough
    fn observe(&mut self, metrics: &StepMetrics) -> Option<u64> {
        if metrics.modal_agreement < self.threshold {
            self.length = 0;
            return None;
        }
        if self.length == 0 {
            self.started = metrics.step;
        }
        self.length += 1;
        (self.length >= self.required).then_some(self.started)
    }
}

/// One simulation run: a `World` holding the run's resources and the
/// chained stage schedule.
pub struct Simulation {
    world: World,
    schedule: Schedule,
}

impl Simulation {
    /// Build a run from the configured topology
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        let topology = config.topology.clone();
        Self::with_provider(config, &topology)
    }

    /// Build a run on a graph requested from `provider`. Graph generation,
    /// prestige and initial state all draw from the run's seeded RNG.
    pub fn with_provider(
        config: SimConfig,
        provider: &dyn TopologyProvider,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = SmallRng::seed_from_u64(config.seed);
        let graph = provider.generate(config.n_agents, &mut rng);
        let network = Network::with_random_prestige(&graph, &mut rng);
        Self::from_network(config, network, rng)
    }

    /// Build a run on an existing network, drawing the initial state from `rng`
    pub fn from_network(
        config: SimConfig,
        network: Network,
        mut rng: SmallRng,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        check_size(&config, network.node_count())?;
        let state = initialize_state(&config, &mut rng);
        Ok(Self::assemble(config, network, state, rng))
    }

    /// Build a run from a fully specified initial state
    pub fn from_state(
        config: SimConfig,
        network: Network,
        state: SimState,
        rng: SmallRng,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        check_size(&config, network.node_count())?;
        check_size(&config, state.n_agents())?;
        Ok(Self::assemble(config, network, state, rng))
    }

    fn assemble(config: SimConfig, network: Network, state: SimState, rng: SmallRng) -> Self {
        let mut world = World::new();
        world.insert_resource(Prestige::from_network(&network));
        world.insert_resource(StepBuffers::for_state(&state));
        world.insert_resource(config);
        world.insert_resource(network);
        world.insert_resource(state);
        world.insert_resource(SimRng(rng));
        world.insert_resource(StepClock::default());
        world.insert_resource(RunLog::default());

        Self {
            world,
            schedule: build_schedule(),
        }
    }

    pub fn config(&self) -> &SimConfig {
        self.world.resource::<SimConfig>()
    }

    pub fn network(&self) -> &Network {
        self.world.resource::<Network>()
    }

    pub fn prestige(&self) -> &Prestige {
        self.world.resource::<Prestige>()
    }

    pub fn state(&self) -> &SimState {
        self.world.resource::<SimState>()
    }

    /// Direct access to the state, e.g. to seed aggression before stepping
    pub fn state_mut(&mut self) -> &mut SimState {
        self.world.resource_mut::<SimState>().into_inner()
    }

    pub fn current_step(&self) -> u64 {
        self.world.resource::<StepClock>().current_step
    }

    pub fn expulsions(&self) -> &[ExpulsionEvent] {
        &self.world.resource::<RunLog>().expulsions
    }

    /// Advance one timestep through every stage and return its metrics
    pub fn step(&mut self) -> StepMetrics {
        self.world.resource_mut::<StepClock>().advance();
        self.schedule.run(&mut self.world);
        self.world.resource::<RunLog>().latest.clone()
    }

    /// Step until the horizon or until early stopping fires
    pub fn run(mut self) -> RunResult {
        let config = self.config().clone();
        info!(
            seed = config.seed,
            variant = %config.variant().map_or("custom", |v| v.code()),
            n_agents = config.n_agents,
            n_steps = config.n_steps,
            "starting run"
        );

        let mut streak = config.early_stop.as_ref().map(ConsensusStreak::new);
        let mut converged_at = None;

        while self.current_step() < config.n_steps {
            let metrics = self.step();
            if let Some(started) = streak.as_mut().and_then(|s| s.observe(&metrics)) {
                debug!(
                    step = metrics.step,
                    converged_at = started,
                    modal_agreement = metrics.modal_agreement,
                    "consensus sustained, stopping early"
                );
                converged_at = Some(started);
                break;
            }
        }

        let log = std::mem::take(&mut *self.world.resource_mut::<RunLog>());
        let result = RunResult {
            steps_run: self.current_step(),
            metrics: log.metrics,
            expulsions: log.expulsions,
            final_state: self.state().clone(),
            converged_at,
            stopped_early: converged_at.is_some(),
            config,
        };

        info!(
            seed = result.config.seed,
            steps = result.steps_run,
            expulsions = result.expulsions.len(),
            remaining = result.final_state.alive.len(),
            stopped_early = result.stopped_early,
            "run complete"
        );
        result
    }
}

fn check_size(config: &SimConfig, actual: usize) -> Result<(), ConfigError> {
    if actual != config.n_agents {
        return Err(ConfigError::NetworkSizeMismatch {
            expected: config.n_agents,
            actual,
        });
    }
    Ok(())
}

fn build_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.set_executor_kind(ExecutorKind::SingleThreaded);
    schedule.add_systems(
        (
            refresh_prestige_for_desire,
            update_desires,
            source_aggression,
            refresh_prestige_for_spread,
            spread_aggression,
            decay_aggression,
            expel_scapegoat,
            update_status.run_if(status_rivalry_active),
            record_metrics,
        )
            .chain(),
    );
    schedule
}

/// Run `n_runs` independent replicates on graphs from `provider`, with
/// seeds `seed + r * 1000`.
pub fn run_replicates(
    config: &SimConfig,
    provider: &dyn TopologyProvider,
    n_runs: usize,
) -> Result<Vec<RunResult>, ConfigError> {
    (0..n_runs as u64)
        .map(|r| {
            let seed = config.seed.wrapping_add(r * REPLICATE_SEED_STRIDE);
            let replicate = config.clone().with_seed(seed);
            Simulation::with_provider(replicate, provider).map(Simulation::run)
        })
        .collect()
}
