//! Run Log
//!
//! Accumulates what a run produces: the metrics history (when enabled),
//! every expulsion, and the latest step's metrics.

use bevy_ecs::prelude::*;
use mimesis_events::{ExpulsionEvent, StepMetrics};
use tracing::trace;

use crate::components::SimState;
use crate::config::SimConfig;
use crate::output::metrics::compute_metrics;
use crate::StepClock;

/// Resource: everything recorded so far in the current run
#[derive(Resource, Debug, Clone, Default)]
pub struct RunLog {
    pub metrics: Vec<StepMetrics>,
    pub expulsions: Vec<ExpulsionEvent>,
    pub latest: StepMetrics,
}

impl RunLog {
    /// Store `metrics` as the latest, appending it to the history if requested
    pub fn record(&mut self, metrics: StepMetrics, keep_history: bool) {
        if keep_history {
            self.metrics.push(metrics.clone());
        }
        self.latest = metrics;
    }
}

/// System: compute and record end-of-step metrics
pub fn record_metrics(
    config: Res<SimConfig>,
    clock: Res<StepClock>,
    state: Res<SimState>,
    mut log: ResMut<RunLog>,
) {
    let metrics = compute_metrics(clock.current_step, &state);
    trace!(
        step = metrics.step,
        tension = metrics.system_tension,
        gini = metrics.gini,
        top_share = metrics.top_share,
        modal_agreement = metrics.modal_agreement,
        active = metrics.n_active_agents,
        "step complete"
    );
    log.record(metrics, config.record_history);
}
