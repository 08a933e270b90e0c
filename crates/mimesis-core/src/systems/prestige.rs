//! Prestige System
//!
//! Effective prestige weights consumed by the desire and spread stages.
//! Under object rivalry they equal the base weights. Under status rivalry
//! they are recomputed as `w_ik = w0_ik * (c_status + S_k)` immediately
//! before each consuming stage.

use bevy_ecs::prelude::*;

use crate::components::{Matrix, Network, SimState};
use crate::config::SimConfig;

/// Resource: effective prestige, aligned with the network's neighbor lists
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct Prestige {
    weights: Vec<Vec<f64>>,
}

impl Prestige {
    /// Effective weights equal to the network's base weights
    pub fn from_network(network: &Network) -> Self {
        Self {
            weights: (0..network.node_count())
                .map(|i| network.base_prestige(i).to_vec())
                .collect(),
        }
    }

    /// Weights from `i` toward each neighbor, aligned with `network.neighbors(i)`
    pub fn weights(&self, i: usize) -> &[f64] {
        &self.weights[i]
    }

    /// Recompute from base weights and current status.
    /// Without status the weights are reset to the base weights.
    pub fn refresh(&mut self, network: &Network, status: Option<&[f64]>, c_status: f64) {
        for i in 0..network.node_count() {
            let base = network.base_prestige(i);
            let row = &mut self.weights[i];
            match status {
                Some(status) => {
                    for ((w, &w0), &k) in row.iter_mut().zip(base).zip(network.neighbors(i)) {
                        *w = w0 * (c_status + status[k]);
                    }
                }
                None => row.copy_from_slice(base),
            }
        }
    }
}

/// Prestige-weighted mean of living neighbors' rows of `source`, written to `out`.
///
/// Returns false, leaving `out` untouched, when `i` has no living neighbor
/// or the neighbor weights sum to zero.
pub fn neighbor_mean(
    i: usize,
    network: &Network,
    prestige: &Prestige,
    state: &SimState,
    source: &Matrix,
    out: &mut [f64],
) -> bool {
    let weights = prestige.weights(i);
    let mut total_weight = 0.0;
    let mut any = false;

    for (idx, k) in state.living_neighbors(network, i) {
        let w = weights[idx];
        if !any {
            out.iter_mut().for_each(|v| *v = 0.0);
            any = true;
        }
        for (acc, &value) in out.iter_mut().zip(source.row(k)) {
            *acc += w * value;
        }
        total_weight += w;
    }

    if !any || total_weight <= 0.0 {
        return false;
    }
    for acc in out.iter_mut() {
        *acc /= total_weight;
    }
    true
}

fn refresh(config: &SimConfig, network: &Network, state: &SimState, prestige: &mut Prestige) {
    if !config.uses_status() {
        return;
    }
    prestige.refresh(network, state.status.as_deref(), config.c_status);
}

/// System: recompute prestige before the desire update
pub fn refresh_prestige_for_desire(
    config: Res<SimConfig>,
    network: Res<Network>,
    state: Res<SimState>,
    mut prestige: ResMut<Prestige>,
) {
    refresh(&config, &network, &state, &mut prestige);
}

/// System: recompute prestige before the aggression spread
pub fn refresh_prestige_for_spread(
    config: Res<SimConfig>,
    network: Res<Network>,
    state: Res<SimState>,
    mut prestige: ResMut<Prestige>,
) {
    refresh(&config, &network, &state, &mut prestige);
}
