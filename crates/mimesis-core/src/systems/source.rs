//! Aggression Source System
//!
//! Fresh aggression generated by rivalry between living neighbors. Object
//! rivalry comes from shared desire for the rivalrous objects, damped by
//! social distance. Status rivalry comes from proximity in status, biased
//! toward neighbors of higher status.

use bevy_ecs::prelude::*;

use crate::components::{Network, SimState};
use crate::config::{SimConfig, SourceMode};

/// `sum over rivalrous objects of min(D_i(o), D_k(o))`
pub fn shared_desire(di: &[f64], dk: &[f64], n_rivalrous: usize) -> f64 {
    di.iter()
        .zip(dk)
        .take(n_rivalrous)
        .map(|(&a, &b)| a.min(b))
        .sum()
}

/// Status-rivalry increment from `i` toward a neighbor `k`:
/// `rho * (1 - alpha) * (1 + beta * max(0, S_k - S_i)) * exp(-|S_i - S_k| / sigma)`
pub fn status_rivalry_increment(si: f64, sk: f64, config: &SimConfig) -> f64 {
    let proximity = (-(si - sk).abs() / config.sigma_status).exp();
    let upward = 1.0 + config.beta_up * (sk - si).max(0.0);
    config.rivalry_intensity * (1.0 - config.alpha) * upward * proximity
}

/// Add this step's rivalry increments to every living agent's aggression
/// toward each living neighbor.
pub fn apply_rivalry_source(config: &SimConfig, network: &Network, state: &mut SimState) {
    let mut increments = Vec::new();

    match config.source {
        SourceMode::Object => {
            let factor = config.rivalry_to_aggression * (1.0 - config.alpha);
            if factor == 0.0 {
                return;
            }
            for i in state.alive.ids() {
                for (_, k) in state.living_neighbors(network, i) {
                    let shared = shared_desire(
                        state.desires.row(i),
                        state.desires.row(k),
                        config.n_rivalrous,
                    );
                    let inc = factor * shared / network.social_distance(i, k);
                    increments.push((i, k, inc));
                }
            }
        }
        SourceMode::Status => {
            let Some(status) = state.status.as_deref() else {
                return;
            };
            for i in state.alive.ids() {
                for (_, k) in state.living_neighbors(network, i) {
                    increments.push((i, k, status_rivalry_increment(status[i], status[k], config)));
                }
            }
        }
    }

    for (i, k, inc) in increments {
        state.aggression.add(i, k, inc);
    }
}

/// System: rivalry source
pub fn source_aggression(
    config: Res<SimConfig>,
    network: Res<Network>,
    mut state: ResMut<SimState>,
) {
    apply_rivalry_source(&config, &network, &mut state);
}
