//! Desire System
//!
//! Mimetic desire: each living agent blends its own desire with the
//! prestige-weighted mean desire of its living neighbors, plus Gaussian
//! noise, clamped at zero.

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;
use rand::Rng;
use rand_distr::StandardNormal;

use crate::components::{Matrix, Network, SimState, StepBuffers};
use crate::config::SimConfig;
use crate::systems::prestige::{neighbor_mean, Prestige};
use crate::SimRng;

/// Update every living agent's desire vector from the current matrix into
/// `back`, then swap `back` into the state.
///
/// Agents with no living neighbor (or zero total neighbor weight) keep their
/// desires unchanged and draw no noise.
pub fn apply_desire_update(
    config: &SimConfig,
    network: &Network,
    prestige: &Prestige,
    state: &mut SimState,
    back: &mut Matrix,
    rng: &mut SmallRng,
) {
    let alpha = config.alpha;
    let sigma = config.desire_noise;
    let mut social = vec![0.0; state.n_objects()];

    for i in 0..state.n_agents() {
        if !state.alive.is_alive(i)
            || !neighbor_mean(i, network, prestige, state, &state.desires, &mut social)
        {
            back.copy_row_from(&state.desires, i);
            continue;
        }

        let own = state.desires.row(i);
        for ((next, &d), &s) in back.row_mut(i).iter_mut().zip(own).zip(&social) {
            let noise = if sigma > 0.0 {
                sigma * rng.sample::<f64, _>(StandardNormal)
            } else {
                0.0
            };
            *next = (alpha * d + (1.0 - alpha) * s + noise).max(0.0);
        }
    }

    std::mem::swap(&mut state.desires, back);
}

/// System: mimetic desire update
pub fn update_desires(
    config: Res<SimConfig>,
    network: Res<Network>,
    prestige: Res<Prestige>,
    mut state: ResMut<SimState>,
    mut buffers: ResMut<StepBuffers>,
    mut rng: ResMut<SimRng>,
) {
    apply_desire_update(
        &config,
        &network,
        &prestige,
        &mut state,
        &mut buffers.desires,
        &mut rng.0,
    );
}
