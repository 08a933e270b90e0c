//! Decay System

use bevy_ecs::prelude::*;

use crate::components::SimState;
use crate::config::SimConfig;

/// Multiply every living agent's aggression row by `1 - rate`
pub fn apply_decay(rate: f64, state: &mut SimState) {
    if rate == 0.0 {
        return;
    }
    let retain = 1.0 - rate;
    for i in 0..state.n_agents() {
        if state.alive.is_alive(i) {
            state.aggression.row_mut(i).iter_mut().for_each(|a| *a *= retain);
        }
    }
}

/// System: aggression decay
pub fn decay_aggression(config: Res<SimConfig>, mut state: ResMut<SimState>) {
    apply_decay(config.aggression_decay, &mut state);
}
