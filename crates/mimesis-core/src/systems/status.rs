//! Status System
//!
//! Under status rivalry, being targeted costs standing: each living agent
//! loses status in proportion to its share of the peak received aggression.

use bevy_ecs::prelude::*;

use crate::components::SimState;
use crate::config::SimConfig;

/// `S_k -= lambda * R(k) / max(R_max, floor)`, clamped to `[0, 1]`
pub fn apply_status_loss(loss_rate: f64, floor: f64, state: &mut SimState) {
    let received = state.received_by_alive();
    let Some(status) = state.status.as_mut() else {
        return;
    };
    let peak = received.iter().map(|&(_, r)| r).fold(0.0, f64::max);
    let scale = peak.max(floor);

    for (k, r) in received {
        status[k] = (status[k] - loss_rate * r / scale).clamp(0.0, 1.0);
    }
}

/// Run condition: status only evolves under status rivalry
pub fn status_rivalry_active(config: Res<SimConfig>) -> bool {
    config.uses_status()
}

/// System: status degradation
pub fn update_status(config: Res<SimConfig>, mut state: ResMut<SimState>) {
    apply_status_loss(config.status_loss_rate, config.status_floor, &mut state);
}
