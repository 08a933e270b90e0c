//! Agent Setup
//!
//! Initial desire and status draws. Aggression always starts at zero.

use rand::rngs::SmallRng;
use rand::Rng;

use crate::components::SimState;
use crate::config::SimConfig;

/// Builds the `t = 0` state: random desire, uniform status under status
/// rivalry, empty aggression, everyone alive.
pub fn initialize_state(config: &SimConfig, rng: &mut SmallRng) -> SimState {
    let mut state = SimState::new(config.n_agents, config.n_objects);

    for i in 0..config.n_agents {
        for value in state.desires.row_mut(i) {
            *value = uniform(rng, 0.0, config.desire_init_max);
        }
    }

    if config.uses_status() {
        state.status = Some(
            (0..config.n_agents)
                .map(|_| uniform(rng, config.status_init_low, config.status_init_high))
                .collect(),
        );
    }

    state
}

/// Draw from `[low, high)`, or `low` when the range is empty
fn uniform(rng: &mut SmallRng, low: f64, high: f64) -> f64 {
    if high > low {
        rng.gen_range(low..high)
    } else {
        low
    }
}
