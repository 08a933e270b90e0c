//! Aggression Spread System
//!
//! Each living agent perceives the prestige-weighted mean aggression of its
//! living neighbors (the hostility vector `h`), then absorbs it into its own
//! aggression according to the configured spread mode:
//!
//! - Linear: `A' = alpha * A + (1 - alpha) * h`
//! - Convex: `h` is raised elementwise to `gamma` and rescaled so the pull
//!   sums to `H = sum(h)`. Zero perceived hostility leaves `alpha * A`.
//! - RawPower / FixedScale: the sharpened `h` without conservation.

use bevy_ecs::prelude::*;

use crate::components::{Matrix, Network, SimState, StepBuffers};
use crate::config::{SimConfig, SpreadMode};
use crate::systems::prestige::{neighbor_mean, Prestige};

/// Hostility perceived by `i`, written to `out`.
///
/// Entries for `i` itself and for expelled agents are zeroed. Returns false
/// when `i` has no living neighbor to observe.
pub fn perceived_hostility(
    i: usize,
    network: &Network,
    prestige: &Prestige,
    state: &SimState,
    out: &mut [f64],
) -> bool {
    if !neighbor_mean(i, network, prestige, state, &state.aggression, out) {
        return false;
    }
    state.enforce_row_invariants(i, out);
    true
}

/// `(h / h_max)^gamma` elementwise, with the peak `h_max`.
///
/// Every entry lies in `[0, 1]` and the peak maps to exactly 1, so the
/// transform cannot overflow. All zeros when nothing is perceived.
pub fn relative_salience(hostility: &[f64], gamma: f64) -> (Vec<f64>, f64) {
    let peak = hostility.iter().copied().fold(0.0, f64::max);
    if peak <= 0.0 {
        return (vec![0.0; hostility.len()], 0.0);
    }
    let salience = hostility.iter().map(|&h| (h / peak).powf(gamma)).collect();
    (salience, peak)
}

/// Largest entry the unconserved modes may produce in an `n`-agent row, so
/// that sums over the whole aggression matrix stay finite
pub fn salience_ceiling(n: usize) -> f64 {
    f64::MAX / (n.max(1) as f64).powi(2)
}

/// `h^gamma`, elementwise, saturating at [`salience_ceiling`]
pub fn sharpen(hostility: &[f64], gamma: f64) -> Vec<f64> {
    scaled_sharpen(hostility, gamma, 1.0)
}

fn scaled_sharpen(hostility: &[f64], gamma: f64, scale: f64) -> Vec<f64> {
    let (mut salience, peak) = relative_salience(hostility, gamma);
    let magnitude = (scale * peak.powf(gamma)).min(salience_ceiling(hostility.len()));
    salience.iter_mut().for_each(|s| *s *= magnitude);
    salience
}

/// Sharpened hostility rescaled to sum to `total`.
///
/// The normalizer is at least 1 whenever any hostility is perceived; the
/// all-zero fallback only covers an empty or all-zero input.
pub fn redistribute(hostility: &[f64], total: f64, gamma: f64) -> Vec<f64> {
    let (mut pull, _) = relative_salience(hostility, gamma);
    let z: f64 = pull.iter().sum();
    if z > 0.0 {
        pull.iter_mut().for_each(|p| *p = *p / z * total);
    } else {
        pull.iter_mut().for_each(|p| *p = 0.0);
    }
    pull
}

/// The vector an agent is pulled toward, or `None` when a convex-family mode
/// perceives no hostility at all.
pub fn mimetic_pull(mode: SpreadMode, hostility: &[f64], gamma: f64) -> Option<Vec<f64>> {
    let total: f64 = hostility.iter().sum();
    match mode {
        SpreadMode::Linear => Some(hostility.to_vec()),
        _ if total <= 0.0 => None,
        SpreadMode::Convex => Some(redistribute(hostility, total, gamma)),
        SpreadMode::RawPower => Some(sharpen(hostility, gamma)),
        SpreadMode::FixedScale { scale } => Some(scaled_sharpen(hostility, gamma, scale)),
    }
}

/// Spread aggression for every living agent into `back`, then swap it into
/// the state. Isolated agents keep their row unchanged.
pub fn apply_spread(
    config: &SimConfig,
    network: &Network,
    prestige: &Prestige,
    state: &mut SimState,
    back: &mut Matrix,
) {
    let alpha = config.alpha;
    let mut hostility = vec![0.0; state.n_agents()];

    for i in 0..state.n_agents() {
        if !state.alive.is_alive(i)
            || !perceived_hostility(i, network, prestige, state, &mut hostility)
        {
            back.copy_row_from(&state.aggression, i);
            continue;
        }

        let pull = mimetic_pull(config.spread, &hostility, config.salience_exponent);
        let own = state.aggression.row(i);
        let next = back.row_mut(i);
        match pull {
            Some(pull) => {
                for ((n, &a), &p) in next.iter_mut().zip(own).zip(&pull) {
                    *n = alpha * a + (1.0 - alpha) * p;
                }
            }
            None => {
                for (n, &a) in next.iter_mut().zip(own) {
                    *n = alpha * a;
                }
            }
        }
        state.enforce_row_invariants(i, next);
    }

    std::mem::swap(&mut state.aggression, back);
}

/// System: mimetic aggression spread
pub fn spread_aggression(
    config: Res<SimConfig>,
    network: Res<Network>,
    prestige: Res<Prestige>,
    mut state: ResMut<SimState>,
    mut buffers: ResMut<StepBuffers>,
) {
    apply_spread(&config, &network, &prestige, &mut state, &mut buffers.aggression);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Graph;
    use crate::setup::complete;
    use proptest::prelude::*;

    fn complete_network(n: usize) -> (Network, Prestige) {
        let network = Network::with_uniform_prestige(&complete(n), 1.0);
        let prestige = Prestige::from_network(&network);
        (network, prestige)
    }

    fn spread_config(n: usize, spread: SpreadMode, alpha: f64) -> SimConfig {
        SimConfig {
            n_agents: n,
            alpha,
            spread,
            ..SimConfig::default()
        }
    }

    fn spread_once(config: &SimConfig, network: &Network, prestige: &Prestige, state: &mut SimState) {
        let mut back = state.aggression.clone();
        apply_spread(config, network, prestige, state, &mut back);
    }

    #[test]
    fn test_linear_imitation_on_triangle() {
        let (network, prestige) = complete_network(3);
        let config = spread_config(3, SpreadMode::Linear, 0.0);
        let mut state = SimState::new(3, 1);
        state.aggression.set(0, 1, 1.0);

        spread_once(&config, &network, &prestige, &mut state);

        assert_eq!(state.aggression.get(2, 1), 0.5);
        assert_eq!(state.aggression.get(0, 1), 0.0);
        assert!(state.invariants_hold());
    }

    #[test]
    fn test_convex_without_hostility_retains_alpha_share() {
        let (network, prestige) = complete_network(3);
        let config = spread_config(3, SpreadMode::Convex, 0.4);
        let mut state = SimState::new(3, 1);
        // Agent 0's neighbors are not hostile, so agent 0 perceives nothing
        state.aggression.set(0, 1, 2.0);

        spread_once(&config, &network, &prestige, &mut state);

        assert_eq!(state.aggression.get(0, 1), 0.8);
        assert_eq!(state.aggression.get(0, 2), 0.0);
    }

    #[test]
    fn test_pull_sums_conserved() {
        let h = [0.1, 0.0, 0.3, 0.6];
        let pull = mimetic_pull(SpreadMode::Convex, &h, 3.0).unwrap();
        let total: f64 = pull.iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert_eq!(pull[1], 0.0);
    }

    #[test]
    fn test_zero_hostility_yields_no_pull() {
        let h = [0.0; 4];
        assert_eq!(mimetic_pull(SpreadMode::Convex, &h, 2.0), None);
        assert_eq!(mimetic_pull(SpreadMode::RawPower, &h, 2.0), None);
        assert_eq!(mimetic_pull(SpreadMode::Linear, &h, 2.0), Some(vec![0.0; 4]));
    }

    #[test]
    fn test_tiny_hostility_does_not_underflow() {
        let h = [1e-200, 1e-200];
        let pull = redistribute(&h, 2e-200, 4.0);
        assert_eq!(pull, vec![1e-200, 1e-200]);
    }

    #[test]
    fn test_steep_exponent_stays_finite() {
        let pull = redistribute(&[40.0, 20.0], 60.0, 200.0);
        assert!(pull.iter().all(|p| p.is_finite()));
        assert!((pull.iter().sum::<f64>() - 60.0).abs() < 1e-9);
        assert!(pull[0] > pull[1]);

        let raw = mimetic_pull(SpreadMode::RawPower, &[40.0, 20.0], 400.0).unwrap();
        assert!(raw.iter().all(|p| p.is_finite()));
        assert_eq!(raw[0], salience_ceiling(2));

        let fixed =
            mimetic_pull(SpreadMode::FixedScale { scale: 10.0 }, &[4.0, 2.0], 500.0).unwrap();
        assert!(fixed.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn test_steep_exponent_spread_keeps_state_finite() {
        let (network, prestige) = complete_network(4);
        let config = SimConfig {
            salience_exponent: 300.0,
            ..spread_config(4, SpreadMode::Convex, 0.1)
        };
        let mut state = SimState::new(4, 1);
        state.aggression = Matrix::from_rows(vec![
            vec![0.0, 50.0, 30.0, 10.0],
            vec![45.0, 0.0, 25.0, 5.0],
            vec![40.0, 60.0, 0.0, 20.0],
            vec![35.0, 55.0, 15.0, 0.0],
        ]);

        for _ in 0..50 {
            spread_once(&config, &network, &prestige, &mut state);
            for i in 0..4 {
                assert!(state.aggression.row(i).iter().all(|a| a.is_finite()));
            }
        }
        assert!(state.invariants_hold());
    }

    #[test]
    fn test_fixed_scale_multiplies_raw_power() {
        let h = [0.5, 0.25];
        let raw = mimetic_pull(SpreadMode::RawPower, &h, 2.0).unwrap();
        let fixed = mimetic_pull(SpreadMode::FixedScale { scale: 3.0 }, &h, 2.0).unwrap();
        assert_eq!(raw, vec![0.25, 0.0625]);
        assert_eq!(fixed, vec![0.75, 0.1875]);
    }

    #[test]
    fn test_dead_targets_never_absorbed() {
        let graph = Graph::from_edges(4, &[(0, 1), (0, 2), (1, 2), (2, 3)]);
        let network = Network::with_uniform_prestige(&graph, 1.0);
        let prestige = Prestige::from_network(&network);
        let config = spread_config(4, SpreadMode::Convex, 0.2);
        let mut state = SimState::new(4, 1);
        state.aggression = Matrix::from_rows(vec![
            vec![0.0, 0.5, 0.5, 1.0],
            vec![0.3, 0.0, 0.2, 0.9],
            vec![0.4, 0.4, 0.0, 0.0],
            vec![0.0, 0.0, 0.0, 0.0],
        ]);
        state.alive.expel(3);
        state.aggression.set(0, 3, 0.0);
        state.aggression.set(1, 3, 0.0);

        spread_once(&config, &network, &prestige, &mut state);

        assert!(state.invariants_hold());
        assert_eq!(state.aggression.row(3), &[0.0; 4]);
    }

    #[test]
    fn test_isolated_agent_keeps_row() {
        let graph = Graph::from_edges(3, &[(0, 1)]);
        let network = Network::with_uniform_prestige(&graph, 1.0);
        let prestige = Prestige::from_network(&network);
        let config = spread_config(3, SpreadMode::Linear, 0.0);
        let mut state = SimState::new(3, 1);
        state.aggression.set(2, 0, 0.7);

        spread_once(&config, &network, &prestige, &mut state);

        assert_eq!(state.aggression.get(2, 0), 0.7);
    }

    fn hostility() -> impl Strategy<Value = Vec<f64>> {
        prop::collection::vec(0.0f64..10.0, 2..12)
    }

    proptest! {
        #[test]
        fn prop_convex_conserves_throughput(h in hostility(), gamma in 1.0f64..4.0) {
            let total: f64 = h.iter().sum();
            prop_assume!(total > 1e-6);
            let pull = mimetic_pull(SpreadMode::Convex, &h, gamma).unwrap();
            let pulled: f64 = pull.iter().sum();
            prop_assert!((pulled - total).abs() <= 1e-9 * total.max(1.0));
        }

        #[test]
        fn prop_convex_sharpens_ratios(h in hostility(), gamma in 1.0f64..4.0) {
            let total: f64 = h.iter().sum();
            prop_assume!(total > 1e-6);
            let pull = mimetic_pull(SpreadMode::Convex, &h, gamma).unwrap();
            for a in 0..h.len() {
                for b in 0..h.len() {
                    if h[a] > 1e-3 && h[b] > 1e-3 {
                        let expected = (h[a] / h[b]).powf(gamma);
                        let actual = pull[a] / pull[b];
                        prop_assert!((actual - expected).abs() <= 1e-6 * expected.max(1.0));
                    }
                }
            }
        }

        #[test]
        fn prop_convex_with_unit_exponent_is_linear(h in hostility()) {
            let total: f64 = h.iter().sum();
            prop_assume!(total > 1e-6);
            let pull = mimetic_pull(SpreadMode::Convex, &h, 1.0).unwrap();
            for (p, x) in pull.iter().zip(&h) {
                prop_assert!((p - x).abs() <= 1e-9 * total.max(1.0));
            }
        }

        #[test]
        fn prop_raw_power_attenuates_sub_unit_hostility(
            h in prop::collection::vec(0.01f64..0.99, 2..12),
            gamma in 1.1f64..4.0,
        ) {
            let total: f64 = h.iter().sum();
            let pull = mimetic_pull(SpreadMode::RawPower, &h, gamma).unwrap();
            let pulled: f64 = pull.iter().sum();
            prop_assert!(pulled < total);
        }

        #[test]
        fn prop_unit_exponent_spread_matches_linear(
            rows in prop::collection::vec(prop::collection::vec(0.0f64..3.0, 4), 4),
            alpha in 0.0f64..1.0,
        ) {
            let (network, prestige) = complete_network(4);
            let mut linear = SimState::new(4, 1);
            linear.aggression = Matrix::from_rows(rows);
            for i in 0..4 {
                linear.aggression.set(i, i, 0.0);
            }
            let mut convex = linear.clone();

            let mut config = spread_config(4, SpreadMode::Linear, alpha);
            spread_once(&config, &network, &prestige, &mut linear);
            config.spread = SpreadMode::Convex;
            config.salience_exponent = 1.0;
            spread_once(&config, &network, &prestige, &mut convex);

            for i in 0..4 {
                for (a, b) in linear.aggression.row(i).iter().zip(convex.aggression.row(i)) {
                    prop_assert!((a - b).abs() <= 1e-9);
                }
            }
        }

        #[test]
        fn prop_spread_preserves_invariants(
            rows in prop::collection::vec(prop::collection::vec(0.0f64..2.0, 5), 5),
            expelled in 0usize..5,
            alpha in 0.0f64..1.0,
        ) {
            let (network, prestige) = complete_network(5);
            let config = spread_config(5, SpreadMode::Convex, alpha);
            let mut state = SimState::new(5, 1);
            state.aggression = Matrix::from_rows(rows);
            for i in 0..5 {
                let mut row = state.aggression.row(i).to_vec();
                state.enforce_row_invariants(i, &mut row);
                state.aggression.row_mut(i).copy_from_slice(&row);
            }
            state.alive.expel(expelled);
            for i in 0..5 {
                state.aggression.set(i, expelled, 0.0);
            }
            state.aggression.row_mut(expelled).iter_mut().for_each(|a| *a = 0.0);

            spread_once(&config, &network, &prestige, &mut state);

            prop_assert!(state.invariants_hold());
            for i in 0..5 {
                prop_assert!(state.aggression.row(i).iter().all(|&a| a >= 0.0 && a.is_finite()));
            }
        }
    }
}
