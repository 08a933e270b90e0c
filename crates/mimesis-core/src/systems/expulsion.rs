//! Expulsion System
//!
//! At most one agent leaves per step: the living agent receiving the most
//! aggression, provided that total reaches the threshold. Ties go to the
//! lowest id. All aggression toward and from the victim is cleared.

use bevy_ecs::prelude::*;
use mimesis_events::ExpulsionEvent;
use tracing::debug;

use crate::components::SimState;
use crate::config::SimConfig;
use crate::output::RunLog;
use crate::StepClock;

/// Expel the most-targeted living agent if its received aggression is at
/// least `threshold`. A `None` threshold never expels.
pub fn expel_most_targeted(
    threshold: Option<f64>,
    state: &mut SimState,
    step: u64,
) -> Option<ExpulsionEvent> {
    let threshold = threshold?;
    let received = state.received_by_alive();

    let mut best: Option<(usize, f64)> = None;
    for &(id, r) in &received {
        if best.map_or(true, |(_, top)| r > top) {
            best = Some((id, r));
        }
    }
    let (victim, peak) = best?;
    if peak < threshold {
        return None;
    }

    let before: f64 = received.iter().map(|&(_, r)| r).sum();
    let victim_status = state.status.as_ref().map(|status| status[victim]);

    state.alive.expel(victim);
    for i in 0..state.n_agents() {
        state.aggression.set(i, victim, 0.0);
    }
    state.aggression.row_mut(victim).iter_mut().for_each(|a| *a = 0.0);

    let after: f64 = state.received_by_alive().iter().map(|&(_, r)| r).sum();
    let catharsis = if before > 0.0 {
        ((before - after) / before).max(0.0)
    } else {
        0.0
    };

    Some(ExpulsionEvent::new(step, victim, peak, catharsis).with_victim_status(victim_status))
}

/// System: scapegoat expulsion
pub fn expel_scapegoat(
    config: Res<SimConfig>,
    clock: Res<StepClock>,
    mut state: ResMut<SimState>,
    mut log: ResMut<RunLog>,
) {
    let Some(event) = expel_most_targeted(config.expulsion_threshold, &mut state, clock.current_step)
    else {
        return;
    };
    debug!(
        step = event.step,
        victim = event.victim,
        received = event.received_aggression,
        catharsis = event.catharsis,
        victim_status = ?event.victim_status,
        remaining = state.alive.len(),
        "agent expelled"
    );
    log.expulsions.push(event);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Matrix;

    fn targeted_state() -> SimState {
        let mut state = SimState::new(4, 1);
        state.aggression = Matrix::from_rows(vec![
            vec![0.0, 3.0, 1.0, 0.0],
            vec![1.0, 0.0, 1.0, 0.0],
            vec![0.0, 2.0, 0.0, 0.5],
            vec![0.0, 1.0, 0.0, 0.0],
        ]);
        state
    }

    #[test]
    fn test_expels_most_targeted() {
        let mut state = targeted_state();
        let event = expel_most_targeted(Some(5.0), &mut state, 7).unwrap();

        assert_eq!(event.step, 7);
        assert_eq!(event.victim, 1);
        assert_eq!(event.received_aggression, 6.0);
        assert!(!state.alive.is_alive(1));
        assert_eq!(state.received_aggression(1), 0.0);
        assert!((0..4).all(|i| state.aggression.get(i, 1) == 0.0));
        assert_eq!(state.aggression.row(1), &[0.0; 4]);
        assert!(state.invariants_hold());
        // Total received 9.5 drops to 1.5 after expulsion
        assert!((event.catharsis - 8.0 / 9.5).abs() < 1e-12);
    }

    #[test]
    fn test_records_victim_status() {
        let mut state = targeted_state();
        assert_eq!(expel_most_targeted(Some(5.0), &mut state, 1).unwrap().victim_status, None);

        let mut state = targeted_state();
        state.status = Some(vec![0.5, 0.2, 0.6, 0.9]);
        let event = expel_most_targeted(Some(5.0), &mut state, 1).unwrap();
        assert_eq!(event.victim_status, Some(0.2));
    }

    #[test]
    fn test_below_threshold_keeps_everyone() {
        let mut state = targeted_state();
        assert!(expel_most_targeted(Some(6.5), &mut state, 1).is_none());
        assert_eq!(state.alive.len(), 4);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let mut state = targeted_state();
        assert!(expel_most_targeted(Some(6.0), &mut state, 1).is_some());
    }

    #[test]
    fn test_disabled_expulsion() {
        let mut state = targeted_state();
        assert!(expel_most_targeted(None, &mut state, 1).is_none());
    }

    #[test]
    fn test_ties_go_to_lowest_id() {
        let mut state = SimState::new(3, 1);
        state.aggression = Matrix::from_rows(vec![
            vec![0.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0],
            vec![1.0, 1.0, 0.0],
        ]);

        let event = expel_most_targeted(Some(0.5), &mut state, 1).unwrap();
        assert_eq!(event.victim, 0);
    }

    #[test]
    fn test_one_expulsion_per_call() {
        let mut state = targeted_state();
        expel_most_targeted(Some(0.1), &mut state, 1);
        assert_eq!(state.alive.len(), 3);
    }
}
