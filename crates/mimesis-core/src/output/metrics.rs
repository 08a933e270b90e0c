//! Metrics Computation
//!
//! Reads a [`SimState`] and reports how concentrated the population's
//! hostility is. All statistics range over the living agents only.

use std::collections::BTreeMap;

use mimesis_events::StepMetrics;

use crate::components::SimState;

/// Minimum outgoing aggression for an agent to count toward modal agreement
pub const ELIGIBILITY_FLOOR: f64 = 1e-8;

/// Gini coefficient of a non-negative distribution; 0 for empty or all-zero input
pub fn gini(values: &[f64]) -> f64 {
    let n = values.len();
    let total: f64 = values.iter().sum();
    if n == 0 || total <= 0.0 {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let weighted: f64 = sorted
        .iter()
        .enumerate()
        .map(|(i, &x)| (i + 1) as f64 * x)
        .sum();
    let n = n as f64;
    (2.0 * weighted - (n + 1.0) * total) / (n * total)
}

/// Shannon entropy in bits of the normalized distribution; 0 when the total is 0
pub fn entropy(values: &[f64]) -> f64 {
    let total: f64 = values.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    values
        .iter()
        .filter(|&&x| x > 0.0)
        .map(|&x| {
            let p = x / total;
            -p * p.log2()
        })
        .sum()
}

/// Consensus over each agent's favored target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModalAgreement {
    /// Fraction of eligible agents whose favored target is `target`
    pub agreement: f64,
    pub target: Option<usize>,
    pub eligible: usize,
}

/// Modal agreement among living agents whose outgoing aggression toward
/// other living agents is at least [`ELIGIBILITY_FLOOR`].
///
/// An agent's favored target is the first living target with maximal
/// aggression. The modal target breaks ties toward the lowest id.
pub fn modal_agreement(state: &SimState) -> ModalAgreement {
    let mut votes: BTreeMap<usize, usize> = BTreeMap::new();
    let mut eligible = 0;

    for i in state.alive.ids() {
        let row = state.aggression.row(i);
        let mut favored: Option<(usize, f64)> = None;
        let mut outgoing = 0.0;
        for j in state.alive.ids().filter(|&j| j != i) {
            outgoing += row[j];
            if favored.map_or(true, |(_, top)| row[j] > top) {
                favored = Some((j, row[j]));
            }
        }
        let Some((target, _)) = favored else {
            continue;
        };
        if outgoing < ELIGIBILITY_FLOOR {
            continue;
        }
        eligible += 1;
        *votes.entry(target).or_default() += 1;
    }

    let mut modal: Option<(usize, usize)> = None;
    for (&target, &count) in &votes {
        if modal.map_or(true, |(_, best)| count > best) {
            modal = Some((target, count));
        }
    }

    match modal {
        Some((target, count)) => ModalAgreement {
            agreement: count as f64 / eligible as f64,
            target: Some(target),
            eligible,
        },
        None => ModalAgreement {
            agreement: 0.0,
            target: None,
            eligible: 0,
        },
    }
}

/// Compute every per-step statistic for `state`
pub fn compute_metrics(step: u64, state: &SimState) -> StepMetrics {
    let received: Vec<f64> = state
        .received_by_alive()
        .into_iter()
        .map(|(_, r)| r)
        .collect();
    let n_active = received.len();
    let total: f64 = received.iter().sum();

    let mut descending = received.clone();
    descending.sort_by(|a, b| b.total_cmp(a));
    let top = descending.first().copied().unwrap_or(0.0);

    let (top_share, top3_share) = if total > 0.0 {
        (top / total, descending.iter().take(3).sum::<f64>() / total)
    } else {
        (0.0, 0.0)
    };

    let convergence_ratio = match descending.get(1) {
        Some(&second) if second > 0.0 => Some(top / second),
        _ => None,
    };

    let modal = modal_agreement(state);
    let (mean_desire, desire_concentration) = desire_statistics(state);

    let mean_status = state.status.as_ref().and_then(|status| {
        (n_active > 0).then(|| state.alive.ids().map(|k| status[k]).sum::<f64>() / n_active as f64)
    });

    StepMetrics {
        step,
        n_active_agents: n_active,
        system_tension: total,
        mean_aggression: if n_active > 0 { total / n_active as f64 } else { 0.0 },
        top_target_aggression: top,
        gini: gini(&received),
        top_share,
        top3_share,
        convergence_ratio,
        entropy: entropy(&received),
        modal_agreement: modal.agreement,
        modal_target: modal.target,
        eligible_agents: modal.eligible,
        mean_desire,
        desire_concentration,
        mean_status,
    }
}

/// Mean desire intensity and the Herfindahl index of aggregated desire
fn desire_statistics(state: &SimState) -> (f64, f64) {
    let n_objects = state.n_objects();
    let mut per_object = vec![0.0; n_objects];
    for i in state.alive.ids() {
        for (acc, &d) in per_object.iter_mut().zip(state.desires.row(i)) {
            *acc += d;
        }
    }
    let total: f64 = per_object.iter().sum();
    let cells = state.alive.len() * n_objects;
    let mean = if cells > 0 { total / cells as f64 } else { 0.0 };
    let herfindahl = if total > 0.0 {
        per_object.iter().map(|&x| (x / total).powi(2)).sum()
    } else {
        0.0
    };
    (mean, herfindahl)
}
