//! Run Summary
//!
//! Collapses a recorded metrics series into the scalar outcomes used to
//! compare mechanisms across replicates.

use serde::{Deserialize, Serialize};

use crate::{ExpulsionEvent, StepMetrics};

/// Modal agreement level that counts as convergence
pub const DEFAULT_CONVERGENCE_THRESHOLD: f64 = 0.95;
/// Number of consecutive steps the level must be held
pub const DEFAULT_CONSECUTIVE_STEPS: usize = 10;

/// Scalar outcomes of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub steps_run: u64,
    pub n_expulsions: usize,
    pub agents_remaining: usize,
    pub mean_gini: f64,
    pub peak_gini: f64,
    pub mean_top_share: f64,
    pub peak_top_share: f64,
    /// Steps with an undefined ratio contribute the top target's received
    /// aggression when at least two agents are alive, otherwise 0
    pub mean_convergence_ratio: f64,
    pub peak_convergence_ratio: f64,
    pub mean_entropy: f64,
    pub peak_modal_agreement: f64,
    pub final_modal_agreement: f64,
    /// Index into the series where modal agreement first held above 0.95
    /// for ten consecutive steps
    pub time_to_95: Option<usize>,
    /// Fraction of steps inside a qualifying convergence episode
    pub fraction_converged: f64,
    /// Mean catharsis over the run's expulsions, 0 without any
    pub mean_catharsis: f64,
}

impl RunSummary {
    /// Builds a summary from a recorded series.
    ///
    /// `final_window` controls how many trailing steps are averaged into
    /// `final_modal_agreement`.
    pub fn from_series(
        metrics: &[StepMetrics],
        expulsions: &[ExpulsionEvent],
        agents_remaining: usize,
        steps_run: u64,
        final_window: usize,
    ) -> Self {
        let gini: Vec<f64> = metrics.iter().map(|m| m.gini).collect();
        let top_share: Vec<f64> = metrics.iter().map(|m| m.top_share).collect();
        let ratio: Vec<f64> = metrics.iter().map(ratio_or_top).collect();
        let entropy: Vec<f64> = metrics.iter().map(|m| m.entropy).collect();
        let modal: Vec<f64> = metrics.iter().map(|m| m.modal_agreement).collect();

        let catharsis: Vec<f64> = expulsions.iter().map(|e| e.catharsis).collect();

        let window = final_window.max(1).min(modal.len());
        let final_modal_agreement = mean(&modal[modal.len() - window..]);

        Self {
            steps_run,
            n_expulsions: expulsions.len(),
            agents_remaining,
            mean_gini: mean(&gini),
            peak_gini: peak(&gini),
            mean_top_share: mean(&top_share),
            peak_top_share: peak(&top_share),
            mean_convergence_ratio: mean(&ratio),
            peak_convergence_ratio: peak(&ratio),
            mean_entropy: mean(&entropy),
            peak_modal_agreement: peak(&modal),
            final_modal_agreement,
            time_to_95: time_to_threshold(
                &modal,
                DEFAULT_CONVERGENCE_THRESHOLD,
                DEFAULT_CONSECUTIVE_STEPS,
            ),
            fraction_converged: fraction_converged_steps(
                &modal,
                DEFAULT_CONVERGENCE_THRESHOLD,
                DEFAULT_CONSECUTIVE_STEPS,
            ),
            mean_catharsis: mean(&catharsis),
        }
    }
}

fn ratio_or_top(m: &StepMetrics) -> f64 {
    match m.convergence_ratio {
        Some(ratio) => ratio,
        None if m.n_active_agents >= 2 => m.top_target_aggression,
        None => 0.0,
    }
}

/// Fraction of the series covered by windows of `consecutive` steps that
/// all reach `threshold`. Overlapping windows count each step once.
pub fn fraction_converged_steps(series: &[f64], threshold: f64, consecutive: usize) -> f64 {
    if series.is_empty() || consecutive == 0 {
        return 0.0;
    }
    let mut in_episode = vec![false; series.len()];
    let mut streak = 0;
    for (t, &value) in series.iter().enumerate() {
        if value >= threshold {
            streak += 1;
            if streak >= consecutive {
                in_episode[t + 1 - consecutive..=t].iter_mut().for_each(|f| *f = true);
            }
        } else {
            streak = 0;
        }
    }
    in_episode.iter().filter(|&&f| f).count() as f64 / series.len() as f64
}

/// First index `t` such that `series[t..t + consecutive]` all reach `threshold`.
pub fn time_to_threshold(series: &[f64], threshold: f64, consecutive: usize) -> Option<usize> {
    if consecutive == 0 || series.len() < consecutive {
        return None;
    }
    let mut streak = 0;
    for (t, &value) in series.iter().enumerate() {
        if value >= threshold {
            streak += 1;
            if streak == consecutive {
                return Some(t + 1 - consecutive);
            }
        } else {
            streak = 0;
        }
    }
    None
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn peak(values: &[f64]) -> f64 {
    values.iter().copied().fold(0.0, f64::max)
}
