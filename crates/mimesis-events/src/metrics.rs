//! Step Metrics
//!
//! Per-timestep summary statistics of the hostility landscape.
//!
//! All values are computed over the living agents only. Degenerate states
//! (no aggression at all, a single survivor) map to zeros rather than NaN.

use serde::{Deserialize, Serialize};

/// Snapshot of convergence statistics after one timestep.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepMetrics {
    /// Timestep (1-based; 0 is the initial state)
    pub step: u64,
    /// Number of agents still alive
    pub n_active_agents: usize,
    /// Sum of received aggression over living agents
    pub system_tension: f64,
    /// Mean received aggression per living agent
    pub mean_aggression: f64,
    /// Largest received aggression
    pub top_target_aggression: f64,
    /// Gini coefficient of received aggression
    pub gini: f64,
    /// Share of total received aggression held by the top target
    pub top_share: f64,
    /// Share of total received aggression held by the top three targets
    pub top3_share: f64,
    /// Ratio of the largest to the second-largest received aggression.
    /// `None` unless at least two living agents receive nonzero aggression.
    #[serde(default)]
    pub convergence_ratio: Option<f64>,
    /// Shannon entropy (bits) of the normalized received distribution
    pub entropy: f64,
    /// Fraction of eligible agents whose favored target is the modal target
    pub modal_agreement: f64,
    /// The population's most common favored target
    #[serde(default)]
    pub modal_target: Option<usize>,
    /// Agents whose outgoing aggression clears the eligibility floor
    pub eligible_agents: usize,
    /// Mean desire intensity across living agents and objects
    pub mean_desire: f64,
    /// Herfindahl index of the aggregated desire vector
    pub desire_concentration: f64,
    /// Mean status of living agents (status rivalry only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean_status: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_metrics_are_zeroed() {
        let m = StepMetrics::default();
        assert_eq!(m.step, 0);
        assert_eq!(m.gini, 0.0);
        assert!(m.convergence_ratio.is_none());
        assert!(m.modal_target.is_none());
    }

    #[test]
    fn test_metrics_serialization_omits_missing_status() {
        let m = StepMetrics {
            step: 3,
            n_active_agents: 10,
            ..Default::default()
        };
        let json = serde_json::to_string(&m).unwrap();
        assert!(json.contains("\"step\":3"));
        assert!(!json.contains("mean_status"));

        let back: StepMetrics = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
    }
}
