//! Expulsion Events
//!
//! Record of a single agent being removed from the alive set.

use serde::{Deserialize, Serialize};

/// An agent expelled because its received aggression crossed the threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpulsionEvent {
    /// Timestep at which the expulsion fired (1-based)
    pub step: u64,
    /// Identifier of the expelled agent
    pub victim: usize,
    /// Total aggression the victim was receiving when expelled
    pub received_aggression: f64,
    /// Fractional drop in total received aggression caused by the expulsion
    pub catharsis: f64,
    /// Victim's status at the moment of expulsion (status rivalry only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub victim_status: Option<f64>,
}

impl ExpulsionEvent {
    pub fn new(step: u64, victim: usize, received_aggression: f64, catharsis: f64) -> Self {
        Self {
            step,
            victim,
            received_aggression,
            catharsis,
            victim_status: None,
        }
    }

    pub fn with_victim_status(mut self, status: Option<f64>) -> Self {
        self.victim_status = status;
        self
    }
}
