//! Simulation State
//!
//! Mutable per-run record of every agent's desire, aggression and status,
//! plus the alive set. Standing invariants: `A_i(i) = 0`, and `A_i(j) = 0`
//! whenever `j` has been expelled.

use bevy_ecs::prelude::*;
use serde::Serialize;

use crate::components::matrix::Matrix;
use crate::components::network::Network;

/// Agents not yet expelled. Only ever shrinks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AliveSet {
    flags: Vec<bool>,
    count: usize,
}

impl AliveSet {
    /// Everyone alive
    pub fn full(n: usize) -> Self {
        Self {
            flags: vec![true; n],
            count: n,
        }
    }

    pub fn is_alive(&self, id: usize) -> bool {
        self.flags.get(id).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Living ids in ascending order
    pub fn ids(&self) -> impl Iterator<Item = usize> + '_ {
        self.flags
            .iter()
            .enumerate()
            .filter_map(|(id, &alive)| alive.then_some(id))
    }

    /// Remove an agent. Returns false if it was already gone.
    pub fn expel(&mut self, id: usize) -> bool {
        match self.flags.get_mut(id) {
            Some(flag) if *flag => {
                *flag = false;
                self.count -= 1;
                true
            }
            _ => false,
        }
    }
}

/// Agent vectors at the current timestep
#[derive(Resource, Debug, Clone, PartialEq, Serialize)]
pub struct SimState {
    /// `N x n_objects` desire vectors
    pub desires: Matrix,
    /// `N x N` aggression vectors; row `i` is `A_i`
    pub aggression: Matrix,
    /// Status scalars in `[0, 1]`, present only under status rivalry
    pub status: Option<Vec<f64>>,
    pub alive: AliveSet,
}

impl SimState {
    /// Zero desire, zero aggression, no status, everyone alive
    pub fn new(n_agents: usize, n_objects: usize) -> Self {
        Self {
            desires: Matrix::zeros(n_agents, n_objects),
            aggression: Matrix::zeros(n_agents, n_agents),
            status: None,
            alive: AliveSet::full(n_agents),
        }
    }

    pub fn n_agents(&self) -> usize {
        self.aggression.rows()
    }

    pub fn n_objects(&self) -> usize {
        self.desires.cols()
    }

    /// Living neighbors of `i`, with their index into the network's neighbor list
    pub fn living_neighbors<'a>(
        &'a self,
        network: &'a Network,
        i: usize,
    ) -> impl Iterator<Item = (usize, usize)> + 'a {
        network
            .neighbors(i)
            .iter()
            .enumerate()
            .filter(move |&(_, &k)| self.alive.is_alive(k))
            .map(|(idx, &k)| (idx, k))
    }

    /// `R(v)`: aggression aimed at `v` by every other living agent
    pub fn received_aggression(&self, v: usize) -> f64 {
        self.alive
            .ids()
            .filter(|&i| i != v)
            .map(|i| self.aggression.get(i, v))
            .sum()
    }

    /// `(id, R(id))` for each living agent in ascending id order
    pub fn received_by_alive(&self) -> Vec<(usize, f64)> {
        self.alive
            .ids()
            .map(|v| (v, self.received_aggression(v)))
            .collect()
    }

    /// Total aggression an agent directs at other living agents
    pub fn outgoing_aggression(&self, i: usize) -> f64 {
        self.alive
            .ids()
            .filter(|&j| j != i)
            .map(|j| self.aggression.get(i, j))
            .sum()
    }

    /// Zero self-aggression and aggression toward expelled agents in `row`
    pub fn enforce_row_invariants(&self, owner: usize, row: &mut [f64]) {
        for (j, value) in row.iter_mut().enumerate() {
            if j == owner || !self.alive.is_alive(j) {
                *value = 0.0;
            }
        }
    }

    /// True when every living row satisfies the standing invariants
    pub fn invariants_hold(&self) -> bool {
        self.alive.ids().all(|i| {
            self.aggression
                .row(i)
                .iter()
                .enumerate()
                .all(|(j, &a)| (j != i && self.alive.is_alive(j)) || a == 0.0)
        })
    }
}

/// Back buffers written during a step and swapped into [`SimState`] at the end
/// of each stage, so no agent observes a neighbor's same-step update.
#[derive(Resource, Debug, Clone)]
pub struct StepBuffers {
    pub desires: Matrix,
    pub aggression: Matrix,
}

impl StepBuffers {
    pub fn for_state(state: &SimState) -> Self {
        Self {
            desires: state.desires.clone(),
            aggression: state.aggression.clone(),
        }
    }
}
