//! Topology Providers
//!
//! Anything that can produce a graph over `n` agents from the run's RNG.
//! The engine only relies on neighbor lookup and edge tests, never on a
//! particular family.

use rand::rngs::SmallRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::components::Graph;
use crate::error::ConfigError;

/// Source of the social graph for a run
pub trait TopologyProvider {
    fn generate(&self, n_agents: usize, rng: &mut SmallRng) -> Graph;
}

/// Built-in topology families, selectable from configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TopologyConfig {
    /// Ring lattice with `n_neighbors` per node, each edge rewired with `rewire_prob`
    WattsStrogatz { n_neighbors: usize, rewire_prob: f64 },
    /// Each pair connected independently with `edge_probability`
    ErdosRenyi { edge_probability: f64 },
    /// Preferential attachment, `attachments` edges per arriving node
    BarabasiAlbert { attachments: usize },
    /// Every pair connected
    Complete,
    /// Exactly these undirected edges
    EdgeList { edges: Vec<(usize, usize)> },
}

impl Default for TopologyConfig {
    fn default() -> Self {
        TopologyConfig::WattsStrogatz {
            n_neighbors: 6,
            rewire_prob: 0.15,
        }
    }
}

impl TopologyConfig {
    pub fn validate(&self, n_agents: usize) -> Result<(), ConfigError> {
        match self {
            TopologyConfig::WattsStrogatz {
                n_neighbors,
                rewire_prob,
            } => {
                if *n_neighbors >= n_agents {
                    return Err(ConfigError::out_of_range(
                        "topology.n_neighbors",
                        n_neighbors,
                        "fewer than n_agents",
                    ));
                }
                if !(0.0..=1.0).contains(rewire_prob) {
                    return Err(ConfigError::out_of_range(
                        "topology.rewire_prob",
                        rewire_prob,
                        "a value in [0, 1]",
                    ));
                }
            }
            TopologyConfig::ErdosRenyi { edge_probability } => {
                if !(0.0..=1.0).contains(edge_probability) {
                    return Err(ConfigError::out_of_range(
                        "topology.edge_probability",
                        edge_probability,
                        "a value in [0, 1]",
                    ));
                }
            }
            TopologyConfig::BarabasiAlbert { attachments } => {
                if *attachments == 0 || *attachments >= n_agents {
                    return Err(ConfigError::out_of_range(
                        "topology.attachments",
                        attachments,
                        "between 1 and n_agents - 1",
                    ));
                }
            }
            TopologyConfig::Complete => {}
            TopologyConfig::EdgeList { edges } => {
                if let Some(&(u, v)) = edges.iter().find(|(u, v)| *u >= n_agents || *v >= n_agents) {
                    return Err(ConfigError::out_of_range(
                        "topology.edges",
                        format!("({}, {})", u, v),
                        "node ids below n_agents",
                    ));
                }
            }
        }
        Ok(())
    }
}

impl TopologyProvider for TopologyConfig {
    fn generate(&self, n_agents: usize, rng: &mut SmallRng) -> Graph {
        match self {
            TopologyConfig::WattsStrogatz {
                n_neighbors,
                rewire_prob,
            } => watts_strogatz(n_agents, *n_neighbors, *rewire_prob, rng),
            TopologyConfig::ErdosRenyi { edge_probability } => {
                erdos_renyi(n_agents, *edge_probability, rng)
            }
            TopologyConfig::BarabasiAlbert { attachments } => {
                barabasi_albert(n_agents, *attachments, rng)
            }
            TopologyConfig::Complete => complete(n_agents),
            TopologyConfig::EdgeList { edges } => Graph::from_edges(n_agents, edges),
        }
    }
}

/// Small-world graph: ring lattice where each node links to `k / 2`
/// neighbors on either side, then every lattice edge is rewired to a
/// uniformly chosen non-neighbor with probability `p`.
pub fn watts_strogatz(n: usize, k: usize, p: f64, rng: &mut SmallRng) -> Graph {
    let mut graph = Graph::empty(n);
    if n < 2 {
        return graph;
    }
    let half = k / 2;

    for j in 1..=half {
        for u in 0..n {
            graph.add_edge(u, (u + j) % n);
        }
    }

    for j in 1..=half {
        for u in 0..n {
            let v = (u + j) % n;
            if rng.gen::<f64>() >= p {
                continue;
            }
            // Saturated node: nothing to rewire to
            if graph.degree(u) >= n - 1 || !graph.has_edge(u, v) {
                continue;
            }
            let mut w = rng.gen_range(0..n);
            while w == u || graph.has_edge(u, w) {
                w = rng.gen_range(0..n);
            }
            graph.remove_edge(u, v);
            graph.add_edge(u, w);
        }
    }

    graph
}

/// G(n, p) random graph
pub fn erdos_renyi(n: usize, p: f64, rng: &mut SmallRng) -> Graph {
    let mut graph = Graph::empty(n);
    for u in 0..n {
        for v in (u + 1)..n {
            if rng.gen::<f64>() < p {
                graph.add_edge(u, v);
            }
        }
    }
    graph
}

/// Preferential attachment grown from a star on `m + 1` nodes
pub fn barabasi_albert(n: usize, m: usize, rng: &mut SmallRng) -> Graph {
    let mut graph = Graph::empty(n);
    if m == 0 || n == 0 {
        return graph;
    }

    let seed_size = (m + 1).min(n);
    let mut repeated: Vec<usize> = Vec::new();
    for leaf in 1..seed_size {
        graph.add_edge(0, leaf);
        repeated.push(0);
        repeated.push(leaf);
    }

    for source in seed_size..n {
        // m distinct targets, each drawn proportionally to current degree
        let mut targets = BTreeSet::new();
        while targets.len() < m {
            let pick = repeated[rng.gen_range(0..repeated.len())];
            targets.insert(pick);
        }
        for &target in &targets {
            graph.add_edge(source, target);
            repeated.push(target);
            repeated.push(source);
        }
    }

    graph
}

/// Every pair of distinct nodes connected
pub fn complete(n: usize) -> Graph {
    let mut graph = Graph::empty(n);
    for u in 0..n {
        for v in (u + 1)..n {
            graph.add_edge(u, v);
        }
    }
    graph
}
