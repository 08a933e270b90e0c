//! Network Components
//!
//! Undirected social graph plus directed prestige weights on every edge.
//! Built once per run and read-only afterwards.

use bevy_ecs::prelude::*;
use rand::Rng;
use serde::Serialize;
use std::collections::{BTreeSet, VecDeque};

/// Bounds of the base prestige draw
pub const PRESTIGE_MIN: f64 = 0.1;
pub const PRESTIGE_MAX: f64 = 1.0;

/// Undirected simple graph over nodes `0..n`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    adjacency: Vec<BTreeSet<usize>>,
}

impl Graph {
    /// Edgeless graph with `n` nodes
    pub fn empty(n: usize) -> Self {
        Self {
            adjacency: vec![BTreeSet::new(); n],
        }
    }

    /// Graph from an explicit edge list. Self-loops and duplicates are dropped.
    pub fn from_edges(n: usize, edges: &[(usize, usize)]) -> Self {
        let mut graph = Self::empty(n);
        for &(u, v) in edges {
            graph.add_edge(u, v);
        }
        graph
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(|a| a.len()).sum::<usize>() / 2
    }

    /// Adds `u -- v`. Returns false for self-loops, out-of-range nodes, and existing edges.
    pub fn add_edge(&mut self, u: usize, v: usize) -> bool {
        let n = self.node_count();
        if u == v || u >= n || v >= n {
            return false;
        }
        let inserted = self.adjacency[u].insert(v);
        self.adjacency[v].insert(u);
        inserted
    }

    pub fn remove_edge(&mut self, u: usize, v: usize) -> bool {
        if u >= self.node_count() || v >= self.node_count() {
            return false;
        }
        let removed = self.adjacency[u].remove(&v);
        self.adjacency[v].remove(&u);
        removed
    }

    pub fn has_edge(&self, u: usize, v: usize) -> bool {
        self.adjacency.get(u).map(|a| a.contains(&v)).unwrap_or(false)
    }

    pub fn degree(&self, u: usize) -> usize {
        self.adjacency[u].len()
    }

    pub fn neighbors(&self, u: usize) -> impl Iterator<Item = usize> + '_ {
        self.adjacency[u].iter().copied()
    }

    /// Every edge once, as `(u, v)` with `u < v`, in ascending order
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.adjacency
            .iter()
            .enumerate()
            .flat_map(|(u, adj)| adj.range(u + 1..).map(move |&v| (u, v)))
    }
}

/// Graph plus base prestige `w0_ik` on each directed edge `i -> k`.
///
/// `w0_ik` is how strongly `i` imitates `k`; it need not equal `w0_ki`.
#[derive(Resource, Debug, Clone, Serialize)]
pub struct Network {
    /// Sorted neighbor ids per node
    neighbors: Vec<Vec<usize>>,
    /// `prestige[i][idx]` is `w0` from `i` toward `neighbors[i][idx]`
    prestige: Vec<Vec<f64>>,
}

impl Network {
    /// Draws `w0_ik` and `w0_ki` independently from `[0.1, 1.0]` for every edge
    pub fn with_random_prestige(graph: &Graph, rng: &mut impl Rng) -> Self {
        let mut network = Self::with_uniform_prestige(graph, PRESTIGE_MAX);
        for (u, v) in graph.edges() {
            let forward = rng.gen_range(PRESTIGE_MIN..=PRESTIGE_MAX);
            let backward = rng.gen_range(PRESTIGE_MIN..=PRESTIGE_MAX);
            network.set_prestige(u, v, forward);
            network.set_prestige(v, u, backward);
        }
        network
    }

    /// Same weight on every directed edge
    pub fn with_uniform_prestige(graph: &Graph, weight: f64) -> Self {
        let neighbors: Vec<Vec<usize>> = (0..graph.node_count())
            .map(|u| graph.neighbors(u).collect())
            .collect();
        let prestige = neighbors.iter().map(|n| vec![weight; n.len()]).collect();
        Self {
            neighbors,
            prestige,
        }
    }

    pub fn node_count(&self) -> usize {
        self.neighbors.len()
    }

    pub fn edge_count(&self) -> usize {
        self.neighbors.iter().map(|n| n.len()).sum::<usize>() / 2
    }

    pub fn neighbors(&self, i: usize) -> &[usize] {
        &self.neighbors[i]
    }

    /// Base prestige from `i` toward each of its neighbors, aligned with [`neighbors`](Self::neighbors)
    pub fn base_prestige(&self, i: usize) -> &[f64] {
        &self.prestige[i]
    }

    pub fn has_edge(&self, i: usize, k: usize) -> bool {
        self.neighbors
            .get(i)
            .map(|n| n.binary_search(&k).is_ok())
            .unwrap_or(false)
    }

    /// Base prestige `w0_ik`, if the edge exists
    pub fn prestige(&self, i: usize, k: usize) -> Option<f64> {
        let idx = self.neighbors.get(i)?.binary_search(&k).ok()?;
        Some(self.prestige[i][idx])
    }

    /// Overwrite `w0_ik`. Returns false when there is no such edge.
    pub fn set_prestige(&mut self, i: usize, k: usize, weight: f64) -> bool {
        match self.neighbors.get(i).and_then(|n| n.binary_search(&k).ok()) {
            Some(idx) => {
                self.prestige[i][idx] = weight;
                true
            }
            None => false,
        }
    }

    /// Shortest-path length in hops, `None` when unreachable
    pub fn hop_distance(&self, from: usize, to: usize) -> Option<usize> {
        if from == to {
            return Some(0);
        }
        if self.has_edge(from, to) {
            return Some(1);
        }

        let mut seen = vec![false; self.node_count()];
        let mut queue = VecDeque::new();
        seen[from] = true;
        queue.push_back((from, 0usize));

        while let Some((node, dist)) = queue.pop_front() {
            for &next in &self.neighbors[node] {
                if next == to {
                    return Some(dist + 1);
                }
                if !seen[next] {
                    seen[next] = true;
                    queue.push_back((next, dist + 1));
                }
            }
        }
        None
    }

    /// Divisor applied to object rivalry: hop distance floored at 1,
    /// infinite when the pair is disconnected.
    pub fn social_distance(&self, from: usize, to: usize) -> f64 {
        match self.hop_distance(from, to) {
            Some(d) => (d as f64).max(1.0),
            None => f64::INFINITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn path_graph(n: usize) -> Graph {
        let edges: Vec<_> = (0..n - 1).map(|i| (i, i + 1)).collect();
        Graph::from_edges(n, &edges)
    }

    #[test]
    fn test_graph_edges() {
        let mut graph = Graph::from_edges(4, &[(0, 1), (1, 0), (2, 2), (1, 3)]);
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.has_edge(1, 0));
        assert!(!graph.has_edge(2, 2));
        assert_eq!(graph.edges().collect::<Vec<_>>(), vec![(0, 1), (1, 3)]);

        assert!(graph.remove_edge(3, 1));
        assert_eq!(graph.degree(1), 1);
    }

    #[test]
    fn test_random_prestige_in_range_and_asymmetric() {
        let graph = Graph::from_edges(5, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 0)]);
        let mut rng = SmallRng::seed_from_u64(42);
        let network = Network::with_random_prestige(&graph, &mut rng);

        let mut asymmetric = false;
        for (u, v) in graph.edges() {
            let forward = network.prestige(u, v).unwrap();
            let backward = network.prestige(v, u).unwrap();
            assert!((PRESTIGE_MIN..=PRESTIGE_MAX).contains(&forward));
            assert!((PRESTIGE_MIN..=PRESTIGE_MAX).contains(&backward));
            asymmetric |= forward != backward;
        }
        assert!(asymmetric);
        assert_eq!(network.prestige(0, 2), None);
    }

    #[test]
    fn test_neighbors_aligned_with_prestige() {
        let graph = Graph::from_edges(3, &[(0, 1), (0, 2)]);
        let mut network = Network::with_uniform_prestige(&graph, 1.0);
        assert!(network.set_prestige(0, 2, 0.25));
        assert!(!network.set_prestige(1, 2, 0.5));

        assert_eq!(network.neighbors(0), &[1, 2]);
        assert_eq!(network.base_prestige(0), &[1.0, 0.25]);
    }

    #[test]
    fn test_hop_distance() {
        let network = Network::with_uniform_prestige(&path_graph(5), 1.0);
        assert_eq!(network.hop_distance(0, 0), Some(0));
        assert_eq!(network.hop_distance(0, 1), Some(1));
        assert_eq!(network.hop_distance(0, 4), Some(4));
        assert_eq!(network.social_distance(1, 2), 1.0);
    }

    #[test]
    fn test_disconnected_distance_is_infinite() {
        let network = Network::with_uniform_prestige(&Graph::from_edges(4, &[(0, 1)]), 1.0);
        assert_eq!(network.hop_distance(0, 3), None);
        assert!(network.social_distance(0, 3).is_infinite());
    }
}
