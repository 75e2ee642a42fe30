//! Louvain algorithm for community detection.
//!
//! Fast modularity optimization through local node moves and graph aggregation.
//!
//! ## The Algorithm (Blondel et al. 2008)
//!
//! 1. **Local moving**: Start with each node in its own community. Visit the
//!    nodes and move each to the neighboring community with the highest
//!    modularity gain, until a full sweep makes no move.
//!
//! 2. **Aggregation**: Build a meta-graph where communities become single
//!    nodes. Edge weights are sums of edges between communities; internal
//!    edges become self-loops.
//!
//! 3. **Iterate** on the meta-graph until modularity stops improving.
//!
//! ## Determinism
//!
//! The visiting order of each sweep is a seeded shuffle, and candidate
//! communities are scanned in ascending id order with strict improvement
//! required to switch. The same seed on the same graph always gives the same
//! partition; different seeds may give different (equally valid) ones.
//!
//! ## References
//!
//! Blondel et al. (2008). "Fast unfolding of communities in large networks."
//! Journal of Statistical Mechanics: Theory and Experiment, P10008.

use super::traits::CommunityDetection;
use crate::error::{Error, Result};
use petgraph::graph::UnGraph;
use petgraph::visit::EdgeRef;
use rand::prelude::*;
use std::collections::BTreeMap;

/// Weighted edge list with per-node self-loop weight.
struct Level {
    n: usize,
    edges: Vec<(usize, usize, f64)>,
    self_loops: Vec<f64>,
}

impl Level {
    /// Total edge weight m (each edge once, plus self-loops).
    fn total_weight(&self) -> f64 {
        self.edges.iter().map(|(_, _, w)| w).sum::<f64>() + self.self_loops.iter().sum::<f64>()
    }

    /// Weighted degrees; self-loops count twice.
    fn degrees(&self) -> Vec<f64> {
        let mut degrees = vec![0.0; self.n];
        for &(i, j, w) in &self.edges {
            degrees[i] += w;
            degrees[j] += w;
        }
        for (i, &sl) in self.self_loops.iter().enumerate() {
            degrees[i] += 2.0 * sl;
        }
        degrees
    }
}

/// Louvain community detection algorithm.
#[derive(Debug, Clone, PartialEq)]
pub struct Louvain {
    /// Resolution parameter (gamma).
    resolution: f64,
    /// Maximum sweeps per level.
    max_iter: usize,
    /// Maximum levels of aggregation.
    max_levels: usize,
    /// Minimum modularity improvement to continue.
    min_modularity_gain: f64,
    /// Seed for the node visiting order.
    seed: u64,
}

impl Louvain {
    /// Create a new Louvain detector with default settings.
    pub fn new() -> Self {
        Self {
            resolution: 1.0,
            max_iter: 100,
            max_levels: 10,
            min_modularity_gain: 1e-7,
            seed: 42,
        }
    }

    /// Set resolution parameter.
    ///
    /// Higher values produce smaller communities.
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set maximum sweeps per level.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set maximum aggregation levels.
    pub fn with_max_levels(mut self, levels: usize) -> Self {
        self.max_levels = levels;
        self
    }

    /// Set the modularity gain below which aggregation stops.
    pub fn with_min_modularity_gain(mut self, gain: f64) -> Self {
        self.min_modularity_gain = gain;
        self
    }

    /// Set the seed for the node visiting order.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Seed in use.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn validate(&self) -> Result<()> {
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return Err(Error::InvalidParameter {
                name: "resolution",
                message: "must be positive and finite",
            });
        }
        if self.max_iter == 0 || self.max_levels == 0 {
            return Err(Error::InvalidParameter {
                name: "max_iter",
                message: "iteration limits must be at least 1",
            });
        }
        Ok(())
    }

    /// Modularity of a partition of a weighted level.
    fn modularity_weighted(&self, level: &Level, communities: &[usize]) -> f64 {
        let m = level.total_weight();
        if m == 0.0 {
            return 0.0;
        }
        let degrees = level.degrees();

        let mut internal = 0.0;
        for &(i, j, w) in &level.edges {
            if communities[i] == communities[j] {
                internal += w;
            }
        }
        internal += level.self_loops.iter().sum::<f64>();

        let mut community_degree: BTreeMap<usize, f64> = BTreeMap::new();
        for (i, &c) in communities.iter().enumerate() {
            *community_degree.entry(c).or_insert(0.0) += degrees[i];
        }
        let expected: f64 = community_degree.values().map(|d| d * d).sum::<f64>() / (4.0 * m * m);

        internal / m - self.resolution * expected
    }

    /// Phase 1: local moving. Returns (communities, improved).
    fn local_moving(&self, level: &Level, rng: &mut StdRng) -> (Vec<usize>, bool) {
        let n = level.n;
        let m = level.total_weight();
        if m == 0.0 {
            return ((0..n).collect(), false);
        }

        let mut adj: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); n];
        for &(i, j, w) in &level.edges {
            *adj[i].entry(j).or_insert(0.0) += w;
            *adj[j].entry(i).or_insert(0.0) += w;
        }
        let degrees = level.degrees();

        let mut communities: Vec<usize> = (0..n).collect();
        let mut community_degrees = degrees.clone();
        let mut order: Vec<usize> = (0..n).collect();
        let mut any_improved = false;

        for _ in 0..self.max_iter {
            let mut improved = false;
            order.shuffle(rng);

            for &node in &order {
                let current = communities[node];
                let ki = degrees[node];

                // Take the node out of its community before scoring moves.
                community_degrees[current] -= ki;

                let mut links: BTreeMap<usize, f64> = BTreeMap::new();
                for (&neighbor, &w) in &adj[node] {
                    *links.entry(communities[neighbor]).or_insert(0.0) += w;
                }

                // Staying put is scored like any other candidate so that a
                // node never leaves for an equally good community.
                let gain = |ki_in: f64, sigma_tot: f64| {
                    ki_in / m - self.resolution * sigma_tot * ki / (2.0 * m * m)
                };
                let mut best = current;
                let mut best_gain = gain(
                    links.get(&current).copied().unwrap_or(0.0),
                    community_degrees[current],
                )
                .max(0.0);

                for (&target, &ki_in) in &links {
                    let g = gain(ki_in, community_degrees[target]);
                    if g > best_gain {
                        best_gain = g;
                        best = target;
                    }
                }

                community_degrees[best] += ki;
                if best != current {
                    communities[node] = best;
                    improved = true;
                    any_improved = true;
                }
            }

            if !improved {
                break;
            }
        }

        (communities, any_improved)
    }

    /// Phase 2: collapse communities into nodes.
    /// Returns the next level and, per new node, the nodes it absorbed.
    fn aggregate(level: &Level, communities: &[usize]) -> (Level, Vec<Vec<usize>>) {
        let renumbered = renumber(communities);
        let n_new = renumbered.iter().max().map_or(0, |&c| c + 1);

        let mut members: Vec<Vec<usize>> = vec![Vec::new(); n_new];
        for (node, &c) in renumbered.iter().enumerate() {
            members[c].push(node);
        }

        let mut weights: BTreeMap<(usize, usize), f64> = BTreeMap::new();
        let mut self_loops = vec![0.0; n_new];
        for (i, &sl) in level.self_loops.iter().enumerate() {
            self_loops[renumbered[i]] += sl;
        }
        for &(i, j, w) in &level.edges {
            let (ci, cj) = (renumbered[i], renumbered[j]);
            if ci == cj {
                self_loops[ci] += w;
            } else {
                *weights.entry((ci.min(cj), ci.max(cj))).or_insert(0.0) += w;
            }
        }

        let next = Level {
            n: n_new,
            edges: weights.into_iter().map(|((i, j), w)| (i, j, w)).collect(),
            self_loops,
        };
        (next, members)
    }
}

/// Relabel to consecutive integers, preserving the order of label values.
fn renumber(labels: &[usize]) -> Vec<usize> {
    let mut unique: Vec<usize> = labels.to_vec();
    unique.sort_unstable();
    unique.dedup();
    let index: BTreeMap<usize, usize> = unique.iter().enumerate().map(|(i, &c)| (c, i)).collect();
    labels.iter().map(|c| index[c]).collect()
}

impl Default for Louvain {
    fn default() -> Self {
        Self::new()
    }
}

impl CommunityDetection for Louvain {
    fn detect<N, E>(&self, graph: &UnGraph<N, E>) -> Result<Vec<usize>> {
        self.validate()?;
        let n = graph.node_count();
        if n == 0 {
            return Err(Error::EmptyInput);
        }

        if graph.edge_count() == 0 {
            // No edges: each node is its own community
            return Ok((0..n).collect());
        }

        let mut edges: Vec<(usize, usize, f64)> = Vec::with_capacity(graph.edge_count());
        for edge in graph.edge_references() {
            let (i, j) = (edge.source().index(), edge.target().index());
            if i != j {
                edges.push((i.min(j), i.max(j), 1.0));
            }
        }
        let mut level = Level {
            n,
            edges,
            self_loops: vec![0.0; n],
        };

        let mut rng = StdRng::seed_from_u64(self.seed);
        // assignment[original node] = node at the current level
        let mut assignment: Vec<usize> = (0..n).collect();
        let singletons: Vec<usize> = (0..n).collect();
        let mut prev_modularity = self.modularity_weighted(&level, &singletons);

        for depth in 0..self.max_levels {
            let (partition, improved) = self.local_moving(&level, &mut rng);
            if !improved {
                break;
            }

            let q = self.modularity_weighted(&level, &partition);
            let gain = q - prev_modularity;
            prev_modularity = q;

            let (next, members) = Self::aggregate(&level, &partition);
            let mut owner = vec![0; level.n];
            for (new_node, old_nodes) in members.iter().enumerate() {
                for &old in old_nodes {
                    owner[old] = new_node;
                }
            }
            for a in assignment.iter_mut() {
                *a = owner[*a];
            }

            tracing::trace!(depth, nodes = next.n, modularity = q, "louvain level");
            // The level's moves are already folded in.
            if gain < self.min_modularity_gain || next.n == level.n {
                break;
            }
            level = next;
        }

        Ok(renumber(&assignment))
    }

    fn resolution(&self) -> f64 {
        self.resolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use petgraph::graph::UnGraph;

    fn two_triangles() -> UnGraph<(), ()> {
        let mut graph = UnGraph::<(), ()>::new_undirected();
        let n: Vec<_> = (0..6).map(|_| graph.add_node(())).collect();
        for (a, b) in [(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5), (2, 3)] {
            let _ = graph.add_edge(n[a], n[b], ());
        }
        graph
    }

    #[test]
    fn test_louvain_triangle() {
        let mut graph = UnGraph::<(), ()>::new_undirected();
        let n0 = graph.add_node(());
        let n1 = graph.add_node(());
        let n2 = graph.add_node(());

        let _ = graph.add_edge(n0, n1, ());
        let _ = graph.add_edge(n1, n2, ());
        let _ = graph.add_edge(n0, n2, ());

        let communities = Louvain::new().detect(&graph).unwrap();

        assert_eq!(communities.len(), 3);
        assert_eq!(communities[0], communities[1]);
        assert_eq!(communities[1], communities[2]);
    }

    #[test]
    fn test_louvain_two_cliques() {
        let communities = Louvain::new().detect(&two_triangles()).unwrap();

        assert_eq!(communities.len(), 6);
        assert_eq!(communities[0], communities[1]);
        assert_eq!(communities[1], communities[2]);
        assert_eq!(communities[3], communities[4]);
        assert_eq!(communities[4], communities[5]);
        assert_ne!(communities[0], communities[3]);
    }

    #[test]
    fn test_louvain_same_seed_same_partition() {
        let graph = two_triangles();
        for seed in 0..20 {
            let a = Louvain::new().with_seed(seed).detect(&graph).unwrap();
            let b = Louvain::new().with_seed(seed).detect(&graph).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_louvain_labels_are_consecutive() {
        let communities = Louvain::new().detect(&two_triangles()).unwrap();
        let max = communities.iter().copied().max().unwrap();
        for c in 0..=max {
            assert!(communities.contains(&c));
        }
    }

    #[test]
    fn test_louvain_keeps_moves_of_last_level() {
        // Every level falls short of the threshold; the first one still counts.
        let louvain = Louvain::new().with_min_modularity_gain(f64::INFINITY);

        let mut triangle = UnGraph::<(), ()>::new_undirected();
        let n: Vec<_> = (0..3).map(|_| triangle.add_node(())).collect();
        for (a, b) in [(0, 1), (1, 2), (0, 2)] {
            let _ = triangle.add_edge(n[a], n[b], ());
        }
        assert_eq!(louvain.detect(&triangle).unwrap(), vec![0, 0, 0]);

        let communities = louvain.detect(&two_triangles()).unwrap();
        let distinct: std::collections::BTreeSet<_> = communities.iter().collect();
        assert!(distinct.len() < 6);
    }

    #[test]
    fn test_louvain_empty_graph() {
        let graph = UnGraph::<(), ()>::new_undirected();
        assert!(matches!(
            Louvain::new().detect(&graph),
            Err(Error::EmptyInput)
        ));
    }

    #[test]
    fn test_louvain_rejects_bad_resolution() {
        let result = Louvain::new().with_resolution(0.0).detect(&two_triangles());
        assert!(matches!(result, Err(Error::InvalidParameter { .. })));
    }

    #[test]
    fn test_louvain_disconnected() {
        let mut graph = UnGraph::<(), ()>::new_undirected();
        let _ = graph.add_node(());
        let _ = graph.add_node(());

        let communities = Louvain::new().detect(&graph).unwrap();

        assert_eq!(communities.len(), 2);
        assert_ne!(communities[0], communities[1]);
    }
}
