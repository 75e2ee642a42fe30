//! Community detection on layer graphs.
//!
//! Communities feed the reconstruction in one way only: an edge whose
//! endpoints share a detected community is weighted by the community strength
//! `mu`, otherwise by `1 - mu`. The detector therefore only has to produce a
//! reasonable modularity-maximizing partition; it does not need to be stable
//! across seeds.
//!
//! ## The Modularity Objective
//!
//! ```text
//! Q = (1/2m) × Σ[A_ij - γ(k_i × k_j)/(2m)] × δ(c_i, c_j)
//! ```
//!
//! Where:
//! - m = number of edges
//! - A_ij = 1 if i and j are adjacent
//! - k_i = degree of node i
//! - γ = resolution parameter
//! - δ(c_i, c_j) = 1 if i and j are in same community
//!
//! ## Usage
//!
//! ```rust
//! use petgraph::graph::UnGraph;
//! use demux::community::{CommunityDetection, Louvain};
//!
//! let mut graph = UnGraph::<(), ()>::new_undirected();
//! let a = graph.add_node(());
//! let b = graph.add_node(());
//! let c = graph.add_node(());
//! graph.add_edge(a, b, ());
//! graph.add_edge(b, c, ());
//!
//! let communities = Louvain::new().with_seed(7).detect(&graph).unwrap();
//! assert_eq!(communities.len(), 3);
//! ```
//!
//! ## References
//!
//! - Blondel et al. (2008). "Fast unfolding of communities in large networks."
//! - Newman & Girvan (2004). "Finding and evaluating community structure in networks."

mod louvain;
mod traits;

pub use louvain::Louvain;
pub use traits::CommunityDetection;

use petgraph::graph::UnGraph;
use petgraph::visit::EdgeRef;

/// Modularity of a node labelling over an unweighted graph.
///
/// `communities[i]` is the community of node index `i`. Returns `None` when
/// the graph has no edges (modularity is undefined there).
pub fn modularity<N, E>(graph: &UnGraph<N, E>, communities: &[usize], resolution: f64) -> Option<f64> {
    let m = graph.edge_count() as f64;
    if m == 0.0 || communities.len() != graph.node_count() {
        return None;
    }

    let mut degrees = vec![0.0; graph.node_count()];
    let mut internal = 0.0;
    for edge in graph.edge_references() {
        let (i, j) = (edge.source().index(), edge.target().index());
        degrees[i] += 1.0;
        degrees[j] += 1.0;
        if communities[i] == communities[j] {
            internal += 1.0;
        }
    }

    // Σ_c (d_c)^2 over communities
    let mut community_degree = std::collections::BTreeMap::new();
    for (i, &c) in communities.iter().enumerate() {
        *community_degree.entry(c).or_insert(0.0) += degrees[i];
    }
    let expected: f64 = community_degree
        .values()
        .map(|d: &f64| d * d)
        .sum::<f64>()
        / (4.0 * m * m);

    Some(internal / m - resolution * expected)
}
