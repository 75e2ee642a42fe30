//! Remnant construction.
//!
//! The remnant of layer `l` is every aggregate edge that is not already known
//! to belong to a *different* layer. It over-approximates "could still be in
//! `l`" and is only used to estimate degrees and communities for scoring; it
//! makes no claim about the true layer.
//!
//! ```text
//! remnant(l) = aggregate \ ⋃_{k ≠ l} known(k)
//! ```
//!
//! A layer's own known edges stay in its remnant.
//!
//! All remnants share one node universe (the union of their endpoints) so
//! that degree sequences index identically across layers.

use crate::error::Result;
use crate::graph::{endpoints, Aggregate, DegreeSequence, Edge, Layer, NodeId, Observations};
use std::collections::BTreeSet;

/// Per-layer remnant graphs over a common universe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remnants {
    layers: Vec<Layer>,
    universe: BTreeSet<NodeId>,
}

impl Remnants {
    /// Remnant layers in index order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Shared universe.
    pub fn universe(&self) -> &BTreeSet<NodeId> {
        &self.universe
    }

    /// Number of layers.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Total edges across remnants (an edge counts once per remnant).
    pub fn total_edges(&self) -> usize {
        self.layers.iter().map(Layer::edge_count).sum()
    }

    /// Zero-filled degree sequence of every remnant.
    pub fn degree_sequences(&self) -> Vec<DegreeSequence> {
        self.layers
            .iter()
            .map(|l| l.degree_sequence(&self.universe, true))
            .collect()
    }
}

/// Build the remnant of every layer in `0..layer_count`.
///
/// Observations are assumed to have been checked against the aggregate.
pub fn build_remnants(
    aggregate: &Aggregate,
    observations: &Observations,
    layer_count: usize,
) -> Result<Remnants> {
    let edge_sets: Vec<BTreeSet<Edge>> = (0..layer_count)
        .map(|layer| {
            aggregate
                .edges()
                .iter()
                .filter(|e| {
                    !observations
                        .iter()
                        .any(|(&k, known)| k != layer && known.contains(*e))
                })
                .copied()
                .collect()
        })
        .collect();

    let universe = endpoints(edge_sets.iter().flatten());
    let layers = edge_sets
        .into_iter()
        .map(|edges| Layer::build(edges, &universe))
        .collect::<Result<Vec<_>>>()?;

    for (idx, layer) in layers.iter().enumerate() {
        tracing::debug!(layer = idx, edges = layer.edge_count(), "remnant built");
    }

    Ok(Remnants { layers, universe })
}
