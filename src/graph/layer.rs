//! A single layer of a multiplex.

use super::{DegreeSequence, Edge, NodeId};
use crate::community::{self, CommunityDetection};
use crate::error::{Error, Result};
use petgraph::algo::connected_components;
use petgraph::graph::{NodeIndex, UnGraph};
use std::collections::{BTreeMap, BTreeSet};

/// Community assignment per node.
///
/// Community ids are consecutive from 0 within one partition; they carry no
/// meaning across partitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    communities: BTreeMap<NodeId, usize>,
}

impl Partition {
    /// Every node in its own community.
    pub fn singletons(nodes: &BTreeSet<NodeId>) -> Self {
        Self {
            communities: nodes.iter().enumerate().map(|(c, &n)| (n, c)).collect(),
        }
    }

    /// Community of `node`, if assigned.
    pub fn community(&self, node: NodeId) -> Option<usize> {
        self.communities.get(&node).copied()
    }

    /// `Some(true)` when both endpoints share a community, `None` when either
    /// endpoint is unassigned.
    pub fn same_community(&self, edge: &Edge) -> Option<bool> {
        let (u, v) = edge.endpoints();
        Some(self.community(u)? == self.community(v)?)
    }

    /// Number of distinct communities.
    pub fn community_count(&self) -> usize {
        self.communities.values().collect::<BTreeSet<_>>().len()
    }

    /// Number of assigned nodes.
    pub fn len(&self) -> usize {
        self.communities.len()
    }

    /// True when no node is assigned.
    pub fn is_empty(&self) -> bool {
        self.communities.is_empty()
    }

    /// `(node, community)` pairs in ascending node order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, usize)> + '_ {
        self.communities.iter().map(|(&n, &c)| (n, c))
    }
}

impl FromIterator<(NodeId, usize)> for Partition {
    fn from_iter<T: IntoIterator<Item = (NodeId, usize)>>(iter: T) -> Self {
        Self {
            communities: iter.into_iter().collect(),
        }
    }
}

/// Result of one community-detection pass over a layer.
///
/// Computed once by the caller and never updated; run detection again to get
/// a fresh estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct CommunityStructure {
    /// Node to community assignment.
    pub partition: Partition,
    /// Newman-Girvan modularity of `partition`; `None` for edgeless layers.
    pub modularity: Option<f64>,
}

/// One layer: an edge set over a fixed node universe.
///
/// Isolated universe nodes stay in the layer (with degree 0) so that degree
/// sequences line up across layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    nodes: BTreeSet<NodeId>,
    edges: BTreeSet<Edge>,
    degrees: DegreeSequence,
}

impl Layer {
    /// Build a layer restricted to `universe`.
    ///
    /// Fails with [`Error::InvalidTopology`] if an endpoint lies outside it.
    pub fn build<I>(edges: I, universe: &BTreeSet<NodeId>) -> Result<Self>
    where
        I: IntoIterator<Item = Edge>,
    {
        let edges: BTreeSet<Edge> = edges.into_iter().collect();
        for e in &edges {
            let (u, v) = e.endpoints();
            if !universe.contains(&u) || !universe.contains(&v) {
                return Err(Error::topology(*e, "endpoint outside node universe"));
            }
        }
        let degrees = DegreeSequence::from_edges(&edges, universe);
        Ok(Self {
            nodes: universe.clone(),
            edges,
            degrees,
        })
    }

    /// Node universe of the layer (active or not).
    pub fn nodes(&self) -> &BTreeSet<NodeId> {
        &self.nodes
    }

    /// Nodes with at least one incident edge.
    pub fn active_nodes(&self) -> BTreeSet<NodeId> {
        super::endpoints(&self.edges)
    }

    /// Edge set.
    pub fn edges(&self) -> &BTreeSet<Edge> {
        &self.edges
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Size of the node universe.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether `edge` is in the layer.
    pub fn contains(&self, edge: &Edge) -> bool {
        self.edges.contains(edge)
    }

    /// Degree of `node` (0 for inactive or unknown nodes).
    pub fn degree(&self, node: NodeId) -> usize {
        self.degrees.get(node)
    }

    /// Zero-filled degrees over the layer's own universe.
    pub fn degrees(&self) -> &DegreeSequence {
        &self.degrees
    }

    /// Degree sequence indexed by `universe`.
    ///
    /// With `zero_fill` every universe node appears; without it only nodes
    /// with at least one incident edge do.
    pub fn degree_sequence(&self, universe: &BTreeSet<NodeId>, zero_fill: bool) -> DegreeSequence {
        universe
            .iter()
            .map(|&n| (n, self.degree(n)))
            .filter(|&(_, d)| zero_fill || d > 0)
            .collect()
    }

    /// Petgraph view; node index `i` is the `i`-th node of [`Layer::nodes`].
    pub fn to_graph(&self) -> (UnGraph<NodeId, ()>, Vec<NodeId>) {
        let ids: Vec<NodeId> = self.nodes.iter().copied().collect();
        let index: BTreeMap<NodeId, NodeIndex> = ids
            .iter()
            .enumerate()
            .map(|(i, &n)| (n, NodeIndex::new(i)))
            .collect();

        let mut graph = UnGraph::with_capacity(ids.len(), self.edges.len());
        for &n in &ids {
            let _ = graph.add_node(n);
        }
        for e in &self.edges {
            let (u, v) = e.endpoints();
            let _ = graph.add_edge(index[&u], index[&v], ());
        }
        (graph, ids)
    }

    /// Number of connected components among active nodes.
    pub fn component_count(&self) -> usize {
        if self.edges.is_empty() {
            return 0;
        }
        let isolated = self.nodes.len() - self.active_nodes().len();
        let (graph, _) = self.to_graph();
        connected_components(&graph) - isolated
    }

    /// Run `detector` over the layer.
    ///
    /// An empty universe yields an empty partition rather than an error.
    pub fn community_partition<D: CommunityDetection>(&self, detector: &D) -> Result<Partition> {
        if self.nodes.is_empty() {
            return Ok(Partition::default());
        }
        let (graph, ids) = self.to_graph();
        let labels = detector.detect(&graph)?;
        Ok(ids.into_iter().zip(labels).collect())
    }

    /// Modularity of `partition` over this layer, `None` without edges.
    ///
    /// Nodes the partition does not assign are scored as singletons.
    pub fn modularity(&self, partition: &Partition) -> Option<f64> {
        self.modularity_at(partition, 1.0)
    }

    /// [`Layer::modularity`] with resolution `gamma`.
    pub fn modularity_at(&self, partition: &Partition, gamma: f64) -> Option<f64> {
        if self.edges.is_empty() {
            return None;
        }
        let (graph, ids) = self.to_graph();
        let mut next = partition.iter().map(|(_, c)| c + 1).max().unwrap_or(0);
        let labels: Vec<usize> = ids
            .iter()
            .map(|&n| {
                partition.community(n).unwrap_or_else(|| {
                    next += 1;
                    next - 1
                })
            })
            .collect();
        community::modularity(&graph, &labels, gamma)
    }

    /// Detect communities and score them at the detector's resolution.
    pub fn community_structure<D: CommunityDetection>(
        &self,
        detector: &D,
    ) -> Result<CommunityStructure> {
        let partition = self.community_partition(detector)?;
        let modularity = self.modularity_at(&partition, detector.resolution());
        Ok(CommunityStructure {
            partition,
            modularity,
        })
    }
}

/// Build a layer from `edges` restricted to `universe`.
pub fn build_layer<I>(edges: I, universe: &BTreeSet<NodeId>) -> Result<Layer>
where
    I: IntoIterator<Item = Edge>,
{
    Layer::build(edges, universe)
}

/// Degree sequence of `layer` indexed by `universe`.
pub fn degree_sequence(layer: &Layer, universe: &BTreeSet<NodeId>, zero_fill: bool) -> DegreeSequence {
    layer.degree_sequence(universe, zero_fill)
}

/// Community partition of `layer` under `detector`.
pub fn community_partition<D: CommunityDetection>(layer: &Layer, detector: &D) -> Result<Partition> {
    layer.community_partition(detector)
}

/// Modularity of `partition` over `layer`.
pub fn modularity(layer: &Layer, partition: &Partition) -> Option<f64> {
    layer.modularity(partition)
}
