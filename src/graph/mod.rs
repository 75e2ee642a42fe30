//! Graph and multiplex data model.
//!
//! A multiplex network is an ordered collection of layers over a shared node
//! universe. Only the union of the layers (the *aggregate*) is observed
//! directly; everything in this module is the vocabulary the reconstruction
//! pipeline uses to talk about layers, degrees and communities.
//!
//! ## Edge identity
//!
//! Edges are undirected and unweighted. [`Edge`] stores its endpoints in
//! ascending order, so `(u, v)` and `(v, u)` are the same value and hash,
//! compare and sort identically.
//!
//! ## Ordering
//!
//! Every collection here is ordered (`BTreeSet`/`BTreeMap`). Iteration order
//! never depends on hashing, so a reconstruction run is reproducible given a
//! seed.

mod layer;
pub mod multiplex;

pub use layer::{
    build_layer, community_partition, degree_sequence, modularity, CommunityStructure, Layer,
    Partition,
};
pub use multiplex::{Aggregation, Correlation, LayerSummary, Multiplex};

use crate::error::{Error, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Integer node identifier.
pub type NodeId = u64;

/// Known edges per layer index (partial observations).
pub type Observations = BTreeMap<usize, BTreeSet<Edge>>;

/// An undirected edge between two distinct nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Edge {
    lo: NodeId,
    hi: NodeId,
}

impl Edge {
    /// Create an edge, normalizing endpoint order.
    ///
    /// Fails on self-loops.
    pub fn new(a: NodeId, b: NodeId) -> Result<Self> {
        if a == b {
            return Err(Error::topology(Self::new_unchecked(a, b), "self-loop"));
        }
        Ok(Self::new_unchecked(a, b))
    }

    pub(crate) fn new_unchecked(a: NodeId, b: NodeId) -> Self {
        if a <= b {
            Self { lo: a, hi: b }
        } else {
            Self { lo: b, hi: a }
        }
    }

    /// Endpoints, smaller id first.
    pub fn endpoints(&self) -> (NodeId, NodeId) {
        (self.lo, self.hi)
    }

    /// Whether `node` is an endpoint.
    pub fn contains(&self, node: NodeId) -> bool {
        self.lo == node || self.hi == node
    }
}

impl TryFrom<(NodeId, NodeId)> for Edge {
    type Error = Error;

    fn try_from((a, b): (NodeId, NodeId)) -> Result<Self> {
        Edge::new(a, b)
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lo, self.hi)
    }
}

/// Collect the endpoints of a set of edges.
pub fn endpoints<'a, I>(edges: I) -> BTreeSet<NodeId>
where
    I: IntoIterator<Item = &'a Edge>,
{
    edges
        .into_iter()
        .flat_map(|e| [e.lo, e.hi])
        .collect()
}

/// The aggregate graph: the union of all layers' edges.
///
/// Its node set is exactly the set of endpoints of its edges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregate {
    edges: BTreeSet<Edge>,
    nodes: BTreeSet<NodeId>,
}

impl Aggregate {
    /// Build from already-normalized edges. Duplicates collapse.
    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = Edge>,
    {
        let edges: BTreeSet<Edge> = edges.into_iter().collect();
        let nodes = endpoints(&edges);
        Self { edges, nodes }
    }

    /// Build from raw node pairs, rejecting self-loops.
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (NodeId, NodeId)>,
    {
        let edges = pairs
            .into_iter()
            .map(Edge::try_from)
            .collect::<Result<BTreeSet<_>>>()?;
        Ok(Self::from_edges(edges))
    }

    /// Edge set.
    pub fn edges(&self) -> &BTreeSet<Edge> {
        &self.edges
    }

    /// Node universe.
    pub fn nodes(&self) -> &BTreeSet<NodeId> {
        &self.nodes
    }

    /// Whether `edge` belongs to the aggregate.
    pub fn contains(&self, edge: &Edge) -> bool {
        self.edges.contains(edge)
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// True when there are no edges.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Degree of each node within one layer.
///
/// Lookups for nodes without an entry return 0, which is what the likelihood
/// needs; [`DegreeSequence::covers`] distinguishes "absent" from "degree 0".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DegreeSequence {
    degrees: BTreeMap<NodeId, usize>,
}

impl DegreeSequence {
    /// Empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Dense sequence where position `i` is the degree of node `i`.
    pub fn from_dense(degrees: &[usize]) -> Self {
        Self {
            degrees: degrees
                .iter()
                .enumerate()
                .map(|(i, &d)| (i as NodeId, d))
                .collect(),
        }
    }

    /// Count degrees of `edges`, zero-filling every node in `universe`.
    pub fn from_edges<'a, I>(edges: I, universe: &BTreeSet<NodeId>) -> Self
    where
        I: IntoIterator<Item = &'a Edge>,
    {
        let mut degrees: BTreeMap<NodeId, usize> = universe.iter().map(|&n| (n, 0)).collect();
        for e in edges {
            let (u, v) = e.endpoints();
            *degrees.entry(u).or_insert(0) += 1;
            *degrees.entry(v).or_insert(0) += 1;
        }
        Self { degrees }
    }

    /// Set the degree of `node`.
    pub fn insert(&mut self, node: NodeId, degree: usize) {
        let _ = self.degrees.insert(node, degree);
    }

    /// Degree of `node` (0 when absent).
    pub fn get(&self, node: NodeId) -> usize {
        self.degrees.get(&node).copied().unwrap_or(0)
    }

    /// Whether `node` has an explicit entry.
    pub fn covers(&self, node: NodeId) -> bool {
        self.degrees.contains_key(&node)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.degrees.len()
    }

    /// True when there are no entries.
    pub fn is_empty(&self) -> bool {
        self.degrees.is_empty()
    }

    /// Sum of all degrees (twice the edge count for a simple graph).
    pub fn total(&self) -> usize {
        self.degrees.values().sum()
    }

    /// `(node, degree)` pairs in ascending node order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, usize)> + '_ {
        self.degrees.iter().map(|(&n, &d)| (n, d))
    }

    /// Drop zero entries.
    pub fn active(&self) -> Self {
        Self {
            degrees: self
                .degrees
                .iter()
                .filter(|(_, &d)| d > 0)
                .map(|(&n, &d)| (n, d))
                .collect(),
        }
    }
}

impl FromIterator<(NodeId, usize)> for DegreeSequence {
    fn from_iter<T: IntoIterator<Item = (NodeId, usize)>>(iter: T) -> Self {
        Self {
            degrees: iter.into_iter().collect(),
        }
    }
}
