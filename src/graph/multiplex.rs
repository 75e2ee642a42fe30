//! Multiplex networks: ordered layers over a shared node universe.
//!
//! Besides holding the layers, a [`Multiplex`] computes the usual structural
//! indicators for comparing layers pairwise (node/edge overlap, degree ratio,
//! degree correlation, partition similarity) and can re-aggregate itself.
//! None of these are cached: each call recomputes from the immutable layers.

use super::{endpoints, Aggregate, DegreeSequence, Edge, Layer, NodeId, Observations};
use crate::community::CommunityDetection;
use crate::error::{Error, Result};
use crate::metrics;
use crate::validate::validate_observations;
use std::collections::{BTreeMap, BTreeSet};

/// How layers are combined into an aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    /// Edges present in any layer.
    Or,
    /// Edges present in every layer.
    And,
    /// Edges present in some but not all layers.
    Xor,
}

/// Correlation measure for degree sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Correlation {
    /// Linear correlation of degrees.
    #[default]
    Pearson,
    /// Rank correlation of degrees.
    Spearman,
}

/// Per-layer structural summary.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSummary {
    /// Layer index.
    pub layer: usize,
    /// Nodes with at least one edge.
    pub active_nodes: usize,
    /// Number of edges.
    pub edges: usize,
    /// Connected components among active nodes.
    pub components: usize,
    /// Modularity of the detected partition; `None` for edgeless layers.
    pub modularity: Option<f64>,
}

/// An ordered collection of layers indexed `0..L`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Multiplex {
    layers: Vec<Layer>,
    universe: BTreeSet<NodeId>,
}

impl Multiplex {
    /// Build from fully known per-layer edge sets.
    ///
    /// The node universe is the union of all layers' endpoints.
    pub fn from_layers<L, I>(layers: L) -> Result<Self>
    where
        L: IntoIterator<Item = I>,
        I: IntoIterator<Item = Edge>,
    {
        let edge_sets: Vec<BTreeSet<Edge>> = layers
            .into_iter()
            .map(|l| l.into_iter().collect())
            .collect();
        let universe = endpoints(edge_sets.iter().flatten());
        Self::from_edge_sets(edge_sets, universe)
    }

    /// Build from known subsets of each layer over the aggregate's universe.
    ///
    /// Layers without observations are empty. Every observed edge must be in
    /// the aggregate and in at most one layer.
    pub fn from_observations(
        aggregate: &Aggregate,
        observations: &Observations,
        layer_count: usize,
    ) -> Result<Self> {
        validate_observations(aggregate, observations, layer_count).into_result()?;
        let edge_sets = (0..layer_count)
            .map(|l| observations.get(&l).cloned().unwrap_or_default())
            .collect();
        Self::from_edge_sets(edge_sets, aggregate.nodes().clone())
    }

    /// Merge a reconstruction mapping with the observations it extended.
    pub fn from_mapping(
        aggregate: &Aggregate,
        mapping: &BTreeMap<Edge, usize>,
        observations: Option<&Observations>,
        layer_count: usize,
    ) -> Result<Self> {
        let mut edge_sets = vec![BTreeSet::new(); layer_count];
        let known = observations.into_iter().flat_map(|o| {
            o.iter()
                .flat_map(|(&l, edges)| edges.iter().map(move |e| (e, l)))
        });
        for (edge, layer) in known.chain(mapping.iter().map(|(e, &l)| (e, l))) {
            if !aggregate.contains(edge) {
                return Err(Error::layer_topology(*edge, layer, "edge not in aggregate"));
            }
            match edge_sets.get_mut(layer) {
                Some(set) => {
                    let _ = set.insert(*edge);
                }
                None => {
                    return Err(Error::InvalidParameter {
                        name: "layer_count",
                        message: "layer index exceeds layer count",
                    })
                }
            }
        }
        Self::from_edge_sets(edge_sets, aggregate.nodes().clone())
    }

    fn from_edge_sets(edge_sets: Vec<BTreeSet<Edge>>, universe: BTreeSet<NodeId>) -> Result<Self> {
        let layers = edge_sets
            .into_iter()
            .map(|edges| Layer::build(edges, &universe))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { layers, universe })
    }

    /// Number of layers.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// All layers in index order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Layer `idx`, if present.
    pub fn layer(&self, idx: usize) -> Option<&Layer> {
        self.layers.get(idx)
    }

    /// Shared node universe.
    pub fn universe(&self) -> &BTreeSet<NodeId> {
        &self.universe
    }

    /// Number of nodes active in at least one layer.
    pub fn total_nodes(&self) -> usize {
        endpoints(self.layers.iter().flat_map(|l| l.edges())).len()
    }

    /// Number of distinct edges across layers.
    pub fn total_edges(&self) -> usize {
        self.aggregate(Aggregation::Or).edge_count()
    }

    /// Indices of the layers containing `edge`.
    pub fn edge_layers(&self, edge: &Edge) -> Vec<usize> {
        self.layers
            .iter()
            .enumerate()
            .filter(|(_, l)| l.contains(edge))
            .map(|(i, _)| i)
            .collect()
    }

    /// Per-layer degree sequences over the shared universe.
    pub fn degree_sequences(&self, zero_fill: bool) -> Vec<DegreeSequence> {
        self.layers
            .iter()
            .map(|l| l.degree_sequence(&self.universe, zero_fill))
            .collect()
    }

    /// Combine the layers into a single graph.
    pub fn aggregate(&self, mechanism: Aggregation) -> Aggregate {
        let mut counts: BTreeMap<Edge, usize> = BTreeMap::new();
        for layer in &self.layers {
            for e in layer.edges() {
                *counts.entry(*e).or_insert(0) += 1;
            }
        }
        let l = self.layers.len();
        Aggregate::from_edges(
            counts
                .into_iter()
                .filter(|&(_, c)| match mechanism {
                    Aggregation::Or => true,
                    Aggregation::And => c == l,
                    Aggregation::Xor => c < l,
                })
                .map(|(e, _)| e),
        )
    }

    /// Unordered layer pairs `(i, j)` with `i < j`.
    pub fn layer_pairs(&self) -> Vec<(usize, usize)> {
        let l = self.layers.len();
        (0..l)
            .flat_map(|i| (i + 1..l).map(move |j| (i, j)))
            .collect()
    }

    fn pairwise<T>(&self, f: impl Fn(&Layer, &Layer) -> T) -> BTreeMap<(usize, usize), T> {
        self.layer_pairs()
            .into_iter()
            .map(|(i, j)| ((i, j), f(&self.layers[i], &self.layers[j])))
            .collect()
    }

    /// Jaccard overlap of active node sets per layer pair.
    pub fn node_overlap(&self) -> BTreeMap<(usize, usize), f64> {
        self.pairwise(|a, b| metrics::jaccard(&a.active_nodes(), &b.active_nodes()))
    }

    /// Jaccard overlap of edge sets per layer pair.
    pub fn edge_overlap(&self) -> BTreeMap<(usize, usize), f64> {
        self.pairwise(|a, b| metrics::jaccard(a.edges(), b.edges()))
    }

    /// Ratio of smaller to larger mean active-node degree per layer pair.
    ///
    /// 0 when either layer has no edges.
    pub fn average_degree_ratios(&self) -> BTreeMap<(usize, usize), f64> {
        let mean = |l: &Layer| {
            let active = l.active_nodes().len();
            if active == 0 {
                0.0
            } else {
                2.0 * l.edge_count() as f64 / active as f64
            }
        };
        self.pairwise(|a, b| {
            let (x, y) = (mean(a), mean(b));
            if x == 0.0 || y == 0.0 {
                0.0
            } else {
                x.min(y) / x.max(y)
            }
        })
    }

    /// Correlation of zero-filled degree sequences per layer pair.
    ///
    /// `None` for a pair where either sequence is constant.
    pub fn degree_correlations(&self, measure: Correlation) -> BTreeMap<(usize, usize), Option<f64>> {
        let seqs: Vec<Vec<f64>> = self
            .layers
            .iter()
            .map(|l| self.universe.iter().map(|&n| l.degree(n) as f64).collect())
            .collect();
        self.layer_pairs()
            .into_iter()
            .map(|(i, j)| {
                let r = match measure {
                    Correlation::Pearson => metrics::pearson(&seqs[i], &seqs[j]),
                    Correlation::Spearman => metrics::spearman(&seqs[i], &seqs[j]),
                };
                ((i, j), r)
            })
            .collect()
    }

    /// Modularity of each layer's detected partition.
    pub fn modularities<D: CommunityDetection>(&self, detector: &D) -> Result<Vec<Option<f64>>> {
        self.layers
            .iter()
            .map(|l| l.community_structure(detector).map(|s| s.modularity))
            .collect()
    }

    /// NMI between the partitions of each layer pair.
    ///
    /// Both layers are rebuilt over the nodes active in either of them
    /// before detection, so the two partitions cover the same nodes.
    pub fn nmis<D: CommunityDetection>(&self, detector: &D) -> Result<BTreeMap<(usize, usize), f64>> {
        let mut out = BTreeMap::new();
        for (i, j) in self.layer_pairs() {
            let (a, b) = (&self.layers[i], &self.layers[j]);
            let shared: BTreeSet<NodeId> = a.active_nodes().union(&b.active_nodes()).copied().collect();
            let pa = Layer::build(a.edges().iter().copied(), &shared)?.community_partition(detector)?;
            let pb = Layer::build(b.edges().iter().copied(), &shared)?.community_partition(detector)?;

            let la: Vec<usize> = pa.iter().map(|(_, c)| c).collect();
            let lb: Vec<usize> = pb.iter().map(|(_, c)| c).collect();
            let _ = out.insert((i, j), metrics::nmi(&la, &lb));
        }
        Ok(out)
    }

    /// Counts and modularity for every layer.
    pub fn layer_summaries<D: CommunityDetection>(&self, detector: &D) -> Result<Vec<LayerSummary>> {
        self.layers
            .iter()
            .enumerate()
            .map(|(idx, l)| -> Result<LayerSummary> {
                Ok(LayerSummary {
                    layer: idx,
                    active_nodes: l.active_nodes().len(),
                    edges: l.edge_count(),
                    components: l.component_count(),
                    modularity: l.community_structure(detector)?.modularity,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::community::Louvain;

    fn e(a: NodeId, b: NodeId) -> Edge {
        Edge::new(a, b).unwrap()
    }

    fn sample() -> Multiplex {
        Multiplex::from_layers(vec![
            vec![e(1, 2), e(2, 3), e(1, 3)],
            vec![e(1, 2), e(3, 4)],
        ])
        .unwrap()
    }

    #[test]
    fn test_from_layers_shares_universe() {
        let m = sample();
        assert_eq!(m.layer_count(), 2);
        assert_eq!(m.universe().len(), 4);
        assert_eq!(m.layer(0).unwrap().node_count(), 4);
        assert_eq!(m.layer(0).unwrap().degree(4), 0);
        assert_eq!(m.total_nodes(), 4);
        assert_eq!(m.total_edges(), 4);
    }

    #[test]
    fn test_aggregation_mechanisms() {
        let m = sample();
        assert_eq!(m.aggregate(Aggregation::Or).edge_count(), 4);
        let and = m.aggregate(Aggregation::And);
        assert_eq!(and.edges().iter().copied().collect::<Vec<_>>(), vec![e(1, 2)]);
        let xor = m.aggregate(Aggregation::Xor);
        assert_eq!(xor.edge_count(), 3);
        assert!(!xor.contains(&e(1, 2)));
    }

    #[test]
    fn test_edge_layers() {
        let m = sample();
        assert_eq!(m.edge_layers(&e(2, 1)), vec![0, 1]);
        assert_eq!(m.edge_layers(&e(3, 4)), vec![1]);
        assert!(m.edge_layers(&e(1, 4)).is_empty());
    }

    #[test]
    fn test_overlaps_and_ratios() {
        let m = sample();
        // Active nodes {1,2,3} vs {1,2,3,4}.
        assert!((m.node_overlap()[&(0, 1)] - 0.75).abs() < 1e-12);
        // Edges share only (1,2) out of 4 distinct.
        assert!((m.edge_overlap()[&(0, 1)] - 0.25).abs() < 1e-12);
        // Mean degrees 2.0 and 1.0.
        assert!((m.average_degree_ratios()[&(0, 1)] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_degree_correlations() {
        let m = sample();
        // Degrees over {1,2,3,4}: [2,2,2,0] vs [1,1,1,1] -> second is constant.
        let r = m.degree_correlations(Correlation::Pearson);
        assert!(r[&(0, 1)].is_none());

        // [2,1,1,0] vs [2,2,3,1]
        let m = Multiplex::from_layers(vec![
            vec![e(1, 2), e(1, 3)],
            vec![e(1, 2), e(1, 3), e(2, 3), e(3, 4)],
        ])
        .unwrap();
        let r = m.degree_correlations(Correlation::Spearman)[&(0, 1)].unwrap();
        assert!(r > 0.0);
    }

    #[test]
    fn test_from_observations_rejects_foreign_edge() {
        let agg = Aggregate::from_pairs([(1, 2), (2, 3)]).unwrap();
        let obs: Observations = [(0, [e(1, 3)].into_iter().collect())].into_iter().collect();
        let err = Multiplex::from_observations(&agg, &obs, 2).unwrap_err();
        assert!(matches!(err, Error::InvalidTopology { layer: Some(0), .. }));
    }

    #[test]
    fn test_from_observations_rejects_ambiguous_edge() {
        let agg = Aggregate::from_pairs([(1, 2), (2, 3)]).unwrap();
        let obs: Observations = [
            (0, [e(1, 2)].into_iter().collect()),
            (1, [e(2, 1)].into_iter().collect()),
        ]
        .into_iter()
        .collect();
        let err = Multiplex::from_observations(&agg, &obs, 2).unwrap_err();
        assert_eq!(
            err,
            Error::AmbiguousObservation {
                edge: e(1, 2),
                first: 0,
                second: 1
            }
        );
    }

    #[test]
    fn test_from_mapping_merges_observations() {
        let agg = Aggregate::from_pairs([(1, 2), (2, 3), (3, 4)]).unwrap();
        let obs: Observations = [(1, [e(3, 4)].into_iter().collect())].into_iter().collect();
        let mapping: BTreeMap<Edge, usize> = [(e(1, 2), 0), (e(2, 3), 1)].into_iter().collect();

        let m = Multiplex::from_mapping(&agg, &mapping, Some(&obs), 2).unwrap();
        assert_eq!(m.layer(0).unwrap().edge_count(), 1);
        assert_eq!(m.layer(1).unwrap().edge_count(), 2);
        assert_eq!(m.edge_layers(&e(3, 4)), vec![1]);
    }

    #[test]
    fn test_layer_summaries_and_nmis() {
        let m = Multiplex::from_layers(vec![
            vec![e(0, 1), e(1, 2), e(0, 2), e(3, 4), e(4, 5), e(3, 5), e(2, 3)],
            vec![e(0, 1), e(1, 2), e(0, 2), e(3, 4), e(4, 5), e(3, 5), e(2, 3)],
            vec![],
        ])
        .unwrap();
        let detector = Louvain::new();

        let summaries = m.layer_summaries(&detector).unwrap();
        assert_eq!(summaries[0].components, 1);
        assert_eq!(summaries[0].active_nodes, 6);
        assert!(summaries[0].modularity.unwrap() > 0.3);
        assert!(summaries[2].modularity.is_none());

        let nmis = m.nmis(&detector).unwrap();
        assert!((nmis[&(0, 1)] - 1.0).abs() < 1e-9);
        assert_eq!(nmis.len(), 3);
    }
}
