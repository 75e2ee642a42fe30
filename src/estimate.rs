//! Community-strength (mu) estimation.
//!
//! Communities are detected on every remnant, then each remnant edge is
//! counted as *in-group* (both endpoints share a community) or *out-group*.
//! Counts are pooled over all layers:
//!
//! ```text
//! mu = Σ_layers in_group / Σ_layers edges
//! ```
//!
//! mu is one global number, not one per layer.
//!
//! When no remnant has an edge there is nothing to measure: mu falls back to
//! [`NEUTRAL_MU`] and no partitions are reported. This is distinct from
//! running without community detection at all, which uses [`DISABLED_MU`].

use crate::community::CommunityDetection;
use crate::error::Result;
use crate::graph::{Layer, Partition};

/// mu when community detection ran but had no edges to measure.
pub const NEUTRAL_MU: f64 = 0.5;

/// mu when community detection is turned off.
pub const DISABLED_MU: f64 = 1.0;

/// Outcome of a mu estimation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct MuEstimate {
    /// Estimated community strength in [0, 1].
    pub mu: f64,
    /// One partition per layer, absent when no topology was available.
    pub partitions: Option<Vec<Partition>>,
    /// Remnant edges whose endpoints share a community.
    pub in_group: usize,
    /// Remnant edges counted.
    pub total: usize,
}

impl MuEstimate {
    /// The "detection disabled" estimate: mu = 1, no partitions.
    pub fn disabled() -> Self {
        Self {
            mu: DISABLED_MU,
            partitions: None,
            in_group: 0,
            total: 0,
        }
    }

    /// The "no information" estimate: mu = 0.5, no partitions.
    pub fn neutral() -> Self {
        Self {
            mu: NEUTRAL_MU,
            partitions: None,
            in_group: 0,
            total: 0,
        }
    }
}

/// Detect communities on every remnant and estimate mu.
///
/// Edgeless remnants get singleton partitions and contribute nothing to
/// either count.
pub fn estimate_mu<D: CommunityDetection>(remnants: &[Layer], detector: &D) -> Result<MuEstimate> {
    let mut partitions = Vec::with_capacity(remnants.len());
    let (mut in_group, mut total) = (0usize, 0usize);

    for (idx, layer) in remnants.iter().enumerate() {
        if layer.edge_count() == 0 {
            partitions.push(Partition::singletons(layer.nodes()));
            continue;
        }
        let partition = layer.community_partition(detector)?;
        let inside = layer
            .edges()
            .iter()
            .filter(|e| partition.same_community(e) == Some(true))
            .count();
        tracing::debug!(
            layer = idx,
            communities = partition.community_count(),
            in_group = inside,
            edges = layer.edge_count(),
            "remnant partition"
        );
        in_group += inside;
        total += layer.edge_count();
        partitions.push(partition);
    }

    if total == 0 {
        tracing::warn!("no remnant edges to estimate community strength; using neutral mu");
        return Ok(MuEstimate::neutral());
    }

    let mu = in_group as f64 / total as f64;
    tracing::debug!(mu, in_group, total, "estimated community strength");
    Ok(MuEstimate {
        mu,
        partitions: Some(partitions),
        in_group,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::community::Louvain;
    use crate::graph::{Edge, NodeId};
    use std::collections::BTreeSet;

    fn e(a: NodeId, b: NodeId) -> Edge {
        Edge::new(a, b).unwrap()
    }

    fn universe() -> BTreeSet<NodeId> {
        (0..6).collect()
    }

    fn bridged_triangles() -> Layer {
        Layer::build(
            [e(0, 1), e(1, 2), e(0, 2), e(3, 4), e(4, 5), e(3, 5), e(2, 3)],
            &universe(),
        )
        .unwrap()
    }

    #[test]
    fn test_mu_counts_in_group_edges() {
        let est = estimate_mu(&[bridged_triangles()], &Louvain::new()).unwrap();
        assert_eq!(est.total, 7);
        assert_eq!(est.in_group, 6);
        assert!((est.mu - 6.0 / 7.0).abs() < 1e-12);
        assert_eq!(est.partitions.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn test_mu_pools_across_layers_and_skips_empty() {
        let empty = Layer::build([], &universe()).unwrap();
        let est = estimate_mu(&[bridged_triangles(), empty], &Louvain::new()).unwrap();
        assert_eq!(est.total, 7);
        let partitions = est.partitions.unwrap();
        assert_eq!(partitions.len(), 2);
        assert_eq!(partitions[1].community_count(), 6);
    }

    #[test]
    fn test_mu_neutral_without_edges() {
        let empty = Layer::build([], &universe()).unwrap();
        let est = estimate_mu(&[empty.clone(), empty], &Louvain::new()).unwrap();
        assert_eq!(est.mu, NEUTRAL_MU);
        assert!(est.partitions.is_none());
        assert_eq!(est, MuEstimate::neutral());

        let est = estimate_mu(&[], &Louvain::new()).unwrap();
        assert_eq!(est.mu, NEUTRAL_MU);
    }

    #[test]
    fn test_disabled_and_neutral_are_distinct() {
        assert_eq!(MuEstimate::disabled().mu, 1.0);
        assert_ne!(MuEstimate::disabled(), MuEstimate::neutral());
    }
}
