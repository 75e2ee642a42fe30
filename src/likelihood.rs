//! Configuration-model edge likelihoods and hard classification.
//!
//! For an edge `(u, v)` and layer `l`:
//!
//! ```text
//! weight(l)     = mu       if u and v share a community in l
//!               = 1 - mu   otherwise
//!               = 1        if no partitions are available
//! numerator(l)  = weight(l) * k_l(u) * k_l(v)
//! likelihood(l) = numerator(l) / Σ_l' numerator(l')
//! ```
//!
//! When every numerator is zero the vector is all zeros (no error) and the
//! edge is resolved by the uniform tie-break.
//!
//! [`Evidence`] is everything the engine reads. It does not record whether it
//! came from observations or from supplied degree sequences.

use crate::error::{Error, Result};
use crate::graph::{DegreeSequence, Edge, Partition};
use rand::Rng;
use std::collections::BTreeMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Read-only per-layer inputs to the likelihood.
#[derive(Debug, Clone, PartialEq)]
pub struct Evidence {
    degrees: Vec<DegreeSequence>,
    partitions: Option<Vec<Partition>>,
    mu: f64,
}

impl Evidence {
    /// Bundle degree sequences, optional partitions and mu.
    ///
    /// Requires at least one layer, one partition per layer when partitions
    /// are given, and `mu` in [0, 1].
    pub fn new(
        degrees: Vec<DegreeSequence>,
        partitions: Option<Vec<Partition>>,
        mu: f64,
    ) -> Result<Self> {
        if degrees.is_empty() {
            return Err(Error::EmptyInput);
        }
        if let Some(p) = &partitions {
            if p.len() != degrees.len() {
                return Err(Error::InvalidParameter {
                    name: "partitions",
                    message: "need exactly one partition per layer",
                });
            }
        }
        if !(0.0..=1.0).contains(&mu) {
            return Err(Error::InvalidParameter {
                name: "mu",
                message: "must lie in [0, 1]",
            });
        }
        Ok(Self {
            degrees,
            partitions,
            mu,
        })
    }

    /// Number of layers.
    pub fn layer_count(&self) -> usize {
        self.degrees.len()
    }

    /// Community strength in use.
    pub fn mu(&self) -> f64 {
        self.mu
    }

    /// Per-layer degree sequences.
    pub fn degrees(&self) -> &[DegreeSequence] {
        &self.degrees
    }

    /// Per-layer partitions, if any.
    pub fn partitions(&self) -> Option<&[Partition]> {
        self.partitions.as_deref()
    }

    /// Community weight of `edge` in every layer.
    ///
    /// Falls back to all ones if any partition is missing an endpoint.
    fn weights(&self, edge: &Edge) -> Vec<f64> {
        let ones = || vec![1.0; self.degrees.len()];
        let Some(partitions) = &self.partitions else {
            return ones();
        };
        partitions
            .iter()
            .map(|p| {
                p.same_community(edge)
                    .map(|same| if same { self.mu } else { 1.0 - self.mu })
            })
            .collect::<Option<Vec<f64>>>()
            .unwrap_or_else(ones)
    }
}

/// Likelihood of `edge` belonging to each layer.
///
/// Sums to 1 unless every layer has a zero numerator, in which case every
/// entry is 0.
pub fn edge_likelihoods(edge: &Edge, evidence: &Evidence) -> Vec<f64> {
    let (u, v) = edge.endpoints();
    let numerators: Vec<f64> = evidence
        .weights(edge)
        .into_iter()
        .zip(&evidence.degrees)
        .map(|(w, deg)| w * deg.get(u) as f64 * deg.get(v) as f64)
        .collect();

    let total: f64 = numerators.iter().sum();
    if total == 0.0 {
        return vec![0.0; numerators.len()];
    }
    numerators.into_iter().map(|n| n / total).collect()
}

/// Pick the most likely layer, breaking exact ties uniformly at random.
///
/// Returns `None` only for an empty vector.
pub fn classify<R: Rng + ?Sized>(likelihoods: &[f64], rng: &mut R) -> Option<usize> {
    let max = likelihoods.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let tied: Vec<usize> = likelihoods
        .iter()
        .enumerate()
        .filter(|&(_, &p)| p == max)
        .map(|(i, _)| i)
        .collect();
    match tied.len() {
        0 => None,
        1 => Some(tied[0]),
        n => Some(tied[rng.random_range(0..n)]),
    }
}

/// Hard layer assignment for a batch of edges.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    /// Chosen layer per edge.
    pub mapping: BTreeMap<Edge, usize>,
    /// Likelihood vector per edge, when requested.
    pub likelihoods: Option<BTreeMap<Edge, Vec<f64>>>,
    /// Edges whose maximum was shared by more than one layer.
    pub ties: usize,
    /// Edges with zero degree product in every layer.
    pub degenerate: usize,
}

/// Classify every edge in `edges` (taken in ascending order).
///
/// Likelihoods are pure per-edge computations; with the `parallel` feature
/// they are computed on the rayon pool. Tie-breaks always consume `rng`
/// sequentially in edge order, so a fixed seed gives the same result either way.
pub fn classify_edges<R: Rng + ?Sized>(
    edges: &[Edge],
    evidence: &Evidence,
    rng: &mut R,
    keep_likelihoods: bool,
) -> Classification {
    let mut edges = edges.to_vec();
    edges.sort_unstable();
    edges.dedup();

    #[cfg(feature = "parallel")]
    let vectors: Vec<Vec<f64>> = edges
        .par_iter()
        .map(|e| edge_likelihoods(e, evidence))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let vectors: Vec<Vec<f64>> = edges.iter().map(|e| edge_likelihoods(e, evidence)).collect();

    let mut out = Classification {
        likelihoods: keep_likelihoods.then(BTreeMap::new),
        ..Classification::default()
    };
    for (edge, vector) in edges.into_iter().zip(vectors) {
        let max = vector.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if max == 0.0 {
            out.degenerate += 1;
        }
        if vector.iter().filter(|&&p| p == max).count() > 1 {
            out.ties += 1;
        }
        // Evidence always has at least one layer.
        let layer = classify(&vector, rng).unwrap_or(0);
        let _ = out.mapping.insert(edge, layer);
        if let Some(store) = out.likelihoods.as_mut() {
            let _ = store.insert(edge, vector);
        }
    }

    if out.degenerate > 0 {
        tracing::warn!(
            edges = out.degenerate,
            "edges with zero degree product in every layer resolved by tie-break"
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeId;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn e(a: NodeId, b: NodeId) -> Edge {
        Edge::new(a, b).unwrap()
    }

    fn degrees(pairs: &[(NodeId, usize)]) -> DegreeSequence {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_degree_product_likelihood() {
        let ev = Evidence::new(
            vec![degrees(&[(1, 2), (2, 3)]), degrees(&[(1, 1), (2, 2)])],
            None,
            1.0,
        )
        .unwrap();
        let p = edge_likelihoods(&e(1, 2), &ev);
        // 6 vs 2
        assert!((p[0] - 0.75).abs() < 1e-12);
        assert!((p[1] - 0.25).abs() < 1e-12);

        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(classify(&p, &mut rng), Some(0));
    }

    #[test]
    fn test_community_weights() {
        let same: Partition = [(1, 0), (2, 0)].into_iter().collect();
        let split: Partition = [(1, 0), (2, 1)].into_iter().collect();
        let deg = degrees(&[(1, 1), (2, 1)]);
        let ev = Evidence::new(vec![deg.clone(), deg], Some(vec![same, split]), 0.8).unwrap();

        let p = edge_likelihoods(&e(1, 2), &ev);
        assert!((p[0] - 0.8).abs() < 1e-12);
        assert!((p[1] - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_missing_partition_node_falls_back_to_unit_weights() {
        let partial: Partition = [(1, 0)].into_iter().collect();
        let deg = degrees(&[(1, 1), (2, 1)]);
        let ev = Evidence::new(
            vec![deg.clone(), deg],
            Some(vec![partial.clone(), partial]),
            0.9,
        )
        .unwrap();
        assert_eq!(edge_likelihoods(&e(1, 2), &ev), vec![0.5, 0.5]);
    }

    #[test]
    fn test_zero_degrees_are_degenerate_not_errors() {
        let ev = Evidence::new(vec![degrees(&[]), degrees(&[(5, 3)])], None, 1.0).unwrap();
        let p = edge_likelihoods(&e(1, 2), &ev);
        assert_eq!(p, vec![0.0, 0.0]);

        let mut rng = StdRng::seed_from_u64(3);
        let c = classify_edges(&[e(1, 2)], &ev, &mut rng, true);
        assert_eq!(c.degenerate, 1);
        assert_eq!(c.ties, 1);
        assert!(c.mapping[&e(1, 2)] < 2);
        assert_eq!(c.likelihoods.unwrap()[&e(1, 2)], vec![0.0, 0.0]);
    }

    #[test]
    fn test_evidence_validation() {
        assert_eq!(Evidence::new(vec![], None, 0.5), Err(Error::EmptyInput));
        assert!(Evidence::new(vec![degrees(&[])], None, 1.5).is_err());
        assert!(Evidence::new(vec![degrees(&[])], Some(vec![]), 0.5).is_err());
    }

    #[test]
    fn test_classify_empty() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(classify(&[], &mut rng), None);
    }

    #[test]
    fn test_tie_break_is_roughly_uniform() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut counts = [0usize; 3];
        for _ in 0..3000 {
            counts[classify(&[0.4, 0.2, 0.4], &mut rng).unwrap()] += 1;
        }
        assert_eq!(counts[1], 0);
        assert!(counts[0] > 1300 && counts[2] > 1300, "{counts:?}");
    }

    #[test]
    fn test_classify_edges_is_seed_reproducible() {
        let deg = degrees(&[(1, 1), (2, 1), (3, 1), (4, 1)]);
        let ev = Evidence::new(vec![deg.clone(), deg], None, 1.0).unwrap();
        let edges: Vec<Edge> = vec![e(1, 2), e(3, 4), e(2, 3), e(1, 4)];

        let a = classify_edges(&edges, &ev, &mut StdRng::seed_from_u64(9), false);
        let b = classify_edges(&edges, &ev, &mut StdRng::seed_from_u64(9), false);
        assert_eq!(a.mapping, b.mapping);
        assert_eq!(a.ties, 4);
        assert!(a.likelihoods.is_none());
    }

    proptest! {
        #[test]
        fn likelihoods_normalize_and_ignore_orientation(
            layers in proptest::collection::vec(
                proptest::collection::vec(0usize..6, 4),
                1..5,
            ),
            u in 0u64..4,
            v in 0u64..4,
            mu in 0.0f64..=1.0,
        ) {
            prop_assume!(u != v);
            let degrees: Vec<DegreeSequence> =
                layers.iter().map(|d| DegreeSequence::from_dense(d)).collect();
            let partitions: Vec<Partition> = (0..degrees.len())
                .map(|l| (0..4u64).map(|n| (n, (n as usize + l) % 2)).collect())
                .collect();
            let ev = Evidence::new(degrees, Some(partitions), mu).unwrap();

            let forward = edge_likelihoods(&Edge::new(u, v).unwrap(), &ev);
            let backward = edge_likelihoods(&Edge::new(v, u).unwrap(), &ev);
            prop_assert_eq!(&forward, &backward);

            let sum: f64 = forward.iter().sum();
            prop_assert!(forward.iter().all(|&p| (0.0..=1.0).contains(&p)));
            prop_assert!(sum == 0.0 || (sum - 1.0).abs() < 1e-9);
        }
    }
}
