//! Reconstruction driver.
//!
//! Turns an aggregate graph plus side information into a complete
//! [`Multiplex`]:
//!
//! 1. Validate the side information (fail fast, nothing is classified on
//!    bad input).
//! 2. Derive per-layer evidence:
//!    - **observations**: remnant degree sequences, plus remnant communities
//!      and mu when community detection is on;
//!    - **degree sequences**: the supplied sequences, no partitions.
//! 3. Classify every aggregate edge not already observed.
//! 4. Merge the classification with the observations.
//!
//! Randomness is confined to tie-breaking and comes from one generator
//! seeded by [`ReconstructionConfig::with_seed`].
//!
//! ```rust
//! use demux::graph::{Aggregate, Edge, Observations};
//! use demux::reconstruct::{reconstruct, ReconstructionConfig, SideInformation};
//!
//! let agg = Aggregate::from_pairs([(1, 2), (2, 3), (3, 4), (1, 4)]).unwrap();
//! let mut obs = Observations::new();
//! obs.entry(0).or_default().insert(Edge::new(1, 2).unwrap());
//! obs.entry(1).or_default().insert(Edge::new(3, 4).unwrap());
//!
//! let config = ReconstructionConfig::new().with_seed(7);
//! let result = reconstruct(&agg, &SideInformation::Observations(obs), &config).unwrap();
//! assert_eq!(result.multiplex.total_edges(), 4);
//! assert_eq!(result.mu, 1.0);
//! ```

use crate::community::Louvain;
use crate::error::{Error, Result};
use crate::estimate::{estimate_mu, MuEstimate};
use crate::graph::{Aggregate, DegreeSequence, Edge, Multiplex, Observations};
use crate::likelihood::{classify_edges, Evidence};
use crate::remnant::build_remnants;
use crate::validate::{validate_degree_sequences, validate_observations};
use rand::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

/// Smallest layer count inferred from observations.
const MIN_OBSERVED_LAYERS: usize = 2;

/// What is known besides the aggregate.
#[derive(Debug, Clone, PartialEq)]
pub enum SideInformation {
    /// Some edges with known layers.
    Observations(Observations),
    /// One zero-filled degree sequence per layer.
    DegreeSequences(Vec<DegreeSequence>),
}

impl SideInformation {
    /// Pick the mode from optional inputs; exactly one must be present.
    pub fn from_parts(
        observations: Option<Observations>,
        degree_sequences: Option<Vec<DegreeSequence>>,
    ) -> Result<Self> {
        match (observations, degree_sequences) {
            (Some(o), None) => Ok(Self::Observations(o)),
            (None, Some(d)) => Ok(Self::DegreeSequences(d)),
            (Some(_), Some(_)) => Err(Error::UnsupportedMode(
                "both observations and degree sequences supplied",
            )),
            (None, None) => Err(Error::UnsupportedMode(
                "neither observations nor degree sequences supplied",
            )),
        }
    }
}

/// Reconstruction settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconstructionConfig {
    /// Tie-break seed; `None` uses the thread-local generator.
    seed: Option<u64>,
    /// Weight likelihoods by remnant community structure.
    use_community_detection: bool,
    /// Keep per-edge likelihood vectors in the result.
    soft_output: bool,
    /// Layer count in observation mode.
    layer_count: Option<usize>,
    /// Detector used on remnants.
    louvain: Louvain,
}

impl ReconstructionConfig {
    /// Defaults: unseeded, no community detection, hard output only.
    pub fn new() -> Self {
        Self {
            seed: None,
            use_community_detection: false,
            soft_output: false,
            layer_count: None,
            louvain: Louvain::new(),
        }
    }

    /// Seed the tie-break generator.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Turn community weighting on or off.
    pub fn with_community_detection(mut self, enabled: bool) -> Self {
        self.use_community_detection = enabled;
        self
    }

    /// Keep likelihood vectors for soft classification.
    pub fn with_soft_output(mut self, enabled: bool) -> Self {
        self.soft_output = enabled;
        self
    }

    /// Fix the number of layers in observation mode.
    ///
    /// Without it the count is one past the highest observed layer, and at
    /// least 2. In degree-sequence mode it must equal the number of
    /// sequences.
    pub fn with_layer_count(mut self, layers: usize) -> Self {
        self.layer_count = Some(layers);
        self
    }

    /// Replace the remnant community detector.
    pub fn with_louvain(mut self, louvain: Louvain) -> Self {
        self.louvain = louvain;
        self
    }

    /// Whether community weighting is on.
    pub fn use_community_detection(&self) -> bool {
        self.use_community_detection
    }

    fn layer_count_for(&self, observations: &Observations) -> usize {
        self.layer_count.unwrap_or_else(|| {
            observations
                .keys()
                .next_back()
                .map_or(MIN_OBSERVED_LAYERS, |&max| (max + 1).max(MIN_OBSERVED_LAYERS))
        })
    }
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Output of a reconstruction run.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconstruction {
    /// Every aggregate edge in exactly one layer.
    pub multiplex: Multiplex,
    /// Layer chosen for each previously unclassified edge.
    pub mapping: BTreeMap<Edge, usize>,
    /// Likelihood vector per classified edge (soft output only).
    pub likelihoods: Option<BTreeMap<Edge, Vec<f64>>>,
    /// Community strength used for scoring.
    pub mu: f64,
    /// Classified edges decided by a random tie-break.
    pub ties: usize,
}

/// Reconstruct the multiplex behind `aggregate`.
pub fn reconstruct(
    aggregate: &Aggregate,
    side: &SideInformation,
    config: &ReconstructionConfig,
) -> Result<Reconstruction> {
    let mut rng: Box<dyn RngCore> = match config.seed {
        Some(s) => Box::new(StdRng::seed_from_u64(s)),
        None => Box::new(rand::rng()),
    };

    let (evidence, observations, layer_count) = match side {
        SideInformation::Observations(obs) => {
            let layer_count = config.layer_count_for(obs);
            validate_observations(aggregate, obs, layer_count).into_result()?;
            (observation_evidence(aggregate, obs, layer_count, config)?, Some(obs), layer_count)
        }
        SideInformation::DegreeSequences(seqs) => {
            if config.layer_count.is_some_and(|n| n != seqs.len()) {
                return Err(Error::UnsupportedMode(
                    "layer count disagrees with the number of degree sequences",
                ));
            }
            validate_degree_sequences(aggregate, seqs).into_result()?;
            (degree_evidence(seqs, config)?, None, seqs.len())
        }
    };

    let known: BTreeSet<Edge> = observations
        .into_iter()
        .flat_map(|o| o.values().flatten().copied())
        .collect();
    let unknown: Vec<Edge> = aggregate.edges().difference(&known).copied().collect();

    let classification = classify_edges(&unknown, &evidence, &mut rng, config.soft_output);
    let multiplex =
        Multiplex::from_mapping(aggregate, &classification.mapping, observations, layer_count)?;

    tracing::info!(
        layers = layer_count,
        observed = known.len(),
        classified = classification.mapping.len(),
        ties = classification.ties,
        mu = evidence.mu(),
        "reconstruction complete"
    );

    Ok(Reconstruction {
        multiplex,
        mapping: classification.mapping,
        likelihoods: classification.likelihoods,
        mu: evidence.mu(),
        ties: classification.ties,
    })
}

fn observation_evidence(
    aggregate: &Aggregate,
    observations: &Observations,
    layer_count: usize,
    config: &ReconstructionConfig,
) -> Result<Evidence> {
    let remnants = build_remnants(aggregate, observations, layer_count)?;
    let estimate = if config.use_community_detection {
        estimate_mu(remnants.layers(), &config.louvain)?
    } else {
        MuEstimate::disabled()
    };
    Evidence::new(remnants.degree_sequences(), estimate.partitions, estimate.mu)
}

fn degree_evidence(sequences: &[DegreeSequence], config: &ReconstructionConfig) -> Result<Evidence> {
    // No topology to detect communities on.
    let estimate = if config.use_community_detection {
        tracing::warn!("community detection requested without observations; using neutral mu");
        MuEstimate::neutral()
    } else {
        MuEstimate::disabled()
    };
    Evidence::new(sequences.to_vec(), estimate.partitions, estimate.mu)
}
