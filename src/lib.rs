//! # demux
//!
//! Multiplex network reconstruction: given only the aggregate of a
//! multiplex (the union of its layers' edges) and some side information,
//! assign every aggregate edge to the layer it most likely came from.
//!
//! Side information is either a subset of edges with known layers, or one
//! degree sequence per layer. Each unknown edge is scored per layer with a
//! configuration-model likelihood (product of endpoint degrees), optionally
//! reweighted by detected community structure, and given to the arg-max layer.
//!
//! The pipeline, leaf first:
//!
//! - [`graph`]: edges, layers, degree sequences, partitions, multiplexes
//! - [`remnant`]: per-layer "not yet attributable elsewhere" graphs
//! - [`estimate`]: remnant communities and the community strength mu
//! - [`likelihood`]: per-edge likelihood vectors and hard classification
//! - [`reconstruct`]: the driver tying these together

pub mod community;
/// Error types used across `demux`.
pub mod error;
pub mod estimate;
pub mod graph;
pub mod io;
pub mod likelihood;
pub mod metrics;
pub mod reconstruct;
pub mod remnant;
pub mod validate;

pub use community::{CommunityDetection, Louvain};
pub use error::{Error, Result};
pub use estimate::{estimate_mu, MuEstimate, DISABLED_MU, NEUTRAL_MU};
pub use graph::{
    Aggregate, Aggregation, CommunityStructure, Correlation, DegreeSequence, Edge, Layer,
    LayerSummary, Multiplex, NodeId, Observations, Partition,
};
pub use likelihood::{classify, classify_edges, edge_likelihoods, Classification, Evidence};
pub use metrics::{jaccard, nmi, pearson, spearman};
pub use reconstruct::{reconstruct, Reconstruction, ReconstructionConfig, SideInformation};
pub use remnant::{build_remnants, Remnants};
pub use validate::{validate_degree_sequences, validate_observations, ValidationReport};
