use crate::graph::{Edge, NodeId};
use thiserror::Error;

/// Result alias for `demux`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by reconstruction and multiplex primitives.
///
/// Structural problems with the input abort a run before any likelihood is
/// computed. Numeric degeneracies (empty remnants, zero degree products) are
/// absorbed with neutral defaults and never show up here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// An edge references a node outside the declared universe, is a
    /// self-loop, or is not a member of the aggregate.
    #[error("invalid topology at edge {edge}{}: {reason}", layer_suffix(.layer))]
    InvalidTopology {
        /// Offending edge.
        edge: Edge,
        /// Layer the edge was supplied for, if any.
        layer: Option<usize>,
        /// What was violated.
        reason: &'static str,
    },

    /// A node is missing from a supplied degree sequence.
    #[error("degree sequence for layer {layer} does not cover node {node}")]
    UncoveredNode {
        /// Layer whose sequence is short.
        layer: usize,
        /// Aggregate node with no entry.
        node: NodeId,
    },

    /// The same edge was observed in more than one layer.
    #[error("edge {edge} observed in layers {first} and {second}")]
    AmbiguousObservation {
        /// Offending edge.
        edge: Edge,
        /// First layer claiming the edge.
        first: usize,
        /// Second layer claiming the edge.
        second: usize,
    },

    /// Side information is missing, conflicting, or inconsistent with the mode.
    #[error("unsupported mode: {0}")]
    UnsupportedMode(&'static str),

    /// Input was empty.
    #[error("empty input provided")]
    EmptyInput,

    /// Invalid parameter value.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// A line of an edgelist or degree-sequence file could not be parsed.
    #[error("parse error on line {line}: {message}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },
}

fn layer_suffix(layer: &Option<usize>) -> String {
    match layer {
        Some(l) => format!(" (layer {l})"),
        None => String::new(),
    }
}

impl Error {
    /// Shorthand for an [`Error::InvalidTopology`] outside any layer.
    pub(crate) fn topology(edge: Edge, reason: &'static str) -> Self {
        Error::InvalidTopology {
            edge,
            layer: None,
            reason,
        }
    }

    /// Shorthand for an [`Error::InvalidTopology`] tied to a layer.
    pub(crate) fn layer_topology(edge: Edge, layer: usize, reason: &'static str) -> Self {
        Error::InvalidTopology {
            edge,
            layer: Some(layer),
            reason,
        }
    }
}
