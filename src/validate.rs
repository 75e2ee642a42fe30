//! Side-information validation.
//!
//! [`validate_observations`] and [`validate_degree_sequences`] walk the whole
//! input and report every problem they find, not just the first one. Error-
//! level issues carry the typed [`Error`] a reconstruction run would fail
//! with; [`ValidationReport::into_result`] turns a report into that error.
//!
//! # Example
//!
//! ```rust
//! use demux::graph::{Aggregate, Edge, Observations};
//! use demux::validate::validate_observations;
//!
//! let agg = Aggregate::from_pairs([(1, 2), (2, 3)]).unwrap();
//! let mut obs = Observations::new();
//! obs.entry(0).or_default().insert(Edge::new(1, 3).unwrap());
//!
//! let report = validate_observations(&agg, &obs, 2);
//! assert!(!report.is_healthy());
//! for issue in &report.issues {
//!     eprintln!("{issue}");
//! }
//! ```

use crate::error::{Error, Result};
use crate::graph::{Aggregate, DegreeSequence, Edge, Observations};
use std::collections::{BTreeMap, HashMap};

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Informational, not a problem.
    Info,
    /// Something unusual but not necessarily wrong.
    Warning,
    /// The input cannot be reconstructed.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warning => write!(f, "WARN"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// A single validation issue.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Severity of the issue.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
    /// Layer involved, if any.
    pub layer: Option<usize>,
    /// Edge involved, if any.
    pub edge: Option<Edge>,
    /// Typed error for error-level issues.
    pub error: Option<Error>,
}

impl ValidationIssue {
    /// Create a new validation issue.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            layer: None,
            edge: None,
            error: None,
        }
    }

    /// Error-level issue built from a typed error.
    pub fn from_error(error: Error) -> Self {
        let mut issue = Self::new(Severity::Error, error.to_string());
        match &error {
            Error::InvalidTopology { edge, layer, .. } => {
                issue.edge = Some(*edge);
                issue.layer = *layer;
            }
            Error::AmbiguousObservation { edge, second, .. } => {
                issue.edge = Some(*edge);
                issue.layer = Some(*second);
            }
            Error::UncoveredNode { layer, .. } => issue.layer = Some(*layer),
            _ => {}
        }
        issue.error = Some(error);
        issue
    }

    /// Attach a layer.
    pub fn with_layer(mut self, layer: usize) -> Self {
        self.layer = Some(layer);
        self
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)?;
        if self.error.is_none() {
            if let Some(layer) = self.layer {
                write!(f, " (layer {layer})")?;
            }
            if let Some(edge) = self.edge {
                write!(f, " (edge {edge})")?;
            }
        }
        Ok(())
    }
}

/// Report from a validation pass.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// All issues found.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    /// Add an issue to the report.
    pub fn add(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// Add an info-level issue.
    pub fn info(&mut self, message: impl Into<String>) {
        self.add(ValidationIssue::new(Severity::Info, message));
    }

    /// Add a warning-level issue.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.add(ValidationIssue::new(Severity::Warning, message));
    }

    /// Add an error-level issue.
    pub fn error(&mut self, error: Error) {
        self.add(ValidationIssue::from_error(error));
    }

    /// No error-level issues.
    pub fn is_healthy(&self) -> bool {
        !self.issues.iter().any(|i| i.severity >= Severity::Error)
    }

    /// No issues at all.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Issues at or above `min_severity`.
    pub fn issues_at_level(&self, min_severity: Severity) -> Vec<&ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity >= min_severity)
            .collect()
    }

    /// Count issues by severity.
    pub fn counts(&self) -> HashMap<Severity, usize> {
        let mut counts = HashMap::new();
        for issue in &self.issues {
            *counts.entry(issue.severity).or_default() += 1;
        }
        counts
    }

    /// `Err` with the first error-level issue's error, if any.
    pub fn into_result(self) -> Result<()> {
        match self.issues.into_iter().find_map(|i| i.error) {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_clean() {
            return write!(f, "Validation passed: no issues found");
        }

        let counts = self.counts();
        write!(f, "Validation report: ")?;

        let parts: Vec<String> = [
            (Severity::Error, "errors"),
            (Severity::Warning, "warnings"),
            (Severity::Info, "info"),
        ]
        .iter()
        .filter_map(|(sev, name)| counts.get(sev).map(|c| format!("{} {}", c, name)))
        .collect();

        writeln!(f, "{}", parts.join(", "))?;

        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }

        Ok(())
    }
}

/// Check partial observations against the aggregate.
///
/// Errors: observed edge not in the aggregate, edge observed in two layers,
/// layer index outside `0..layer_count`. Warnings: layers with no
/// observations, nothing left to classify.
pub fn validate_observations(
    aggregate: &Aggregate,
    observations: &Observations,
    layer_count: usize,
) -> ValidationReport {
    let mut report = ValidationReport::new();
    if aggregate.is_empty() {
        report.error(Error::EmptyInput);
        return report;
    }

    let mut owner: BTreeMap<Edge, usize> = BTreeMap::new();
    for (&layer, edges) in observations {
        if layer >= layer_count {
            report.add(
                ValidationIssue::from_error(Error::InvalidParameter {
                    name: "layer_count",
                    message: "observed layer index exceeds layer count",
                })
                .with_layer(layer),
            );
        }
        for edge in edges {
            if !aggregate.contains(edge) {
                report.error(Error::layer_topology(*edge, layer, "observed edge not in aggregate"));
            } else if let Some(&first) = owner.get(edge) {
                report.error(Error::AmbiguousObservation {
                    edge: *edge,
                    first,
                    second: layer,
                });
            } else {
                let _ = owner.insert(*edge, layer);
            }
        }
    }

    for layer in 0..layer_count {
        if observations.get(&layer).map_or(true, |s| s.is_empty()) {
            report.add(
                ValidationIssue::new(Severity::Warning, "no observed edges").with_layer(layer),
            );
        }
    }
    if owner.len() == aggregate.edge_count() {
        report.warn("every aggregate edge is already observed");
    }
    report.info(format!(
        "{} of {} aggregate edges observed across {} layers",
        owner.len(),
        aggregate.edge_count(),
        layer_count
    ));
    report
}

/// Check supplied degree sequences against the aggregate.
///
/// Errors: no sequences, an aggregate node missing from a sequence.
/// Warnings: odd total degree in a layer, total degree across layers not
/// equal to twice the aggregate edge count.
pub fn validate_degree_sequences(
    aggregate: &Aggregate,
    sequences: &[DegreeSequence],
) -> ValidationReport {
    let mut report = ValidationReport::new();
    if aggregate.is_empty() {
        report.error(Error::EmptyInput);
        return report;
    }
    if sequences.is_empty() {
        report.error(Error::UnsupportedMode("no degree sequences supplied"));
        return report;
    }

    for (layer, seq) in sequences.iter().enumerate() {
        if let Some(&node) = aggregate.nodes().iter().find(|&&n| !seq.covers(n)) {
            report.error(Error::UncoveredNode { layer, node });
        }
        if seq.total() % 2 == 1 {
            report.add(
                ValidationIssue::new(Severity::Warning, "odd total degree").with_layer(layer),
            );
        }
    }

    let total: usize = sequences.iter().map(DegreeSequence::total).sum();
    if total != 2 * aggregate.edge_count() {
        report.warn(format!(
            "degree total {} differs from twice the aggregate edge count {}",
            total,
            2 * aggregate.edge_count()
        ));
    }
    report
}
