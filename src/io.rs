//! Plain-text formats.
//!
//! - Aggregate edgelist: one `SRC TGT` pair per line.
//! - Multiplex edgelist: one `LAYER SRC TGT` triple per line; used both for
//!   partial observations and for writing a reconstruction.
//! - Degree sequences: one line per layer, whitespace-separated degrees of
//!   nodes `0, 1, 2, ...`.
//!
//! Blank lines and lines starting with `#` are skipped. Extra trailing
//! columns on edge lines are ignored.

use crate::error::{Error, Result};
use crate::graph::{Aggregate, DegreeSequence, Edge, Multiplex, NodeId, Observations};
use std::str::FromStr;

fn content_lines(text: &str) -> impl Iterator<Item = (usize, Vec<&str>)> {
    text.lines().enumerate().filter_map(|(i, line)| {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            None
        } else {
            Some((i + 1, line.split_whitespace().collect()))
        }
    })
}

fn field<T: FromStr>(fields: &[&str], idx: usize, line: usize, what: &str) -> Result<T> {
    let raw = fields.get(idx).ok_or_else(|| Error::Parse {
        line,
        message: format!("missing {what}"),
    })?;
    raw.parse().map_err(|_| Error::Parse {
        line,
        message: format!("invalid {what} '{raw}'"),
    })
}

fn edge_at(fields: &[&str], offset: usize, line: usize) -> Result<Edge> {
    let src: NodeId = field(fields, offset, line, "source node")?;
    let tgt: NodeId = field(fields, offset + 1, line, "target node")?;
    Edge::new(src, tgt).map_err(|_| Error::Parse {
        line,
        message: format!("self-loop on node {src}"),
    })
}

/// Parse an aggregate `SRC TGT` edgelist.
pub fn parse_aggregate(text: &str) -> Result<Aggregate> {
    let edges = content_lines(text)
        .map(|(line, fields)| edge_at(&fields, 0, line))
        .collect::<Result<Vec<_>>>()?;
    Ok(Aggregate::from_edges(edges))
}

/// Parse a `LAYER SRC TGT` multiplex edgelist into observations.
pub fn parse_observations(text: &str) -> Result<Observations> {
    let mut out = Observations::new();
    for (line, fields) in content_lines(text) {
        let layer: usize = field(&fields, 0, line, "layer")?;
        let edge = edge_at(&fields, 1, line)?;
        let _ = out.entry(layer).or_default().insert(edge);
    }
    Ok(out)
}

/// Parse one dense degree sequence per line.
pub fn parse_degree_sequences(text: &str) -> Result<Vec<DegreeSequence>> {
    content_lines(text)
        .map(|(line, fields)| {
            let degrees = (0..fields.len())
                .map(|i| field::<usize>(&fields, i, line, "degree"))
                .collect::<Result<Vec<_>>>()?;
            Ok(DegreeSequence::from_dense(&degrees))
        })
        .collect()
}

/// Write `multiplex` as `LAYER SRC TGT` lines, by layer then edge.
pub fn write_multiplex<W: std::io::Write>(multiplex: &Multiplex, out: &mut W) -> std::io::Result<()> {
    for (idx, layer) in multiplex.layers().iter().enumerate() {
        for edge in layer.edges() {
            let (u, v) = edge.endpoints();
            writeln!(out, "{idx} {u} {v}")?;
        }
    }
    Ok(())
}
