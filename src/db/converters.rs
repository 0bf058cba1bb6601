//! Row <-> domain-type conversions for the graph store.

use rusqlite::Row;

use crate::error::{GraphError, Result};
use crate::types::{Edge, EdgeKind, Language, Metadata, Node, NodeKind};

fn parse_metadata(raw: Option<String>) -> Result<Metadata> {
    match raw {
        None => Ok(Metadata::new()),
        Some(s) if s.is_empty() => Ok(Metadata::new()),
        Some(s) => Ok(serde_json::from_str(&s)?),
    }
}

pub fn row_to_node(row: &Row) -> rusqlite::Result<(String, String, String, String, u32, u32, String, Option<String>)> {
    Ok((
        row.get("id")?,
        row.get("type")?,
        row.get("name")?,
        row.get("file_path")?,
        row.get("start_line")?,
        row.get("end_line")?,
        row.get("language")?,
        row.get("metadata")?,
    ))
}

/// Build a [`Node`] from a raw row tuple, validating the enum-backed
/// columns. Kept separate from `row_to_node` so callers using
/// `query_and_then` can map the `rusqlite::Error` and the
/// `GraphError::Db`/`Json` conversion paths independently.
pub fn node_from_row(row: &Row) -> Result<Node> {
    let (id, kind_s, name, file_path, start_line, end_line, language_s, metadata_raw) =
        row_to_node(row).map_err(GraphError::Db)?;
    let kind = NodeKind::from_str_loose(&kind_s)
        .ok_or_else(|| GraphError::other(format!("unknown node type in store: {kind_s}")))?;
    let language = Language::from_str_loose(&language_s)
        .ok_or_else(|| GraphError::other(format!("unknown language in store: {language_s}")))?;
    Ok(Node {
        id,
        kind,
        name,
        file_path,
        line_start: start_line,
        line_end: end_line,
        language,
        metadata: parse_metadata(metadata_raw)?,
    })
}

pub fn edge_from_row(row: &Row) -> Result<Edge> {
    let id: String = row.get("id").map_err(GraphError::Db)?;
    let source_id: String = row.get("source_id").map_err(GraphError::Db)?;
    let target_id: String = row.get("target_id").map_err(GraphError::Db)?;
    let kind_s: String = row.get("type").map_err(GraphError::Db)?;
    let metadata_raw: Option<String> = row.get("metadata").map_err(GraphError::Db)?;
    let kind = EdgeKind::from_str_loose(&kind_s)
        .ok_or_else(|| GraphError::other(format!("unknown edge type in store: {kind_s}")))?;
    Ok(Edge {
        id,
        source_id,
        target_id,
        kind,
        metadata: parse_metadata(metadata_raw)?,
    })
}
