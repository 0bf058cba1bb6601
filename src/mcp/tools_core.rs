//! Handlers behind the fixed 10-tool surface (§6): free functions taking a
//! `&GraphStore` plus plain arguments and returning a JSON value, shared
//! between the MCP tool router and the CLI's `query`/`status` commands so
//! the two surfaces can never drift apart.
//!
//! Tool methods stay one-liners; the actual graph queries live here.

use std::collections::BTreeSet;
use std::path::Path;

use serde_json::{json, Value};

use crate::context::assembler::ContextAssembler;
use crate::error::{GraphError, Result};
use crate::graph::store::GraphStore;
use crate::types::{Node, NodeKind};

/// Cap applied to `search_symbols` results (§6 table).
const SEARCH_LIMIT: usize = 100;

/// Prefer an exact-name match among `search_by_name(name, limit)`'s
/// results, falling back to the first substring match.
fn find_best_match(store: &GraphStore, name: &str, limit: usize) -> Result<Option<Node>> {
    let candidates = store.search_by_name(name, limit)?;
    if let Some(exact) = candidates.iter().find(|n| n.name == name) {
        return Ok(Some(exact.clone()));
    }
    Ok(candidates.into_iter().next())
}

/// Read `line_start..=line_end` out of `file_path` (relative to
/// `project_root`), widened by `context_lines` on each side and clamped to
/// the file's extent. Returns the slice plus the actual 1-based range used.
fn source_slice(
    project_root: &Path,
    file_path: &str,
    line_start: u32,
    line_end: u32,
    context_lines: u32,
) -> Result<(String, u32, u32)> {
    let content = std::fs::read_to_string(project_root.join(file_path))?;
    let lines: Vec<&str> = content.lines().collect();
    let total = lines.len() as u32;
    let start = line_start.saturating_sub(context_lines).max(1);
    let end = (line_end + context_lines).min(total.max(1));
    let slice = if start > end || total == 0 {
        String::new()
    } else {
        lines[(start - 1) as usize..end as usize].join("\n")
    };
    Ok((slice, start, end))
}

pub fn handle_get_file_context(store: &GraphStore, file_path: &str) -> Result<Value> {
    let ctx = store.file_context(file_path)?;
    Ok(json!({
        "file": file_path,
        "symbols": ctx.nodes_in_file,
        "incomingEdges": ctx.incoming_edges,
        "outgoingEdges": ctx.outgoing_edges,
    }))
}

pub fn handle_search_symbols(store: &GraphStore, query: &str) -> Result<Value> {
    let nodes = store.search_by_name(query, SEARCH_LIMIT)?;
    Ok(json!({ "nodes": nodes }))
}

pub fn handle_find_references(store: &GraphStore, symbol: &str) -> Result<Value> {
    let mut definitions: Vec<Node> = store
        .search_by_name(symbol, SEARCH_LIMIT)?
        .into_iter()
        .filter(|n| n.name == symbol && n.kind.is_indexable_symbol())
        .collect();
    if definitions.is_empty() {
        definitions = store
            .search_by_name(symbol, 20)?
            .into_iter()
            .filter(|n| n.kind.is_indexable_symbol())
            .collect();
    }

    let mut results = Vec::with_capacity(definitions.len());
    for definition in definitions {
        let usages = store.in_edges(&definition.id, None)?;
        results.push(json!({ "definition": definition, "usages": usages }));
    }
    Ok(json!({ "references": results }))
}

pub fn handle_get_call_graph(store: &GraphStore, function_name: &str) -> Result<Value> {
    let Some(function) = find_best_match(store, function_name, SEARCH_LIMIT)? else {
        return Ok(json!({
            "found": false,
            "suggestions": store
                .search_by_name(function_name, 5)?
                .into_iter()
                .map(|n| n.name)
                .collect::<Vec<_>>(),
        }));
    };
    let callers = store.resolved_callers_of(&function.id)?;
    let callees = store.resolved_callees_of(&function.id)?;
    Ok(json!({ "found": true, "function": function, "callers": callers, "callees": callees }))
}

pub fn handle_get_by_type(store: &GraphStore, node_type: &str) -> Result<Value> {
    let kind = NodeKind::from_str_loose(node_type)
        .ok_or_else(|| GraphError::bad_arguments(format!("unknown node type: {node_type}")))?;
    Ok(json!({ "nodes": store.get_by_type(kind)? }))
}

pub fn handle_get_graph_stats(store: &GraphStore) -> Result<Value> {
    Ok(serde_json::to_value(store.stats()?)?)
}

pub fn handle_get_impact_analysis(store: &GraphStore, file_path: &str) -> Result<Value> {
    let ctx = store.file_context(file_path)?;
    let exports: Vec<&Node> = ctx
        .nodes_in_file
        .iter()
        .filter(|n| n.kind == NodeKind::Export)
        .collect();

    let mut dependent_files = BTreeSet::new();
    for edge in &ctx.incoming_edges {
        if let Some(source) = store.get_node(&edge.source_id)? {
            dependent_files.insert(source.file_path);
        }
    }
    let risk = match dependent_files.len() {
        n if n > 10 => "high",
        n if n > 3 => "medium",
        _ => "low",
    };

    Ok(json!({
        "file": file_path,
        "exports": exports,
        "dependentFiles": dependent_files,
        "riskLevel": risk,
    }))
}

pub fn handle_get_source_code(
    store: &GraphStore,
    project_root: &Path,
    symbol_name: Option<&str>,
    node_id: Option<&str>,
    context_lines: u32,
) -> Result<Value> {
    let node = match (node_id, symbol_name) {
        (Some(id), _) => store.get_node(id)?,
        (None, Some(name)) => find_best_match(store, name, SEARCH_LIMIT)?,
        (None, None) => {
            return Err(GraphError::bad_arguments(
                "get_source_code requires symbol_name or node_id",
            ))
        }
    };
    let Some(node) = node else {
        let suggestions = match symbol_name {
            Some(name) => store
                .search_by_name(name, 5)?
                .into_iter()
                .map(|n| n.name)
                .collect(),
            None => Vec::new(),
        };
        return Ok(json!({ "found": false, "suggestions": suggestions }));
    };
    let (source, range_start, range_end) =
        source_slice(project_root, &node.file_path, node.line_start, node.line_end, context_lines)?;
    Ok(json!({
        "found": true,
        "node": node,
        "source": source,
        "rangeStart": range_start,
        "rangeEnd": range_end,
    }))
}

pub fn handle_get_usage_examples(
    store: &GraphStore,
    project_root: &Path,
    symbol_name: &str,
    max_examples: usize,
    context_lines: u32,
) -> Result<Value> {
    let Some(definition) = find_best_match(store, symbol_name, SEARCH_LIMIT)? else {
        return Ok(json!({
            "found": false,
            "suggestions": store
                .search_by_name(symbol_name, 5)?
                .into_iter()
                .map(|n| n.name)
                .collect::<Vec<_>>(),
        }));
    };

    let mut examples = Vec::new();
    for edge in store.in_edges(&definition.id, None)? {
        if examples.len() >= max_examples {
            break;
        }
        let Some(source_node) = store.get_node(&edge.source_id)? else {
            continue;
        };
        let (source, line_start, line_end) = source_slice(
            project_root,
            &source_node.file_path,
            source_node.line_start,
            source_node.line_end,
            context_lines,
        )?;
        examples.push(json!({
            "file": source_node.file_path,
            "lineStart": line_start,
            "lineEnd": line_end,
            "source": source,
        }));
    }

    Ok(json!({ "found": true, "symbol": definition, "examples": examples }))
}

pub fn handle_get_editing_context(
    store: &GraphStore,
    project_root: &Path,
    file_path: &str,
    task: Option<&str>,
    max_tokens: Option<usize>,
    include_tests: bool,
) -> Result<Value> {
    let context = ContextAssembler::new(store, project_root)
        .assemble(file_path, task, max_tokens, include_tests)?;
    Ok(serde_json::to_value(context)?)
}
