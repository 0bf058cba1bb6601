//! The Context assembler (§4.5): given a target file, an optional task
//! hint, and a token budget, returns a structured editing-context payload
//! — the target file's source, inlined imported symbols, dependent-file
//! usage sites, related types, and (if a task is given) similar functions
//! — each admitted greedily against its slice of the budget.
//!
//! Budget allocation is sequential, each percentage taken against what's
//! left after the previous slot: target file 60%, imports 30% of the
//! remainder, dependents 30% of what's left after that, related types 50%
//! of what's left after that, and similar functions get whatever remains.

use std::collections::HashSet;
use std::path::PathBuf;

use serde::Serialize;

use crate::context::budget::{estimate_tokens, truncate_to_fit};
use crate::error::Result;
use crate::graph::store::GraphStore;
use crate::resolution::imports::module_matches;
use crate::types::{Edge, EdgeKind, Node, NodeKind};

/// Default token budget (§4.5) when a caller doesn't specify one.
pub const DEFAULT_MAX_TOKENS: usize = 8000;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetFile {
    pub path: String,
    pub source: String,
    pub truncated: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextSnippet {
    pub node_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub file_path: String,
    pub line_start: u32,
    pub line_end: u32,
    pub source: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditingContext {
    pub target_file: TargetFile,
    pub imports: Vec<ContextSnippet>,
    pub dependents: Vec<ContextSnippet>,
    pub related_types: Vec<ContextSnippet>,
    pub similar_functions: Vec<ContextSnippet>,
    pub token_estimate: usize,
}

pub struct ContextAssembler<'a> {
    store: &'a GraphStore,
    project_root: PathBuf,
}

impl<'a> ContextAssembler<'a> {
    pub fn new(store: &'a GraphStore, project_root: impl Into<PathBuf>) -> Self {
        Self {
            store,
            project_root: project_root.into(),
        }
    }

    /// Assemble the editing context for `file_path` (project-relative).
    pub fn assemble(
        &self,
        file_path: &str,
        task: Option<&str>,
        max_tokens: Option<usize>,
        include_tests: bool,
    ) -> Result<EditingContext> {
        let max_tokens = max_tokens.unwrap_or(DEFAULT_MAX_TOKENS);
        let file_ctx = self.store.file_context(file_path)?;
        let source = self.read_file(file_path)?;

        let target_budget = max_tokens * 60 / 100;
        let (target_source, truncated) = if estimate_tokens(&source) <= target_budget {
            (source, false)
        } else {
            (truncate_to_fit(&source, target_budget), true)
        };
        let target_tokens = estimate_tokens(&target_source);
        let mut remaining = max_tokens.saturating_sub(target_tokens);

        // A node already shown as the target file's own content never
        // reappears in a related section.
        let mut seen: HashSet<String> = file_ctx.nodes_in_file.iter().map(|n| n.id.clone()).collect();

        let imports_budget = remaining * 30 / 100;
        let import_candidates = self.resolve_import_targets(file_path, &file_ctx.nodes_in_file)?;
        let (imports, imports_used) = self.admit(&import_candidates, imports_budget, &mut seen);
        remaining = remaining.saturating_sub(imports_used);

        let dependents_budget = remaining * 30 / 100;
        let dependent_candidates = self.resolve_dependents(&file_ctx.incoming_edges, include_tests)?;
        let (dependents, dependents_used) = self.admit(&dependent_candidates, dependents_budget, &mut seen);
        remaining = remaining.saturating_sub(dependents_used);

        let related_budget = remaining * 50 / 100;
        let related_candidates = self.resolve_related_types(&file_ctx.outgoing_edges)?;
        let (related_types, related_used) = self.admit(&related_candidates, related_budget, &mut seen);
        remaining = remaining.saturating_sub(related_used);

        let similar_candidates = match task {
            Some(task) => self.resolve_similar_functions(task, file_path)?,
            None => Vec::new(),
        };
        let (similar_functions, similar_used) = self.admit(&similar_candidates, remaining, &mut seen);

        let token_estimate = target_tokens + imports_used + dependents_used + related_used + similar_used;

        Ok(EditingContext {
            target_file: TargetFile {
                path: file_path.to_string(),
                source: target_source,
                truncated,
            },
            imports,
            dependents,
            related_types,
            similar_functions,
            token_estimate,
        })
    }

    // -------------------------------------------------------------------
    // Candidate gathering
    // -------------------------------------------------------------------

    /// For each import node in the target file, find the concrete node(s)
    /// it names, scoped to files whose module specifier plausibly matches.
    fn resolve_import_targets(&self, importing_file: &str, nodes_in_file: &[Node]) -> Result<Vec<Node>> {
        let mut candidates = Vec::new();
        for node in nodes_in_file {
            if node.kind != NodeKind::Import {
                continue;
            }
            let (module_specifier, names) = import_target_names(node);
            for name in names {
                let matches = self.store.search_by_name(&name, 20)?;
                if let Some(target) = matches.into_iter().find(|n| {
                    n.kind.is_indexable_symbol()
                        && n.name == name
                        && n.file_path != importing_file
                        && module_matches(importing_file, &module_specifier, &n.file_path)
                }) {
                    candidates.push(target);
                }
            }
        }
        Ok(candidates)
    }

    /// Other files' symbols that reference something in the target file,
    /// one candidate per distinct caller, tests excluded unless asked for.
    fn resolve_dependents(&self, incoming_edges: &[Edge], include_tests: bool) -> Result<Vec<Node>> {
        let mut candidates = Vec::new();
        let mut seen_sources: HashSet<String> = HashSet::new();
        for edge in incoming_edges {
            if !seen_sources.insert(edge.source_id.clone()) {
                continue;
            }
            let Some(source_node) = self.store.get_node(&edge.source_id)? else {
                continue;
            };
            if !include_tests && is_test_file(&source_node.file_path) {
                continue;
            }
            candidates.push(source_node);
        }
        Ok(candidates)
    }

    /// Resolved `extends`/`implements`/`uses` targets of the target file's
    /// own symbols.
    fn resolve_related_types(&self, outgoing_edges: &[Edge]) -> Result<Vec<Node>> {
        let mut candidates = Vec::new();
        let mut seen_targets: HashSet<String> = HashSet::new();
        for edge in outgoing_edges {
            if !matches!(edge.kind, EdgeKind::Extends | EdgeKind::Implements | EdgeKind::Uses) {
                continue;
            }
            if edge.is_unresolved() {
                continue;
            }
            if !seen_targets.insert(edge.target_id.clone()) {
                continue;
            }
            if let Some(target_node) = self.store.get_node(&edge.target_id)? {
                candidates.push(target_node);
            }
        }
        Ok(candidates)
    }

    /// Task-keyword driven discovery: up to 3 words longer than 3 chars,
    /// up to 2 function/method matches per word, outside the target file.
    fn resolve_similar_functions(&self, task: &str, target_file: &str) -> Result<Vec<Node>> {
        let mut candidates = Vec::new();
        let mut seen_ids: HashSet<String> = HashSet::new();

        for word in task.split_whitespace().filter(|w| w.chars().count() > 3).take(3) {
            let matches = self.store.search_by_name(word, 20)?;
            let mut admitted_for_word = 0;
            for node in matches {
                if admitted_for_word >= 2 {
                    break;
                }
                if !matches!(node.kind, NodeKind::Function | NodeKind::Method) {
                    continue;
                }
                if node.file_path == target_file {
                    continue;
                }
                if !seen_ids.insert(node.id.clone()) {
                    continue;
                }
                admitted_for_word += 1;
                candidates.push(node);
            }
        }

        Ok(candidates)
    }

    // -------------------------------------------------------------------
    // Budget admission
    // -------------------------------------------------------------------

    /// Admit as many `candidates` as fit within `budget` tokens, skipping
    /// (not stopping at) candidates too large to fit so smaller later ones
    /// still get a chance. Already-`seen` node ids are skipped outright.
    fn admit(&self, candidates: &[Node], budget: usize, seen: &mut HashSet<String>) -> (Vec<ContextSnippet>, usize) {
        let mut out = Vec::new();
        let mut used = 0;
        for node in candidates {
            if seen.contains(&node.id) {
                continue;
            }
            let Some(snippet) = self.snippet_from_node(node) else {
                continue;
            };
            let tokens = estimate_tokens(&snippet.source);
            if used + tokens > budget {
                continue;
            }
            used += tokens;
            seen.insert(node.id.clone());
            out.push(snippet);
        }
        (out, used)
    }

    fn snippet_from_node(&self, node: &Node) -> Option<ContextSnippet> {
        let source = self.read_snippet(&node.file_path, node.line_start, node.line_end)?;
        Some(ContextSnippet {
            node_id: node.id.clone(),
            name: node.name.clone(),
            kind: node.kind,
            file_path: node.file_path.clone(),
            line_start: node.line_start,
            line_end: node.line_end,
            source,
        })
    }

    // -------------------------------------------------------------------
    // Disk access
    // -------------------------------------------------------------------

    fn read_file(&self, file_path: &str) -> Result<String> {
        Ok(std::fs::read_to_string(self.project_root.join(file_path))?)
    }

    fn read_snippet(&self, file_path: &str, line_start: u32, line_end: u32) -> Option<String> {
        let full = self.read_file(file_path).ok()?;
        let lines: Vec<&str> = full.lines().collect();
        let start = line_start.saturating_sub(1) as usize;
        let end = (line_end as usize).min(lines.len());
        if start >= end {
            return None;
        }
        Some(lines[start..end].join("\n"))
    }
}

/// Extract `(moduleSpecifier, names[])` from an import node, handling both
/// the TypeScript shape (`namedImports` as plain strings, optional
/// `defaultImport`) and the Python shape (`namedImports` as
/// `{name, alias}` objects, module specifier carried in the node's own
/// `name` field rather than a `moduleSpecifier` key).
fn import_target_names(node: &Node) -> (String, Vec<String>) {
    let module_specifier = node
        .metadata
        .get("moduleSpecifier")
        .and_then(|v| v.as_str())
        .unwrap_or(&node.name)
        .to_string();

    let mut names = Vec::new();
    if let Some(named) = node.metadata.get("namedImports").and_then(|v| v.as_array()) {
        for entry in named {
            if let Some(s) = entry.as_str() {
                names.push(s.to_string());
            } else if let Some(name) = entry.get("name").and_then(|v| v.as_str()) {
                names.push(name.to_string());
            }
        }
    }
    if let Some(default) = node.metadata.get("defaultImport").and_then(|v| v.as_str()) {
        names.push(default.to_string());
    }

    (module_specifier, names)
}

fn is_test_file(path: &str) -> bool {
    path.contains(".test.") || path.contains(".spec.") || path.contains("__tests__")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
