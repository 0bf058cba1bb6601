//! The Resolver (§4.4): a whole-graph pass that converts `ref:<kind>:<name>`
//! edges into concrete node identities, or leaves them annotated as
//! ambiguous/unresolved.

use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::graph::store::GraphStore;
use crate::indexer::common::strip_receiver_prefix;
use crate::resolution::imports::module_matches;
use crate::types::{Edge, EdgeKind, Node, NodeKind};

/// `{resolved, ambiguous, unresolved}` counts for one `resolve()` run (§4.4
/// "Return value").
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ResolveStats {
    pub resolved: usize,
    pub ambiguous: usize,
    pub unresolved: usize,
}

/// One entry in the Resolver's multi-keyed symbol index.
#[derive(Debug, Clone)]
struct IndexEntry {
    node_id: String,
    name: String,
    full_name: String,
    kind: NodeKind,
    file_path: String,
    language: crate::types::Language,
    exported: bool,
}

/// A file's import declarations, normalised enough to answer "does this
/// alias/name refer to a symbol imported from a module matching this
/// candidate's file path" (§4.4 step 4c).
#[derive(Debug, Clone)]
struct ImportInfo {
    module_specifier: String,
    /// `(alias_or_bound_name, original_name)` pairs — for an unaliased
    /// import these are equal.
    named: Vec<(String, String)>,
}

/// Builds the per-run indices (§4.4 "Indices built once per run") and
/// resolves every currently-unresolved edge against them.
pub struct Resolver<'a> {
    store: &'a GraphStore,
    index: HashMap<String, Vec<IndexEntry>>,
    imports_by_file: HashMap<String, Vec<ImportInfo>>,
}

impl<'a> Resolver<'a> {
    pub fn new(store: &'a GraphStore) -> Result<Self> {
        let all_nodes = store.all_nodes()?;
        let mut index: HashMap<String, Vec<IndexEntry>> = HashMap::new();
        let mut imports_by_file: HashMap<String, Vec<ImportInfo>> = HashMap::new();

        for node in &all_nodes {
            if node.kind == NodeKind::Import {
                imports_by_file
                    .entry(node.file_path.clone())
                    .or_default()
                    .push(import_info_from_node(node));
                continue;
            }
            if !node.kind.is_indexable_symbol() {
                continue;
            }
            let entry = IndexEntry {
                node_id: node.id.clone(),
                name: node.name.clone(),
                full_name: node.name.clone(),
                kind: node.kind,
                file_path: node.file_path.clone(),
                language: node.language,
                exported: is_exported(node),
            };

            let short = short_name(&node.name).to_string();
            push_unique(&mut index, short, entry.clone());
            push_unique(&mut index, node.name.clone(), entry.clone());
            if let Some((owner_method, bare)) = owner_and_method(&node.name) {
                push_unique(&mut index, bare.to_string(), entry.clone());
                push_unique(&mut index, owner_method, entry.clone());
            }
        }

        Ok(Self {
            store,
            index,
            imports_by_file,
        })
    }

    /// Run one whole-graph resolution pass. Running it twice in a row
    /// yields identical final edges (§8 "Resolver monotonicity") because
    /// resolution only ever reads already-extracted metadata
    /// (`targetName`) and the current index snapshot.
    pub fn resolve(&self) -> Result<ResolveStats> {
        let mut stats = ResolveStats::default();
        for edge in self.store.get_unresolved_edges()? {
            match self.resolve_edge(&edge)? {
                Outcome::Resolved => stats.resolved += 1,
                Outcome::Ambiguous => stats.ambiguous += 1,
                Outcome::Unresolved => stats.unresolved += 1,
            }
        }
        Ok(stats)
    }

    fn resolve_edge(&self, edge: &Edge) -> Result<Outcome> {
        // 1. reject if no targetName
        let Some(target_name) = edge.target_name().map(str::to_string) else {
            return Ok(Outcome::Unresolved);
        };
        // 2. fetch source node
        let Some(source) = self.store.get_node(&edge.source_id)? else {
            return Ok(Outcome::Unresolved);
        };
        // 3. clean the target name
        let cleaned = strip_receiver_prefix(&target_name).to_string();

        // 4. build candidate list
        let mut seen_ids = std::collections::HashSet::new();
        let mut candidates: Vec<IndexEntry> = Vec::new();
        let mut add = |entry: &IndexEntry,
                       candidates: &mut Vec<IndexEntry>,
                       seen: &mut std::collections::HashSet<String>| {
            if seen.insert(entry.node_id.clone()) {
                candidates.push(entry.clone());
            }
        };

        // 4a. direct index hit
        if let Some(hits) = self.index.get(&cleaned) {
            for h in hits {
                add(h, &mut candidates, &mut seen_ids);
            }
        }
        // 4b. dotted name: last segment, and Owner.member (last two segments)
        if cleaned.contains('.') {
            let last = short_name(&cleaned).to_string();
            if let Some(hits) = self.index.get(&last) {
                for h in hits {
                    add(h, &mut candidates, &mut seen_ids);
                }
            }
            if let Some((owner_member, _)) = owner_and_method(&cleaned) {
                if let Some(hits) = self.index.get(&owner_member) {
                    for h in hits {
                        add(h, &mut candidates, &mut seen_ids);
                    }
                }
            }
        }
        // 4c. via the source file's imports
        if let Some(imports) = self.imports_by_file.get(&source.file_path) {
            for import in imports {
                for (alias_or_name, orig_name) in &import.named {
                    let matches_alias = alias_or_name == &cleaned
                        || cleaned
                            .split('.')
                            .next()
                            .map(|prefix| prefix == alias_or_name)
                            .unwrap_or(false);
                    if !matches_alias {
                        continue;
                    }
                    if let Some(hits) = self.index.get(orig_name) {
                        for h in hits {
                            if module_matches(&source.file_path, &import.module_specifier, &h.file_path) {
                                add(h, &mut candidates, &mut seen_ids);
                            }
                        }
                    }
                }
            }
        }

        // 5. filter by edge-type compatibility
        let allowed = edge.kind.compatible_target_kinds();
        let filtered: Vec<IndexEntry> = if allowed.is_empty() {
            candidates
        } else {
            candidates
                .into_iter()
                .filter(|c| allowed.contains(&c.kind))
                .collect()
        };

        // 6 / 7 / 8
        match filtered.len() {
            0 => Ok(Outcome::Unresolved),
            1 => {
                self.store
                    .update_edge_target(&edge.id, &filtered[0].node_id, false)?;
                Ok(Outcome::Resolved)
            }
            _ => {
                let mut scored: Vec<(i32, &IndexEntry)> = filtered
                    .iter()
                    .map(|c| (score_candidate(&source, &cleaned, c, &self.imports_by_file), c))
                    .collect();
                scored.sort_by(|a, b| b.0.cmp(&a.0));

                let top_score = scored[0].0;
                let second_score = scored.get(1).map(|(s, _)| *s).unwrap_or(i32::MIN);
                if top_score - second_score > 10 {
                    self.store
                        .update_edge_target(&edge.id, &scored[0].1.node_id, false)?;
                    Ok(Outcome::Resolved)
                } else {
                    let top5: Vec<serde_json::Value> = scored
                        .iter()
                        .take(5)
                        .map(|(_, c)| serde_json::json!(format!("{} ({})", c.full_name, c.file_path)))
                        .collect();
                    let mut metadata = crate::types::Metadata::new();
                    metadata.insert("ambiguousCandidates".to_string(), serde_json::json!(top5));
                    metadata.insert("unresolved".to_string(), serde_json::json!(true));
                    self.store.update_edge_metadata(&edge.id, metadata)?;
                    Ok(Outcome::Ambiguous)
                }
            }
        }
    }
}

enum Outcome {
    Resolved,
    Ambiguous,
    Unresolved,
}

fn short_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// For an owner-qualified name (`Owner.member` or deeper), return
/// `(Owner.member as the last-two-segments join, bare member name)`.
/// `None` if `name` has no `.`.
fn owner_and_method(name: &str) -> Option<(String, &str)> {
    let mut parts: Vec<&str> = name.split('.').collect();
    if parts.len() < 2 {
        return None;
    }
    let method = parts.pop().unwrap();
    let owner = parts.pop().unwrap();
    Some((format!("{owner}.{method}"), method))
}

fn is_exported(node: &Node) -> bool {
    node.metadata
        .get("isExported")
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

fn push_unique(index: &mut HashMap<String, Vec<IndexEntry>>, key: String, entry: IndexEntry) {
    let bucket = index.entry(key).or_default();
    if !bucket.iter().any(|e| e.node_id == entry.node_id) {
        bucket.push(entry);
    }
}

/// Pull `(alias_or_bound_name, original_name)` pairs plus the module
/// specifier out of an `import` node's metadata, covering both the TS/JS
/// shape (`namedImports: [string]`, `defaultImport: string`) and the Python
/// shape (`namedImports: [{name, alias}]`, module-level `alias`).
fn import_info_from_node(node: &Node) -> ImportInfo {
    let module_specifier = node
        .metadata
        .get("moduleSpecifier")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| node.name.clone());

    let mut named = Vec::new();
    if let Some(arr) = node.metadata.get("namedImports").and_then(|v| v.as_array()) {
        for item in arr {
            if let Some(s) = item.as_str() {
                named.push((s.to_string(), s.to_string()));
            } else if let Some(obj) = item.as_object() {
                let orig = obj.get("name").and_then(|v| v.as_str()).unwrap_or_default();
                let alias = obj
                    .get("alias")
                    .and_then(|v| v.as_str())
                    .unwrap_or(orig);
                named.push((alias.to_string(), orig.to_string()));
            }
        }
    }
    if let Some(default) = node.metadata.get("defaultImport").and_then(|v| v.as_str()) {
        named.push((default.to_string(), default.to_string()));
    }
    if let Some(alias) = node.metadata.get("alias").and_then(|v| v.as_str()) {
        let module_basename = short_name(&module_specifier).to_string();
        named.push((alias.to_string(), module_basename));
    }

    ImportInfo {
        module_specifier,
        named,
    }
}

/// §4.4 step 8 candidate scoring table.
fn score_candidate(
    source: &Node,
    target: &str,
    candidate: &IndexEntry,
    imports_by_file: &HashMap<String, Vec<ImportInfo>>,
) -> i32 {
    let mut score = 0;

    if candidate.file_path == source.file_path {
        score += 100;
    }
    if dirname(&candidate.file_path) == dirname(&source.file_path) {
        score += 50;
    }
    if candidate.language == source.language {
        score += 30;
    }
    if candidate.full_name == target || candidate.name == target {
        score += 40;
    }
    if candidate.exported {
        score += 20;
    }
    if let Some(imports) = imports_by_file.get(&source.file_path) {
        if imports
            .iter()
            .any(|i| module_matches(&source.file_path, &i.module_specifier, &candidate.file_path))
        {
            score += 60;
        }
    }
    if let (Some((_, target_owner)), Some((_, candidate_owner))) =
        (owner_of(target), owner_of(&candidate.full_name))
    {
        if target_owner.eq_ignore_ascii_case(candidate_owner) {
            score += 35;
        }
    }

    score
}

/// `(member, owner)` for a dotted name, or `None` if undotted.
fn owner_of(name: &str) -> Option<(&str, &str)> {
    let idx = name.rfind('.')?;
    Some((&name[idx + 1..], &name[..idx]))
}

fn dirname(path: &str) -> &str {
    Path::new(path)
        .parent()
        .and_then(|p| p.to_str())
        .unwrap_or("")
}
