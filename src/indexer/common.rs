//! Shared extractor helpers: the `(nodes, edges)` output shape, 1-based line
//! conversion, the per-function call-dedup rule, and the file node every
//! extractor emits exactly once (§4.2 common rules).

use std::collections::HashSet;

use tree_sitter::Node as TsNode;

use crate::types::{Edge, EdgeKind, Language, Node, NodeKind};

#[derive(Debug, Default, Clone)]
pub struct ExtractResult {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl ExtractResult {
    pub fn push_node(&mut self, node: Node) -> String {
        let id = node.id.clone();
        self.nodes.push(node);
        id
    }

    pub fn push_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    pub fn merge(&mut self, other: ExtractResult) {
        self.nodes.extend(other.nodes);
        self.edges.extend(other.edges);
    }
}

/// Tree-sitter rows are 0-based; the graph's line fields are 1-based
/// inclusive.
pub fn line_start(node: TsNode) -> u32 {
    node.start_position().row as u32 + 1
}

pub fn line_end(node: TsNode) -> u32 {
    node.end_position().row as u32 + 1
}

pub fn node_text<'a>(node: TsNode, source: &'a str) -> &'a str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

fn basename(file_path: &str) -> &str {
    file_path.rsplit('/').next().unwrap_or(file_path)
}

/// Every file yields exactly one `file` node spanning the whole file
/// (§4.2 common rule).
pub fn file_node(file_path: &str, total_lines: u32, language: Language) -> Node {
    Node::new(
        NodeKind::File,
        basename(file_path),
        file_path,
        1,
        total_lines.max(1),
        language,
    )
}

pub fn contains_edge(owner_id: &str, child_id: &str) -> Edge {
    Edge::new(owner_id, child_id, EdgeKind::Contains)
}

/// Tracks which call-names have already been emitted for one function body,
/// so that duplicate calls to the same name produce at most one `calls`
/// edge per owner (§4.2 common rule). A fresh tracker must be created per
/// function/method body.
#[derive(Debug, Default)]
pub struct CallDedup {
    seen: HashSet<String>,
}

impl CallDedup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` the first time `call_name` is seen, `false` on every
    /// later occurrence within the same body.
    pub fn first_time(&mut self, call_name: &str) -> bool {
        self.seen.insert(call_name.to_string())
    }
}

/// Strip a generic argument list (`Base<T, U>` -> `Base`) before placing a
/// name into a `ref:` placeholder (§9 Open Question 3).
pub fn strip_generics(name: &str) -> &str {
    name.split('<').next().unwrap_or(name).trim()
}

/// Strip a leading `this.`, `self.` or `super.` prefix from a resolver
/// target candidate name (§4.4 step 3) — also useful at extraction time for
/// normalising receiver-qualified call text is intentionally NOT done here;
/// extractors keep the literal call-site text (§9 Open Question 4).
pub fn strip_receiver_prefix(name: &str) -> &str {
    for prefix in ["this.", "self.", "super."] {
        if let Some(stripped) = name.strip_prefix(prefix) {
            return stripped;
        }
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_dedup_allows_first_occurrence_only() {
        let mut dedup = CallDedup::new();
        assert!(dedup.first_time("foo"));
        assert!(!dedup.first_time("foo"));
        assert!(dedup.first_time("bar"));
    }

    #[test]
    fn strip_generics_removes_type_args() {
        assert_eq!(strip_generics("Base<T>"), "Base");
        assert_eq!(strip_generics("Base"), "Base");
        assert_eq!(strip_generics("Map<K, V>"), "Map");
    }

    #[test]
    fn strip_receiver_prefix_handles_all_three() {
        assert_eq!(strip_receiver_prefix("this.foo"), "foo");
        assert_eq!(strip_receiver_prefix("self.foo"), "foo");
        assert_eq!(strip_receiver_prefix("super.foo"), "foo");
        assert_eq!(strip_receiver_prefix("obj.foo"), "obj.foo");
    }

    #[test]
    fn file_node_spans_whole_file() {
        let node = file_node("src/a.ts", 42, Language::TypeScript);
        assert_eq!(node.line_start, 1);
        assert_eq!(node.line_end, 42);
        assert_eq!(node.name, "a.ts");
    }
}
