//! Core domain types: languages, node/edge kinds, and the graph's two
//! persisted entities (`Node`, `Edge`) plus their on-disk companions
//! (`FileHash`, `ProjectConfig`).

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// Length, in hex characters, of a node/edge id's hash prefix.
///
/// Sixteen hex characters (64 bits) is the collision-tolerant prefix this
/// crate uses: short enough to stay readable in logs and `ref:` targets,
/// long enough that accidental collisions across a real repository's symbol
/// count are not a practical concern.
const ID_PREFIX_LEN: usize = 16;

fn hash_prefix(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            hasher.update(b"\0");
        }
        hasher.update(part.as_bytes());
    }
    let digest = hasher.finalize();
    hex::encode(digest)[..ID_PREFIX_LEN].to_string()
}

// ---------------------------------------------------------------------------
// Language
// ---------------------------------------------------------------------------

/// The four source languages this crate understands.
///
/// TypeScript and JavaScript share a single extractor (§4.2.1); only the
/// `language` field on emitted nodes differs, driven purely by file
/// extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    TypeScript,
    JavaScript,
    Python,
    Java,
}

impl Language {
    /// Map a file extension (including the leading dot) to a language.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            ".ts" => Some(Self::TypeScript),
            ".js" | ".jsx" | ".mjs" | ".cjs" => Some(Self::JavaScript),
            ".tsx" => Some(Self::TypeScript),
            ".py" => Some(Self::Python),
            ".java" => Some(Self::Java),
            _ => None,
        }
    }

    /// Detect a language from a path's extension.
    pub fn from_path(path: &str) -> Option<Self> {
        let ext = path.rsplit_once('.').map(|(_, e)| format!(".{e}"))?;
        Self::from_extension(&ext)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TypeScript => "typescript",
            Self::JavaScript => "javascript",
            Self::Python => "python",
            Self::Java => "java",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "typescript" | "ts" => Some(Self::TypeScript),
            "javascript" | "js" => Some(Self::JavaScript),
            "python" | "py" => Some(Self::Python),
            "java" => Some(Self::Java),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// NodeKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    File,
    Class,
    Interface,
    Function,
    Method,
    Variable,
    Import,
    Export,
    Module,
    Controller,
    Service,
    Repository,
    Component,
    Bean,
    Endpoint,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Function => "function",
            Self::Method => "method",
            Self::Variable => "variable",
            Self::Import => "import",
            Self::Export => "export",
            Self::Module => "module",
            Self::Controller => "controller",
            Self::Service => "service",
            Self::Repository => "repository",
            Self::Component => "component",
            Self::Bean => "bean",
            Self::Endpoint => "endpoint",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "file" => Some(Self::File),
            "class" => Some(Self::Class),
            "interface" => Some(Self::Interface),
            "function" => Some(Self::Function),
            "method" => Some(Self::Method),
            "variable" => Some(Self::Variable),
            "import" => Some(Self::Import),
            "export" => Some(Self::Export),
            "module" => Some(Self::Module),
            "controller" => Some(Self::Controller),
            "service" => Some(Self::Service),
            "repository" => Some(Self::Repository),
            "component" => Some(Self::Component),
            "bean" => Some(Self::Bean),
            "endpoint" => Some(Self::Endpoint),
            _ => None,
        }
    }

    /// Whether nodes of this kind can ever be the target of a resolved
    /// symbolic reference (used by the Resolver's symbol index, which
    /// excludes file/import nodes per §4.4).
    pub fn is_indexable_symbol(&self) -> bool {
        !matches!(self, Self::File | Self::Import)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// EdgeKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Contains,
    Calls,
    Imports,
    Exports,
    Extends,
    Implements,
    Uses,
    Injects,
    Returns,
    ParameterOf,
    MapsTo,
    Autowires,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::Calls => "calls",
            Self::Imports => "imports",
            Self::Exports => "exports",
            Self::Extends => "extends",
            Self::Implements => "implements",
            Self::Uses => "uses",
            Self::Injects => "injects",
            Self::Returns => "returns",
            Self::ParameterOf => "parameter_of",
            Self::MapsTo => "maps_to",
            Self::Autowires => "autowires",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "contains" => Some(Self::Contains),
            "calls" => Some(Self::Calls),
            "imports" => Some(Self::Imports),
            "exports" => Some(Self::Exports),
            "extends" => Some(Self::Extends),
            "implements" => Some(Self::Implements),
            "uses" => Some(Self::Uses),
            "injects" => Some(Self::Injects),
            "returns" => Some(Self::Returns),
            "parameter_of" => Some(Self::ParameterOf),
            "maps_to" => Some(Self::MapsTo),
            "autowires" => Some(Self::Autowires),
            _ => None,
        }
    }

    /// The node kinds a resolved target of this edge kind is allowed to be
    /// (§4.4 step 5, the edge-type compatibility table). Unknown/unlisted
    /// edge kinds are not produced by any extractor, so every variant here
    /// has an explicit table entry.
    pub fn compatible_target_kinds(&self) -> &'static [NodeKind] {
        use NodeKind::*;
        match self {
            Self::Calls => &[Function, Method, Endpoint],
            Self::Uses => &[Variable, Class, Interface, Function, Method],
            Self::Extends => &[Class, Interface],
            Self::Implements => &[Interface],
            Self::Imports => &[Module, File, Class, Function, Variable],
            Self::Autowires | Self::Injects => {
                &[Class, Interface, Service, Repository, Component, Controller]
            }
            Self::Contains | Self::Exports | Self::Returns | Self::ParameterOf | Self::MapsTo => {
                &[]
            }
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

pub type Metadata = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub name: String,
    pub file_path: String,
    pub line_start: u32,
    pub line_end: u32,
    pub language: Language,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Node {
    /// Build the deterministic id for a node from its identity tuple
    /// (`filePath`, `type`, `name`, `lineStart`). Reproducible from inputs;
    /// re-parsing the same bytes at the same location always yields the
    /// same id.
    pub fn make_id(file_path: &str, kind: NodeKind, name: &str, line_start: u32) -> String {
        hash_prefix(&[file_path, kind.as_str(), name, &line_start.to_string()])
    }

    pub fn new(
        kind: NodeKind,
        name: impl Into<String>,
        file_path: impl Into<String>,
        line_start: u32,
        line_end: u32,
        language: Language,
    ) -> Self {
        let name = name.into();
        let file_path = file_path.into();
        let id = Self::make_id(&file_path, kind, &name, line_start);
        Self {
            id,
            kind,
            name,
            file_path,
            line_start,
            line_end,
            language,
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: serde_json::Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    /// Dotted owner qualification: `Owner.member` for class/interface members.
    pub fn owner_qualified(owner: &str, member: &str) -> String {
        format!("{owner}.{member}")
    }
}

// ---------------------------------------------------------------------------
// Edge
// ---------------------------------------------------------------------------

/// Prefix used for unresolved symbolic edge targets: `ref:<category>:<name>`.
pub const REF_PREFIX: &str = "ref:";

/// Category tags used inside `ref:<category>:<name>` placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefCategory {
    Class,
    Interface,
    Function,
    Method,
    Module,
}

impl RefCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Function => "function",
            Self::Method => "method",
            Self::Module => "module",
        }
    }
}

/// Build a `ref:<category>:<name>` placeholder target.
pub fn make_ref(category: RefCategory, name: &str) -> String {
    format!("{}{}:{}", REF_PREFIX, category.as_str(), name)
}

/// Whether a target id is an unresolved placeholder.
pub fn is_unresolved_target(target_id: &str) -> bool {
    target_id.starts_with(REF_PREFIX)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Edge {
    pub fn make_id(source_id: &str, target_id: &str, kind: EdgeKind) -> String {
        hash_prefix(&[source_id, target_id, kind.as_str()])
    }

    pub fn new(source_id: impl Into<String>, target_id: impl Into<String>, kind: EdgeKind) -> Self {
        let source_id = source_id.into();
        let target_id = target_id.into();
        let id = Self::make_id(&source_id, &target_id, kind);
        Self {
            id,
            source_id,
            target_id,
            kind,
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: serde_json::Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    pub fn is_unresolved(&self) -> bool {
        is_unresolved_target(&self.target_id)
            || self
                .metadata
                .get("unresolved")
                .and_then(|v| v.as_bool())
                .unwrap_or(false)
    }

    pub fn target_name(&self) -> Option<&str> {
        self.metadata.get("targetName").and_then(|v| v.as_str())
    }
}

// ---------------------------------------------------------------------------
// FileHash / ProjectConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileHash {
    pub path: String,
    pub hash: String,
    pub last_modified: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    pub languages: Vec<Language>,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default = "default_auto_sync")]
    pub auto_sync: bool,
}

fn default_auto_sync() -> bool {
    true
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            languages: vec![
                Language::TypeScript,
                Language::JavaScript,
                Language::Python,
                Language::Java,
            ],
            include: vec!["**/*".to_string()],
            exclude: vec![
                ".git/**".to_string(),
                "node_modules/**".to_string(),
                "target/**".to_string(),
                "dist/**".to_string(),
                "build/**".to_string(),
                ".code-graph/**".to_string(),
            ],
            auto_sync: true,
        }
    }
}
