//! MCP server implementation using `rmcp` over stdio transport.
//!
//! Exposes exactly the 10 tools in §6's table; every tool method is a
//! one-liner delegating to [`super::tools_core`]'s router/handler split.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use schemars::JsonSchema;
use serde::Deserialize;

use crate::graph::store::GraphStore;
use crate::observability::{self, McpLogRecord};

/// CodeGraph MCP server.
///
/// Wraps a `GraphStore` in `Arc<Mutex<>>` to satisfy `Clone + Send + Sync`
/// while keeping every graph operation synchronous internally — no request
/// ever holds the store's write handle across an await point (§9).
#[derive(Clone)]
pub struct CodeGraphServer {
    store: Arc<Mutex<GraphStore>>,
    project_root: PathBuf,
    tool_router: rmcp::handler::server::router::tool::ToolRouter<Self>,
}

impl std::fmt::Debug for CodeGraphServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeGraphServer")
            .field("project_root", &self.project_root)
            .finish()
    }
}

/// Run one tool handler, timing it and writing a request/response pair to
/// the JSONL audit log when `$CODE_GRAPH_LOG` is set (§6, §7: a log-write
/// failure must never take the server down).
fn audited<F>(tool: &str, arguments: serde_json::Value, f: F) -> String
where
    F: FnOnce() -> crate::error::Result<serde_json::Value>,
{
    let started = Instant::now();
    if observability::logging_enabled() {
        observability::log_mcp_call(&McpLogRecord {
            timestamp: observability::now_utc().to_rfc3339(),
            kind: "request",
            tool,
            arguments: Some(arguments.clone()),
            result: None,
            token_estimate: None,
            duration_ms: None,
            error: None,
        });
    }

    let outcome = f();
    let duration_ms = started.elapsed().as_millis() as u64;
    let text = match &outcome {
        Ok(value) => serde_json::to_string(value).unwrap_or_else(|_| "null".to_string()),
        Err(err) => serde_json::json!({ "error": err.to_string(), "isError": true }).to_string(),
    };

    if observability::logging_enabled() {
        observability::log_mcp_call(&McpLogRecord {
            timestamp: observability::now_utc().to_rfc3339(),
            kind: "response",
            tool,
            arguments: None,
            result: Some(observability::truncate_result(&text)),
            token_estimate: Some(text.len() / 4),
            duration_ms: Some(duration_ms),
            error: outcome.as_ref().err().map(|e| e.to_string()),
        });
    }

    text
}

impl CodeGraphServer {
    pub fn new(store: GraphStore, project_root: PathBuf) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            project_root,
            tool_router: Self::tool_router(),
        }
    }

    fn locked(&self) -> std::sync::MutexGuard<'_, GraphStore> {
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// ---------------------------------------------------------------------------
// Tool parameter structs
// ---------------------------------------------------------------------------

#[derive(Deserialize, JsonSchema)]
pub(crate) struct FileContextParams {
    /// Project-relative path of the file to inspect.
    pub file_path: String,
    /// Unused by this single-project server; accepted for protocol parity.
    pub project_path: Option<String>,
}

#[derive(Deserialize, JsonSchema)]
pub(crate) struct SearchSymbolsParams {
    /// Substring to search node names for.
    pub query: String,
    pub project_path: Option<String>,
}

#[derive(Deserialize, JsonSchema)]
pub(crate) struct FindReferencesParams {
    /// Exact or best-effort symbol name.
    pub symbol: String,
    pub project_path: Option<String>,
}

#[derive(Deserialize, JsonSchema)]
pub(crate) struct CallGraphParams {
    pub function_name: String,
    pub project_path: Option<String>,
}

#[derive(Deserialize, JsonSchema)]
pub(crate) struct ByTypeParams {
    /// One of: file, class, interface, function, method, variable, import,
    /// export, module, controller, service, repository, component, bean,
    /// endpoint.
    pub node_type: String,
    pub project_path: Option<String>,
}

#[derive(Deserialize, JsonSchema)]
pub(crate) struct GraphStatsParams {
    pub project_path: Option<String>,
}

#[derive(Deserialize, JsonSchema)]
pub(crate) struct ImpactAnalysisParams {
    pub file_path: String,
    pub project_path: Option<String>,
}

#[derive(Deserialize, JsonSchema)]
pub(crate) struct SourceCodeParams {
    pub project_path: String,
    pub symbol_name: Option<String>,
    pub node_id: Option<String>,
    /// Lines of surrounding context on each side (default 0).
    pub context_lines: Option<u32>,
}

#[derive(Deserialize, JsonSchema)]
pub(crate) struct UsageExamplesParams {
    pub project_path: String,
    pub symbol_name: String,
    /// Default 5.
    pub max_examples: Option<usize>,
    /// Default 2.
    pub context_lines: Option<u32>,
}

#[derive(Deserialize, JsonSchema)]
pub(crate) struct EditingContextParams {
    pub project_path: String,
    pub file_path: String,
    pub task: Option<String>,
    /// Default 8000.
    pub max_tokens: Option<usize>,
    /// Default false.
    pub include_tests: Option<bool>,
}

// ---------------------------------------------------------------------------
// Tool implementations
// ---------------------------------------------------------------------------

#[tool_router]
impl CodeGraphServer {
    #[tool(
        description = "Get a file's symbols plus the edges that cross its boundary (incoming dependents, outgoing dependencies)."
    )]
    async fn get_file_context(&self, Parameters(p): Parameters<FileContextParams>) -> String {
        let store = self.locked();
        audited(
            "get_file_context",
            serde_json::json!({"file_path": p.file_path}),
            || super::tools_core::handle_get_file_context(&store, &p.file_path),
        )
    }

    #[tool(description = "Search node names by substring, capped at 100 results.")]
    async fn search_symbols(&self, Parameters(p): Parameters<SearchSymbolsParams>) -> String {
        let store = self.locked();
        audited(
            "search_symbols",
            serde_json::json!({"query": p.query}),
            || super::tools_core::handle_search_symbols(&store, &p.query),
        )
    }

    #[tool(description = "Find every definition matching a symbol name plus its usage edges.")]
    async fn find_references(&self, Parameters(p): Parameters<FindReferencesParams>) -> String {
        let store = self.locked();
        audited(
            "find_references",
            serde_json::json!({"symbol": p.symbol}),
            || super::tools_core::handle_find_references(&store, &p.symbol),
        )
    }

    #[tool(description = "Get the callers and callees of the first function/method matching a name.")]
    async fn get_call_graph(&self, Parameters(p): Parameters<CallGraphParams>) -> String {
        let store = self.locked();
        audited(
            "get_call_graph",
            serde_json::json!({"function_name": p.function_name}),
            || super::tools_core::handle_get_call_graph(&store, &p.function_name),
        )
    }

    #[tool(description = "List every node of a given type (class, function, endpoint, ...).")]
    async fn get_by_type(&self, Parameters(p): Parameters<ByTypeParams>) -> String {
        let store = self.locked();
        audited(
            "get_by_type",
            serde_json::json!({"node_type": p.node_type}),
            || super::tools_core::handle_get_by_type(&store, &p.node_type),
        )
    }

    #[tool(description = "Get total node/edge/file counts, broken down by type and language.")]
    async fn get_graph_stats(&self, Parameters(_p): Parameters<GraphStatsParams>) -> String {
        let store = self.locked();
        audited("get_graph_stats", serde_json::json!({}), || {
            super::tools_core::handle_get_graph_stats(&store)
        })
    }

    #[tool(
        description = "Assess the blast radius of changing a file: its exports, the files that depend on it, and a risk level (high/medium/low)."
    )]
    async fn get_impact_analysis(&self, Parameters(p): Parameters<ImpactAnalysisParams>) -> String {
        let store = self.locked();
        audited(
            "get_impact_analysis",
            serde_json::json!({"file_path": p.file_path}),
            || super::tools_core::handle_get_impact_analysis(&store, &p.file_path),
        )
    }

    #[tool(
        description = "Read the source of a symbol (by name or node id) with optional surrounding context lines. Returns suggestions instead of an error when nothing matches."
    )]
    async fn get_source_code(&self, Parameters(p): Parameters<SourceCodeParams>) -> String {
        let store = self.locked();
        let root = PathBuf::from(&p.project_path);
        audited(
            "get_source_code",
            serde_json::json!({"symbol_name": p.symbol_name, "node_id": p.node_id}),
            || {
                super::tools_core::handle_get_source_code(
                    &store,
                    &root,
                    p.symbol_name.as_deref(),
                    p.node_id.as_deref(),
                    p.context_lines.unwrap_or(0),
                )
            },
        )
    }

    #[tool(description = "Show up to max_examples call sites of a symbol with surrounding context.")]
    async fn get_usage_examples(&self, Parameters(p): Parameters<UsageExamplesParams>) -> String {
        let store = self.locked();
        let root = PathBuf::from(&p.project_path);
        audited(
            "get_usage_examples",
            serde_json::json!({"symbol_name": p.symbol_name}),
            || {
                super::tools_core::handle_get_usage_examples(
                    &store,
                    &root,
                    &p.symbol_name,
                    p.max_examples.unwrap_or(5),
                    p.context_lines.unwrap_or(2),
                )
            },
        )
    }

    #[tool(
        description = "Assemble a token-budgeted editing context for a file: its source, imported symbols, dependent usages, related types, and (given a task) similar functions."
    )]
    async fn get_editing_context(&self, Parameters(p): Parameters<EditingContextParams>) -> String {
        let store = self.locked();
        let root = PathBuf::from(&p.project_path);
        audited(
            "get_editing_context",
            serde_json::json!({"file_path": p.file_path, "task": p.task}),
            || {
                super::tools_core::handle_get_editing_context(
                    &store,
                    &root,
                    &p.file_path,
                    p.task.as_deref(),
                    p.max_tokens,
                    p.include_tests.unwrap_or(false),
                )
            },
        )
    }
}

#[tool_handler]
impl ServerHandler for CodeGraphServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "code-graph: query the symbol graph of a TypeScript/JavaScript, Python, or Java \
                 project. Run `code-graph init` then `code-graph sync` against the project root \
                 before connecting, or pass an absolute project_path to each tool."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

/// Start the MCP server on stdin/stdout. Blocks until the client
/// disconnects.
pub async fn run_server(store: GraphStore, project_root: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let server = CodeGraphServer::new(store, project_root);
    let transport = rmcp::transport::io::stdio();
    let running = rmcp::ServiceExt::serve(server, transport)
        .await
        .inspect_err(|e| tracing::error!("MCP server error: {e}"))?;
    let _ = running.waiting().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::initialize_database;
    use tempfile::tempdir;

    #[test]
    fn server_constructs_over_an_empty_store() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("graph.db");
        initialize_database(&db_path).unwrap();
        let store = GraphStore::new(&db_path).unwrap();
        let server = CodeGraphServer::new(store, dir.path().to_path_buf());
        assert_eq!(server.project_root, dir.path());
    }

    #[test]
    fn get_info_advertises_tools_capability() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("graph.db");
        initialize_database(&db_path).unwrap();
        let store = GraphStore::new(&db_path).unwrap();
        let server = CodeGraphServer::new(store, dir.path().to_path_buf());
        let info = server.get_info();
        assert!(info.capabilities.tools.is_some());
    }
}
