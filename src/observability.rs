//! Structured logging (`tracing`) and the MCP tool-server's optional
//! request/response JSONL audit log (§6 environment variables, §7 "the
//! logger must never take down the server").

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Initialise structured logging with `RUST_LOG` support. Defaults to
/// `code_graph=info` when unset. Safe to call more than once (subsequent
/// calls are silently ignored).
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("code_graph=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}

/// Reject a tool-supplied relative path that would escape `project_root`
/// once joined and canonicalised.
pub fn validate_path(path: &str, project_root: &Path) -> Result<PathBuf, String> {
    let requested = project_root.join(path);
    let canonical = requested
        .canonicalize()
        .map_err(|e| format!("path not found: {path}: {e}"))?;
    let root_canonical = project_root
        .canonicalize()
        .map_err(|e| format!("invalid project root: {e}"))?;
    if !canonical.starts_with(&root_canonical) {
        return Err(format!("path traversal detected: {path} escapes project root"));
    }
    Ok(canonical)
}

// ---------------------------------------------------------------------------
// MCP request/response JSONL log (§6)
// ---------------------------------------------------------------------------

/// One line of the `$HOME/.code-graph/logs/mcp-YYYY-MM-DD.jsonl` audit log.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct McpLogRecord<'a> {
    pub timestamp: String,
    #[serde(rename = "type")]
    pub kind: &'a str,
    pub tool: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    pub token_estimate: Option<usize>,
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Whether `$CODE_GRAPH_LOG` is set truthy — gates whether the tool server
/// writes JSONL request/response records at all.
pub fn logging_enabled() -> bool {
    env_truthy("CODE_GRAPH_LOG")
}

/// Whether `$CODE_GRAPH_LOG_CONSOLE` is set truthy — mirrors records to
/// stderr in addition to the JSONL file.
pub fn console_mirror_enabled() -> bool {
    env_truthy("CODE_GRAPH_LOG_CONSOLE")
}

fn env_truthy(name: &str) -> bool {
    std::env::var(name)
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(false)
}

/// The log file path for "now": `$HOME/.code-graph/logs/mcp-YYYY-MM-DD.jsonl`.
pub fn log_path_for(now: chrono::DateTime<chrono::Utc>) -> Option<PathBuf> {
    let home = directories::BaseDirs::new()?.home_dir().to_path_buf();
    Some(
        home.join(".code-graph")
            .join("logs")
            .join(format!("mcp-{}.jsonl", now.format("%Y-%m-%d"))),
    )
}

/// Append one record to today's JSONL log, truncating `result` to 2000
/// chars (§6). A log-write failure is reported to stderr and swallowed —
/// the logger must never take the server down (§7).
pub fn log_mcp_call(record: &McpLogRecord) {
    if !logging_enabled() {
        return;
    }
    if console_mirror_enabled() {
        if let Ok(line) = serde_json::to_string(record) {
            eprintln!("{line}");
        }
    }
    if let Err(e) = append_log_line(record) {
        eprintln!("code-graph: failed to write mcp log: {e}");
    }
}

fn append_log_line(record: &McpLogRecord) -> std::io::Result<()> {
    let now = now_utc();
    let Some(path) = log_path_for(now) else {
        return Ok(());
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    let line = serde_json::to_string(record)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    writeln!(file, "{line}")
}

/// Truncate a result payload to at most 2000 chars for the audit log (§6).
pub fn truncate_result(result: &str) -> String {
    if result.chars().count() <= 2000 {
        result.to_string()
    } else {
        let head: String = result.chars().take(2000).collect();
        format!("{head}... (truncated)")
    }
}

pub fn now_utc() -> chrono::DateTime<chrono::Utc> {
    chrono::Utc::now()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn validate_path_rejects_escape() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/file.txt"), "x").unwrap();
        assert!(validate_path("sub/file.txt", dir.path()).is_ok());
        assert!(validate_path("../../../../etc/passwd", dir.path()).is_err());
    }

    #[test]
    fn truncate_result_caps_at_2000() {
        let long = "a".repeat(3000);
        assert!(truncate_result(&long).len() < 3000);
        let short = "a".repeat(10);
        assert_eq!(truncate_result(&short), short);
    }
}
