//! MCP tool server — line-delimited JSON-RPC 2.0 over stdio (§6).
//!
//! Exposes the fixed 10-tool surface from §6's table over `rmcp`'s stdio
//! transport. No HTTP transport and no extra tools: git blame/history,
//! security scanning, dead-code analysis, and dataflow are all out of scope.

pub mod server;
pub mod tools_core;

pub use server::CodeGraphServer;
