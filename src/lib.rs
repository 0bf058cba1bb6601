//! CodeGraph — a persistent, queryable symbol graph for TypeScript/
//! JavaScript, Python and Java codebases, exposed as a CLI and an MCP tool
//! server for AI-assisted development workflows.

pub mod cli;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod graph;
pub mod indexer;
pub mod mcp;
pub mod observability;
pub mod resolution;
pub mod resolver;
pub mod scanner;
pub mod types;
pub mod watcher;
