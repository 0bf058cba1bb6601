//! Crate-wide error type.
//!
//! Models the error taxonomy as variants rather than string tags: per-file
//! and per-request failures (`Parse`, `SymbolNotFound`, `BadArguments`) stay
//! local to their caller; only `NotInitialised` is meant to be user-visible
//! at the CLI/tool-server boundary.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("project not initialised: {path} not found (run `init` first)")]
    NotInitialised { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Db(#[from] rusqlite::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("symbol not found: {query}")]
    SymbolNotFound {
        query: String,
        suggestions: Vec<String>,
    },

    #[error("bad arguments: {message}")]
    BadArguments { message: String },

    #[error("{0}")]
    Other(String),
}

impl GraphError {
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    pub fn bad_arguments(message: impl Into<String>) -> Self {
        Self::BadArguments {
            message: message.into(),
        }
    }

    /// Whether this error represents a condition the tool server/CLI should
    /// surface directly to the user, as opposed to a per-file/per-request
    /// failure that stays local (§7 propagation rules).
    pub fn is_user_visible(&self) -> bool {
        matches!(self, Self::NotInitialised { .. })
    }
}

pub type Result<T> = std::result::Result<T, GraphError>;
