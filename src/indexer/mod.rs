//! Indexer: stateless per-language extractors (§4.2) plus the shared
//! tree-sitter parser wrapper and cross-extractor helpers.

pub mod common;
pub mod java;
pub mod parser;
pub mod python;
pub mod typescript;

use crate::error::Result;
use crate::indexer::common::ExtractResult;
use crate::types::Language;

/// Dispatch to the language-appropriate extractor based on file extension.
/// Returns `None` for files no extractor understands (the Scanner skips
/// these rather than treating them as an error).
pub fn extract(file_path: &str, content: &str) -> Option<Result<ExtractResult>> {
    let language = parser::CodeParser::detect_language(file_path)?;
    Some(match language {
        Language::TypeScript | Language::JavaScript => typescript::extract(file_path, content),
        Language::Python => python::extract(file_path, content),
        Language::Java => java::extract(file_path, content),
    })
}
