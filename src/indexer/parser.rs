//! Native tree-sitter parser wrapper, narrowed to the four supported
//! grammars. No stored state: `Parser` is `!Send`, so a fresh one is created
//! per call rather than wrestling with thread-safety wrappers — each
//! extractor invocation is synchronous and pure (§5).

use std::path::Path;

use crate::error::{GraphError, Result};
use crate::types::Language;

pub struct CodeParser;

impl Default for CodeParser {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, content: &str, language: Language) -> Result<tree_sitter::Tree> {
        let ts_lang = Self::ts_language(language);
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&ts_lang)
            .map_err(|e| GraphError::other(format!("language version mismatch: {e}")))?;
        parser.parse(content, None).ok_or_else(|| {
            GraphError::other("tree-sitter returned no tree (timeout or cancellation)")
        })
    }

    pub fn ts_language(language: Language) -> tree_sitter::Language {
        match language {
            Language::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Language::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            Language::Python => tree_sitter_python::LANGUAGE.into(),
            Language::Java => tree_sitter_java::LANGUAGE.into(),
        }
    }

    /// Detect a supported language purely from the file extension; `.ts`
    /// vs `.js`-family only ever changes the `language` field, never which
    /// extractor runs (§4.2.1).
    pub fn detect_language(file_path: &str) -> Option<Language> {
        let path = Path::new(file_path);
        let ext = path.extension()?.to_str()?;
        Language::from_extension(&format!(".{ext}"))
    }

    pub fn is_supported(file_path: &str) -> bool {
        Self::detect_language(file_path).is_some()
    }
}
