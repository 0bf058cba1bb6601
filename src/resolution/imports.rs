//! Specifier-matching helpers for the Resolver's "module match" rule
//! (§4.4): deciding whether a source file's import specifier plausibly
//! refers to a given candidate file path.
//!
//! `is_relative_import`/`normalize_path` handle specifier normalisation;
//! `module_matches` generalises extension-probing from "find the one
//! indexed file" to "does this candidate file match", since the Resolver
//! scores candidates rather than short-circuiting on the first hit.

use std::path::{Component, Path, PathBuf};

/// Extensions probed when comparing a relative specifier against a
/// candidate path, one per supported language plus its barrel-file form.
const EXTENSIONS: &[&str] = &[
    "", ".ts", ".tsx", ".js", ".jsx", ".mjs", ".cjs", ".py", ".java",
    "/index.ts", "/index.tsx", "/index.js", "/index.jsx",
];

/// Whether an import specifier is relative (`./foo`, `../foo`) as opposed to
/// a bare package/module name.
pub fn is_relative_import(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../")
}

/// Resolve `.` and `..` path components away: `a/b/../c/./d` -> `a/c/d`.
pub fn normalize_path(path: &str) -> String {
    let pb = PathBuf::from(path);
    let mut components: Vec<String> = Vec::new();
    for component in pb.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                components.pop();
            }
            Component::Normal(s) => components.push(s.to_string_lossy().to_string()),
            _ => {}
        }
    }
    components.join("/")
}

/// §4.4 "Module match": does `candidate_file` plausibly correspond to
/// `specifier`, imported from `importing_file`?
///
/// Non-relative specifiers match by substring containment (directory
/// separators preserved). Relative specifiers are normalised against the
/// importing file's directory and compared against the candidate with and
/// without a known extension, as a prefix or full match.
pub fn module_matches(importing_file: &str, specifier: &str, candidate_file: &str) -> bool {
    if !is_relative_import(specifier) {
        return candidate_file.contains(specifier);
    }

    let importing_dir = Path::new(importing_file)
        .parent()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_default();
    let joined = if importing_dir.is_empty() {
        specifier.to_string()
    } else {
        format!("{importing_dir}/{specifier}")
    };
    let normalized = normalize_path(&joined);

    for ext in EXTENSIONS {
        let candidate_specifier = format!("{normalized}{ext}");
        if candidate_file == candidate_specifier
            || candidate_file.starts_with(&format!("{candidate_specifier}/"))
            || candidate_specifier.ends_with(candidate_file)
        {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_resolves_dotdot() {
        assert_eq!(normalize_path("src/routes/../utils/auth"), "src/utils/auth");
    }

    #[test]
    fn normalize_resolves_dot() {
        assert_eq!(normalize_path("src/./utils/./auth"), "src/utils/auth");
    }

    #[test]
    fn skips_non_relative_imports() {
        assert!(!is_relative_import("express"));
        assert!(!is_relative_import("@types/node"));
        assert!(is_relative_import("./utils"));
        assert!(is_relative_import("../helpers"));
    }

    #[test]
    fn resolves_relative_ts_import() {
        assert!(module_matches("src/main.ts", "./utils", "src/utils.ts"));
        assert!(!module_matches("src/main.ts", "./utils", "src/other.ts"));
    }

    #[test]
    fn resolves_dotdot_import() {
        assert!(module_matches(
            "src/routes/api.ts",
            "../utils/auth",
            "src/utils/auth.ts"
        ));
    }

    #[test]
    fn resolves_index_barrel() {
        assert!(module_matches("src/main.ts", "./utils", "src/utils/index.ts"));
    }

    #[test]
    fn non_relative_matches_by_substring() {
        assert!(module_matches("src/main.ts", "components/button", "src/components/button.tsx"));
        assert!(!module_matches("src/main.ts", "express", "src/components/button.tsx"));
    }
}
