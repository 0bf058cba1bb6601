//! Scanner / Reconciler (§4.3): walks a project tree (or a caller-supplied
//! file list), re-parses changed files, and reconciles the store so it
//! matches what's on disk — a file that vanishes is removed along with
//! every node/edge it owned.
//!
//! Walks the tree with the `ignore` crate's override-glob builder, then
//! splits work so the CPU-bound parse runs on a rayon pool while writes to
//! the `!Send` SQLite connection stay sequential.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use ignore::WalkBuilder;
use rayon::prelude::*;
use sha2::{Digest, Sha256};

use crate::error::{GraphError, Result};
use crate::graph::store::GraphStore;
use crate::indexer;
use crate::indexer::parser::CodeParser;
use crate::types::{FileHash, ProjectConfig};

/// `{processed, errors, deleted}` per §4.3's return shape, plus a
/// `skipped` counter for files whose content hash didn't change.
#[derive(Debug, Default)]
pub struct SyncStats {
    pub processed: usize,
    pub skipped: usize,
    pub deleted: usize,
    pub errors: Vec<(String, String)>,
}

impl SyncStats {
    fn merge(&mut self, other: SyncStats) {
        self.processed += other.processed;
        self.skipped += other.skipped;
        self.deleted += other.deleted;
        self.errors.extend(other.errors);
    }
}

pub struct Scanner<'a> {
    store: &'a GraphStore,
    root: PathBuf,
    config: ProjectConfig,
}

impl<'a> Scanner<'a> {
    pub fn new(store: &'a GraphStore, root: impl Into<PathBuf>, config: ProjectConfig) -> Self {
        Self {
            store,
            root: root.into(),
            config,
        }
    }

    /// Walk the whole project, re-parsing any file whose content hash
    /// changed and deleting store entries for files no longer on disk
    /// (§4.3 `fullSync`).
    pub fn full_sync(&self) -> Result<SyncStats> {
        let discovered = self.discover_files()?;
        let discovered_rel: HashSet<String> = discovered.iter().map(|p| self.relative(p)).collect();

        let mut stats = self.sync_files(&discovered)?;

        for hash in self.store.all_file_hashes()? {
            if !discovered_rel.contains(&hash.path) {
                self.store.delete_by_file(&hash.path)?;
                self.store.delete_file_hash(&hash.path)?;
                stats.deleted += 1;
            }
        }
        Ok(stats)
    }

    /// Re-parse exactly the given paths (absolute or relative to the
    /// project root). A path that no longer exists on disk is treated as a
    /// deletion rather than an error (§4.3 `update`).
    pub fn update(&self, paths: &[PathBuf]) -> Result<SyncStats> {
        let mut present = Vec::new();
        let mut stats = SyncStats::default();

        for path in paths {
            let absolute = if path.is_absolute() {
                path.clone()
            } else {
                self.root.join(path)
            };
            if absolute.is_file() {
                present.push(absolute);
            } else {
                let rel = self.relative(path);
                self.store.delete_by_file(&rel)?;
                self.store.delete_file_hash(&rel)?;
                stats.deleted += 1;
            }
        }

        stats.merge(self.sync_files(&present)?);
        Ok(stats)
    }

    /// Hash, skip-if-unchanged, extract, and write each file. The store's
    /// stored hashes are read up front, on the calling thread; reading file
    /// content, hashing it, comparing to that snapshot, and extracting all
    /// happen in parallel over pure, store-free data (§5 extractors are
    /// pure and side-effect-free). Store writes happen afterwards,
    /// sequentially, since `rusqlite`'s connection isn't `Sync` and cannot
    /// be touched from inside the rayon closure.
    fn sync_files(&self, files: &[PathBuf]) -> Result<SyncStats> {
        let mut known_hashes = std::collections::HashMap::new();
        for hash in self.store.all_file_hashes()? {
            known_hashes.insert(hash.path, hash.hash);
        }

        // Compute each path's project-relative form sequentially (it only
        // touches `self.root`, but keeping it off the rayon closure means
        // that closure never captures `self` — and `Scanner: !Sync`
        // because its `store: &GraphStore` field holds a non-`Sync`
        // `rusqlite::Connection`).
        let with_rel: Vec<(PathBuf, String)> =
            files.iter().map(|p| (p.clone(), self.relative(p))).collect();

        let results: Vec<(String, ExtractOutcome)> = with_rel
            .par_iter()
            .map(|(path, rel)| {
                let outcome = read_and_extract(path, rel, known_hashes.get(rel).map(String::as_str));
                (rel.clone(), outcome)
            })
            .collect();

        let mut stats = SyncStats::default();
        for (rel, outcome) in results {
            match outcome {
                ExtractOutcome::Unchanged => stats.skipped += 1,
                ExtractOutcome::Extracted { hash, result } => {
                    self.store.replace_file_data(&rel, &result.nodes, &result.edges)?;
                    self.store.set_file_hash(&FileHash {
                        path: rel,
                        hash,
                        last_modified: now_epoch(),
                    })?;
                    stats.processed += 1;
                }
                ExtractOutcome::Failed(message) => {
                    stats.errors.push((rel, message));
                }
            }
        }
        Ok(stats)
    }

    /// Every supported, non-excluded source file under the project root.
    fn discover_files(&self) -> Result<Vec<PathBuf>> {
        let exclude = build_gitignore(&self.root, &self.config.exclude)?;
        let include = if is_default_include(&self.config.include) {
            None
        } else {
            Some(build_gitignore(&self.root, &self.config.include)?)
        };

        let walker = WalkBuilder::new(&self.root)
            .standard_filters(true)
            .require_git(false)
            .build();

        let mut out = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(_) => continue,
            };
            if entry.file_type().map(|ft| ft.is_dir()).unwrap_or(true) {
                continue;
            }
            let path = entry.path();
            let rel = self.relative(path);
            if !CodeParser::is_supported(&rel) {
                continue;
            }
            if exclude.matched(path, false).is_ignore() {
                continue;
            }
            if let Some(include) = &include {
                if !include.matched(path, false).is_ignore() {
                    continue;
                }
            }
            out.push(path.to_path_buf());
        }
        Ok(out)
    }

    fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }
}

/// Read, hash, and (if changed) extract a single file. Takes the
/// previously-stored hash as a plain `Option<&str>` rather than reaching
/// into the store, so this can run inside a rayon closure.
fn read_and_extract(path: &Path, rel: &str, stored_hash: Option<&str>) -> ExtractOutcome {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return ExtractOutcome::Failed(e.to_string()),
    };
    let hash = hex::encode(Sha256::digest(content.as_bytes()));

    if stored_hash == Some(hash.as_str()) {
        return ExtractOutcome::Unchanged;
    }

    match indexer::extract(rel, &content) {
        Some(Ok(result)) => ExtractOutcome::Extracted { hash, result },
        Some(Err(e)) => ExtractOutcome::Failed(e.to_string()),
        None => ExtractOutcome::Unchanged,
    }
}

enum ExtractOutcome {
    Unchanged,
    Extracted {
        hash: String,
        result: indexer::common::ExtractResult,
    },
    Failed(String),
}

fn is_default_include(patterns: &[String]) -> bool {
    patterns.len() == 1 && patterns[0] == "**/*"
}

fn build_gitignore(root: &Path, patterns: &[String]) -> Result<Gitignore> {
    let mut builder = GitignoreBuilder::new(root);
    for pattern in patterns {
        builder
            .add_line(None, pattern)
            .map_err(|e| GraphError::other(e.to_string()))?;
    }
    builder.build().map_err(|e| GraphError::other(e.to_string()))
}

fn now_epoch() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
