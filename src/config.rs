//! On-disk project layout (§6): `.code-graph/config.json`,
//! `.code-graph/graph.db`, `.code-graph/.gitignore`. [`ProjectConfig`]
//! itself lives in [`crate::types`] (it is also the in-store `config` row
//! payload, per §4.1); this module owns reading and writing it as JSON.

use std::path::{Path, PathBuf};

use crate::error::{GraphError, Result};
use crate::types::ProjectConfig;

/// Directory name, relative to a project root, holding the store and config.
pub const CODE_GRAPH_DIR: &str = ".code-graph";
const CONFIG_FILE: &str = "config.json";
const DB_FILE: &str = "graph.db";
const GITIGNORE_CONTENTS: &str = "graph.db\ngraph.db-wal\ngraph.db-shm\nlogs/\n";

/// Paths to the pieces of a project's `.code-graph/` directory.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub code_graph_dir: PathBuf,
    pub config_path: PathBuf,
    pub db_path: PathBuf,
}

impl ProjectPaths {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        let root = project_root.into();
        let code_graph_dir = root.join(CODE_GRAPH_DIR);
        Self {
            config_path: code_graph_dir.join(CONFIG_FILE),
            db_path: code_graph_dir.join(DB_FILE),
            code_graph_dir,
            root,
        }
    }

    pub fn is_initialised(&self) -> bool {
        self.config_path.is_file()
    }

    /// Error out with `NotInitialised` unless `.code-graph/config.json`
    /// exists (§7 error taxonomy: the one user-visible CLI-level error).
    pub fn require_initialised(&self) -> Result<()> {
        if self.is_initialised() {
            Ok(())
        } else {
            Err(GraphError::NotInitialised {
                path: self.config_path.clone(),
            })
        }
    }
}

/// Create `.code-graph/` with a default (or caller-supplied) config, a
/// freshly initialised store file, and a `.gitignore` that excludes the
/// store and its WAL/SHM side files plus logs.
///
/// `force`: overwrite an existing config rather than erroring.
pub fn init_project(project_root: &Path, config: ProjectConfig, force: bool) -> Result<ProjectPaths> {
    let paths = ProjectPaths::new(project_root);
    if paths.is_initialised() && !force {
        return Err(GraphError::bad_arguments(format!(
            "{} already exists (use --force to reinitialise)",
            paths.config_path.display()
        )));
    }
    std::fs::create_dir_all(&paths.code_graph_dir)?;
    save_config(&paths, &config)?;
    std::fs::write(paths.code_graph_dir.join(".gitignore"), GITIGNORE_CONTENTS)?;
    // Touch the store so `status`/`query` against a freshly-init'd project
    // see an empty-but-valid database rather than a missing file.
    crate::db::schema::initialize_database(&paths.db_path)?;
    Ok(paths)
}

pub fn load_config(paths: &ProjectPaths) -> Result<ProjectConfig> {
    paths.require_initialised()?;
    let raw = std::fs::read_to_string(&paths.config_path)?;
    Ok(serde_json::from_str(&raw)?)
}

pub fn save_config(paths: &ProjectPaths, config: &ProjectConfig) -> Result<()> {
    let raw = serde_json::to_string_pretty(config)?;
    std::fs::write(&paths.config_path, raw)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn init_creates_expected_layout() {
        let dir = tempdir().unwrap();
        let paths = init_project(dir.path(), ProjectConfig::default(), false).unwrap();
        assert!(paths.config_path.is_file());
        assert!(paths.db_path.is_file());
        assert!(paths.code_graph_dir.join(".gitignore").is_file());
    }

    #[test]
    fn init_refuses_to_overwrite_without_force() {
        let dir = tempdir().unwrap();
        init_project(dir.path(), ProjectConfig::default(), false).unwrap();
        let err = init_project(dir.path(), ProjectConfig::default(), false).unwrap_err();
        assert!(matches!(err, GraphError::BadArguments { .. }));
    }

    #[test]
    fn init_force_overwrites() {
        let dir = tempdir().unwrap();
        init_project(dir.path(), ProjectConfig::default(), false).unwrap();
        init_project(dir.path(), ProjectConfig::default(), true).unwrap();
    }

    #[test]
    fn require_initialised_errors_on_missing_project() {
        let dir = tempdir().unwrap();
        let paths = ProjectPaths::new(dir.path());
        assert!(matches!(
            paths.require_initialised(),
            Err(GraphError::NotInitialised { .. })
        ));
    }

    #[test]
    fn load_config_roundtrips() {
        let dir = tempdir().unwrap();
        let mut config = ProjectConfig::default();
        config.auto_sync = false;
        let paths = init_project(dir.path(), config, false).unwrap();
        let loaded = load_config(&paths).unwrap();
        assert!(!loaded.auto_sync);
    }
}
