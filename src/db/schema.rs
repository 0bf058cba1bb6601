//! SQLite schema for the graph store: four relations (`nodes`, `edges`,
//! `file_hashes`, `config`), indexed per §4.1. Foreign keys stay off: edges
//! legitimately point at `ref:` placeholders that have no row in `nodes`.

use rusqlite::Connection;

const CREATE_NODES: &str = "\
CREATE TABLE IF NOT EXISTS nodes (
  id TEXT PRIMARY KEY,
  type TEXT NOT NULL,
  name TEXT NOT NULL,
  file_path TEXT NOT NULL,
  start_line INTEGER NOT NULL,
  end_line INTEGER NOT NULL,
  language TEXT NOT NULL,
  metadata TEXT
)";

const CREATE_EDGES: &str = "\
CREATE TABLE IF NOT EXISTS edges (
  id TEXT PRIMARY KEY,
  source_id TEXT NOT NULL,
  target_id TEXT NOT NULL,
  type TEXT NOT NULL,
  metadata TEXT
)";

const CREATE_FILE_HASHES: &str = "\
CREATE TABLE IF NOT EXISTS file_hashes (
  path TEXT PRIMARY KEY,
  hash TEXT NOT NULL,
  last_modified INTEGER NOT NULL
)";

const CREATE_CONFIG: &str = "\
CREATE TABLE IF NOT EXISTS config (
  key TEXT PRIMARY KEY,
  value TEXT NOT NULL
)";

const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_nodes_file ON nodes(file_path)",
    "CREATE INDEX IF NOT EXISTS idx_nodes_type ON nodes(type)",
    "CREATE INDEX IF NOT EXISTS idx_nodes_name ON nodes(name)",
    "CREATE INDEX IF NOT EXISTS idx_edges_source ON edges(source_id)",
    "CREATE INDEX IF NOT EXISTS idx_edges_target ON edges(target_id)",
    "CREATE INDEX IF NOT EXISTS idx_edges_type ON edges(type)",
];

/// Open (creating if needed) the graph database at `db_path`, set its
/// pragmas, and ensure the schema exists. Idempotent: safe to call against
/// an already-initialised database.
pub fn initialize_database(db_path: &std::path::Path) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;

    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "OFF")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;

    conn.execute(CREATE_NODES, [])?;
    conn.execute(CREATE_EDGES, [])?;
    conn.execute(CREATE_FILE_HASHES, [])?;
    conn.execute(CREATE_CONFIG, [])?;

    for stmt in CREATE_INDEXES {
        conn.execute(stmt, [])?;
    }

    Ok(conn)
}

/// Apply the schema to an already-open connection (e.g. an in-memory
/// connection used in tests). Skips file-oriented pragmas that only make
/// sense for a WAL-backed file.
pub fn initialize_database_on(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "OFF")?;
    conn.execute(CREATE_NODES, [])?;
    conn.execute(CREATE_EDGES, [])?;
    conn.execute(CREATE_FILE_HASHES, [])?;
    conn.execute(CREATE_CONFIG, [])?;
    for stmt in CREATE_INDEXES {
        conn.execute(stmt, [])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_names(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap();
        stmt.query_map([], |row| row.get::<_, String>(0))
            .unwrap()
            .map(|r| r.unwrap())
            .collect()
    }

    #[test]
    fn creates_all_four_tables() {
        let conn = Connection::open_in_memory().unwrap();
        let conn = {
            // exercise the same statements initialize_database runs, since
            // that function opens its own file-backed connection
            conn.execute(CREATE_NODES, []).unwrap();
            conn.execute(CREATE_EDGES, []).unwrap();
            conn.execute(CREATE_FILE_HASHES, []).unwrap();
            conn.execute(CREATE_CONFIG, []).unwrap();
            conn
        };
        let names = table_names(&conn);
        assert!(names.contains(&"nodes".to_string()));
        assert!(names.contains(&"edges".to_string()));
        assert!(names.contains(&"file_hashes".to_string()));
        assert!(names.contains(&"config".to_string()));
    }

    #[test]
    fn initialize_database_sets_pragmas() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.db");
        let conn = initialize_database(&path).unwrap();
        let fk: i64 = conn
            .pragma_query_value(None, "foreign_keys", |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 0);
    }

    #[test]
    fn initialize_database_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.db");
        initialize_database(&path).unwrap();
        // reopening and re-initialising must not error
        initialize_database(&path).unwrap();
    }
}
