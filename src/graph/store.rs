//! The persistent graph store: owns node/edge identity, indices, and
//! transactional batch writes over SQLite (§4.1).

use std::path::Path;

use rusqlite::Connection;
use serde::Serialize;

use crate::db::converters::{edge_from_row, node_from_row};
use crate::db::schema::initialize_database;
use crate::error::Result;
use crate::types::{is_unresolved_target, Edge, EdgeKind, Node, NodeKind};

const UPSERT_NODE_SQL: &str = "\
INSERT INTO nodes (id, type, name, file_path, start_line, end_line, language, metadata)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
ON CONFLICT(id) DO UPDATE SET
  type = excluded.type,
  name = excluded.name,
  file_path = excluded.file_path,
  start_line = excluded.start_line,
  end_line = excluded.end_line,
  language = excluded.language,
  metadata = excluded.metadata";

const UPSERT_EDGE_SQL: &str = "\
INSERT INTO edges (id, source_id, target_id, type, metadata)
VALUES (?1, ?2, ?3, ?4, ?5)
ON CONFLICT(id) DO UPDATE SET
  source_id = excluded.source_id,
  target_id = excluded.target_id,
  type = excluded.type,
  metadata = excluded.metadata";

const DELETE_EDGES_BY_FILE_SQL: &str = "\
DELETE FROM edges WHERE source_id IN (SELECT id FROM nodes WHERE file_path = ?1)
   OR target_id IN (SELECT id FROM nodes WHERE file_path = ?1)";

const DELETE_NODES_BY_FILE_SQL: &str = "DELETE FROM nodes WHERE file_path = ?1";

/// Summary counters returned by [`GraphStore::stats`].
#[derive(Debug, Clone, Serialize)]
pub struct GraphStats {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub total_files: usize,
    pub nodes_by_type: Vec<(String, usize)>,
    pub nodes_by_language: Vec<(String, usize)>,
    pub edges_by_type: Vec<(String, usize)>,
}

/// Resolution counters returned by [`GraphStore::resolution_stats`].
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ResolutionStats {
    pub total_edges: usize,
    pub unresolved_edges: usize,
    pub resolved_edges: usize,
}

/// Cross-file context for a single file, per §4.1 `fileContext`.
#[derive(Debug, Clone)]
pub struct FileContext {
    pub nodes_in_file: Vec<Node>,
    pub incoming_edges: Vec<Edge>,
    pub outgoing_edges: Vec<Edge>,
}

pub struct GraphStore {
    conn: Connection,
}

impl std::fmt::Debug for GraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphStore").finish_non_exhaustive()
    }
}

fn node_metadata_json(node: &Node) -> Result<String> {
    Ok(serde_json::to_string(&node.metadata)?)
}

fn edge_metadata_json(edge: &Edge) -> Result<String> {
    Ok(serde_json::to_string(&edge.metadata)?)
}

impl GraphStore {
    /// Open (or create) the graph database file at `db_path`.
    pub fn new(db_path: &Path) -> Result<Self> {
        let conn = initialize_database(db_path)?;
        Ok(Self { conn })
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    // -- writes -------------------------------------------------------

    fn upsert_node_in(tx: &Connection, node: &Node) -> Result<()> {
        let metadata = node_metadata_json(node)?;
        let mut stmt = tx.prepare_cached(UPSERT_NODE_SQL)?;
        stmt.execute(rusqlite::params![
            node.id,
            node.kind.as_str(),
            node.name,
            node.file_path,
            node.line_start,
            node.line_end,
            node.language.as_str(),
            metadata,
        ])?;
        Ok(())
    }

    fn upsert_edge_in(tx: &Connection, edge: &Edge) -> Result<()> {
        let metadata = edge_metadata_json(edge)?;
        let mut stmt = tx.prepare_cached(UPSERT_EDGE_SQL)?;
        stmt.execute(rusqlite::params![
            edge.id,
            edge.source_id,
            edge.target_id,
            edge.kind.as_str(),
            metadata,
        ])?;
        Ok(())
    }

    /// Insert or update a batch of nodes atomically. All-or-nothing: if any
    /// row fails, none of the batch's writes are visible (§4.1 failure
    /// semantics).
    pub fn upsert_nodes(&self, nodes: &[Node]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        for node in nodes {
            Self::upsert_node_in(&tx, node)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Insert or update a batch of edges atomically.
    pub fn upsert_edges(&self, edges: &[Edge]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        for edge in edges {
            Self::upsert_edge_in(&tx, edge)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Remove every node belonging to `file_path` and every edge incident to
    /// any of those nodes (in either direction), atomically. No edge is left
    /// referencing a node that no longer exists in that file (§3 invariant).
    pub fn delete_by_file(&self, file_path: &str) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(DELETE_EDGES_BY_FILE_SQL, [file_path])?;
        tx.execute(DELETE_NODES_BY_FILE_SQL, [file_path])?;
        tx.commit()?;
        Ok(())
    }

    /// Delete-then-insert a file's contents in one transaction — the only
    /// way a re-parse ever mutates stored data (§4.3: never in-place).
    pub fn replace_file_data(&self, file_path: &str, nodes: &[Node], edges: &[Edge]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(DELETE_EDGES_BY_FILE_SQL, [file_path])?;
        tx.execute(DELETE_NODES_BY_FILE_SQL, [file_path])?;
        for node in nodes {
            Self::upsert_node_in(&tx, node)?;
        }
        for edge in edges {
            Self::upsert_edge_in(&tx, edge)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Rewrite an edge's target, recording the prior target under
    /// `metadata.resolvedFrom` (§4.1 `updateEdgeTarget`).
    pub fn update_edge_target(&self, edge_id: &str, new_target: &str, still_unresolved: bool) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        let mut edge = {
            let mut stmt = tx.prepare_cached("SELECT * FROM edges WHERE id = ?1")?;
            stmt.query_row([edge_id], |row| Ok(edge_from_row(row)))?
        }?;
        edge.metadata.insert(
            "resolvedFrom".to_string(),
            serde_json::Value::String(edge.target_id.clone()),
        );
        edge.metadata.insert(
            "unresolved".to_string(),
            serde_json::Value::Bool(still_unresolved),
        );
        edge.target_id = new_target.to_string();
        Self::upsert_edge_in(&tx, &edge)?;
        tx.commit()?;
        Ok(())
    }

    /// Merge additional keys into an edge's metadata document.
    pub fn update_edge_metadata(&self, edge_id: &str, metadata: crate::types::Metadata) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        let mut edge = {
            let mut stmt = tx.prepare_cached("SELECT * FROM edges WHERE id = ?1")?;
            stmt.query_row([edge_id], |row| Ok(edge_from_row(row)))?
        }?;
        for (k, v) in metadata {
            edge.metadata.insert(k, v);
        }
        Self::upsert_edge_in(&tx, &edge)?;
        tx.commit()?;
        Ok(())
    }

    // -- reads ----------------------------------------------------------

    pub fn get_node(&self, id: &str) -> Result<Option<Node>> {
        let mut stmt = self.conn.prepare_cached("SELECT * FROM nodes WHERE id = ?1")?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(node_from_row(row)?)),
            None => Ok(None),
        }
    }

    pub fn get_by_file(&self, file_path: &str) -> Result<Vec<Node>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT * FROM nodes WHERE file_path = ?1 ORDER BY start_line")?;
        let mut rows = stmt.query([file_path])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(node_from_row(row)?);
        }
        Ok(out)
    }

    /// Every node in the store, in no particular order. Used by the
    /// Resolver to build its once-per-run symbol index (§4.4).
    pub fn all_nodes(&self) -> Result<Vec<Node>> {
        let mut stmt = self.conn.prepare_cached("SELECT * FROM nodes")?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(node_from_row(row)?);
        }
        Ok(out)
    }

    pub fn get_by_type(&self, kind: NodeKind) -> Result<Vec<Node>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT * FROM nodes WHERE type = ?1 ORDER BY file_path, start_line")?;
        let mut rows = stmt.query([kind.as_str()])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(node_from_row(row)?);
        }
        Ok(out)
    }

    /// Case-preserving substring match on `name`, ordered by name, capped
    /// at `limit` (default 100 at the call site).
    pub fn search_by_name(&self, substring: &str, limit: usize) -> Result<Vec<Node>> {
        let pattern = format!("%{}%", escape_like(substring));
        let mut stmt = self.conn.prepare_cached(
            "SELECT * FROM nodes WHERE name LIKE ?1 ESCAPE '\\' ORDER BY name LIMIT ?2",
        )?;
        let mut rows = stmt.query(rusqlite::params![pattern, limit as i64])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(node_from_row(row)?);
        }
        Ok(out)
    }

    /// All edges whose target is a `ref:` placeholder, or whose metadata
    /// explicitly marks them unresolved.
    pub fn get_unresolved_edges(&self) -> Result<Vec<Edge>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT * FROM edges WHERE target_id LIKE 'ref:%'")?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(edge_from_row(row)?);
        }

        // also include edges explicitly flagged unresolved via metadata
        // whose target_id happens not to carry the ref: prefix (e.g. a
        // stale pointer left after the source node it pointed to vanished).
        let mut stmt = self
            .conn
            .prepare_cached("SELECT * FROM edges WHERE target_id NOT LIKE 'ref:%'")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let edge = edge_from_row(row)?;
            if edge
                .metadata
                .get("unresolved")
                .and_then(|v| v.as_bool())
                .unwrap_or(false)
            {
                out.push(edge);
            }
        }
        Ok(out)
    }

    fn edges_where(&self, column: &str, value: &str, edge_type: Option<EdgeKind>) -> Result<Vec<Edge>> {
        let mut out = Vec::new();
        if let Some(kind) = edge_type {
            let sql = format!("SELECT * FROM edges WHERE {column} = ?1 AND type = ?2");
            let mut stmt = self.conn.prepare_cached(&sql)?;
            let mut rows = stmt.query(rusqlite::params![value, kind.as_str()])?;
            while let Some(row) = rows.next()? {
                out.push(edge_from_row(row)?);
            }
        } else {
            let sql = format!("SELECT * FROM edges WHERE {column} = ?1");
            let mut stmt = self.conn.prepare_cached(&sql)?;
            let mut rows = stmt.query([value])?;
            while let Some(row) = rows.next()? {
                out.push(edge_from_row(row)?);
            }
        }
        Ok(out)
    }

    pub fn out_edges(&self, node_id: &str, edge_type: Option<EdgeKind>) -> Result<Vec<Edge>> {
        self.edges_where("source_id", node_id, edge_type)
    }

    pub fn in_edges(&self, node_id: &str, edge_type: Option<EdgeKind>) -> Result<Vec<Edge>> {
        self.edges_where("target_id", node_id, edge_type)
    }

    /// Resolved `calls` edges pointing at `node_id` (its callers).
    pub fn resolved_callers_of(&self, node_id: &str) -> Result<Vec<Edge>> {
        Ok(self
            .in_edges(node_id, Some(EdgeKind::Calls))?
            .into_iter()
            .filter(|e| !is_unresolved_target(&e.target_id))
            .collect())
    }

    /// Resolved `calls` edges originating at `node_id` (its callees),
    /// excluding any edge still pointing at a `ref:` placeholder.
    pub fn resolved_callees_of(&self, node_id: &str) -> Result<Vec<Edge>> {
        Ok(self
            .out_edges(node_id, Some(EdgeKind::Calls))?
            .into_iter()
            .filter(|e| !is_unresolved_target(&e.target_id))
            .collect())
    }

    /// Cross-file view of a file: its nodes, plus incoming/outgoing edges
    /// that cross the file boundary (edges entirely within the file are
    /// excluded).
    pub fn file_context(&self, file_path: &str) -> Result<FileContext> {
        let nodes_in_file = self.get_by_file(file_path)?;
        let ids: std::collections::HashSet<&str> =
            nodes_in_file.iter().map(|n| n.id.as_str()).collect();

        let mut incoming = Vec::new();
        let mut outgoing = Vec::new();
        for node in &nodes_in_file {
            for edge in self.in_edges(&node.id, None)? {
                if !ids.contains(edge.source_id.as_str()) {
                    incoming.push(edge);
                }
            }
            for edge in self.out_edges(&node.id, None)? {
                if !ids.contains(edge.target_id.as_str()) {
                    outgoing.push(edge);
                }
            }
        }
        Ok(FileContext {
            nodes_in_file,
            incoming_edges: incoming,
            outgoing_edges: outgoing,
        })
    }

    pub fn node_count(&self) -> Result<usize> {
        let mut stmt = self.conn.prepare_cached("SELECT count(*) FROM nodes")?;
        Ok(stmt.query_row([], |row| row.get::<_, i64>(0))? as usize)
    }

    pub fn edge_count(&self) -> Result<usize> {
        let mut stmt = self.conn.prepare_cached("SELECT count(*) FROM edges")?;
        Ok(stmt.query_row([], |row| row.get::<_, i64>(0))? as usize)
    }

    pub fn file_count(&self) -> Result<usize> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT count(DISTINCT file_path) FROM nodes")?;
        Ok(stmt.query_row([], |row| row.get::<_, i64>(0))? as usize)
    }

    fn counts_by(&self, table: &str, column: &str) -> Result<Vec<(String, usize)>> {
        let sql = format!("SELECT {column}, count(*) FROM {table} GROUP BY {column} ORDER BY {column}");
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let key: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            out.push((key, count as usize));
        }
        Ok(out)
    }

    pub fn stats(&self) -> Result<GraphStats> {
        Ok(GraphStats {
            total_nodes: self.node_count()?,
            total_edges: self.edge_count()?,
            total_files: self.file_count()?,
            nodes_by_type: self.counts_by("nodes", "type")?,
            nodes_by_language: self.counts_by("nodes", "language")?,
            edges_by_type: self.counts_by("edges", "type")?,
        })
    }

    /// `resolved_count = total_edges - count(edges where targetId starts
    /// with "ref:")` (§3 invariant, §8 placeholder accounting).
    pub fn resolution_stats(&self) -> Result<ResolutionStats> {
        let total_edges = self.edge_count()?;
        let mut stmt = self
            .conn
            .prepare_cached("SELECT count(*) FROM edges WHERE target_id LIKE 'ref:%'")?;
        let unresolved = stmt.query_row([], |row| row.get::<_, i64>(0))? as usize;
        Ok(ResolutionStats {
            total_edges,
            unresolved_edges: unresolved,
            resolved_edges: total_edges - unresolved,
        })
    }

    // -- config / file-hash bookkeeping ---------------------------------

    pub fn get_file_hash(&self, path: &str) -> Result<Option<crate::types::FileHash>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT path, hash, last_modified FROM file_hashes WHERE path = ?1")?;
        let mut rows = stmt.query([path])?;
        match rows.next()? {
            Some(row) => Ok(Some(crate::types::FileHash {
                path: row.get(0)?,
                hash: row.get(1)?,
                last_modified: row.get(2)?,
            })),
            None => Ok(None),
        }
    }

    pub fn set_file_hash(&self, record: &crate::types::FileHash) -> Result<()> {
        self.conn.execute(
            "INSERT INTO file_hashes (path, hash, last_modified) VALUES (?1, ?2, ?3)
             ON CONFLICT(path) DO UPDATE SET hash = excluded.hash, last_modified = excluded.last_modified",
            rusqlite::params![record.path, record.hash, record.last_modified],
        )?;
        Ok(())
    }

    pub fn delete_file_hash(&self, path: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM file_hashes WHERE path = ?1", [path])?;
        Ok(())
    }

    pub fn all_file_hashes(&self) -> Result<Vec<crate::types::FileHash>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT path, hash, last_modified FROM file_hashes")?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(crate::types::FileHash {
                path: row.get(0)?,
                hash: row.get(1)?,
                last_modified: row.get(2)?,
            });
        }
        Ok(out)
    }

    pub fn set_config(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO config (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            rusqlite::params![key, value],
        )?;
        Ok(())
    }

    pub fn get_config(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT value FROM config WHERE key = ?1")?;
        let mut rows = stmt.query([key])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }
}

fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}
