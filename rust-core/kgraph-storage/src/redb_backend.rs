// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// redb-backed persistent graph backend.
//
// Uses redb (pure Rust, B-tree, ACID, single-file database). No C/C++
// dependencies, so it builds on any platform with a Rust toolchain.
//
// # Storage Design
//
// Two tables, both keyed by position so that insertion order survives a
// round trip:
//
// 1. **`nodes`**: `u64` index to JSON-serialised `Node`
// 2. **`edges`**: `u64` index to JSON-serialised `Edge`
//
// `save_graph` drops and rewrites both tables inside one redb write
// transaction, so a save is all-or-nothing on this backend.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use kgraph_graph::{Edge, Graph, Node};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, TableError};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::backend::GraphBackend;
use crate::error::StorageError;

const NODES: TableDefinition<u64, &[u8]> = TableDefinition::new("nodes");
const EDGES: TableDefinition<u64, &[u8]> = TableDefinition::new("edges");

/// A persistent graph backend powered by redb.
///
/// # Example
///
/// ```rust,no_run
/// use kgraph_storage::redb_backend::RedbBackend;
/// use kgraph_storage::GraphBackend;
///
/// # tokio_test::block_on(async {
/// let store = RedbBackend::open("/tmp/kgraph-test.redb").unwrap();
/// let graph = store.load_graph().await.unwrap();
/// store.save_graph(&graph).await.unwrap();
/// # });
/// ```
pub struct RedbBackend {
    db: Arc<Database>,
    path: PathBuf,
}

impl RedbBackend {
    /// Open or create a redb database at the given path.
    ///
    /// Creates parent directories if they don't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(StorageError::Io)?;
        }

        let db = Database::create(&path).map_err(|e| {
            StorageError::BackendUnavailable(format!(
                "failed to open redb at {}: {}",
                path.display(),
                e
            ))
        })?;

        debug!(path = %path.display(), "opened redb graph backend");

        Ok(Self {
            db: Arc::new(db),
            path,
        })
    }

    /// Return the filesystem path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for RedbBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbBackend")
            .field("path", &self.path)
            .finish()
    }
}

/// Read every record of `table` in key order.
fn read_table<T: DeserializeOwned>(
    txn: &redb::ReadTransaction,
    table: TableDefinition<'static, u64, &'static [u8]>,
) -> Result<Vec<T>, StorageError> {
    let table = match txn.open_table(table) {
        Ok(t) => t,
        // Nothing has been saved yet
        Err(TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
        Err(e) => return Err(StorageError::BackendUnavailable(format!("open table: {e}"))),
    };

    let mut records = Vec::new();
    let iter = table
        .iter()
        .map_err(|e| StorageError::CorruptedData { line: 0, reason: format!("iter: {e}") })?;
    for entry in iter {
        let (key, value) = entry.map_err(|e| StorageError::CorruptedData {
            line: 0,
            reason: format!("entry: {e}"),
        })?;
        let record = serde_json::from_slice(value.value()).map_err(|e| {
            StorageError::CorruptedData {
                line: key.value() as usize + 1,
                reason: e.to_string(),
            }
        })?;
        records.push(record);
    }
    Ok(records)
}

#[async_trait]
impl GraphBackend for RedbBackend {
    async fn load_graph(&self) -> Result<Graph, StorageError> {
        let db = Arc::clone(&self.db);

        tokio::task::spawn_blocking(move || -> Result<Graph, StorageError> {
            let txn = db
                .begin_read()
                .map_err(|e| StorageError::BackendUnavailable(format!("read txn: {e}")))?;
            let nodes: Vec<Node> = read_table(&txn, NODES)?;
            let edges: Vec<Edge> = read_table(&txn, EDGES)?;
            Ok(Graph { nodes, edges })
        })
        .await
        .map_err(|e| StorageError::BackendUnavailable(format!("task join: {e}")))?
    }

    async fn save_graph(&self, graph: &Graph) -> Result<(), StorageError> {
        let db = Arc::clone(&self.db);
        let nodes = graph
            .nodes
            .iter()
            .map(serde_json::to_vec)
            .collect::<Result<Vec<_>, _>>()?;
        let edges = graph
            .edges
            .iter()
            .map(serde_json::to_vec)
            .collect::<Result<Vec<_>, _>>()?;

        tokio::task::spawn_blocking(move || -> Result<(), StorageError> {
            let txn = db
                .begin_write()
                .map_err(|e| StorageError::BackendUnavailable(format!("write txn: {e}")))?;

            for (def, rows) in [(NODES, &nodes), (EDGES, &edges)] {
                txn.delete_table(def)
                    .map_err(|e| StorageError::WriteFailed(format!("clear table: {e}")))?;
                let mut table = txn
                    .open_table(def)
                    .map_err(|e| StorageError::WriteFailed(format!("open table: {e}")))?;
                for (idx, row) in rows.iter().enumerate() {
                    table
                        .insert(idx as u64, row.as_slice())
                        .map_err(|e| StorageError::WriteFailed(format!("insert: {e}")))?;
                }
            }

            txn.commit()
                .map_err(|e| StorageError::WriteFailed(format!("commit: {e}")))?;
            Ok(())
        })
        .await
        .map_err(|e| StorageError::BackendUnavailable(format!("task join: {e}")))?
    }

    fn name(&self) -> &str {
        "redb"
    }
}
