// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Mutation and search capabilities
//!
//! Each entity kind (node, edge, metadata) has a manager trait that validates
//! a batch against the active transaction's working snapshot, applies it, and
//! registers the rollback actions that undo it. Search is read-only and works
//! on whatever graph the caller hands it.
//!
//! The `Default*` implementations are what [`KnowledgeGraph::new`] wires in;
//! the builder accepts any other implementation of the same trait.
//!
//! [`KnowledgeGraph::new`]: crate::KnowledgeGraph::new

mod edge;
mod metadata;
mod node;
mod search;

pub use edge::DefaultEdgeManager;
pub use metadata::DefaultMetadataManager;
pub use node::DefaultNodeManager;
pub use search::DefaultSearchManager;

use async_trait::async_trait;
use kgraph_graph::{
    Edge, EdgeFilter, EdgeUpdate, Graph, GraphSlice, MetadataAdded, MetadataAddition,
    MetadataDeletion, Node, NodeUpdate,
};

use crate::error::Result;
use crate::transaction::TransactionManager;

/// Node mutations against the working snapshot.
#[async_trait]
pub trait NodeManager: Send + Sync {
    /// Add new nodes. Returns the nodes as stored.
    async fn add_nodes(&self, txn: &TransactionManager, nodes: Vec<Node>) -> Result<Vec<Node>>;

    /// Replace the provided fields of existing nodes. Returns each node after
    /// its update.
    async fn update_nodes(
        &self,
        txn: &TransactionManager,
        updates: Vec<NodeUpdate>,
    ) -> Result<Vec<Node>>;

    /// Delete nodes by name, together with every incident edge.
    async fn delete_nodes(&self, txn: &TransactionManager, names: Vec<String>) -> Result<()>;
}

/// Edge mutations against the working snapshot.
#[async_trait]
pub trait EdgeManager: Send + Sync {
    async fn add_edges(&self, txn: &TransactionManager, edges: Vec<Edge>) -> Result<Vec<Edge>>;

    /// Returns the edges as they are after the update.
    async fn update_edges(
        &self,
        txn: &TransactionManager,
        updates: Vec<EdgeUpdate>,
    ) -> Result<Vec<Edge>>;

    async fn delete_edges(&self, txn: &TransactionManager, edges: Vec<Edge>) -> Result<()>;

    /// Edges of `graph` matching `filter`, in graph order.
    fn get_edges(&self, graph: &Graph, filter: &EdgeFilter) -> Vec<Edge>;
}

/// Metadata mutations against the working snapshot.
#[async_trait]
pub trait MetadataManager: Send + Sync {
    async fn add_metadata(
        &self,
        txn: &TransactionManager,
        additions: Vec<MetadataAddition>,
    ) -> Result<Vec<MetadataAdded>>;

    async fn delete_metadata(
        &self,
        txn: &TransactionManager,
        deletions: Vec<MetadataDeletion>,
    ) -> Result<()>;
}

/// Read-only lookup over a graph. Never fails for "no matches".
pub trait SearchManager: Send + Sync {
    fn search_nodes(&self, graph: &Graph, query: &str) -> GraphSlice;

    fn open_nodes(&self, graph: &Graph, names: &[String]) -> GraphSlice;
}
