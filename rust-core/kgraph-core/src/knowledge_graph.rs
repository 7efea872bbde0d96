// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Knowledge Graph facade
//!
//! The single entry point composing the transaction manager, the three
//! mutation managers and the search manager.
//!
//! - Mutations called outside a transaction run in an implicit
//!   single-operation transaction, so each call commits or rolls back on its
//!   own.
//! - Mutations called inside a transaction join it.
//! - Reads inside a transaction see the working snapshot; outside they see
//!   the durable graph.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use kgraph_graph::{
    Edge, EdgeFilter, EdgeList, EdgeUpdate, Graph, GraphSlice, MetadataAdded, MetadataAddition,
    MetadataDeletion, Node, NodeUpdate,
};
use kgraph_storage::GraphBackend;
use tracing::{error, instrument, warn};

use crate::config::{ConfigError, KnowledgeGraphConfig};
use crate::error::Result;
use crate::managers::{
    DefaultEdgeManager, DefaultMetadataManager, DefaultNodeManager, DefaultSearchManager,
    EdgeManager, MetadataManager, NodeManager, SearchManager,
};
use crate::rollback::RollbackCommand;
use crate::transaction::{TransactionId, TransactionInfo, TransactionManager};

/// Transactional knowledge graph.
pub struct KnowledgeGraph {
    txn: TransactionManager,
    nodes: Box<dyn NodeManager>,
    edges: Box<dyn EdgeManager>,
    metadata: Box<dyn MetadataManager>,
    search: Box<dyn SearchManager>,
}

/// Builder for a [`KnowledgeGraph`] with non-default managers.
pub struct KnowledgeGraphBuilder {
    backend: Arc<dyn GraphBackend>,
    nodes: Box<dyn NodeManager>,
    edges: Box<dyn EdgeManager>,
    metadata: Box<dyn MetadataManager>,
    search: Box<dyn SearchManager>,
}

impl KnowledgeGraphBuilder {
    pub fn node_manager(mut self, manager: impl NodeManager + 'static) -> Self {
        self.nodes = Box::new(manager);
        self
    }

    pub fn edge_manager(mut self, manager: impl EdgeManager + 'static) -> Self {
        self.edges = Box::new(manager);
        self
    }

    pub fn metadata_manager(mut self, manager: impl MetadataManager + 'static) -> Self {
        self.metadata = Box::new(manager);
        self
    }

    pub fn search_manager(mut self, manager: impl SearchManager + 'static) -> Self {
        self.search = Box::new(manager);
        self
    }

    pub fn build(self) -> KnowledgeGraph {
        KnowledgeGraph {
            txn: TransactionManager::new(self.backend),
            nodes: self.nodes,
            edges: self.edges,
            metadata: self.metadata,
            search: self.search,
        }
    }
}

impl KnowledgeGraph {
    /// A graph over `backend` with the default managers.
    pub fn new(backend: Arc<dyn GraphBackend>) -> Self {
        Self::builder(backend).build()
    }

    pub fn builder(backend: Arc<dyn GraphBackend>) -> KnowledgeGraphBuilder {
        KnowledgeGraphBuilder {
            backend,
            nodes: Box::new(DefaultNodeManager),
            edges: Box::new(DefaultEdgeManager),
            metadata: Box::new(DefaultMetadataManager),
            search: Box::new(DefaultSearchManager::default()),
        }
    }

    /// Build the backend and managers described by `config`.
    pub fn open(config: &KnowledgeGraphConfig) -> std::result::Result<Self, ConfigError> {
        let backend = config.backend.open_backend()?;
        Ok(Self::builder(backend)
            .search_manager(DefaultSearchManager::new(config.search.max_results))
            .build())
    }

    pub fn transaction_manager(&self) -> &TransactionManager {
        &self.txn
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Transactions
    // ═══════════════════════════════════════════════════════════════════════

    /// Run `operation` atomically.
    ///
    /// Begins a transaction, runs `operation` with this graph, and commits
    /// if it succeeds. If it fails the transaction is rolled back and the
    /// original error returned; if some undo steps fail as well, the result
    /// is `RollbackAggregate` carrying the original error as its cause.
    ///
    /// A failed commit returns `CommitFailed`. The transaction has ended
    /// by then, so nothing is rolled back and durable state may be partial.
    ///
    /// Every exit leaves the manager Idle. If `operation` panics, the
    /// transaction is rolled back and the panic then resumes.
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use futures::FutureExt;
    /// use kgraph_core::KnowledgeGraph;
    /// use kgraph_graph::{Edge, Node};
    /// use kgraph_storage::InMemoryBackend;
    ///
    /// # tokio_test::block_on(async {
    /// let kg = KnowledgeGraph::new(Arc::new(InMemoryBackend::new()));
    /// let result = kg
    ///     .with_transaction(|kg| {
    ///         async move {
    ///             kg.add_nodes(vec![Node::new("x", "thing")]).await?;
    ///             kg.add_edges(vec![Edge::new("x", "y", "points_to")]).await
    ///         }
    ///         .boxed()
    ///     })
    ///     .await;
    ///
    /// assert!(result.is_err());
    /// assert!(kg.read_graph().await.unwrap().nodes.is_empty());
    /// # });
    /// ```
    #[instrument(skip_all)]
    pub async fn with_transaction<'a, T, F>(&'a self, operation: F) -> Result<T>
    where
        F: FnOnce(&'a Self) -> BoxFuture<'a, Result<T>>,
    {
        let id = self.txn.begin_transaction().await?;

        let outcome = AssertUnwindSafe(async move { operation(self).await })
            .catch_unwind()
            .await;
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(payload) => {
                if self.txn.is_in_transaction().await {
                    error!(transaction = %id, "Operation panicked; rolling back");
                    if let Err(rollback_err) = self.txn.rollback().await {
                        error!(transaction = %id, error = %rollback_err, "Rollback after panic was incomplete");
                    }
                }
                panic::resume_unwind(payload);
            }
        };

        match outcome {
            Ok(value) => {
                self.txn.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if !self.txn.is_in_transaction().await {
                    // The operation ended the transaction itself.
                    warn!(transaction = %id, error = %err, "Operation failed after leaving its transaction");
                    return Err(err);
                }
                warn!(transaction = %id, error = %err, "Operation failed; rolling back");
                match self.txn.rollback().await {
                    Ok(()) => Err(err),
                    Err(rollback_err) => Err(rollback_err.with_cause(err)),
                }
            }
        }
    }

    /// Join the active transaction, or wrap `operation` in its own.
    async fn mutate<'a, T, F>(&'a self, operation: F) -> Result<T>
    where
        F: FnOnce(&'a Self) -> BoxFuture<'a, Result<T>>,
    {
        if self.txn.is_in_transaction().await {
            operation(self).await
        } else {
            self.with_transaction(operation).await
        }
    }

    pub async fn begin_transaction(&self) -> Result<TransactionId> {
        self.txn.begin_transaction().await
    }

    pub async fn commit(&self) -> Result<()> {
        self.txn.commit().await
    }

    pub async fn rollback(&self) -> Result<()> {
        self.txn.rollback().await
    }

    /// Register a custom undo step with the active transaction.
    pub async fn add_rollback_action(
        &self,
        command: RollbackCommand,
        description: impl Into<String>,
    ) -> Result<()> {
        self.txn.add_rollback_action(command, description).await
    }

    pub async fn is_in_transaction(&self) -> bool {
        self.txn.is_in_transaction().await
    }

    /// The working snapshot of the active transaction; fails when Idle.
    pub async fn get_current_graph(&self) -> Result<Graph> {
        self.txn.current_graph().await
    }

    pub async fn transaction_info(&self) -> Option<TransactionInfo> {
        self.txn.transaction_info().await
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Mutations
    // ═══════════════════════════════════════════════════════════════════════

    #[instrument(skip(self, nodes), fields(count = nodes.len()))]
    pub async fn add_nodes(&self, nodes: Vec<Node>) -> Result<Vec<Node>> {
        self.mutate(move |kg| async move { kg.nodes.add_nodes(&kg.txn, nodes).await }.boxed())
            .await
    }

    #[instrument(skip(self, updates), fields(count = updates.len()))]
    pub async fn update_nodes(&self, updates: Vec<NodeUpdate>) -> Result<Vec<Node>> {
        self.mutate(move |kg| async move { kg.nodes.update_nodes(&kg.txn, updates).await }.boxed())
            .await
    }

    /// Delete nodes and every edge touching them.
    #[instrument(skip(self, names), fields(count = names.len()))]
    pub async fn delete_nodes(&self, names: Vec<String>) -> Result<()> {
        self.mutate(move |kg| async move { kg.nodes.delete_nodes(&kg.txn, names).await }.boxed())
            .await
    }

    #[instrument(skip(self, edges), fields(count = edges.len()))]
    pub async fn add_edges(&self, edges: Vec<Edge>) -> Result<Vec<Edge>> {
        self.mutate(move |kg| async move { kg.edges.add_edges(&kg.txn, edges).await }.boxed())
            .await
    }

    #[instrument(skip(self, updates), fields(count = updates.len()))]
    pub async fn update_edges(&self, updates: Vec<EdgeUpdate>) -> Result<Vec<Edge>> {
        self.mutate(move |kg| async move { kg.edges.update_edges(&kg.txn, updates).await }.boxed())
            .await
    }

    #[instrument(skip(self, edges), fields(count = edges.len()))]
    pub async fn delete_edges(&self, edges: Vec<Edge>) -> Result<()> {
        self.mutate(move |kg| async move { kg.edges.delete_edges(&kg.txn, edges).await }.boxed())
            .await
    }

    #[instrument(skip(self, additions), fields(count = additions.len()))]
    pub async fn add_metadata(&self, additions: Vec<MetadataAddition>) -> Result<Vec<MetadataAdded>> {
        self.mutate(move |kg| {
            async move { kg.metadata.add_metadata(&kg.txn, additions).await }.boxed()
        })
        .await
    }

    #[instrument(skip(self, deletions), fields(count = deletions.len()))]
    pub async fn delete_metadata(&self, deletions: Vec<MetadataDeletion>) -> Result<()> {
        self.mutate(move |kg| {
            async move { kg.metadata.delete_metadata(&kg.txn, deletions).await }.boxed()
        })
        .await
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Reads
    // ═══════════════════════════════════════════════════════════════════════

    /// The graph a read should see right now.
    async fn visible_graph(&self) -> Result<Graph> {
        if self.txn.is_in_transaction().await {
            self.txn.current_graph().await
        } else {
            self.txn.durable_graph().await
        }
    }

    pub async fn read_graph(&self) -> Result<Graph> {
        self.visible_graph().await
    }

    #[instrument(skip(self))]
    pub async fn search_nodes(&self, query: &str) -> Result<GraphSlice> {
        let graph = self.visible_graph().await?;
        Ok(self.search.search_nodes(&graph, query))
    }

    /// The named nodes and the edges among them. Unknown names are skipped.
    #[instrument(skip(self, names), fields(count = names.len()))]
    pub async fn open_nodes(&self, names: &[String]) -> Result<GraphSlice> {
        let graph = self.visible_graph().await?;
        Ok(self.search.open_nodes(&graph, names))
    }

    /// Edges matching `filter`, or every edge when `None`.
    #[instrument(skip(self))]
    pub async fn get_edges(&self, filter: Option<EdgeFilter>) -> Result<EdgeList> {
        let graph = self.visible_graph().await?;
        let edges = self
            .edges
            .get_edges(&graph, &filter.unwrap_or_default());
        Ok(EdgeList { edges })
    }
}

impl fmt::Debug for KnowledgeGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KnowledgeGraph")
            .field("txn", &self.txn)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KnowledgeGraphError;
    use async_trait::async_trait;
    use kgraph_graph::ValidationError;
    use kgraph_storage::InMemoryBackend;

    fn graph() -> KnowledgeGraph {
        KnowledgeGraph::new(Arc::new(InMemoryBackend::new()))
    }

    #[tokio::test]
    async fn test_standalone_mutation_commits() {
        let kg = graph();
        kg.add_nodes(vec![Node::new("x", "thing")]).await.unwrap();
        assert!(!kg.is_in_transaction().await);
        assert!(kg.read_graph().await.unwrap().contains_node("x"));
    }

    #[tokio::test]
    async fn test_standalone_failure_leaves_graph_unchanged() {
        let kg = graph();
        kg.add_nodes(vec![Node::new("x", "thing")]).await.unwrap();
        let err = kg
            .add_nodes(vec![Node::new("y", "thing"), Node::new("x", "thing")])
            .await
            .unwrap_err();
        assert!(matches!(err, KnowledgeGraphError::Validation(_)));
        assert!(!kg.is_in_transaction().await);
        assert_eq!(kg.read_graph().await.unwrap().nodes.len(), 1);
    }

    #[tokio::test]
    async fn test_reads_inside_transaction_see_working_snapshot() {
        let kg = graph();
        kg.begin_transaction().await.unwrap();
        kg.add_nodes(vec![Node::new("x", "thing")]).await.unwrap();

        assert!(kg.read_graph().await.unwrap().contains_node("x"));
        assert_eq!(kg.search_nodes("x").await.unwrap().nodes.len(), 1);
        // The durable graph is untouched until commit.
        assert!(kg.transaction_manager().durable_graph().await.unwrap().is_empty());

        kg.rollback().await.unwrap();
        assert!(kg.read_graph().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_with_transaction_returns_value() {
        let kg = graph();
        let added = kg
            .with_transaction(|kg| {
                async move {
                    kg.add_nodes(vec![Node::new("a", "t"), Node::new("b", "t")]).await?;
                    kg.add_edges(vec![Edge::new("a", "b", "r")]).await
                }
                .boxed()
            })
            .await
            .unwrap();
        assert_eq!(added, vec![Edge::new("a", "b", "r")]);
        assert_eq!(kg.get_edges(None).await.unwrap().edges.len(), 1);
    }

    #[tokio::test]
    async fn test_with_transaction_when_operation_commits_itself() {
        let kg = graph();
        let err = kg
            .with_transaction(|kg| {
                async move {
                    kg.add_nodes(vec![Node::new("a", "t")]).await?;
                    kg.commit().await?;
                    Err::<(), KnowledgeGraphError>(ValidationError::Malformed("late".into()).into())
                }
                .boxed()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, KnowledgeGraphError::Validation(_)));
        assert!(!kg.is_in_transaction().await);
        assert!(kg.read_graph().await.unwrap().contains_node("a"));
    }

    #[tokio::test]
    async fn test_nested_transaction_rejected() {
        let kg = graph();
        let err = kg
            .with_transaction(|kg| async move { kg.begin_transaction().await.map(|_| ()) }.boxed())
            .await
            .unwrap_err();
        assert!(matches!(err, KnowledgeGraphError::TransactionState { .. }));
        assert!(!kg.is_in_transaction().await);
    }

    /// Refuses every node mutation.
    struct FrozenNodes;

    #[async_trait]
    impl NodeManager for FrozenNodes {
        async fn add_nodes(&self, _: &TransactionManager, _: Vec<Node>) -> Result<Vec<Node>> {
            Err(ValidationError::Malformed("frozen".into()).into())
        }

        async fn update_nodes(&self, _: &TransactionManager, _: Vec<NodeUpdate>) -> Result<Vec<Node>> {
            Err(ValidationError::Malformed("frozen".into()).into())
        }

        async fn delete_nodes(&self, _: &TransactionManager, _: Vec<String>) -> Result<()> {
            Err(ValidationError::Malformed("frozen".into()).into())
        }
    }

    #[tokio::test]
    async fn test_builder_replaces_manager() {
        let kg = KnowledgeGraph::builder(Arc::new(InMemoryBackend::new()))
            .node_manager(FrozenNodes)
            .build();
        let err = kg.add_nodes(vec![Node::new("x", "t")]).await.unwrap_err();
        assert!(err.to_string().contains("frozen"));
    }

    #[tokio::test]
    async fn test_open_from_config() {
        let mut config = KnowledgeGraphConfig::default();
        config.search.max_results = 1;
        let kg = KnowledgeGraph::open(&config).unwrap();
        kg.add_nodes(vec![Node::new("ab", "t"), Node::new("abc", "t")])
            .await
            .unwrap();
        assert_eq!(kg.search_nodes("ab").await.unwrap().nodes.len(), 1);
    }
}
