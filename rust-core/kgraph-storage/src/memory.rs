// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory graph backend.
//
// Holds the durable graph in a tokio `RwLock`. Intended for testing,
// development, and ephemeral knowledge graphs.

use std::sync::Arc;

use async_trait::async_trait;
use kgraph_graph::Graph;
use tokio::sync::RwLock;

use crate::backend::GraphBackend;
use crate::error::StorageError;

/// An in-memory graph backend.
///
/// All data lives in process memory and is lost on drop. Clones share the
/// same underlying graph.
///
/// # Example
///
/// ```rust
/// use kgraph_graph::{Graph, Node};
/// use kgraph_storage::{GraphBackend, InMemoryBackend};
///
/// # tokio_test::block_on(async {
/// let store = InMemoryBackend::new();
/// assert!(store.load_graph().await.unwrap().is_empty());
///
/// let mut graph = Graph::new();
/// graph.nodes.push(Node::new("alice", "person"));
/// store.save_graph(&graph).await.unwrap();
/// assert_eq!(store.load_graph().await.unwrap().nodes.len(), 1);
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    graph: Arc<RwLock<Graph>>,
}

impl InMemoryBackend {
    /// Create a new, empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend pre-populated with `graph`.
    pub fn with_graph(graph: Graph) -> Self {
        Self {
            graph: Arc::new(RwLock::new(graph)),
        }
    }
}

#[async_trait]
impl GraphBackend for InMemoryBackend {
    async fn load_graph(&self) -> Result<Graph, StorageError> {
        Ok(self.graph.read().await.clone())
    }

    async fn save_graph(&self, graph: &Graph) -> Result<(), StorageError> {
        *self.graph.write().await = graph.clone();
        Ok(())
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kgraph_graph::{Edge, Node};

    fn sample() -> Graph {
        Graph {
            nodes: vec![Node::new("a", "thing"), Node::new("b", "thing")],
            edges: vec![Edge::new("a", "b", "links")],
        }
    }

    #[tokio::test]
    async fn test_starts_empty() {
        let backend = InMemoryBackend::new();
        assert!(backend.load_graph().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let backend = InMemoryBackend::new();
        backend.save_graph(&sample()).await.unwrap();
        assert_eq!(backend.load_graph().await.unwrap(), sample());
    }

    #[tokio::test]
    async fn test_loaded_graph_is_detached() {
        let backend = InMemoryBackend::with_graph(sample());
        let mut loaded = backend.load_graph().await.unwrap();
        loaded.nodes.clear();
        assert_eq!(backend.load_graph().await.unwrap().nodes.len(), 2);
    }

    #[tokio::test]
    async fn test_clone_shares_state() {
        let backend = InMemoryBackend::new();
        let clone = backend.clone();
        backend.save_graph(&sample()).await.unwrap();
        assert_eq!(clone.load_graph().await.unwrap(), sample());
    }

    #[tokio::test]
    async fn test_name() {
        assert_eq!(InMemoryBackend::new().name(), "in-memory");
    }
}
