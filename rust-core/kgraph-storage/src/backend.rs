// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core durability trait for the knowledge graph.
//
// A backend reads and writes the graph as a whole. Multi-step atomicity is
// not assumed: a failed `save_graph` may leave whatever the backend managed to
// write, and callers surface that failure rather than hiding it.

use std::sync::Arc;

use async_trait::async_trait;
use kgraph_graph::Graph;

use crate::error::StorageError;

/// A pluggable durable store for the full graph.
///
/// Implementations must be safe to share across threads and tokio tasks.
#[async_trait]
pub trait GraphBackend: Send + Sync {
    /// Load the current durable graph.
    ///
    /// A store that has never been written loads as an empty graph.
    async fn load_graph(&self) -> Result<Graph, StorageError>;

    /// Replace the durable graph with `graph`.
    async fn save_graph(&self, graph: &Graph) -> Result<(), StorageError>;

    /// A human-readable name for this backend, used in logging and metrics.
    fn name(&self) -> &str;
}

#[async_trait]
impl<B: GraphBackend + ?Sized> GraphBackend for Arc<B> {
    async fn load_graph(&self) -> Result<Graph, StorageError> {
        (**self).load_graph().await
    }

    async fn save_graph(&self, graph: &Graph) -> Result<(), StorageError> {
        (**self).save_graph(graph).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
