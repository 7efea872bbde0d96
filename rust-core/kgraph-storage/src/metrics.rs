// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Metrics-collecting wrapper for graph backends.
//
// Wraps any `GraphBackend` and transparently counts loads and saves, their
// failures and latency. The transaction layer reads the durable graph once
// at begin and writes it once at commit; these counters make that
// discipline observable.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use kgraph_graph::Graph;
use tokio::sync::RwLock;

use crate::backend::GraphBackend;
use crate::error::StorageError;

/// Accumulated statistics for a graph backend.
///
/// All counters are monotonically increasing for the lifetime of the
/// [`MetricsBackend`] that owns them, until [`MetricsBackend::reset_stats`].
#[derive(Debug, Clone, Default)]
pub struct BackendStats {
    /// Number of `load_graph` calls.
    pub load_count: u64,
    /// Number of `save_graph` calls.
    pub save_count: u64,
    /// Number of `load_graph` calls that returned an error.
    pub load_failures: u64,
    /// Number of `save_graph` calls that returned an error.
    pub save_failures: u64,
    /// Cumulative wall-clock latency of all loads, in milliseconds.
    pub load_latency_sum_ms: f64,
    /// Cumulative wall-clock latency of all saves, in milliseconds.
    pub save_latency_sum_ms: f64,
    /// Node count of the most recent successful save.
    pub last_saved_nodes: usize,
    /// Edge count of the most recent successful save.
    pub last_saved_edges: usize,
}

/// A graph backend wrapper that collects operation metrics.
///
/// # Example
///
/// ```rust
/// use kgraph_graph::Graph;
/// use kgraph_storage::{GraphBackend, InMemoryBackend, MetricsBackend};
///
/// # tokio_test::block_on(async {
/// let metered = MetricsBackend::new(InMemoryBackend::new());
///
/// metered.save_graph(&Graph::new()).await.unwrap();
/// metered.load_graph().await.unwrap();
///
/// let stats = metered.stats().await;
/// assert_eq!(stats.save_count, 1);
/// assert_eq!(stats.load_count, 1);
/// # });
/// ```
pub struct MetricsBackend<B: GraphBackend> {
    /// The wrapped backend that performs the actual storage operations.
    inner: B,
    /// Shared, mutable statistics accumulator.
    stats: Arc<RwLock<BackendStats>>,
}

impl<B: GraphBackend> MetricsBackend<B> {
    /// Wrap `inner` with metrics collection.
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            stats: Arc::new(RwLock::new(BackendStats::default())),
        }
    }

    /// Return a snapshot of the current statistics.
    pub async fn stats(&self) -> BackendStats {
        self.stats.read().await.clone()
    }

    /// Reset all statistics to zero.
    pub async fn reset_stats(&self) {
        *self.stats.write().await = BackendStats::default();
    }

    /// Return a reference to the inner backend.
    pub fn inner(&self) -> &B {
        &self.inner
    }
}

#[async_trait]
impl<B: GraphBackend> GraphBackend for MetricsBackend<B> {
    async fn load_graph(&self) -> Result<Graph, StorageError> {
        let start = Instant::now();
        let result = self.inner.load_graph().await;
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        let mut s = self.stats.write().await;
        s.load_count += 1;
        s.load_latency_sum_ms += elapsed_ms;
        if result.is_err() {
            s.load_failures += 1;
        }

        result
    }

    async fn save_graph(&self, graph: &Graph) -> Result<(), StorageError> {
        let start = Instant::now();
        let result = self.inner.save_graph(graph).await;
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        let mut s = self.stats.write().await;
        s.save_count += 1;
        s.save_latency_sum_ms += elapsed_ms;
        match result {
            Ok(()) => {
                s.last_saved_nodes = graph.nodes.len();
                s.last_saved_edges = graph.edges.len();
            }
            Err(_) => s.save_failures += 1,
        }

        result
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
