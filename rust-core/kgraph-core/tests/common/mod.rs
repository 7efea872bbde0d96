// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use kgraph_core::{Edge, Graph, GraphBackend, KnowledgeGraph, Node, StorageError};
use kgraph_storage::InMemoryBackend;

/// In-memory backend whose loads and saves can be made to fail on demand.
#[derive(Debug, Default)]
pub struct FlakyBackend {
    inner: InMemoryBackend,
    fail_loads: AtomicBool,
    fail_saves: AtomicBool,
}

impl FlakyBackend {
    pub fn with_graph(graph: Graph) -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryBackend::with_graph(graph),
            ..Default::default()
        })
    }

    pub fn fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// What is durably stored, regardless of the failure switches.
    pub async fn durable(&self) -> Graph {
        self.inner.load_graph().await.unwrap()
    }
}

#[async_trait]
impl GraphBackend for FlakyBackend {
    async fn load_graph(&self) -> Result<Graph, StorageError> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(StorageError::BackendUnavailable("injected load failure".into()));
        }
        self.inner.load_graph().await
    }

    async fn save_graph(&self, graph: &Graph) -> Result<(), StorageError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StorageError::WriteFailed("injected save failure".into()));
        }
        self.inner.save_graph(graph).await
    }

    fn name(&self) -> &str {
        "flaky"
    }
}

/// A small social graph: three people, two relations, some metadata.
pub fn seed_graph() -> Graph {
    Graph {
        nodes: vec![
            Node::new("A", "person").with_metadata(["likes tea"]),
            Node::new("B", "person").with_metadata(["likes coffee", "runs"]),
            Node::new("C", "company"),
        ],
        edges: vec![Edge::new("A", "B", "knows"), Edge::new("B", "C", "works_at")],
    }
}

pub fn flaky_graph() -> (KnowledgeGraph, Arc<FlakyBackend>) {
    let backend = FlakyBackend::with_graph(seed_graph());
    (KnowledgeGraph::new(backend.clone()), backend)
}
