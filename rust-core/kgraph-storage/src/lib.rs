// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Knowledge graph storage backend abstraction.
//
// The core `GraphBackend` trait is the durability contract the transaction
// layer relies on: load the whole graph, save the whole graph. Backends can be
// swapped without touching orchestration logic.
//
// # Modules
//
// - [`backend`] -- The `GraphBackend` trait.
// - [`error`] -- The `StorageError` enum covering all backend failure modes.
// - [`memory`] -- An in-memory backend for testing and ephemeral graphs.
// - [`jsonl`] -- A line-delimited JSON file backend.
// - [`metrics`] -- A transparent wrapper that counts loads and saves.
//
// # Example
//
// ```rust
// use kgraph_graph::{Graph, Node};
// use kgraph_storage::{GraphBackend, InMemoryBackend, MetricsBackend};
//
// # tokio_test::block_on(async {
// let backend = MetricsBackend::new(InMemoryBackend::new());
//
// let mut graph = Graph::new();
// graph.nodes.push(Node::new("alice", "person"));
// backend.save_graph(&graph).await.unwrap();
//
// assert_eq!(backend.load_graph().await.unwrap(), graph);
// assert_eq!(backend.stats().await.save_count, 1);
// # });
// ```

pub mod backend;
pub mod error;
pub mod jsonl;
pub mod memory;
pub mod metrics;

// Optional persistent backends, feature-gated.
#[cfg(feature = "redb-backend")]
pub mod redb_backend;

pub use backend::GraphBackend;
pub use error::StorageError;
pub use jsonl::JsonlBackend;
pub use memory::InMemoryBackend;
pub use metrics::{BackendStats, MetricsBackend};

#[cfg(feature = "redb-backend")]
pub use redb_backend::RedbBackend;
