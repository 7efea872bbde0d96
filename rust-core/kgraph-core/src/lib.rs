// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Transactional Knowledge Graph
//!
//! Typed nodes, directed edges and per-node metadata, persisted through a
//! pluggable [`GraphBackend`] and mutated under transactional guarantees.
//!
//! - [`TransactionManager`] owns the transaction lifecycle, the in-flight
//!   working snapshot and the rollback list.
//! - The mutation managers ([`NodeManager`], [`EdgeManager`],
//!   [`MetadataManager`]) validate and apply batches, registering a
//!   [`RollbackAction`] for everything they change.
//! - [`KnowledgeGraph`] composes them behind one API and provides
//!   [`KnowledgeGraph::with_transaction`], which commits or rolls back as a
//!   whole.
//!
//! ```rust
//! use std::sync::Arc;
//! use kgraph_core::KnowledgeGraph;
//! use kgraph_graph::{Edge, Node};
//! use kgraph_storage::InMemoryBackend;
//!
//! # tokio_test::block_on(async {
//! let kg = KnowledgeGraph::new(Arc::new(InMemoryBackend::new()));
//! kg.add_nodes(vec![Node::new("alice", "person"), Node::new("bob", "person")])
//!     .await
//!     .unwrap();
//! kg.add_edges(vec![Edge::new("alice", "bob", "knows")]).await.unwrap();
//!
//! let found = kg.search_nodes("ali").await.unwrap();
//! assert_eq!(found.nodes[0].name, "alice");
//! # });
//! ```

pub mod config;
pub mod error;
pub mod knowledge_graph;
pub mod managers;
pub mod rollback;
pub mod telemetry;
pub mod transaction;

pub use config::{BackendConfig, ConfigError, KnowledgeGraphConfig, LogFormat, SearchConfig};
pub use error::{KnowledgeGraphError, Result, RollbackFailure, TransactionPhase};
pub use knowledge_graph::{KnowledgeGraph, KnowledgeGraphBuilder};
pub use managers::{
    DefaultEdgeManager, DefaultMetadataManager, DefaultNodeManager, DefaultSearchManager,
    EdgeManager, MetadataManager, NodeManager, SearchManager,
};
pub use rollback::{EdgeReplacement, Positioned, RollbackAction, RollbackCommand};
pub use transaction::{TransactionId, TransactionInfo, TransactionManager};

// Model and storage types that appear in this crate's signatures.
pub use kgraph_graph::{
    Edge, EdgeFilter, EdgeList, EdgeUpdate, Graph, GraphSlice, MetadataAdded, MetadataAddition,
    MetadataDeletion, Node, NodeUpdate, ValidationError,
};
pub use kgraph_storage::{GraphBackend, StorageError};
