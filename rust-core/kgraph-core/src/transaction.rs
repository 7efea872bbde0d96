// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Transaction Manager for knowledge graph mutations
//!
//! Makes a sequence of node, edge and metadata mutations atomic. While a
//! transaction is active the manager owns:
//!
//! - a **working snapshot** of the graph, loaded from the backend at begin and
//!   mutated in place by the mutation managers;
//! - an ordered list of **rollback actions**, one per applied mutation batch.
//!
//! Commit writes the snapshot back through the backend once. Rollback applies
//! the registered actions in reverse order, then discards the snapshot.
//!
//! # Transaction State Machine
//!
//! ```text
//! ┌────────┐  begin_transaction()  ┌────────┐
//! │  Idle  │ ────────────────────> │ Active │
//! └────────┘                       └────────┘
//!     ^                                 │
//!     │        commit() / rollback()    │
//!     └─────────────────────────────────┘
//! ```
//!
//! Every exit from Active lands in Idle, including a commit whose save fails.
//!
//! # Concurrency
//!
//! At most one transaction is active per manager. A second
//! `begin_transaction` while Active is a caller error, not a queueing
//! signal; callers with several writers must serialise them externally.

use chrono::{DateTime, Utc};
use kgraph_graph::{Graph, ValidationError};
use kgraph_storage::GraphBackend;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{KnowledgeGraphError, Result, RollbackFailure, TransactionPhase};
use crate::rollback::{RollbackAction, RollbackCommand};

// ---------------------------------------------------------------------------
// Core types
// ---------------------------------------------------------------------------

/// Unique identifier of one transaction, for logs and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TransactionId(Uuid);

impl TransactionId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn_{}", &self.0.simple().to_string()[..12])
    }
}

/// Read-only view of the active transaction.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionInfo {
    pub id: TransactionId,
    pub started_at: DateTime<Utc>,
    /// Registered rollback actions, in registration order.
    pub rollback_actions: Vec<RollbackAction>,
}

/// State owned by an active transaction.
#[derive(Debug)]
struct ActiveTransaction {
    id: TransactionId,
    started_at: DateTime<Utc>,
    /// All mutations applied so far, not yet durable.
    working: Graph,
    /// Undo steps in registration order (applied in reverse).
    rollback: Vec<RollbackAction>,
}

#[derive(Debug)]
enum State {
    Idle,
    Active(ActiveTransaction),
}

impl State {
    fn phase(&self) -> TransactionPhase {
        match self {
            State::Idle => TransactionPhase::Idle,
            State::Active(_) => TransactionPhase::Active,
        }
    }

    fn active_mut(&mut self, operation: &'static str) -> Result<&mut ActiveTransaction> {
        match self {
            State::Active(txn) => Ok(txn),
            State::Idle => Err(KnowledgeGraphError::state(operation, TransactionPhase::Idle)),
        }
    }

    /// Move to Idle, returning the transaction that was active.
    fn take_active(&mut self, operation: &'static str) -> Result<ActiveTransaction> {
        match std::mem::replace(self, State::Idle) {
            State::Active(txn) => Ok(txn),
            State::Idle => Err(KnowledgeGraphError::state(operation, TransactionPhase::Idle)),
        }
    }
}

// ---------------------------------------------------------------------------
// Transaction Manager
// ---------------------------------------------------------------------------

/// Owns transaction lifecycle, the working snapshot and the rollback list.
///
/// One instance is injected into one `KnowledgeGraph`; nothing else holds
/// the snapshot or the rollback list across a commit/rollback boundary.
pub struct TransactionManager {
    backend: Arc<dyn GraphBackend>,
    state: Mutex<State>,
}

impl TransactionManager {
    /// Create a manager in the Idle state over `backend`.
    pub fn new(backend: Arc<dyn GraphBackend>) -> Self {
        Self {
            backend,
            state: Mutex::new(State::Idle),
        }
    }

    /// The durable storage this manager commits to.
    pub fn backend(&self) -> &Arc<dyn GraphBackend> {
        &self.backend
    }

    /// Start a transaction, loading the working snapshot from the backend.
    ///
    /// Fails with `TransactionState` if a transaction is already active. A
    /// storage failure during the load leaves the manager Idle.
    pub async fn begin_transaction(&self) -> Result<TransactionId> {
        let mut state = self.state.lock().await;
        if let State::Active(current) = &*state {
            warn!(transaction = %current.id, "begin requested while a transaction is active");
            return Err(KnowledgeGraphError::state(
                "begin transaction",
                TransactionPhase::Active,
            ));
        }

        let working = self.backend.load_graph().await.map_err(|e| {
            warn!(backend = self.backend.name(), error = %e, "failed to load graph at begin");
            e
        })?;

        let txn = ActiveTransaction {
            id: TransactionId::generate(),
            started_at: Utc::now(),
            working,
            rollback: Vec::new(),
        };
        let id = txn.id;

        info!(
            transaction = %id,
            backend = self.backend.name(),
            nodes = txn.working.nodes.len(),
            edges = txn.working.edges.len(),
            "Transaction started"
        );

        *state = State::Active(txn);
        Ok(id)
    }

    /// Persist the working snapshot and return to Idle.
    ///
    /// The manager is Idle afterwards even when the save fails; the storage
    /// error is returned as `CommitFailed` and the durable graph is whatever
    /// the backend managed to write.
    pub async fn commit(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        let txn = state.take_active("commit")?;

        match self.backend.save_graph(&txn.working).await {
            Ok(()) => {
                info!(
                    transaction = %txn.id,
                    nodes = txn.working.nodes.len(),
                    edges = txn.working.edges.len(),
                    discarded_rollback_actions = txn.rollback.len(),
                    "Transaction committed"
                );
                Ok(())
            }
            Err(e) => {
                error!(
                    transaction = %txn.id,
                    backend = self.backend.name(),
                    error = %e,
                    "Commit failed to persist; durable state needs reconciliation"
                );
                Err(KnowledgeGraphError::CommitFailed(e))
            }
        }
    }

    /// Undo every registered action in reverse order and return to Idle.
    ///
    /// Actions run best-effort: a failing action is recorded and the rest
    /// still run. If any failed, `RollbackAggregate` is returned after all
    /// of them have been attempted.
    pub async fn rollback(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        let ActiveTransaction {
            id,
            mut working,
            rollback,
            ..
        } = state.take_active("rollback")?;

        let attempted = rollback.len();
        let mut failures = Vec::new();

        for action in rollback.into_iter().rev() {
            match action.command.apply(&mut working) {
                Ok(()) => debug!(
                    transaction = %id,
                    command = action.command.kind(),
                    description = %action.description,
                    "Rollback action applied"
                ),
                Err(e) => {
                    warn!(
                        transaction = %id,
                        command = action.command.kind(),
                        description = %action.description,
                        error = %e,
                        "Rollback action failed"
                    );
                    failures.push(RollbackFailure {
                        description: action.description,
                        command: action.command,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            transaction = %id,
            attempted = attempted,
            failed = failures.len(),
            "Transaction rolled back"
        );

        if failures.is_empty() {
            Ok(())
        } else {
            Err(KnowledgeGraphError::RollbackAggregate {
                cause: None,
                failures,
            })
        }
    }

    /// Register an undo step for the active transaction. Does not run it.
    pub async fn add_rollback_action(
        &self,
        command: RollbackCommand,
        description: impl Into<String>,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        let txn = state.active_mut("register rollback action")?;
        Self::push_action(txn, RollbackAction::new(command, description));
        Ok(())
    }

    /// Apply a mutation to the working snapshot and register its undo steps
    /// under the same lock.
    ///
    /// `mutation` either fails without touching the graph, or succeeds and
    /// returns its result together with the actions that reverse it, in the
    /// order they should be registered (empty when nothing changed).
    pub async fn mutate_working_graph<R, F>(&self, mutation: F) -> Result<R>
    where
        F: FnOnce(&mut Graph) -> std::result::Result<(R, Vec<RollbackAction>), ValidationError>,
    {
        let mut state = self.state.lock().await;
        let txn = state.active_mut("mutate the working graph")?;
        let (result, actions) = mutation(&mut txn.working)?;
        for action in actions {
            Self::push_action(txn, action);
        }
        Ok(result)
    }

    fn push_action(txn: &mut ActiveTransaction, action: RollbackAction) {
        debug!(
            transaction = %txn.id,
            command = action.command.kind(),
            description = %action.description,
            position = txn.rollback.len(),
            "Rollback action registered"
        );
        txn.rollback.push(action);
    }

    /// Whether a transaction is currently active.
    pub async fn is_in_transaction(&self) -> bool {
        self.state.lock().await.phase() == TransactionPhase::Active
    }

    /// A copy of the in-flight working snapshot.
    ///
    /// Fails with `TransactionState` when Idle; use
    /// [`durable_graph`](Self::durable_graph) for the committed state.
    pub async fn current_graph(&self) -> Result<Graph> {
        let mut state = self.state.lock().await;
        let txn = state.active_mut("read the working graph")?;
        Ok(txn.working.clone())
    }

    /// The last committed graph, straight from the backend.
    pub async fn durable_graph(&self) -> Result<Graph> {
        Ok(self.backend.load_graph().await?)
    }

    /// Diagnostics for the active transaction, or `None` when Idle.
    pub async fn transaction_info(&self) -> Option<TransactionInfo> {
        match &*self.state.lock().await {
            State::Active(txn) => Some(TransactionInfo {
                id: txn.id,
                started_at: txn.started_at,
                rollback_actions: txn.rollback.clone(),
            }),
            State::Idle => None,
        }
    }
}

impl fmt::Debug for TransactionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionManager")
            .field("backend", &self.backend.name())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
