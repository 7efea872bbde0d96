// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Error taxonomy for the transactional knowledge graph.

use std::fmt;

use kgraph_graph::ValidationError;
use kgraph_storage::StorageError;
use serde::Serialize;
use thiserror::Error;

use crate::rollback::RollbackCommand;

/// Lifecycle phase of the transaction manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TransactionPhase {
    Idle,
    Active,
}

impl fmt::Display for TransactionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Active => f.write_str("active"),
        }
    }
}

/// One undo step that could not be applied during rollback.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollbackFailure {
    /// Description registered with the action
    pub description: String,
    /// The command that failed
    pub command: RollbackCommand,
    /// Why it failed
    pub error: String,
}

impl fmt::Display for RollbackFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.description, self.error)
    }
}

/// Errors surfaced by the transaction manager and the facade.
#[derive(Error, Debug)]
pub enum KnowledgeGraphError {
    /// An operation was called in the wrong lifecycle phase. Always a caller
    /// logic bug; never retried.
    #[error("cannot {operation} while transaction is {current}")]
    TransactionState {
        operation: &'static str,
        current: TransactionPhase,
    },

    /// A mutation did not fit the graph it was applied to.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The storage backend failed to load the graph. Nothing was written.
    #[error("storage failure: {0}")]
    Storage(#[from] StorageError),

    /// Persisting the working snapshot at commit failed. The transaction has
    /// ended and the durable graph may be partially written.
    #[error("commit failed: {0}")]
    CommitFailed(#[source] StorageError),

    /// One or more undo steps failed. State may be inconsistent and needs
    /// manual reconciliation.
    #[error("rollback incomplete ({} failed undo step(s)){}", .failures.len(), cause_suffix(.cause))]
    RollbackAggregate {
        /// The error that triggered the rollback, if the rollback was
        /// triggered by one
        cause: Option<Box<KnowledgeGraphError>>,
        failures: Vec<RollbackFailure>,
    },
}

impl KnowledgeGraphError {
    pub(crate) fn state(operation: &'static str, current: TransactionPhase) -> Self {
        Self::TransactionState { operation, current }
    }

    /// Return `true` for errors after which durable state may not match
    /// either the pre-transaction or the intended post-transaction graph.
    pub fn needs_reconciliation(&self) -> bool {
        matches!(self, Self::RollbackAggregate { .. } | Self::CommitFailed(_))
    }

    /// The underlying storage error, whether it came from a load or a commit.
    pub fn storage_error(&self) -> Option<&StorageError> {
        match self {
            Self::Storage(e) | Self::CommitFailed(e) => Some(e),
            _ => None,
        }
    }

    /// Attach the error that triggered a failed rollback.
    pub(crate) fn with_cause(self, cause: KnowledgeGraphError) -> Self {
        match self {
            Self::RollbackAggregate { failures, .. } => Self::RollbackAggregate {
                cause: Some(Box::new(cause)),
                failures,
            },
            other => other,
        }
    }
}

fn cause_suffix(cause: &Option<Box<KnowledgeGraphError>>) -> String {
    cause
        .as_ref()
        .map(|c| format!(" after: {c}"))
        .unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, KnowledgeGraphError>;
