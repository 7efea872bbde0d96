// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Default edge manager.

use std::collections::HashSet;

use async_trait::async_trait;
use kgraph_graph::{Edge, EdgeFilter, EdgeUpdate, Graph, ValidationError};
use tracing::debug;

use super::EdgeManager;
use crate::error::Result;
use crate::rollback::{EdgeReplacement, Positioned, RollbackAction, RollbackCommand};
use crate::transaction::TransactionManager;

/// Edge manager enforcing endpoint existence and triple uniqueness.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultEdgeManager;

impl DefaultEdgeManager {
    pub fn new() -> Self {
        Self
    }
}

/// Both endpoints must exist; the first missing one is reported.
fn check_endpoints(graph: &Graph, edge: &Edge) -> std::result::Result<(), ValidationError> {
    for endpoint in [&edge.from, &edge.to] {
        if !graph.contains_node(endpoint) {
            return Err(ValidationError::DanglingEdge {
                from: edge.from.clone(),
                to: edge.to.clone(),
                relation_type: edge.relation_type.clone(),
                missing: endpoint.clone(),
            });
        }
    }
    Ok(())
}

fn check_shape(edge: &Edge) -> std::result::Result<(), ValidationError> {
    if edge.from.is_empty() || edge.to.is_empty() || edge.relation_type.is_empty() {
        return Err(ValidationError::Malformed(format!(
            "edge has an empty field: {edge}"
        )));
    }
    Ok(())
}

#[async_trait]
impl EdgeManager for DefaultEdgeManager {
    async fn add_edges(&self, txn: &TransactionManager, edges: Vec<Edge>) -> Result<Vec<Edge>> {
        txn.mutate_working_graph(move |graph| {
            let mut batch = HashSet::new();
            for edge in &edges {
                check_shape(edge)?;
                check_endpoints(graph, edge)?;
                if graph.contains_edge(edge) || !batch.insert(edge) {
                    return Err(ValidationError::DuplicateEdge(edge.to_string()));
                }
            }
            if edges.is_empty() {
                return Ok((edges, Vec::new()));
            }

            graph.edges.extend(edges.iter().cloned());
            debug!(count = edges.len(), "Edges added to working snapshot");

            let undo = RollbackAction::new(
                RollbackCommand::RemoveEdges {
                    edges: edges.clone(),
                },
                format!("remove {} added edge(s)", edges.len()),
            );
            Ok((edges, vec![undo]))
        })
        .await
    }

    async fn update_edges(
        &self,
        txn: &TransactionManager,
        updates: Vec<EdgeUpdate>,
    ) -> Result<Vec<Edge>> {
        txn.mutate_working_graph(move |graph| {
            let mut slots = Vec::with_capacity(updates.len());
            let mut targets = HashSet::new();
            for update in &updates {
                let target = update.target();
                let slot = graph
                    .edge_index(&target)
                    .ok_or_else(|| ValidationError::EdgeNotFound(target.to_string()))?;
                if !targets.insert(target.clone()) {
                    return Err(ValidationError::Malformed(format!(
                        "edge {target} updated more than once in one batch"
                    )));
                }
                slots.push(slot);
            }

            // All updates land at once: a replacement may take the identity of
            // another targeted edge, but not of an untouched one.
            let mut results = HashSet::new();
            let mut replacements = Vec::with_capacity(updates.len());
            for update in &updates {
                let next = update.replacement();
                check_shape(&next)?;
                check_endpoints(graph, &next)?;
                let collides = graph.contains_edge(&next) && !targets.contains(&next);
                if collides || !results.insert(next.clone()) {
                    return Err(ValidationError::DuplicateEdge(next.to_string()));
                }
                replacements.push(EdgeReplacement {
                    current: next,
                    previous: update.target(),
                });
            }
            if replacements.is_empty() {
                return Ok((Vec::new(), Vec::new()));
            }

            for (slot, r) in slots.into_iter().zip(&replacements) {
                graph.edges[slot] = r.current.clone();
            }
            debug!(count = replacements.len(), "Edges updated in working snapshot");

            let updated = replacements.iter().map(|r| r.current.clone()).collect();
            let undo = RollbackAction::new(
                RollbackCommand::RevertEdges {
                    replacements: replacements.clone(),
                },
                format!("revert {} updated edge(s)", replacements.len()),
            );
            Ok((updated, vec![undo]))
        })
        .await
    }

    async fn delete_edges(&self, txn: &TransactionManager, edges: Vec<Edge>) -> Result<()> {
        txn.mutate_working_graph(move |graph| {
            let mut targets = HashSet::new();
            for edge in &edges {
                if !graph.contains_edge(edge) {
                    return Err(ValidationError::EdgeNotFound(edge.to_string()));
                }
                targets.insert(edge);
            }
            if targets.is_empty() {
                return Ok(((), Vec::new()));
            }

            let removed: Vec<Positioned<Edge>> = graph
                .edges
                .iter()
                .enumerate()
                .filter(|(_, e)| targets.contains(e))
                .map(|(i, e)| Positioned::new(i, e.clone()))
                .collect();
            graph.edges.retain(|e| !targets.contains(e));
            debug!(count = removed.len(), "Edges deleted from working snapshot");

            let description = format!("restore {} deleted edge(s)", removed.len());
            let undo = RollbackAction::new(RollbackCommand::RestoreEdges { edges: removed }, description);
            Ok(((), vec![undo]))
        })
        .await
    }

    fn get_edges(&self, graph: &Graph, filter: &EdgeFilter) -> Vec<Edge> {
        graph.edges_matching(filter)
    }
}
