// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Default node manager.

use std::collections::HashSet;

use async_trait::async_trait;
use kgraph_graph::{Graph, Node, NodeUpdate, ValidationError};
use tracing::debug;

use super::NodeManager;
use crate::error::Result;
use crate::rollback::{Positioned, RollbackAction, RollbackCommand};
use crate::transaction::TransactionManager;

/// Validates node batches in full before touching the working snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNodeManager;

impl DefaultNodeManager {
    pub fn new() -> Self {
        Self
    }
}

fn validate_new_nodes(graph: &Graph, nodes: &[Node]) -> std::result::Result<(), ValidationError> {
    let mut batch = HashSet::new();
    for node in nodes {
        if node.name.is_empty() {
            return Err(ValidationError::Malformed("node name is empty".into()));
        }
        if node.node_type.is_empty() {
            return Err(ValidationError::Malformed(format!(
                "node {} has an empty type",
                node.name
            )));
        }
        if graph.contains_node(&node.name) || !batch.insert(node.name.as_str()) {
            return Err(ValidationError::DuplicateNode(node.name.clone()));
        }
    }
    Ok(())
}

fn summary<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    names.into_iter().collect::<Vec<_>>().join(", ")
}

#[async_trait]
impl NodeManager for DefaultNodeManager {
    async fn add_nodes(&self, txn: &TransactionManager, nodes: Vec<Node>) -> Result<Vec<Node>> {
        txn.mutate_working_graph(move |graph| {
            validate_new_nodes(graph, &nodes)?;
            if nodes.is_empty() {
                return Ok((nodes, Vec::new()));
            }

            graph.nodes.extend(nodes.iter().cloned());
            let names: Vec<String> = nodes.iter().map(|n| n.name.clone()).collect();
            debug!(count = nodes.len(), "Nodes added to working snapshot");

            let undo = RollbackAction::new(
                RollbackCommand::RemoveNodes {
                    names: names.clone(),
                },
                format!("remove added nodes [{}]", summary(names.iter().map(String::as_str))),
            );
            Ok((nodes, vec![undo]))
        })
        .await
    }

    async fn update_nodes(
        &self,
        txn: &TransactionManager,
        updates: Vec<NodeUpdate>,
    ) -> Result<Vec<Node>> {
        txn.mutate_working_graph(move |graph| {
            for update in &updates {
                if !graph.contains_node(&update.name) {
                    return Err(ValidationError::NodeNotFound(update.name.clone()));
                }
                if update.node_type.as_deref() == Some("") {
                    return Err(ValidationError::Malformed(format!(
                        "update of {} sets an empty type",
                        update.name
                    )));
                }
            }
            if updates.is_empty() {
                return Ok((Vec::new(), Vec::new()));
            }

            // Only the state before the first update of each node is needed.
            let mut seen = HashSet::new();
            let mut previous = Vec::new();
            let mut updated = Vec::with_capacity(updates.len());

            for update in updates {
                let Some(node) = graph.node_mut(&update.name) else {
                    continue;
                };
                if seen.insert(update.name.clone()) {
                    previous.push(node.clone());
                }
                if let Some(node_type) = update.node_type {
                    node.node_type = node_type;
                }
                if let Some(metadata) = update.metadata {
                    node.metadata = metadata;
                }
                updated.push(node.clone());
            }
            debug!(count = updated.len(), "Nodes updated in working snapshot");

            let description = format!(
                "revert updated nodes [{}]",
                summary(previous.iter().map(|n| n.name.as_str()))
            );
            let undo = RollbackAction::new(RollbackCommand::RevertNodes { previous }, description);
            Ok((updated, vec![undo]))
        })
        .await
    }

    async fn delete_nodes(&self, txn: &TransactionManager, names: Vec<String>) -> Result<()> {
        txn.mutate_working_graph(move |graph| {
            let mut targets = HashSet::new();
            for name in &names {
                if !graph.contains_node(name) {
                    return Err(ValidationError::NodeNotFound(name.clone()));
                }
                targets.insert(name.as_str());
            }
            if targets.is_empty() {
                return Ok(((), Vec::new()));
            }

            let nodes: Vec<Positioned<Node>> = graph
                .nodes
                .iter()
                .enumerate()
                .filter(|(_, n)| targets.contains(n.name.as_str()))
                .map(|(i, n)| Positioned::new(i, n.clone()))
                .collect();
            let edges: Vec<Positioned<_>> = graph
                .edges
                .iter()
                .enumerate()
                .filter(|(_, e)| targets.contains(e.from.as_str()) || targets.contains(e.to.as_str()))
                .map(|(i, e)| Positioned::new(i, e.clone()))
                .collect();

            graph.nodes.retain(|n| !targets.contains(n.name.as_str()));
            graph
                .edges
                .retain(|e| !targets.contains(e.from.as_str()) && !targets.contains(e.to.as_str()));
            debug!(
                nodes = nodes.len(),
                cascaded_edges = edges.len(),
                "Nodes deleted from working snapshot"
            );

            let description = format!(
                "restore deleted nodes [{}] and {} incident edge(s)",
                summary(nodes.iter().map(|p| p.value.name.as_str())),
                edges.len()
            );
            let undo = RollbackAction::new(RollbackCommand::RestoreNodes { nodes, edges }, description);
            Ok(((), vec![undo]))
        })
        .await
    }
}
