// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Rollback commands
//!
//! Each mutation manager registers one [`RollbackAction`] per applied batch.
//! The action is a plain value describing how to undo that batch against the
//! working snapshot, so it can be logged, serialised and tested on its own.
//!
//! Commands are strict: applying one whose target is missing fails with a
//! [`ValidationError`] and leaves the graph untouched.

use kgraph_graph::{Edge, Graph, Node, ValidationError};
use serde::{Deserialize, Serialize};

/// A value remembered together with the index it occupied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Positioned<T> {
    pub index: usize,
    pub value: T,
}

impl<T> Positioned<T> {
    pub fn new(index: usize, value: T) -> Self {
        Self { index, value }
    }
}

/// An edge as it is now, and as it was before an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeReplacement {
    pub current: Edge,
    pub previous: Edge,
}

/// The undo operation for one applied mutation batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RollbackCommand {
    /// Undo of an add-nodes batch.
    RemoveNodes { names: Vec<String> },
    /// Undo of a delete-nodes batch, including the edges removed with them.
    RestoreNodes {
        nodes: Vec<Positioned<Node>>,
        edges: Vec<Positioned<Edge>>,
    },
    /// Undo of an update-nodes batch.
    RevertNodes { previous: Vec<Node> },
    /// Undo of an add-edges batch.
    RemoveEdges { edges: Vec<Edge> },
    /// Undo of a delete-edges batch.
    RestoreEdges { edges: Vec<Positioned<Edge>> },
    /// Undo of an update-edges batch.
    RevertEdges { replacements: Vec<EdgeReplacement> },
    /// Undo of an add-metadata call.
    RemoveMetadata {
        node_name: String,
        contents: Vec<String>,
    },
    /// Undo of a delete-metadata call.
    RestoreMetadata {
        node_name: String,
        entries: Vec<Positioned<String>>,
    },
}

impl RollbackCommand {
    /// Apply this command to `graph`.
    ///
    /// Every target is checked before anything changes, so a failed command
    /// leaves `graph` as it was.
    pub fn apply(&self, graph: &mut Graph) -> Result<(), ValidationError> {
        match self {
            Self::RemoveNodes { names } => {
                for name in names {
                    require_node(graph, name)?;
                }
                graph.nodes.retain(|n| !names.contains(&n.name));
            }

            Self::RestoreNodes { nodes, edges } => {
                for entry in nodes {
                    if graph.contains_node(&entry.value.name) {
                        return Err(ValidationError::DuplicateNode(entry.value.name.clone()));
                    }
                }
                for entry in edges {
                    if graph.contains_edge(&entry.value) {
                        return Err(ValidationError::DuplicateEdge(entry.value.to_string()));
                    }
                }
                insert_positioned(&mut graph.nodes, nodes);
                insert_positioned(&mut graph.edges, edges);
            }

            Self::RevertNodes { previous } => {
                for node in previous {
                    require_node(graph, &node.name)?;
                }
                for node in previous {
                    if let Some(slot) = graph.node_mut(&node.name) {
                        *slot = node.clone();
                    }
                }
            }

            Self::RemoveEdges { edges } => {
                for edge in edges {
                    require_edge(graph, edge)?;
                }
                graph.edges.retain(|e| !edges.contains(e));
            }

            Self::RestoreEdges { edges } => {
                for entry in edges {
                    if graph.contains_edge(&entry.value) {
                        return Err(ValidationError::DuplicateEdge(entry.value.to_string()));
                    }
                }
                insert_positioned(&mut graph.edges, edges);
            }

            Self::RevertEdges { replacements } => {
                // Resolve every slot before writing, so swapped edges revert cleanly.
                let slots = replacements
                    .iter()
                    .map(|r| {
                        graph
                            .edge_index(&r.current)
                            .ok_or_else(|| ValidationError::EdgeNotFound(r.current.to_string()))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                for (slot, r) in slots.into_iter().zip(replacements) {
                    graph.edges[slot] = r.previous.clone();
                }
            }

            Self::RemoveMetadata { node_name, contents } => {
                let node = graph
                    .node_mut(node_name)
                    .ok_or_else(|| ValidationError::NodeNotFound(node_name.clone()))?;
                for content in contents {
                    if !node.metadata.contains(content) {
                        return Err(ValidationError::MetadataNotFound {
                            node_name: node_name.clone(),
                            content: content.clone(),
                        });
                    }
                }
                for content in contents {
                    if let Some(pos) = node.metadata.iter().rposition(|m| m == content) {
                        node.metadata.remove(pos);
                    }
                }
            }

            Self::RestoreMetadata { node_name, entries } => {
                let node = graph
                    .node_mut(node_name)
                    .ok_or_else(|| ValidationError::NodeNotFound(node_name.clone()))?;
                insert_positioned(&mut node.metadata, entries);
            }
        }
        Ok(())
    }

    /// Short name of the command, for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RemoveNodes { .. } => "remove_nodes",
            Self::RestoreNodes { .. } => "restore_nodes",
            Self::RevertNodes { .. } => "revert_nodes",
            Self::RemoveEdges { .. } => "remove_edges",
            Self::RestoreEdges { .. } => "restore_edges",
            Self::RevertEdges { .. } => "revert_edges",
            Self::RemoveMetadata { .. } => "remove_metadata",
            Self::RestoreMetadata { .. } => "restore_metadata",
        }
    }
}

fn require_node(graph: &Graph, name: &str) -> Result<(), ValidationError> {
    if graph.contains_node(name) {
        Ok(())
    } else {
        Err(ValidationError::NodeNotFound(name.to_string()))
    }
}

fn require_edge(graph: &Graph, edge: &Edge) -> Result<(), ValidationError> {
    if graph.contains_edge(edge) {
        Ok(())
    } else {
        Err(ValidationError::EdgeNotFound(edge.to_string()))
    }
}

/// Re-insert values at their remembered indices.
///
/// Entries are inserted in ascending index order, which reproduces the
/// original layout when they were removed from it. Indices past the end are
/// clamped.
fn insert_positioned<T: Clone>(target: &mut Vec<T>, entries: &[Positioned<T>]) {
    let mut sorted: Vec<&Positioned<T>> = entries.iter().collect();
    sorted.sort_by_key(|p| p.index);
    for entry in sorted {
        let at = entry.index.min(target.len());
        target.insert(at, entry.value.clone());
    }
}

/// A registered undo step plus a human-readable description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackAction {
    pub command: RollbackCommand,
    pub description: String,
}

impl RollbackAction {
    pub fn new(command: RollbackCommand, description: impl Into<String>) -> Self {
        Self {
            command,
            description: description.into(),
        }
    }
}
