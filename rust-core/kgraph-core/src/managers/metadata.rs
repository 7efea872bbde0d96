// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Default metadata manager.
//
// Additions skip entries the node already carries. Deletions remove every
// occurrence of each named entry and remember the positions they held, which
// is the part of the undo that cannot be recomputed from the resulting state.

use std::collections::HashMap;

use async_trait::async_trait;
use kgraph_graph::{MetadataAdded, MetadataAddition, MetadataDeletion, ValidationError};
use tracing::debug;

use super::MetadataManager;
use crate::error::Result;
use crate::rollback::{Positioned, RollbackAction, RollbackCommand};
use crate::transaction::TransactionManager;

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMetadataManager;

impl DefaultMetadataManager {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MetadataManager for DefaultMetadataManager {
    async fn add_metadata(
        &self,
        txn: &TransactionManager,
        additions: Vec<MetadataAddition>,
    ) -> Result<Vec<MetadataAdded>> {
        txn.mutate_working_graph(move |graph| {
            for addition in &additions {
                if !graph.contains_node(&addition.node_name) {
                    return Err(ValidationError::NodeNotFound(addition.node_name.clone()));
                }
            }

            let mut results = Vec::with_capacity(additions.len());
            let mut undo = Vec::new();
            for MetadataAddition {
                node_name,
                contents,
            } in additions
            {
                let Some(node) = graph.node_mut(&node_name) else {
                    continue;
                };
                let mut added = Vec::new();
                for content in contents {
                    if !node.metadata.contains(&content) {
                        node.metadata.push(content.clone());
                        added.push(content);
                    }
                }
                if !added.is_empty() {
                    undo.push(RollbackAction::new(
                        RollbackCommand::RemoveMetadata {
                            node_name: node_name.clone(),
                            contents: added.clone(),
                        },
                        format!("remove {} metadata entr(ies) added to {node_name}", added.len()),
                    ));
                }
                results.push(MetadataAdded { node_name, added });
            }

            debug!(
                nodes = results.len(),
                entries = results.iter().map(|r| r.added.len()).sum::<usize>(),
                "Metadata added to working snapshot"
            );
            Ok((results, undo))
        })
        .await
    }

    async fn delete_metadata(
        &self,
        txn: &TransactionManager,
        deletions: Vec<MetadataDeletion>,
    ) -> Result<()> {
        txn.mutate_working_graph(move |graph| {
            // Stage removals on copies so a later failure leaves the graph untouched.
            let mut staged: HashMap<&str, Vec<String>> = HashMap::new();
            let mut undo = Vec::new();

            for deletion in &deletions {
                let node_name = deletion.node_name.as_str();
                if !staged.contains_key(node_name) {
                    let node = graph
                        .node(node_name)
                        .ok_or_else(|| ValidationError::NodeNotFound(node_name.to_string()))?;
                    staged.insert(node_name, node.metadata.clone());
                }
                let Some(metadata) = staged.get_mut(node_name) else {
                    continue;
                };

                if let Some(missing) = deletion.contents.iter().find(|c| !metadata.contains(c)) {
                    return Err(ValidationError::MetadataNotFound {
                        node_name: node_name.to_string(),
                        content: missing.clone(),
                    });
                }

                let entries: Vec<Positioned<String>> = metadata
                    .iter()
                    .enumerate()
                    .filter(|(_, m)| deletion.contents.contains(m))
                    .map(|(i, m)| Positioned::new(i, m.clone()))
                    .collect();
                if entries.is_empty() {
                    continue;
                }
                metadata.retain(|m| !deletion.contents.contains(m));

                undo.push(RollbackAction::new(
                    RollbackCommand::RestoreMetadata {
                        node_name: node_name.to_string(),
                        entries: entries.clone(),
                    },
                    format!(
                        "restore {} metadata entr(ies) deleted from {node_name}",
                        entries.len()
                    ),
                ));
            }

            let touched = staged.len();
            for (node_name, metadata) in staged {
                if let Some(node) = graph.node_mut(node_name) {
                    node.metadata = metadata;
                }
            }
            debug!(nodes = touched, steps = undo.len(), "Metadata deleted from working snapshot");
            Ok(((), undo))
        })
        .await
    }
}
