// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Default search manager: ranked case-insensitive substring matching.

use kgraph_graph::{Graph, GraphSlice, Node};

use super::SearchManager;

/// Where a query matched a node. Lower ranks sort first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum MatchRank {
    ExactName,
    Name,
    NodeType,
    Metadata,
}

fn rank(node: &Node, needle: &str) -> Option<MatchRank> {
    let name = node.name.to_lowercase();
    if name == needle {
        Some(MatchRank::ExactName)
    } else if name.contains(needle) {
        Some(MatchRank::Name)
    } else if node.node_type.to_lowercase().contains(needle) {
        Some(MatchRank::NodeType)
    } else if node
        .metadata
        .iter()
        .any(|m| m.to_lowercase().contains(needle))
    {
        Some(MatchRank::Metadata)
    } else {
        None
    }
}

/// Matches the query against node name, type and metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSearchManager {
    /// Result cap; `0` means unlimited.
    max_results: usize,
}

impl DefaultSearchManager {
    pub fn new(max_results: usize) -> Self {
        Self { max_results }
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }
}

impl SearchManager for DefaultSearchManager {
    fn search_nodes(&self, graph: &Graph, query: &str) -> GraphSlice {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return GraphSlice::default();
        }

        let mut hits: Vec<(MatchRank, &str)> = graph
            .nodes
            .iter()
            .filter_map(|n| rank(n, &needle).map(|r| (r, n.name.as_str())))
            .collect();
        // Stable: ties keep graph order.
        hits.sort_by_key(|(r, _)| *r);
        if self.max_results > 0 {
            hits.truncate(self.max_results);
        }

        graph.slice(hits.into_iter().map(|(_, name)| name))
    }

    fn open_nodes(&self, graph: &Graph, names: &[String]) -> GraphSlice {
        graph.slice(names.iter().map(String::as_str))
    }
}
