// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Knowledge Graph Data Model
//!
//! Typed nodes keyed by a unique name, directed relation edges between them,
//! and ordered metadata observations attached to each node.
//!
//! - **`Graph`**: the aggregate value returned by every read. It is handed out
//!   by value, so a caller never observes later mutation through it.
//! - **Mutation payloads**: `NodeUpdate`, `EdgeUpdate`, `MetadataAddition` and
//!   `MetadataDeletion` describe requested changes; they carry no behaviour.
//! - **`ValidationError`**: the domain errors raised when a mutation does not
//!   fit the graph it is applied to.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Domain validation errors raised by mutation managers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Node already exists: {0}")]
    DuplicateNode(String),

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Edge {from} -[{relation_type}]-> {to} references missing node {missing}")]
    DanglingEdge {
        from: String,
        to: String,
        relation_type: String,
        missing: String,
    },

    #[error("Edge already exists: {0}")]
    DuplicateEdge(String),

    #[error("Edge not found: {0}")]
    EdgeNotFound(String),

    #[error("Metadata entry {content:?} not found on node {node_name}")]
    MetadataNotFound { node_name: String, content: String },

    #[error("Malformed item: {0}")]
    Malformed(String),
}

// ═══════════════════════════════════════════════════════════════════════════
// Nodes and edges
// ═══════════════════════════════════════════════════════════════════════════

/// A typed node identified by its unique name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique key across the graph
    pub name: String,
    /// Type tag, e.g. `"person"`
    pub node_type: String,
    /// Ordered metadata observations
    #[serde(default)]
    pub metadata: Vec<String>,
}

impl Node {
    /// Create a node with no metadata.
    pub fn new(name: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            node_type: node_type.into(),
            metadata: Vec::new(),
        }
    }

    /// Builder-style helper attaching metadata observations.
    pub fn with_metadata<I, S>(mut self, metadata: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metadata.extend(metadata.into_iter().map(Into::into));
        self
    }
}

/// A directed, typed relation between two named nodes.
///
/// The full `(from, to, relation_type)` triple is the edge's identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub relation_type: String,
}

impl Edge {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        relation_type: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            relation_type: relation_type.into(),
        }
    }

    /// Return `true` if `name` is either endpoint.
    pub fn touches(&self, name: &str) -> bool {
        self.from == name || self.to == name
    }
}

impl std::fmt::Display for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -[{}]-> {}", self.from, self.relation_type, self.to)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Mutation payloads
// ═══════════════════════════════════════════════════════════════════════════

/// Partial replacement of a node's fields. The name selects the node.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NodeUpdate {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Vec<String>>,
}

/// Replacement of parts of an existing edge, selected by its current triple.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EdgeUpdate {
    pub from: String,
    pub to: String,
    pub relation_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_relation_type: Option<String>,
}

impl EdgeUpdate {
    /// The edge this update targets.
    pub fn target(&self) -> Edge {
        Edge::new(&self.from, &self.to, &self.relation_type)
    }

    /// The edge that results from applying this update to its target.
    pub fn replacement(&self) -> Edge {
        Edge::new(
            self.new_from.as_deref().unwrap_or(&self.from),
            self.new_to.as_deref().unwrap_or(&self.to),
            self.new_relation_type
                .as_deref()
                .unwrap_or(&self.relation_type),
        )
    }
}

/// Metadata entries to append to a node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MetadataAddition {
    pub node_name: String,
    pub contents: Vec<String>,
}

/// Entries actually appended by a [`MetadataAddition`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MetadataAdded {
    pub node_name: String,
    pub added: Vec<String>,
}

/// Metadata entries to remove from a node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MetadataDeletion {
    pub node_name: String,
    pub contents: Vec<String>,
}

// ═══════════════════════════════════════════════════════════════════════════
// Read shapes
// ═══════════════════════════════════════════════════════════════════════════

/// Selects edges by relation type and/or endpoint. Unset fields match anything.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EdgeFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Matches either endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
}

impl EdgeFilter {
    pub fn relation(relation_type: impl Into<String>) -> Self {
        Self {
            relation_type: Some(relation_type.into()),
            ..Default::default()
        }
    }

    pub fn touching(node: impl Into<String>) -> Self {
        Self {
            node: Some(node.into()),
            ..Default::default()
        }
    }

    pub fn matches(&self, edge: &Edge) -> bool {
        self.relation_type
            .as_ref()
            .map_or(true, |r| &edge.relation_type == r)
            && self.from.as_ref().map_or(true, |f| &edge.from == f)
            && self.to.as_ref().map_or(true, |t| &edge.to == t)
            && self.node.as_ref().map_or(true, |n| edge.touches(n))
    }
}

/// A subset of the graph: some nodes plus the edges among them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GraphSlice {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// Wrapped result of an edge listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EdgeList {
    pub edges: Vec<Edge>,
}

// ═══════════════════════════════════════════════════════════════════════════
// Graph
// ═══════════════════════════════════════════════════════════════════════════

/// All nodes and edges at a point in time, in insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn node_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.name == name)
    }

    pub fn node_index(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.name == name)
    }

    pub fn contains_node(&self, name: &str) -> bool {
        self.node(name).is_some()
    }

    pub fn edge_index(&self, edge: &Edge) -> Option<usize> {
        self.edges.iter().position(|e| e == edge)
    }

    pub fn contains_edge(&self, edge: &Edge) -> bool {
        self.edge_index(edge).is_some()
    }

    /// Edges matching `filter`, in graph order.
    pub fn edges_matching(&self, filter: &EdgeFilter) -> Vec<Edge> {
        self.edges
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect()
    }

    /// Build a slice from the named nodes, keeping only edges whose both
    /// endpoints are among them. Node order follows `names`; unknown names
    /// are skipped.
    pub fn slice<'a, I>(&self, names: I) -> GraphSlice
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen = HashSet::new();
        let nodes: Vec<Node> = names
            .into_iter()
            .filter(|name| seen.insert(*name))
            .filter_map(|name| self.node(name).cloned())
            .collect();

        let included: HashSet<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
        let edges = self
            .edges
            .iter()
            .filter(|e| included.contains(e.from.as_str()) && included.contains(e.to.as_str()))
            .cloned()
            .collect();

        GraphSlice { nodes, edges }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Graph {
        Graph {
            nodes: vec![
                Node::new("alice", "person").with_metadata(["likes tea"]),
                Node::new("bob", "person"),
                Node::new("acme", "company"),
            ],
            edges: vec![
                Edge::new("alice", "bob", "knows"),
                Edge::new("alice", "acme", "works_at"),
                Edge::new("bob", "acme", "works_at"),
            ],
        }
    }

    #[test]
    fn test_node_lookup() {
        let g = sample();
        assert_eq!(g.node_index("bob"), Some(1));
        assert!(g.contains_node("acme"));
        assert!(!g.contains_node("carol"));
        assert_eq!(g.node("alice").unwrap().metadata, vec!["likes tea"]);
    }

    #[test]
    fn test_edge_filter() {
        let g = sample();
        assert_eq!(g.edges_matching(&EdgeFilter::default()).len(), 3);
        assert_eq!(g.edges_matching(&EdgeFilter::relation("works_at")).len(), 2);
        assert_eq!(g.edges_matching(&EdgeFilter::touching("bob")).len(), 2);

        let filter = EdgeFilter {
            from: Some("alice".into()),
            relation_type: Some("works_at".into()),
            ..Default::default()
        };
        assert_eq!(
            g.edges_matching(&filter),
            vec![Edge::new("alice", "acme", "works_at")]
        );
    }

    #[test]
    fn test_slice_keeps_internal_edges_only() {
        let g = sample();
        let slice = g.slice(["alice", "bob", "nobody"]);
        assert_eq!(slice.nodes.len(), 2);
        assert_eq!(slice.edges, vec![Edge::new("alice", "bob", "knows")]);
    }

    #[test]
    fn test_slice_deduplicates_names() {
        let g = sample();
        let slice = g.slice(["bob", "bob"]);
        assert_eq!(slice.nodes.len(), 1);
    }

    #[test]
    fn test_edge_update_replacement() {
        let update = EdgeUpdate {
            from: "alice".into(),
            to: "bob".into(),
            relation_type: "knows".into(),
            new_relation_type: Some("mentors".into()),
            ..Default::default()
        };
        assert_eq!(update.target(), Edge::new("alice", "bob", "knows"));
        assert_eq!(update.replacement(), Edge::new("alice", "bob", "mentors"));
    }

    #[test]
    fn test_serde_field_names() {
        let node = Node::new("alice", "person");
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["nodeType"], "person");

        let edge = Edge::new("a", "b", "rel");
        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(json["relationType"], "rel");
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::DanglingEdge {
            from: "x".into(),
            to: "y".into(),
            relation_type: "rel".into(),
            missing: "y".into(),
        };
        assert!(err.to_string().contains("missing node y"));
    }
}
