// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Line-delimited JSON file backend.
//
// Each line holds one record tagged with its kind:
//
// ```text
// {"type":"node","name":"alice","nodeType":"person","metadata":["likes tea"]}
// {"type":"edge","from":"alice","to":"bob","relationType":"knows"}
// ```
//
// Saves write a sibling temporary file and rename it over the target, so a
// crash mid-write leaves the previous file intact on filesystems where rename
// is atomic.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use kgraph_graph::{Edge, Graph, Node};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backend::GraphBackend;
use crate::error::StorageError;

/// One line of the file.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Record {
    Node(Node),
    Edge(Edge),
}

/// A graph backend persisting to a single JSONL file.
#[derive(Debug, Clone)]
pub struct JsonlBackend {
    path: PathBuf,
}

impl JsonlBackend {
    /// Use the file at `path`. The file is created on first save.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Return the filesystem path of the graph file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Parse file contents into a graph.
    fn decode(contents: &str) -> Result<Graph, StorageError> {
        let mut graph = Graph::new();
        for (idx, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let record: Record =
                serde_json::from_str(line).map_err(|e| StorageError::CorruptedData {
                    line: idx + 1,
                    reason: e.to_string(),
                })?;
            match record {
                Record::Node(node) => graph.nodes.push(node),
                Record::Edge(edge) => graph.edges.push(edge),
            }
        }
        Ok(graph)
    }

    /// Render a graph as file contents.
    fn encode(graph: &Graph) -> Result<String, StorageError> {
        let mut out = String::new();
        for node in &graph.nodes {
            out.push_str(&serde_json::to_string(&Record::Node(node.clone()))?);
            out.push('\n');
        }
        for edge in &graph.edges {
            out.push_str(&serde_json::to_string(&Record::Edge(edge.clone()))?);
            out.push('\n');
        }
        Ok(out)
    }
}

#[async_trait]
impl GraphBackend for JsonlBackend {
    async fn load_graph(&self) -> Result<Graph, StorageError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "graph file absent, loading empty graph");
                return Ok(Graph::new());
            }
            Err(e) => return Err(StorageError::Io(e)),
        };
        let graph = Self::decode(&contents)?;
        debug!(
            path = %self.path.display(),
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "loaded graph file"
        );
        Ok(graph)
    }

    async fn save_graph(&self, graph: &Graph) -> Result<(), StorageError> {
        let contents = Self::encode(graph)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, contents.as_bytes()).await?;
        tokio::fs::rename(&temp, &self.path).await?;

        debug!(
            path = %self.path.display(),
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "saved graph file"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "jsonl"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> Graph {
        Graph {
            nodes: vec![
                Node::new("alice", "person").with_metadata(["likes tea", "lives in York"]),
                Node::new("bob", "person"),
            ],
            edges: vec![Edge::new("alice", "bob", "knows")],
        }
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let backend = JsonlBackend::new(dir.path().join("graph.jsonl"));
        assert!(backend.load_graph().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("graph.jsonl");
        let backend = JsonlBackend::new(&path);

        backend.save_graph(&sample()).await.unwrap();
        assert!(path.exists());
        assert!(!backend.temp_path().exists());

        let reopened = JsonlBackend::new(&path);
        assert_eq!(reopened.load_graph().await.unwrap(), sample());
    }

    #[tokio::test]
    async fn test_line_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("graph.jsonl");
        let backend = JsonlBackend::new(&path);
        backend.save_graph(&sample()).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains(r#""type":"node""#));
        assert!(lines[0].contains(r#""nodeType":"person""#));
        assert!(lines[2].contains(r#""type":"edge""#));
        assert!(lines[2].contains(r#""relationType":"knows""#));
    }

    #[tokio::test]
    async fn test_blank_lines_ignored() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("graph.jsonl");
        std::fs::write(
            &path,
            "\n{\"type\":\"node\",\"name\":\"a\",\"nodeType\":\"t\"}\n\n",
        )
        .unwrap();

        let graph = JsonlBackend::new(&path).load_graph().await.unwrap();
        assert_eq!(graph.nodes, vec![Node::new("a", "t")]);
    }

    #[tokio::test]
    async fn test_corrupt_line_reports_position() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("graph.jsonl");
        std::fs::write(
            &path,
            "{\"type\":\"node\",\"name\":\"a\",\"nodeType\":\"t\"}\nnot json\n",
        )
        .unwrap();

        let err = JsonlBackend::new(&path).load_graph().await.unwrap_err();
        assert!(matches!(err, StorageError::CorruptedData { line: 2, .. }));
    }

    #[tokio::test]
    async fn test_name() {
        assert_eq!(JsonlBackend::new("x.jsonl").name(), "jsonl");
    }
}
