//! # Graph Document Export
//!
//! JSON encoding of a whole graph for use across a process boundary
//! (HTTP responses, CLI output, files handed to a visualizer).
//!
//! A [`GraphDocument`] carries a format tag, a version, declared counts,
//! and the node and edge lists in graph insertion order. Ids, kinds, edge
//! types and weights are kept verbatim, so importing a document rebuilds
//! the same graph, dangling edges included.

use crate::{Edge, EdgeId, Graph, MedGraphError, Node};
use serde::{Deserialize, Serialize};
use std::path::Path;

// =============================================================================
// DOCUMENT FORMAT
// =============================================================================

/// Format tag written into every document.
pub const DOCUMENT_FORMAT: &str = "medgraph";

/// Current document version.
pub const DOCUMENT_VERSION: u32 = 1;

/// Maximum node count accepted on import.
pub const MAX_IMPORT_NODE_COUNT: usize = 1_000_000;

/// Maximum edge count accepted on import.
pub const MAX_IMPORT_EDGE_COUNT: usize = 10_000_000;

/// Serializable form of a [`Graph`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDocument {
    pub format: String,
    pub version: u32,
    pub node_count: usize,
    pub edge_count: usize,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl GraphDocument {
    /// Capture a graph as a document.
    #[must_use]
    pub fn from_graph(graph: &Graph) -> Self {
        Self {
            format: DOCUMENT_FORMAT.to_string(),
            version: DOCUMENT_VERSION,
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
            nodes: graph.nodes().cloned().collect(),
            edges: graph.edges().cloned().collect(),
        }
    }

    /// Check the format tag, version, declared counts and that every edge
    /// id is the one derived from its endpoints and type.
    pub fn validate(&self) -> Result<(), MedGraphError> {
        if self.format != DOCUMENT_FORMAT {
            return Err(MedGraphError::Serialization(
                "Invalid document format".to_string(),
            ));
        }
        if self.version != DOCUMENT_VERSION {
            return Err(MedGraphError::Serialization(format!(
                "Unsupported document version {}",
                self.version
            )));
        }
        if self.node_count > MAX_IMPORT_NODE_COUNT {
            return Err(MedGraphError::Serialization(format!(
                "Node count {} exceeds maximum allowed {}",
                self.node_count, MAX_IMPORT_NODE_COUNT
            )));
        }
        if self.edge_count > MAX_IMPORT_EDGE_COUNT {
            return Err(MedGraphError::Serialization(format!(
                "Edge count {} exceeds maximum allowed {}",
                self.edge_count, MAX_IMPORT_EDGE_COUNT
            )));
        }
        if self.nodes.len() != self.node_count {
            return Err(MedGraphError::Serialization(
                "Node count mismatch".to_string(),
            ));
        }
        if self.edges.len() != self.edge_count {
            return Err(MedGraphError::Serialization(
                "Edge count mismatch".to_string(),
            ));
        }
        if let Some(edge) = self
            .edges
            .iter()
            .find(|e| e.id != EdgeId::derive(&e.source, &e.target, e.kind))
        {
            return Err(MedGraphError::Serialization(format!(
                "Edge id '{}' does not match its endpoints and type",
                edge.id
            )));
        }
        Ok(())
    }

    /// Encode as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, MedGraphError> {
        serde_json::to_string_pretty(self).map_err(|e| MedGraphError::Serialization(e.to_string()))
    }

    /// Decode from JSON. The result is not yet validated.
    pub fn from_json(json: &str) -> Result<Self, MedGraphError> {
        serde_json::from_str(json).map_err(|e| MedGraphError::Serialization(e.to_string()))
    }
}

impl Graph {
    /// Rebuild a graph from a validated document.
    pub fn from_document(document: GraphDocument) -> Result<Self, MedGraphError> {
        document.validate()?;
        Ok(Graph::from_parts(document.nodes, document.edges))
    }
}

// =============================================================================
// CONVENIENCE
// =============================================================================

/// Export a graph as a JSON document string.
pub fn export_document(graph: &Graph) -> Result<String, MedGraphError> {
    GraphDocument::from_graph(graph).to_json()
}

/// Import a graph from a JSON document string.
pub fn import_document(json: &str) -> Result<Graph, MedGraphError> {
    Graph::from_document(GraphDocument::from_json(json)?)
}

/// Write a graph document to a file.
pub fn write_document(graph: &Graph, path: impl AsRef<Path>) -> Result<(), MedGraphError> {
    let path = path.as_ref();
    let json = export_document(graph)?;
    std::fs::write(path, json)
        .map_err(|e| MedGraphError::Io(format!("Cannot write '{}': {}", path.display(), e)))
}

// =============================================================================
// TESTS
// =============================================================================
