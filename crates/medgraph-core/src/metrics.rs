//! # Graph Metrics
//!
//! Summary counts over a graph snapshot, used by status reporting.

use crate::{EdgeKind, Graph, NodeKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Counts describing a graph snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphMetrics {
    /// Total number of nodes in the graph.
    pub node_count: usize,
    /// Total number of edges in the graph.
    pub edge_count: usize,
    /// Nodes per kind; kinds with no nodes are omitted.
    pub nodes_by_kind: BTreeMap<NodeKind, usize>,
    /// Edges per type; types with no edges are omitted.
    pub edges_by_kind: BTreeMap<EdgeKind, usize>,
    /// Edges with at least one endpoint that has no node.
    pub dangling_edges: usize,
    /// Edge density: edge_count / node_count, in millionths (0 if no nodes).
    pub density_millionths: u64,
}

impl GraphMetrics {
    /// Compute metrics from a graph.
    #[must_use]
    pub fn from_graph(graph: &Graph) -> Self {
        let node_count = graph.node_count();
        let edge_count = graph.edge_count();

        let mut nodes_by_kind = BTreeMap::new();
        for node in graph.nodes() {
            *nodes_by_kind.entry(node.kind).or_insert(0) += 1;
        }

        let mut edges_by_kind = BTreeMap::new();
        let mut dangling_edges = 0;
        for edge in graph.edges() {
            *edges_by_kind.entry(edge.kind).or_insert(0) += 1;
            if graph.is_dangling(edge) {
                dangling_edges += 1;
            }
        }

        let density_millionths = if node_count > 0 {
            (edge_count as u64).saturating_mul(1_000_000) / node_count as u64
        } else {
            0
        };

        Self {
            node_count,
            edge_count,
            nodes_by_kind,
            edges_by_kind,
            dangling_edges,
            density_millionths,
        }
    }

    /// Nodes of one kind.
    #[must_use]
    pub fn nodes_of(&self, kind: NodeKind) -> usize {
        self.nodes_by_kind.get(&kind).copied().unwrap_or(0)
    }

    /// Edges of one type.
    #[must_use]
    pub fn edges_of(&self, kind: EdgeKind) -> usize {
        self.edges_by_kind.get(&kind).copied().unwrap_or(0)
    }
}
