//! # Graph Model
//!
//! The in-memory clinical knowledge graph.
//!
//! A [`Graph`] is an arena of nodes plus a list of edges, indexed by id.
//! Edges refer to their endpoints by [`NodeId`], never by reference, so an
//! edge may be inserted before (or without) the node it points at. Such
//! dangling endpoints are resolved lazily: lookups return `None` and query
//! code omits the missing node.
//!
//! Graphs are assembled through a [`GraphDraft`] and frozen with
//! [`GraphDraft::finish`]. A finished graph has no mutating methods; a new
//! data revision means a new graph.
//!
//! All indices use `BTreeMap` for deterministic ordering.

use crate::{Edge, EdgeId, EdgeKind, Node, NodeId, NodeKind};
use std::collections::BTreeMap;

// =============================================================================
// DRAFT (BUILD-TIME ONLY)
// =============================================================================

/// Mutable staging area used while a graph is being built.
///
/// Deduplicates nodes by id and edges by derived edge id. The first
/// insertion of an id wins; later insertions are reported as no-ops.
#[derive(Debug, Default)]
pub struct GraphDraft {
    nodes: Vec<Node>,
    node_index: BTreeMap<NodeId, usize>,
    edges: Vec<Edge>,
    edge_index: BTreeMap<EdgeId, usize>,
}

impl GraphDraft {
    /// Create an empty draft.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node unless one with the same id exists.
    ///
    /// Returns `true` if the node was added.
    pub fn insert_node(&mut self, node: Node) -> bool {
        if self.node_index.contains_key(&node.id) {
            return false;
        }
        self.node_index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        true
    }

    #[must_use]
    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.node_index.contains_key(id)
    }

    /// Insert an edge unless one with the same id exists.
    ///
    /// Endpoints are not checked: edges may reference nodes that are added
    /// later or never.
    ///
    /// Returns `true` if the edge was added.
    pub fn insert_edge(&mut self, edge: Edge) -> bool {
        if self.edge_index.contains_key(&edge.id) {
            return false;
        }
        self.edge_index.insert(edge.id.clone(), self.edges.len());
        self.edges.push(edge);
        true
    }

    /// Freeze the draft into an immutable graph, building adjacency indices.
    #[must_use]
    pub fn finish(self) -> Graph {
        let mut outgoing: BTreeMap<NodeId, Vec<usize>> = BTreeMap::new();
        let mut incoming: BTreeMap<NodeId, Vec<usize>> = BTreeMap::new();

        for (idx, edge) in self.edges.iter().enumerate() {
            outgoing.entry(edge.source.clone()).or_default().push(idx);
            incoming.entry(edge.target.clone()).or_default().push(idx);
        }

        Graph {
            nodes: self.nodes,
            node_index: self.node_index,
            edges: self.edges,
            edge_index: self.edge_index,
            outgoing,
            incoming,
        }
    }
}

// =============================================================================
// GRAPH (IMMUTABLE SNAPSHOT)
// =============================================================================

/// An immutable clinical knowledge graph.
///
/// Safe to share across threads; every method takes `&self`.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    /// Node arena in insertion order.
    nodes: Vec<Node>,

    /// NodeId -> arena index
    node_index: BTreeMap<NodeId, usize>,

    /// Edge list in insertion order.
    edges: Vec<Edge>,

    /// EdgeId -> edge index
    edge_index: BTreeMap<EdgeId, usize>,

    /// source -> indices of edges leaving it
    outgoing: BTreeMap<NodeId, Vec<usize>>,

    /// target -> indices of edges entering it
    incoming: BTreeMap<NodeId, Vec<usize>>,
}

impl Graph {
    /// Create a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a graph from loose parts, deduplicating by id.
    #[must_use]
    pub fn from_parts(
        nodes: impl IntoIterator<Item = Node>,
        edges: impl IntoIterator<Item = Edge>,
    ) -> Self {
        let mut draft = GraphDraft::new();
        for node in nodes {
            draft.insert_node(node);
        }
        for edge in edges {
            draft.insert_edge(edge);
        }
        draft.finish()
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// All edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    /// Lookup a node by id. Returns `None` for dangling ids.
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.node_index.get(id).map(|&idx| &self.nodes[idx])
    }

    #[must_use]
    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.node_index.contains_key(id)
    }

    /// Lookup an edge by its derived id.
    #[must_use]
    pub fn edge(&self, id: &EdgeId) -> Option<&Edge> {
        self.edge_index.get(id).map(|&idx| &self.edges[idx])
    }

    /// Check whether any edge of the given kind runs from `source` to `target`.
    #[must_use]
    pub fn contains_edge(&self, source: &NodeId, target: &NodeId, kind: EdgeKind) -> bool {
        self.edge_index
            .contains_key(&EdgeId::derive(source, target, kind))
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Edges leaving `id`, in insertion order.
    pub fn outgoing(&self, id: &NodeId) -> impl Iterator<Item = &Edge> + '_ {
        self.outgoing
            .get(id)
            .into_iter()
            .flat_map(|indices| indices.iter().map(|&idx| &self.edges[idx]))
    }

    /// Edges entering `id`, in insertion order.
    pub fn incoming(&self, id: &NodeId) -> impl Iterator<Item = &Edge> + '_ {
        self.incoming
            .get(id)
            .into_iter()
            .flat_map(|indices| indices.iter().map(|&idx| &self.edges[idx]))
    }

    /// Nodes of a single kind, in insertion order.
    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.iter().filter(move |n| n.kind == kind)
    }

    /// An edge is dangling if either endpoint has no node in this graph.
    #[must_use]
    pub fn is_dangling(&self, edge: &Edge) -> bool {
        !self.contains_node(&edge.source) || !self.contains_node(&edge.target)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EdgeWeight, NodePayload};

    fn symptom(slug: &str) -> Node {
        Node::new(
            NodeId::namespaced(NodeKind::Symptom, slug),
            NodeKind::Symptom,
            slug,
            NodePayload::Symptom {
                text: slug.to_string(),
            },
        )
    }

    fn edge(source: &str, target: &str, kind: EdgeKind) -> Edge {
        Edge::new(
            NodeId::from(source),
            NodeId::from(target),
            kind,
            EdgeWeight::ONE,
        )
    }

    #[test]
    fn draft_deduplicates_nodes_by_id() {
        let mut draft = GraphDraft::new();
        assert!(draft.insert_node(symptom("febre")));
        assert!(!draft.insert_node(symptom("febre")));
        assert!(draft.insert_node(symptom("tosse")));

        let graph = draft.finish();
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn draft_deduplicates_edges_by_id() {
        let mut draft = GraphDraft::new();
        assert!(draft.insert_edge(edge("disease:a", "symptom:febre", EdgeKind::Causes)));
        assert!(!draft.insert_edge(edge("disease:a", "symptom:febre", EdgeKind::Causes)));
        // Same endpoints, different kind: a distinct edge.
        assert!(draft.insert_edge(edge("disease:a", "symptom:febre", EdgeKind::Associated)));

        assert_eq!(draft.finish().edge_count(), 2);
    }

    #[test]
    fn edges_may_precede_their_nodes() {
        let mut draft = GraphDraft::new();
        draft.insert_edge(edge("disease:a", "symptom:febre", EdgeKind::Causes));
        draft.insert_node(symptom("febre"));
        let graph = draft.finish();

        let causes: Vec<_> = graph.incoming(&NodeId::from("symptom:febre")).collect();
        assert_eq!(causes.len(), 1);
        // The source was never materialized.
        assert!(graph.node(&NodeId::from("disease:a")).is_none());
        assert!(graph.is_dangling(causes[0]));
    }

    #[test]
    fn adjacency_preserves_insertion_order() {
        let graph = Graph::from_parts(
            Vec::new(),
            vec![
                edge("disease:a", "symptom:z", EdgeKind::Causes),
                edge("disease:a", "symptom:b", EdgeKind::Causes),
                edge("disease:a", "symptom:m", EdgeKind::Causes),
            ],
        );

        let targets: Vec<_> = graph
            .outgoing(&NodeId::from("disease:a"))
            .map(|e| e.target.as_str())
            .collect();
        assert_eq!(targets, vec!["symptom:z", "symptom:b", "symptom:m"]);
    }

    #[test]
    fn lookups_on_missing_ids_are_empty() {
        let graph = Graph::new();
        let id = NodeId::from("disease:none");
        assert!(graph.node(&id).is_none());
        assert_eq!(graph.outgoing(&id).count(), 0);
        assert_eq!(graph.incoming(&id).count(), 0);
        assert!(graph.is_empty());
    }

    #[test]
    fn contains_edge_uses_derived_id() {
        let graph = Graph::from_parts(
            Vec::new(),
            vec![edge("medication:x", "disease:y", EdgeKind::Treats)],
        );
        assert!(graph.contains_edge(
            &NodeId::from("medication:x"),
            &NodeId::from("disease:y"),
            EdgeKind::Treats
        ));
        assert!(!graph.contains_edge(
            &NodeId::from("disease:y"),
            &NodeId::from("medication:x"),
            EdgeKind::Treats
        ));
    }

    #[test]
    fn nodes_of_kind_filters() {
        let graph = Graph::from_parts(vec![symptom("febre"), symptom("tosse")], Vec::new());
        assert_eq!(graph.nodes_of_kind(NodeKind::Symptom).count(), 2);
        assert_eq!(graph.nodes_of_kind(NodeKind::Disease).count(), 0);
    }
}
