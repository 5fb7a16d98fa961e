//! # Query Engine
//!
//! Read-only relationship queries over an immutable [`Graph`].
//!
//! - Every operation takes `&Graph` and returns owned results
//! - Absent anchors produce empty results, never errors
//! - Dangling edge endpoints are omitted from node lists
//!
//! [`Query`] and [`execute`] wrap the operations in a structured form for
//! callers that receive queries as data (the HTTP and CLI layers).

use crate::paths::{GraphPath, PathLimits, find_paths_with_limits};
use crate::{Edge, EdgeKind, Graph, MedGraphError, Node, NodeId, NodeKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

// =============================================================================
// RESULT TYPES
// =============================================================================

/// An anchor node and the nodes it is related to through specific edges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Related {
    /// The node the query started from, if it is materialized.
    pub anchor: Option<Node>,
    /// Counterpart nodes, in edge order, without duplicates.
    pub related: Vec<Node>,
    /// The edges that connect anchor and counterparts.
    pub edges: Vec<Edge>,
}

impl Related {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.anchor.is_none() && self.related.is_empty() && self.edges.is_empty()
    }
}

/// A group of diseases that co-occur in patients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComorbidityCluster {
    pub diseases: Vec<NodeId>,
    pub co_occurrences: usize,
}

/// Which end of an edge the anchor sits on.
#[derive(Debug, Clone, Copy)]
enum Side {
    /// Anchor is the edge source; counterparts are targets.
    Source,
    /// Anchor is the edge target; counterparts are sources.
    Target,
}

/// Collect edges of `kind` incident to `anchor` on the given side, and the
/// materialized nodes at their other ends.
fn related_by(graph: &Graph, anchor: &NodeId, kind: EdgeKind, side: Side) -> Related {
    let edges: Vec<Edge> = match side {
        Side::Source => graph
            .outgoing(anchor)
            .filter(|e| e.kind == kind)
            .cloned()
            .collect(),
        Side::Target => graph
            .incoming(anchor)
            .filter(|e| e.kind == kind)
            .cloned()
            .collect(),
    };

    let mut seen = BTreeSet::new();
    let related = edges
        .iter()
        .map(|e| match side {
            Side::Source => &e.target,
            Side::Target => &e.source,
        })
        .filter(|id| seen.insert(*id))
        .filter_map(|id| graph.node(id).cloned())
        .collect();

    Related {
        anchor: graph.node(anchor).cloned(),
        related,
        edges,
    }
}

// =============================================================================
// RELATIONSHIP QUERIES
// =============================================================================

/// Find the diseases that cause a symptom matching `text`.
///
/// `text` is matched case-insensitively, surrounding whitespace included,
/// as a substring of symptom labels; blank text matches nothing. Only the first matching symptom (in build order) is used. The result's
/// anchor is that symptom, its `related` nodes the diseases, and its edges
/// the `causes` edges (disease → symptom) between them.
#[must_use]
pub fn find_diseases_by_symptom(graph: &Graph, text: &str) -> Related {
    if text.trim().is_empty() {
        return Related::default();
    }
    let needle = text.to_lowercase();

    graph
        .nodes_of_kind(NodeKind::Symptom)
        .find(|n| n.label.to_lowercase().contains(&needle))
        .map(|symptom| related_by(graph, &symptom.id, EdgeKind::Causes, Side::Target))
        .unwrap_or_default()
}

/// Find the medications that treat a disease.
///
/// Accepts a raw disease id or a `disease:`-namespaced id.
#[must_use]
pub fn find_medications_for_disease(graph: &Graph, disease_id: &str) -> Related {
    let anchor = NodeKind::Disease.qualify(disease_id);
    related_by(graph, &anchor, EdgeKind::Treats, Side::Target)
}

/// Find the diseases a medication treats.
///
/// Accepts a raw medication id or a `medication:`-namespaced id.
#[must_use]
pub fn find_diseases_for_medication(graph: &Graph, medication_id: &str) -> Related {
    let anchor = NodeKind::Medication.qualify(medication_id);
    related_by(graph, &anchor, EdgeKind::Treats, Side::Source)
}

// =============================================================================
// SUBGRAPHS
// =============================================================================

/// Node-induced subgraph: exactly the given nodes that exist, and only the
/// edges whose endpoints are both in the given set.
#[must_use]
pub fn get_subgraph<'a>(graph: &Graph, node_ids: impl IntoIterator<Item = &'a NodeId>) -> Graph {
    let wanted: BTreeSet<&NodeId> = node_ids.into_iter().collect();
    induced(graph, |node| wanted.contains(&node.id), |id| wanted.contains(id))
}

/// Induced subgraph over every node of the given kinds.
#[must_use]
pub fn subgraph_by_kind(graph: &Graph, kinds: &[NodeKind]) -> Graph {
    let kept: BTreeSet<&NodeId> = graph
        .nodes()
        .filter(|n| kinds.contains(&n.kind))
        .map(|n| &n.id)
        .collect();
    induced(graph, |node| kept.contains(&node.id), |id| kept.contains(id))
}

fn induced(
    graph: &Graph,
    keep_node: impl Fn(&Node) -> bool,
    in_set: impl Fn(&NodeId) -> bool,
) -> Graph {
    Graph::from_parts(
        graph.nodes().filter(|n| keep_node(n)).cloned(),
        graph
            .edges()
            .filter(|e| in_set(&e.source) && in_set(&e.target))
            .cloned(),
    )
}

// =============================================================================
// CLUSTERING
// =============================================================================

/// Group diseases that co-occur at least `min_co_occurrences` times.
///
/// Not available: the entity source carries no co-occurrence data, so this
/// always returns [`MedGraphError::Unsupported`]. Callers must not read the
/// error as "no clusters".
pub fn find_comorbidity_clusters(
    _graph: &Graph,
    _min_co_occurrences: usize,
) -> Result<Vec<ComorbidityCluster>, MedGraphError> {
    Err(MedGraphError::Unsupported("comorbidity clustering"))
}

// =============================================================================
// STRUCTURED QUERIES
// =============================================================================

/// Query operation types supported by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryType {
    /// Diseases causing the first symptom matching a text.
    DiseasesBySymptom(String),

    /// Medications treating a disease.
    MedicationsForDisease(String),

    /// Diseases treated by a medication.
    DiseasesForMedication(String),

    /// Simple paths between two nodes.
    Paths {
        source: NodeId,
        target: NodeId,
        max_depth: usize,
    },

    /// Node-induced subgraph.
    Subgraph(Vec<NodeId>),

    /// Induced subgraph over node kinds.
    SubgraphByKind(Vec<NodeKind>),

    /// Comorbidity clusters (unsupported).
    ComorbidityClusters { min_co_occurrences: usize },
}

/// A structured query with optional timeout.
#[derive(Debug, Clone)]
pub struct Query {
    /// The type of query operation.
    pub query_type: QueryType,
    /// Optional timeout in milliseconds, applied to path search.
    pub timeout_ms: Option<u64>,
    /// Optional node-expansion budget, applied to path search.
    pub max_expansions: Option<usize>,
}

impl Query {
    /// Create a new query with no timeout.
    #[must_use]
    pub fn new(query_type: QueryType) -> Self {
        Self {
            query_type,
            timeout_ms: None,
            max_expansions: None,
        }
    }

    /// Create a new query with a timeout.
    #[must_use]
    pub fn with_timeout(query_type: QueryType, timeout_ms: u64) -> Self {
        Self {
            timeout_ms: Some(timeout_ms),
            ..Self::new(query_type)
        }
    }

    #[must_use]
    pub fn with_max_expansions(mut self, max_expansions: usize) -> Self {
        self.max_expansions = Some(max_expansions);
        self
    }

    /// Symptom lookup helper.
    #[must_use]
    pub fn symptom(text: impl Into<String>) -> Self {
        Self::new(QueryType::DiseasesBySymptom(text.into()))
    }

    /// Paths helper.
    #[must_use]
    pub fn paths(source: impl Into<String>, target: impl Into<String>, max_depth: usize) -> Self {
        Self::new(QueryType::Paths {
            source: NodeId(source.into()),
            target: NodeId(target.into()),
            max_depth,
        })
    }

    /// Subgraph helper.
    #[must_use]
    pub fn subgraph(node_ids: Vec<NodeId>) -> Self {
        Self::new(QueryType::Subgraph(node_ids))
    }
}

/// Result of executing a [`Query`].
#[derive(Debug, Clone)]
pub enum QueryOutcome {
    Related(Related),
    Paths { paths: Vec<GraphPath>, truncated: bool },
    Subgraph(Graph),
    Clusters(Vec<ComorbidityCluster>),
}

/// Execute a structured query against a graph.
///
/// Fails only for unsupported operations.
pub fn execute(graph: &Graph, query: &Query) -> Result<QueryOutcome, MedGraphError> {
    match &query.query_type {
        QueryType::DiseasesBySymptom(text) => {
            Ok(QueryOutcome::Related(find_diseases_by_symptom(graph, text)))
        }
        QueryType::MedicationsForDisease(id) => {
            Ok(QueryOutcome::Related(find_medications_for_disease(graph, id)))
        }
        QueryType::DiseasesForMedication(id) => {
            Ok(QueryOutcome::Related(find_diseases_for_medication(graph, id)))
        }
        QueryType::Paths {
            source,
            target,
            max_depth,
        } => {
            let limits = PathLimits {
                max_depth: *max_depth,
                max_expansions: query.max_expansions,
                timeout: query.timeout_ms.map(Duration::from_millis),
            };
            let search = find_paths_with_limits(graph, source, target, &limits);
            Ok(QueryOutcome::Paths {
                paths: search.paths,
                truncated: search.truncated,
            })
        }
        QueryType::Subgraph(ids) => Ok(QueryOutcome::Subgraph(get_subgraph(graph, ids))),
        QueryType::SubgraphByKind(kinds) => {
            Ok(QueryOutcome::Subgraph(subgraph_by_kind(graph, kinds)))
        }
        QueryType::ComorbidityClusters { min_co_occurrences } => Ok(QueryOutcome::Clusters(
            find_comorbidity_clusters(graph, *min_co_occurrences)?,
        )),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EdgeWeight, NodePayload};

    fn disease(id: &str) -> Node {
        Node::new(
            NodeKind::Disease.qualify(id),
            NodeKind::Disease,
            id,
            NodePayload::Disease {
                disease_id: id.to_string(),
                icd10: Vec::new(),
                ciap2: Vec::new(),
            },
        )
    }

    fn symptom(label: &str) -> Node {
        Node::new(
            NodeId::namespaced(NodeKind::Symptom, &crate::normalize::slugify(label)),
            NodeKind::Symptom,
            label,
            NodePayload::Symptom {
                text: label.to_string(),
            },
        )
    }

    fn medication(id: &str) -> Node {
        Node::new(
            NodeKind::Medication.qualify(id),
            NodeKind::Medication,
            id,
            NodePayload::Medication {
                medication_id: id.to_string(),
                atc_code: None,
            },
        )
    }

    fn edge(source: &Node, target: &str, kind: EdgeKind, weight: f64) -> Edge {
        Edge::new(
            source.id.clone(),
            NodeId::from(target),
            kind,
            EdgeWeight::new(weight),
        )
    }

    fn sample() -> Graph {
        let dengue = disease("dengue");
        let gripe = disease("gripe");
        let febre = symptom("Febre alta");
        let tosse = symptom("Tosse seca");
        let paracetamol = medication("paracetamol");
        Graph::from_parts(
            vec![
                dengue.clone(),
                gripe.clone(),
                febre.clone(),
                tosse,
                paracetamol.clone(),
            ],
            vec![
                edge(&dengue, "symptom:febre-alta", EdgeKind::Causes, 1.0),
                edge(&gripe, "symptom:febre-alta", EdgeKind::Causes, 1.0),
                edge(&gripe, "symptom:tosse-seca", EdgeKind::Causes, 1.0),
                edge(&paracetamol, "disease:dengue", EdgeKind::Treats, 0.9),
                edge(&paracetamol, "disease:gripe", EdgeKind::Treats, 0.9),
                // Medication without a record: dangling source.
                Edge::new(
                    NodeId::from("medication:oseltamivir"),
                    NodeId::from("disease:gripe"),
                    EdgeKind::Treats,
                    EdgeWeight::new(0.9),
                ),
            ],
        )
    }

    #[test]
    fn symptom_lookup_is_case_insensitive_substring() {
        let graph = sample();
        let result = find_diseases_by_symptom(&graph, "FEBRE");

        let anchor = result.anchor.as_ref().expect("anchor");
        assert_eq!(anchor.id.as_str(), "symptom:febre-alta");
        let diseases: Vec<_> = result.related.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(diseases, vec!["disease:dengue", "disease:gripe"]);
        assert!(result.edges.iter().all(|e| e.kind == EdgeKind::Causes));
    }

    #[test]
    fn symptom_lookup_uses_first_match_only() {
        let graph = sample();
        // "e" matches both symptoms; the first in build order wins.
        let result = find_diseases_by_symptom(&graph, "e");
        assert_eq!(
            result.anchor.map(|n| n.id),
            Some(NodeId::from("symptom:febre-alta"))
        );
    }

    #[test]
    fn symptom_lookup_keeps_surrounding_whitespace() {
        let graph = sample();
        let result = find_diseases_by_symptom(&graph, " ALTA");
        assert_eq!(
            result.anchor.map(|n| n.id),
            Some(NodeId::from("symptom:febre-alta"))
        );
        // No label ends in "alta " so a trailing space must not match.
        assert!(find_diseases_by_symptom(&graph, "alta ").is_empty());
    }

    #[test]
    fn symptom_lookup_without_match_is_empty() {
        let graph = sample();
        assert!(find_diseases_by_symptom(&graph, "cefaleia").is_empty());
        assert!(find_diseases_by_symptom(&graph, "   ").is_empty());
    }

    #[test]
    fn medications_for_disease_omits_dangling_nodes() {
        let graph = sample();
        let result = find_medications_for_disease(&graph, "gripe");

        assert_eq!(
            result.anchor.as_ref().map(|n| n.id.as_str()),
            Some("disease:gripe")
        );
        assert_eq!(result.edges.len(), 2);
        let meds: Vec<_> = result.related.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(meds, vec!["medication:paracetamol"]);
    }

    #[test]
    fn namespaced_ids_are_accepted() {
        let graph = sample();
        let raw = find_medications_for_disease(&graph, "dengue");
        let namespaced = find_medications_for_disease(&graph, "disease:dengue");
        assert_eq!(raw, namespaced);
    }

    #[test]
    fn diseases_for_medication_follows_treats() {
        let graph = sample();
        let result = find_diseases_for_medication(&graph, "paracetamol");
        let diseases: Vec<_> = result.related.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(diseases, vec!["disease:dengue", "disease:gripe"]);
        assert!(result.edges.iter().all(|e| e.kind == EdgeKind::Treats));
    }

    #[test]
    fn dangling_anchor_still_reports_edges() {
        let graph = sample();
        let result = find_diseases_for_medication(&graph, "oseltamivir");
        assert!(result.anchor.is_none());
        assert_eq!(result.edges.len(), 1);
        assert_eq!(result.related.len(), 1);
    }

    #[test]
    fn unknown_anchor_is_empty() {
        let graph = sample();
        assert!(find_medications_for_disease(&graph, "inexistente").is_empty());
    }

    #[test]
    fn subgraph_is_node_induced() {
        let graph = sample();
        let ids = [
            NodeId::from("disease:gripe"),
            NodeId::from("symptom:tosse-seca"),
            NodeId::from("not:present"),
        ];
        let sub = get_subgraph(&graph, &ids);

        assert_eq!(sub.node_count(), 2);
        assert_eq!(sub.edge_count(), 1);
        for edge in sub.edges() {
            assert!(ids.contains(&edge.source) && ids.contains(&edge.target));
        }
    }

    #[test]
    fn subgraph_by_kind_filters_nodes_and_edges() {
        let graph = sample();
        let sub = subgraph_by_kind(&graph, &[NodeKind::Disease, NodeKind::Medication]);
        assert_eq!(sub.node_count(), 3);
        // Only materialized treats edges survive.
        assert_eq!(sub.edge_count(), 2);
        assert!(sub.edges().all(|e| e.kind == EdgeKind::Treats));
    }

    #[test]
    fn comorbidity_clusters_are_unsupported() {
        let graph = sample();
        let result = find_comorbidity_clusters(&graph, 2);
        assert!(matches!(result, Err(MedGraphError::Unsupported(_))));
    }

    #[test]
    fn execute_dispatches_queries() {
        let graph = sample();

        let outcome = execute(&graph, &Query::symptom("tosse")).expect("symptom");
        assert!(matches!(outcome, QueryOutcome::Related(r) if r.related.len() == 1));

        let outcome = execute(
            &graph,
            &Query::paths("medication:paracetamol", "symptom:tosse-seca", 3),
        )
        .expect("paths");
        match outcome {
            QueryOutcome::Paths { paths, truncated } => {
                assert!(!truncated);
                assert_eq!(paths.len(), 1);
                assert_eq!(paths[0].len(), 2);
            }
            other => unreachable!("unexpected outcome: {other:?}"),
        }

        let clusters = execute(
            &graph,
            &Query::new(QueryType::ComorbidityClusters {
                min_co_occurrences: 1,
            }),
        );
        assert!(matches!(clusters, Err(MedGraphError::Unsupported(_))));
    }

    #[test]
    fn query_with_timeout() {
        let q = Query::with_timeout(QueryType::MedicationsForDisease("x".into()), 1000);
        assert_eq!(q.timeout_ms, Some(1000));
        assert_eq!(q.max_expansions, None);
    }
}
