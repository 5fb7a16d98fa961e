//! # Property-Based Tests
//!
//! Structural invariants of built graphs, path search and subgraphs,
//! checked over generated catalogs.

use medgraph_core::source::{
    ClinicalPresentation, FullContent, PharmacogenomicAnnotation, QuickView,
};
use medgraph_core::{
    Catalog, DiseaseRecord, EdgeKind, Graph, Interaction, MedicationRecord, NodeId, NodeKind,
    build_graph, find_paths, get_subgraph,
};
use proptest::collection::vec;
use proptest::prelude::*;
use proptest::sample::select;
use std::collections::BTreeSet;

// =============================================================================
// STRATEGIES
// =============================================================================

const SYMPTOMS: [&str; 8] = [
    "Febre",
    "febre",
    "Tosse seca",
    "Dor torácica",
    "Cefaleia",
    "Náusea",
    "!!!",
    "Dispneia aos esforços",
];

const CRITERIA: [&str; 3] = ["febre e tosse", "dor intensa", "sem achados"];

const GENES: [&str; 3] = ["CYP2C9", "CYP3A4", " "];

const SEVERITIES: [&str; 6] = ["grave", "moderada", "leve", "contraindicada", "", "desconhecida"];

fn medication_id() -> impl Strategy<Value = String> {
    (0usize..8).prop_map(|i| format!("med-{i}"))
}

fn disease() -> impl Strategy<Value = DiseaseRecord> {
    (
        0usize..12,
        vec(0usize..SYMPTOMS.len(), 0..5),
        vec(medication_id(), 0..4),
        vec(select(CRITERIA.to_vec()), 0..3),
    )
        .prop_map(|(i, symptoms, medications, criteria)| DiseaseRecord {
            id: format!("d-{i}"),
            title: format!("Disease {i}"),
            quick_view: QuickView {
                diagnostic_criteria: criteria.into_iter().map(str::to_string).collect(),
                initial_exams: vec!["Hemograma".to_string()],
            },
            full_content: FullContent {
                clinical_presentation: ClinicalPresentation {
                    principal_symptoms: symptoms.into_iter().map(|s| SYMPTOMS[s].to_string()).collect(),
                },
                ..FullContent::default()
            },
            medications,
            protocols: vec![format!("p-{i}")],
            ..DiseaseRecord::default()
        })
}

fn medication() -> impl Strategy<Value = MedicationRecord> {
    (
        medication_id(),
        vec((0usize..12, 0usize..SEVERITIES.len()), 0..3),
        vec(select(GENES.to_vec()), 0..2),
    )
        .prop_map(|(id, interactions, genes)| MedicationRecord {
            generic_name: id.to_uppercase(),
            id,
            interactions: interactions
                .into_iter()
                .map(|(partner, severity)| Interaction {
                    // Partners above med-7 never exist.
                    partner_id: format!("med-{partner}"),
                    severity: SEVERITIES[severity].to_string(),
                    mechanism: None,
                })
                .collect(),
            pharmacogenomics: genes
                .into_iter()
                .map(|gene| PharmacogenomicAnnotation {
                    gene: gene.to_string(),
                })
                .collect(),
            ..MedicationRecord::default()
        })
}

fn catalog() -> impl Strategy<Value = Catalog> {
    (vec(disease(), 0..8), vec(medication(), 0..8))
        .prop_map(|(diseases, medications)| Catalog::new(diseases, medications))
}

fn node_ids(graph: &Graph) -> BTreeSet<NodeId> {
    graph.nodes().map(|n| n.id.clone()).collect()
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// No two nodes share an id; no two edges share an id.
    #[test]
    fn ids_are_unique(catalog in catalog()) {
        let graph = build_graph(&catalog);

        prop_assert_eq!(node_ids(&graph).len(), graph.node_count());
        let edge_ids: BTreeSet<_> = graph.edges().map(|e| e.id.clone()).collect();
        prop_assert_eq!(edge_ids.len(), graph.edge_count());
    }

    /// Endpoints follow the direction table for every kind that has one.
    #[test]
    fn edge_direction_fidelity(catalog in catalog()) {
        let graph = build_graph(&catalog);

        for edge in graph.edges() {
            if let Some((source_kind, target_kind)) = edge.kind.endpoints() {
                prop_assert_eq!(edge.source.kind(), Some(source_kind), "{}", edge.id);
                prop_assert_eq!(edge.target.kind(), Some(target_kind), "{}", edge.id);
            }
        }
    }

    /// Building twice yields the same node and edge id sequences.
    #[test]
    fn rebuild_is_idempotent(catalog in catalog()) {
        let first = build_graph(&catalog);
        let second = build_graph(&catalog);

        let edges = |g: &Graph| g.edges().map(|e| e.id.clone()).collect::<Vec<_>>();
        let nodes = |g: &Graph| g.nodes().map(|n| n.id.clone()).collect::<Vec<_>>();
        prop_assert_eq!(nodes(&first), nodes(&second));
        prop_assert_eq!(edges(&first), edges(&second));
    }

    /// Interacts edges only connect medications present in the source.
    #[test]
    fn interactions_never_dangle(catalog in catalog()) {
        let graph = build_graph(&catalog);

        for edge in graph.edges().filter(|e| e.kind == EdgeKind::Interacts) {
            prop_assert!(graph.contains_node(&edge.target));
        }
    }

    /// Weights stay within [0, 1].
    #[test]
    fn weights_in_unit_interval(catalog in catalog()) {
        let graph = build_graph(&catalog);
        for edge in graph.edges() {
            prop_assert!((0.0..=1.0).contains(&edge.weight.value()));
        }
    }

    /// Every path respects the depth bound, is simple, and follows real edges.
    #[test]
    fn paths_are_valid(
        catalog in catalog(),
        source_index in 0usize..64,
        target_index in 0usize..64,
        depth in 0usize..5
    ) {
        let graph = build_graph(&catalog);
        prop_assume!(graph.node_count() > 0);

        let ids: Vec<NodeId> = node_ids(&graph).into_iter().collect();
        let source = &ids[source_index % ids.len()];
        let target = &ids[target_index % ids.len()];

        for path in find_paths(&graph, source, target, depth) {
            prop_assert!(path.len() <= depth);
            prop_assert_eq!(path.nodes.len(), path.edges.len() + 1);
            prop_assert_eq!(path.nodes.first(), Some(source));
            prop_assert_eq!(path.nodes.last(), Some(target));

            let unique: BTreeSet<_> = path.nodes.iter().collect();
            prop_assert_eq!(unique.len(), path.nodes.len());

            for (pair, edge) in path.nodes.windows(2).zip(&path.edges) {
                prop_assert_eq!(&edge.source, &pair[0]);
                prop_assert_eq!(&edge.target, &pair[1]);
                prop_assert!(graph.contains_edge(&pair[0], &pair[1], edge.kind));
            }
        }
    }

    /// Paths come back sorted by length, then weight descending.
    #[test]
    fn paths_are_sorted(catalog in catalog(), depth in 1usize..5) {
        let graph = build_graph(&catalog);
        let Some(source) = graph.nodes_of_kind(NodeKind::Medication).next() else {
            return Ok(());
        };
        let Some(target) = graph.nodes_of_kind(NodeKind::Symptom).next() else {
            return Ok(());
        };

        let paths = find_paths(&graph, &source.id, &target.id, depth);
        for pair in paths.windows(2) {
            prop_assert!(
                pair[0].len() < pair[1].len()
                    || (pair[0].len() == pair[1].len()
                        && pair[0].total_weight >= pair[1].total_weight)
            );
        }
    }

    /// Every subgraph edge has both endpoints in the requested set.
    #[test]
    fn subgraph_is_closed(catalog in catalog(), picks in vec(0usize..64, 0..10)) {
        let graph = build_graph(&catalog);
        prop_assume!(graph.node_count() > 0);

        let ids: Vec<NodeId> = node_ids(&graph).into_iter().collect();
        let wanted: BTreeSet<NodeId> = picks.iter().map(|i| ids[i % ids.len()].clone()).collect();
        let sub = get_subgraph(&graph, &wanted);

        prop_assert_eq!(sub.node_count(), wanted.len());
        for edge in sub.edges() {
            prop_assert!(wanted.contains(&edge.source));
            prop_assert!(wanted.contains(&edge.target));
        }
    }
}
