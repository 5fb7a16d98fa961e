//! # Graph Builder
//!
//! Deterministic transformation from an [`EntitySource`] to a [`Graph`].
//!
//! - Consumes the whole source once per build
//! - Deduplicates nodes by id, edges by derived edge id
//! - Never fails: malformed records are skipped, logged and counted
//!
//! ## Phases
//!
//! | Phase | Input | Output |
//! |-------|-------|--------|
//! | Diseases | disease records | disease, symptom, exam nodes; causes, diagnoses, treats, associated, calculates edges |
//! | Medications | medication records | medication, gene nodes; interacts, metabolizes edges |
//!
//! `treats`, `associated` and `calculates` edges are emitted during the
//! disease phase and may point at nodes that a later phase creates, or at
//! nodes that are never created.

use crate::graph::GraphDraft;
use crate::normalize::{interaction_weight, slugify};
use crate::primitives::{
    CALCULATOR_WEIGHT, CAUSES_WEIGHT, DIAGNOSES_WEIGHT, METABOLIZES_WEIGHT, PROTOCOL_WEIGHT,
    SYMPTOM_KEYWORDS, TREATS_WEIGHT,
};
use crate::source::{DiseaseRecord, EntitySource, MedicationRecord};
use crate::{Edge, EdgeKind, EdgePayload, EdgeWeight, Graph, Node, NodeId, NodeKind, NodePayload};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// BUILD REPORT
// =============================================================================

/// Counters describing what a build pass skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    /// Records the source could not decode.
    pub rejected_records: usize,
    /// Disease records without an id.
    pub skipped_diseases: usize,
    /// Medication records without an id.
    pub skipped_medications: usize,
    /// Symptom or exam labels whose slug is empty.
    pub skipped_labels: usize,
    /// Interactions naming a partner absent from the source.
    pub unresolved_interactions: usize,
    /// Pharmacogenomic annotations without a gene symbol.
    pub skipped_annotations: usize,
    /// Edge insertions collapsed into an existing edge id.
    pub duplicate_edges: usize,
}

impl BuildReport {
    /// Total number of skipped inputs.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.rejected_records
            + self.skipped_diseases
            + self.skipped_medications
            + self.skipped_labels
            + self.unresolved_interactions
            + self.skipped_annotations
    }
}

// =============================================================================
// BUILDER
// =============================================================================

/// Builds a graph from an entity source.
///
/// The builder owns only the draft and report of the pass in progress.
/// Calling [`GraphBuilder::build`] consumes it.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    draft: GraphDraft,
    report: BuildReport,
}

impl GraphBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a full build pass over the source.
    pub fn build<S: EntitySource + ?Sized>(mut self, source: &S) -> (Graph, BuildReport) {
        self.report.rejected_records = source.rejected_records();
        for disease in source.diseases() {
            self.add_disease(disease);
        }
        for medication in source.medications() {
            self.add_medication(medication, source);
        }

        let graph = self.draft.finish();
        tracing::info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            skipped = self.report.skipped(),
            "knowledge graph built"
        );
        (graph, self.report)
    }

    fn add_disease(&mut self, disease: &DiseaseRecord) {
        if disease.id.is_empty() {
            tracing::debug!(title = %disease.title, "skipping disease record without id");
            self.report.skipped_diseases += 1;
            return;
        }

        let disease_id = NodeId::namespaced(NodeKind::Disease, &disease.id);
        self.draft.insert_node(Node::new(
            disease_id.clone(),
            NodeKind::Disease,
            disease.title.clone(),
            NodePayload::Disease {
                disease_id: disease.id.clone(),
                icd10: disease.icd10.clone(),
                ciap2: disease.ciap2.clone(),
            },
        ));

        for symptom in extract_symptoms(disease) {
            let Some(symptom_id) = self.ensure_labeled_node(NodeKind::Symptom, &symptom) else {
                continue;
            };
            self.link(Edge::new(
                disease_id.clone(),
                symptom_id,
                EdgeKind::Causes,
                EdgeWeight::new(CAUSES_WEIGHT),
            ));
        }

        for exam in extract_exams(disease) {
            let Some(exam_id) = self.ensure_labeled_node(NodeKind::Exam, &exam) else {
                continue;
            };
            self.link(Edge::new(
                exam_id,
                disease_id.clone(),
                EdgeKind::Diagnoses,
                EdgeWeight::new(DIAGNOSES_WEIGHT),
            ));
        }

        // Referenced entities below are linked by id only.
        let references = [
            (NodeKind::Medication, &disease.medications, EdgeKind::Treats, TREATS_WEIGHT),
            (NodeKind::Protocol, &disease.protocols, EdgeKind::Associated, PROTOCOL_WEIGHT),
            (NodeKind::Calculator, &disease.calculators, EdgeKind::Calculates, CALCULATOR_WEIGHT),
        ];
        for (kind, ids, edge_kind, weight) in references {
            for raw in ids.iter().filter(|raw| !raw.is_empty()) {
                self.link(Edge::new(
                    NodeId::namespaced(kind, raw),
                    disease_id.clone(),
                    edge_kind,
                    EdgeWeight::new(weight),
                ));
            }
        }
    }

    fn add_medication<S: EntitySource + ?Sized>(
        &mut self,
        medication: &MedicationRecord,
        source: &S,
    ) {
        if medication.id.is_empty() {
            tracing::debug!(name = %medication.generic_name, "skipping medication record without id");
            self.report.skipped_medications += 1;
            return;
        }

        let medication_id = NodeId::namespaced(NodeKind::Medication, &medication.id);
        self.draft.insert_node(Node::new(
            medication_id.clone(),
            NodeKind::Medication,
            medication.generic_name.clone(),
            NodePayload::Medication {
                medication_id: medication.id.clone(),
                atc_code: medication.atc_code.clone(),
            },
        ));

        for interaction in &medication.interactions {
            if interaction.partner_id.is_empty() || !source.has_medication(&interaction.partner_id)
            {
                tracing::warn!(
                    medication = %medication.id,
                    partner = %interaction.partner_id,
                    "interaction partner not found in source, skipping"
                );
                self.report.unresolved_interactions += 1;
                continue;
            }

            let partner_id = NodeId::namespaced(NodeKind::Medication, &interaction.partner_id);
            self.link(
                Edge::new(
                    medication_id.clone(),
                    partner_id,
                    EdgeKind::Interacts,
                    EdgeWeight::new(interaction_weight(&interaction.severity)),
                )
                .with_label(interaction.severity.clone())
                .with_payload(EdgePayload {
                    severity: Some(interaction.severity.clone()),
                    mechanism: interaction.mechanism.clone(),
                }),
            );
        }

        for annotation in &medication.pharmacogenomics {
            let symbol = annotation.gene.trim();
            if symbol.is_empty() {
                self.report.skipped_annotations += 1;
                continue;
            }

            let gene_id = NodeId::namespaced(NodeKind::Gene, symbol);
            self.draft.insert_node(Node::new(
                gene_id.clone(),
                NodeKind::Gene,
                symbol,
                NodePayload::Gene {
                    symbol: symbol.to_string(),
                },
            ));
            self.link(Edge::new(
                gene_id,
                medication_id.clone(),
                EdgeKind::Metabolizes,
                EdgeWeight::new(METABOLIZES_WEIGHT),
            ));
        }
    }

    /// Get or create the node for a symptom or exam label.
    ///
    /// Returns `None` when the label has no usable slug.
    fn ensure_labeled_node(&mut self, kind: NodeKind, label: &str) -> Option<NodeId> {
        let slug = slugify(label);
        if slug.is_empty() {
            tracing::debug!(kind = %kind, label, "skipping label with empty slug");
            self.report.skipped_labels += 1;
            return None;
        }

        let id = NodeId::namespaced(kind, &slug);
        if !self.draft.contains_node(&id) {
            let text = label.to_string();
            let payload = match kind {
                NodeKind::Exam => NodePayload::Exam { text },
                _ => NodePayload::Symptom { text },
            };
            self.draft
                .insert_node(Node::new(id.clone(), kind, label, payload));
        }
        Some(id)
    }

    fn link(&mut self, edge: Edge) {
        if !self.draft.insert_edge(edge) {
            self.report.duplicate_edges += 1;
        }
    }
}

/// Build a graph from an entity source, discarding the report.
#[must_use]
pub fn build_graph<S: EntitySource + ?Sized>(source: &S) -> Graph {
    GraphBuilder::new().build(source).0
}

// =============================================================================
// EXTRACTION
// =============================================================================

/// Union of keyword hits in the diagnostic criteria and the structured
/// principal-symptom list, in first-seen order.
fn extract_symptoms(disease: &DiseaseRecord) -> Vec<String> {
    let mut symptoms = OrderedSet::default();

    for criterion in &disease.quick_view.diagnostic_criteria {
        let lowered = criterion.to_lowercase();
        for keyword in SYMPTOM_KEYWORDS {
            if lowered.contains(keyword) {
                symptoms.insert(keyword);
            }
        }
    }

    for symptom in &disease.full_content.clinical_presentation.principal_symptoms {
        symptoms.insert(symptom);
    }

    symptoms.into_vec()
}

/// Union of initial, lab and imaging exams, in first-seen order.
fn extract_exams(disease: &DiseaseRecord) -> Vec<String> {
    let mut exams = OrderedSet::default();
    let lists = [
        &disease.quick_view.initial_exams,
        &disease.full_content.diagnosis.lab_exams,
        &disease.full_content.diagnosis.imaging_exams,
    ];
    for exam in lists.into_iter().flatten() {
        exams.insert(exam);
    }
    exams.into_vec()
}

/// Insertion-ordered set of strings.
#[derive(Default)]
struct OrderedSet {
    seen: BTreeSet<String>,
    items: Vec<String>,
}

impl OrderedSet {
    fn insert(&mut self, value: &str) {
        if self.seen.insert(value.to_string()) {
            self.items.push(value.to_string());
        }
    }

    fn into_vec(self) -> Vec<String> {
        self.items
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{
        Catalog, ClinicalPresentation, DiagnosticWorkup, FullContent, Interaction,
        PharmacogenomicAnnotation, QuickView,
    };

    fn disease(id: &str) -> DiseaseRecord {
        DiseaseRecord {
            id: id.to_string(),
            title: id.to_uppercase(),
            ..DiseaseRecord::default()
        }
    }

    fn medication(id: &str) -> MedicationRecord {
        MedicationRecord {
            id: id.to_string(),
            generic_name: id.to_string(),
            ..MedicationRecord::default()
        }
    }

    #[test]
    fn symptoms_from_keywords_and_structured_list() {
        let record = DiseaseRecord {
            quick_view: QuickView {
                diagnostic_criteria: vec![
                    "Febre > 38°C com tosse produtiva".to_string(),
                    "Tosse há mais de 3 semanas".to_string(),
                ],
                ..QuickView::default()
            },
            full_content: FullContent {
                clinical_presentation: ClinicalPresentation {
                    principal_symptoms: vec!["Hemoptise".to_string(), "febre".to_string()],
                },
                ..FullContent::default()
            },
            ..disease("tb")
        };

        assert_eq!(
            extract_symptoms(&record),
            vec!["febre", "tosse", "Hemoptise"]
        );
    }

    #[test]
    fn keyword_match_is_substring() {
        let record = DiseaseRecord {
            quick_view: QuickView {
                diagnostic_criteria: vec!["Episódios de DOR torácica".to_string()],
                ..QuickView::default()
            },
            ..disease("angina")
        };
        assert_eq!(extract_symptoms(&record), vec!["dor"]);
    }

    #[test]
    fn exams_union_three_lists() {
        let record = DiseaseRecord {
            quick_view: QuickView {
                initial_exams: vec!["ECG".to_string(), "Troponina".to_string()],
                ..QuickView::default()
            },
            full_content: FullContent {
                diagnosis: DiagnosticWorkup {
                    lab_exams: vec!["Troponina".to_string(), "CK-MB".to_string()],
                    imaging_exams: vec!["Ecocardiograma".to_string()],
                },
                ..FullContent::default()
            },
            ..disease("iam")
        };
        assert_eq!(
            extract_exams(&record),
            vec!["ECG", "Troponina", "CK-MB", "Ecocardiograma"]
        );
    }

    #[test]
    fn treats_edge_may_dangle() {
        let catalog = Catalog::new(
            vec![DiseaseRecord {
                medications: vec!["losartana".to_string()],
                ..disease("hipertensao-arterial")
            }],
            Vec::new(),
        );

        let (graph, _) = GraphBuilder::new().build(&catalog);
        let edge = graph
            .edges()
            .find(|e| e.kind == EdgeKind::Treats)
            .expect("treats edge");
        assert_eq!(edge.source.as_str(), "medication:losartana");
        assert_eq!(edge.target.as_str(), "disease:hipertensao-arterial");
        assert!(graph.is_dangling(edge));
    }

    #[test]
    fn protocols_and_calculators_link_to_disease() {
        let catalog = Catalog::new(
            vec![DiseaseRecord {
                protocols: vec!["has-2024".to_string()],
                calculators: vec!["framingham".to_string()],
                ..disease("has")
            }],
            Vec::new(),
        );
        let graph = build_graph(&catalog);
        let target = NodeId::from("disease:has");

        let protocol = graph
            .edges()
            .find(|e| e.kind == EdgeKind::Associated)
            .expect("associated");
        assert_eq!(protocol.source.as_str(), "protocol:has-2024");
        assert_eq!(protocol.target, target);
        assert_eq!(protocol.weight.value(), PROTOCOL_WEIGHT);

        let calculator = graph
            .edges()
            .find(|e| e.kind == EdgeKind::Calculates)
            .expect("calculates");
        assert_eq!(calculator.source.as_str(), "calculator:framingham");
        assert_eq!(calculator.target, target);
    }

    #[test]
    fn interaction_edges_carry_severity() {
        let catalog = Catalog::new(
            Vec::new(),
            vec![
                MedicationRecord {
                    interactions: vec![Interaction {
                        partner_id: "aas".to_string(),
                        severity: "Grave".to_string(),
                        mechanism: Some("Sangramento".to_string()),
                    }],
                    ..medication("varfarina")
                },
                medication("aas"),
            ],
        );

        let graph = build_graph(&catalog);
        let edge = graph
            .edges()
            .find(|e| e.kind == EdgeKind::Interacts)
            .expect("interacts");
        assert_eq!(edge.source.as_str(), "medication:varfarina");
        assert_eq!(edge.target.as_str(), "medication:aas");
        assert_eq!(edge.weight.value(), 1.0);
        assert_eq!(edge.label.as_deref(), Some("Grave"));
        let payload = edge.payload.as_ref().expect("payload");
        assert_eq!(payload.mechanism.as_deref(), Some("Sangramento"));
    }

    #[test]
    fn unresolved_partner_is_counted() {
        let catalog = Catalog::new(
            Vec::new(),
            vec![MedicationRecord {
                interactions: vec![Interaction {
                    partner_id: "fantasma".to_string(),
                    severity: "leve".to_string(),
                    mechanism: None,
                }],
                ..medication("dipirona")
            }],
        );

        let (graph, report) = GraphBuilder::new().build(&catalog);
        assert_eq!(report.unresolved_interactions, 1);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn genes_are_shared_between_medications() {
        let cyp = || PharmacogenomicAnnotation {
            gene: "CYP2C9".to_string(),
        };
        let catalog = Catalog::new(
            Vec::new(),
            vec![
                MedicationRecord {
                    pharmacogenomics: vec![cyp()],
                    ..medication("varfarina")
                },
                MedicationRecord {
                    pharmacogenomics: vec![cyp(), PharmacogenomicAnnotation::default()],
                    ..medication("losartana")
                },
            ],
        );

        let (graph, report) = GraphBuilder::new().build(&catalog);
        assert_eq!(graph.nodes_of_kind(NodeKind::Gene).count(), 1);
        let gene = NodeId::from("gene:CYP2C9");
        assert_eq!(graph.outgoing(&gene).count(), 2);
        assert_eq!(report.skipped_annotations, 1);
    }

    #[test]
    fn records_without_id_are_skipped() {
        let catalog = Catalog::new(vec![disease("")], vec![medication("")]);
        let (graph, report) = GraphBuilder::new().build(&catalog);
        assert!(graph.is_empty());
        assert_eq!(report.skipped_diseases, 1);
        assert_eq!(report.skipped_medications, 1);
    }

    #[test]
    fn null_and_undecodable_records_never_fail_the_build() {
        let catalog = Catalog::from_json(
            r#"{
                "diseases": [{"id": null, "title": "x"}, {"id": "asma", "title": "Asma"}, 7],
                "medications": [{"id": "m", "genericName": null}]
            }"#,
        )
        .expect("parse");

        let (graph, report) = GraphBuilder::new().build(&catalog);
        assert!(graph.contains_node(&NodeId::from("disease:asma")));
        assert!(graph.contains_node(&NodeId::from("medication:m")));
        assert_eq!(report.skipped_diseases, 1);
        assert_eq!(report.rejected_records, 1);
        assert_eq!(report.skipped(), 2);
    }

    #[test]
    fn punctuation_only_labels_are_skipped() {
        let catalog = Catalog::new(
            vec![DiseaseRecord {
                full_content: FullContent {
                    clinical_presentation: ClinicalPresentation {
                        principal_symptoms: vec!["---".to_string()],
                    },
                    ..FullContent::default()
                },
                ..disease("x")
            }],
            Vec::new(),
        );
        let (graph, report) = GraphBuilder::new().build(&catalog);
        assert_eq!(report.skipped_labels, 1);
        assert_eq!(graph.nodes_of_kind(NodeKind::Symptom).count(), 0);
    }

    #[test]
    fn same_slug_within_disease_yields_one_edge() {
        let catalog = Catalog::new(
            vec![DiseaseRecord {
                full_content: FullContent {
                    clinical_presentation: ClinicalPresentation {
                        principal_symptoms: vec!["Náusea".to_string(), "nausea".to_string()],
                    },
                    ..FullContent::default()
                },
                ..disease("gastrite")
            }],
            Vec::new(),
        );
        let (graph, report) = GraphBuilder::new().build(&catalog);
        assert_eq!(graph.nodes_of_kind(NodeKind::Symptom).count(), 1);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(report.duplicate_edges, 1);
        // First wording wins the label.
        let node = graph
            .node(&NodeId::from("symptom:nausea"))
            .expect("symptom");
        assert_eq!(node.label, "Náusea");
    }
}
