//! # medgraph-core
//!
//! The clinical knowledge graph engine for MedGraph - THE LOGIC.
//!
//! This crate turns read-only disease and medication records into an
//! immutable, typed, weighted graph and answers relationship queries over it.
//!
//! ## Architectural Constraints
//!
//! The CORE:
//! - Is synchronous and has NO network dependencies
//! - Never mutates its entity source
//! - Produces graphs that are immutable once built; a rebuild yields a new
//!   snapshot, published through [`SnapshotCell`]
//! - Uses `BTreeMap`/`BTreeSet` only, so iteration order is deterministic

// =============================================================================
// MODULES
// =============================================================================

pub mod builder;
pub mod export;
pub mod graph;
pub mod metrics;
pub mod normalize;
pub mod paths;
pub mod primitives;
pub mod query;
pub mod snapshot;
pub mod source;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Edge, EdgeId, EdgeKind, EdgePayload, EdgeWeight, MedGraphError, Node, NodeId, NodeKind,
    NodePayload,
};

// =============================================================================
// RE-EXPORTS: Graph Engine
// =============================================================================

pub use builder::{BuildReport, GraphBuilder, build_graph};
pub use export::{GraphDocument, export_document, import_document, write_document};
pub use graph::{Graph, GraphDraft};
pub use metrics::GraphMetrics;
pub use paths::{GraphPath, PathLimits, PathSearch, find_paths, find_paths_with_limits};
pub use query::{
    ComorbidityCluster, Query, QueryOutcome, QueryType, Related, execute,
    find_comorbidity_clusters, find_diseases_by_symptom, find_diseases_for_medication,
    find_medications_for_disease, get_subgraph, subgraph_by_kind,
};
pub use snapshot::SnapshotCell;

// =============================================================================
// RE-EXPORTS: Entity Source
// =============================================================================

pub use source::{Catalog, DiseaseRecord, EntitySource, Interaction, MedicationRecord};
