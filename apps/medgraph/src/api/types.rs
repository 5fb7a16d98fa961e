//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.

use crate::config::PathsConfig;
use medgraph_core::{
    ComorbidityCluster, Edge, GraphMetrics, GraphPath, MedGraphError, Node, NodeId, NodeKind,
    Query, QueryOutcome, QueryType,
    primitives::{MAX_PATH_DEPTH, MAX_SUBGRAPH_NODES},
};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Snapshot status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub revision: u64,
    pub source: Option<String>,
    #[serde(flatten)]
    pub metrics: GraphMetrics,
}

// =============================================================================
// QUERY REQUEST/RESPONSE
// =============================================================================

fn default_min_co_occurrences() -> usize {
    2
}

/// Query request (tagged union).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueryRequest {
    DiseasesBySymptom {
        text: String,
    },
    MedicationsForDisease {
        disease_id: String,
    },
    DiseasesForMedication {
        medication_id: String,
    },
    Paths {
        source: String,
        target: String,
        #[serde(default)]
        max_depth: Option<usize>,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },
    Subgraph {
        node_ids: Vec<String>,
    },
    SubgraphByKind {
        kinds: Vec<NodeKind>,
    },
    ComorbidityClusters {
        #[serde(default = "default_min_co_occurrences")]
        min_co_occurrences: usize,
    },
}

impl QueryRequest {
    /// Convert to a core query, validating bounds.
    ///
    /// Path depth is capped at `MAX_PATH_DEPTH` and subgraph requests at
    /// `MAX_SUBGRAPH_NODES` ids; the configured search budget applies to
    /// every path query.
    pub fn to_query(&self, paths: &PathsConfig) -> Result<Query, MedGraphError> {
        let query = match self {
            QueryRequest::DiseasesBySymptom { text } => {
                Query::new(QueryType::DiseasesBySymptom(text.clone()))
            }
            QueryRequest::MedicationsForDisease { disease_id } => {
                Query::new(QueryType::MedicationsForDisease(disease_id.clone()))
            }
            QueryRequest::DiseasesForMedication { medication_id } => {
                Query::new(QueryType::DiseasesForMedication(medication_id.clone()))
            }
            QueryRequest::Paths {
                source,
                target,
                max_depth,
                timeout_ms,
            } => {
                let depth = max_depth.unwrap_or(paths.max_depth);
                validate_depth(depth)?;
                let limits = paths.limits(depth, *timeout_ms);
                Query {
                    query_type: QueryType::Paths {
                        source: NodeId(source.clone()),
                        target: NodeId(target.clone()),
                        max_depth: depth,
                    },
                    timeout_ms: limits.timeout.map(|t| t.as_millis() as u64),
                    max_expansions: limits.max_expansions,
                }
            }
            QueryRequest::Subgraph { node_ids } => {
                if node_ids.len() > MAX_SUBGRAPH_NODES {
                    return Err(MedGraphError::InvalidQuery(format!(
                        "Subgraph of {} nodes exceeds maximum {}",
                        node_ids.len(),
                        MAX_SUBGRAPH_NODES
                    )));
                }
                Query::subgraph(node_ids.iter().map(|id| NodeId(id.clone())).collect())
            }
            QueryRequest::SubgraphByKind { kinds } => {
                Query::new(QueryType::SubgraphByKind(kinds.clone()))
            }
            QueryRequest::ComorbidityClusters { min_co_occurrences } => {
                Query::new(QueryType::ComorbidityClusters {
                    min_co_occurrences: *min_co_occurrences,
                })
            }
        };
        Ok(query)
    }
}

/// Validate that depth is within bounds.
fn validate_depth(depth: usize) -> Result<(), MedGraphError> {
    if depth > MAX_PATH_DEPTH {
        return Err(MedGraphError::InvalidQuery(format!(
            "Depth {} exceeds maximum {}",
            depth, MAX_PATH_DEPTH
        )));
    }
    Ok(())
}

/// Query response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResponse {
    pub success: bool,
    pub found: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<Node>,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<GraphPath>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clusters: Vec<ComorbidityCluster>,
    #[serde(default)]
    pub truncated: bool,
    pub error: Option<String>,
}

impl QueryResponse {
    pub fn from_outcome(outcome: QueryOutcome) -> Self {
        match outcome {
            QueryOutcome::Related(related) => Self {
                success: true,
                found: !related.related.is_empty(),
                anchor: related.anchor,
                nodes: related.related,
                edges: related.edges,
                ..Self::default()
            },
            QueryOutcome::Paths { paths, truncated } => Self {
                success: true,
                found: !paths.is_empty(),
                paths,
                truncated,
                ..Self::default()
            },
            QueryOutcome::Subgraph(graph) => Self {
                success: true,
                found: graph.node_count() > 0,
                nodes: graph.nodes().cloned().collect(),
                edges: graph.edges().cloned().collect(),
                ..Self::default()
            },
            QueryOutcome::Clusters(clusters) => Self {
                success: true,
                found: !clusters.is_empty(),
                clusters,
                ..Self::default()
            },
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(msg.into()),
            ..Self::default()
        }
    }
}

// =============================================================================
// RELOAD RESPONSE
// =============================================================================

/// Rebuild-and-publish response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReloadResponse {
    pub success: bool,
    pub revision: Option<u64>,
    pub node_count: usize,
    pub edge_count: usize,
    /// Source records skipped during the build.
    pub skipped: usize,
    pub error: Option<String>,
}

impl ReloadResponse {
    pub fn success(revision: u64, node_count: usize, edge_count: usize, skipped: usize) -> Self {
        Self {
            success: true,
            revision: Some(revision),
            node_count,
            edge_count,
            skipped,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(msg.into()),
            ..Self::default()
        }
    }
}
