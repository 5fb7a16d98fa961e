//! # Core Type Definitions
//!
//! This module contains the graph model primitives for MedGraph:
//! - Identifiers (`NodeId`, `EdgeId`)
//! - Node and edge kinds (`NodeKind`, `EdgeKind`)
//! - Weighted relationships (`EdgeWeight`, `Edge`)
//! - Clinical concepts (`Node`, `NodePayload`)
//! - Error types (`MedGraphError`)
//!
//! ## Identity Guarantees
//!
//! - Node ids are namespaced by kind (`disease:<id>`, `symptom:<slug>`).
//! - Edge ids are derived from `(source, target, type)` so that inserting
//!   the same relationship twice is idempotent.
//! - Identifiers implement `Ord` for deterministic ordering in `BTreeMap`.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Globally unique identifier of a node, namespaced by its kind.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Build a namespaced id (`<kind>:<key>`).
    #[must_use]
    pub fn namespaced(kind: NodeKind, key: &str) -> Self {
        Self(format!("{}:{}", kind.as_str(), key))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The kind encoded in the namespace prefix, if it is a known kind.
    #[must_use]
    pub fn kind(&self) -> Option<NodeKind> {
        let (prefix, _) = self.0.split_once(':')?;
        NodeKind::parse(prefix)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Deterministic identifier of an edge: `edge:<source>:<target>:<type>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub String);

impl EdgeId {
    #[must_use]
    pub fn derive(source: &NodeId, target: &NodeId, kind: EdgeKind) -> Self {
        Self(format!("edge:{}:{}:{}", source, target, kind.as_str()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

// =============================================================================
// KINDS
// =============================================================================

/// The clinical concept a node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    Disease,
    Symptom,
    Exam,
    Medication,
    MetabolicPathway,
    Gene,
    Protocol,
    Calculator,
}

impl NodeKind {
    /// Every kind, in declaration order.
    pub const ALL: [NodeKind; 8] = [
        NodeKind::Disease,
        NodeKind::Symptom,
        NodeKind::Exam,
        NodeKind::Medication,
        NodeKind::MetabolicPathway,
        NodeKind::Gene,
        NodeKind::Protocol,
        NodeKind::Calculator,
    ];

    /// Namespace prefix used in node ids.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Disease => "disease",
            NodeKind::Symptom => "symptom",
            NodeKind::Exam => "exam",
            NodeKind::Medication => "medication",
            NodeKind::MetabolicPathway => "metabolic-pathway",
            NodeKind::Gene => "gene",
            NodeKind::Protocol => "protocol",
            NodeKind::Calculator => "calculator",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }

    /// Qualify a raw record id with this kind's namespace.
    ///
    /// Ids that already carry the namespace are returned unchanged, so
    /// callers may pass either `"losartana"` or `"medication:losartana"`.
    #[must_use]
    pub fn qualify(&self, id: &str) -> NodeId {
        let prefix = self.as_str();
        match id.strip_prefix(prefix) {
            Some(rest) if rest.starts_with(':') => NodeId(id.to_string()),
            _ => NodeId::namespaced(*self, id),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// The relationship an edge expresses.
///
/// Direction is fixed per kind; see [`EdgeKind::endpoints`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeKind {
    Causes,
    Treats,
    Diagnoses,
    Interacts,
    Metabolizes,
    Uses,
    Calculates,
    CoOccurs,
    Contraindicated,
    Associated,
}

impl EdgeKind {
    /// Every kind, in declaration order.
    pub const ALL: [EdgeKind; 10] = [
        EdgeKind::Causes,
        EdgeKind::Treats,
        EdgeKind::Diagnoses,
        EdgeKind::Interacts,
        EdgeKind::Metabolizes,
        EdgeKind::Uses,
        EdgeKind::Calculates,
        EdgeKind::CoOccurs,
        EdgeKind::Contraindicated,
        EdgeKind::Associated,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Causes => "causes",
            EdgeKind::Treats => "treats",
            EdgeKind::Diagnoses => "diagnoses",
            EdgeKind::Interacts => "interacts",
            EdgeKind::Metabolizes => "metabolizes",
            EdgeKind::Uses => "uses",
            EdgeKind::Calculates => "calculates",
            EdgeKind::CoOccurs => "co-occurs",
            EdgeKind::Contraindicated => "contraindicated",
            EdgeKind::Associated => "associated",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }

    /// The `(source, target)` node kinds this relationship connects, for
    /// kinds whose direction is fixed by the graph schema.
    ///
    /// Downstream queries rely on this table; the builder never infers
    /// direction from call order.
    #[must_use]
    pub fn endpoints(&self) -> Option<(NodeKind, NodeKind)> {
        match self {
            EdgeKind::Causes => Some((NodeKind::Disease, NodeKind::Symptom)),
            EdgeKind::Treats => Some((NodeKind::Medication, NodeKind::Disease)),
            EdgeKind::Diagnoses => Some((NodeKind::Exam, NodeKind::Disease)),
            EdgeKind::Metabolizes => Some((NodeKind::Gene, NodeKind::Medication)),
            EdgeKind::Associated => Some((NodeKind::Protocol, NodeKind::Disease)),
            EdgeKind::Calculates => Some((NodeKind::Calculator, NodeKind::Disease)),
            EdgeKind::Interacts => Some((NodeKind::Medication, NodeKind::Medication)),
            EdgeKind::Uses | EdgeKind::CoOccurs | EdgeKind::Contraindicated => None,
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

// =============================================================================
// EDGE WEIGHT
// =============================================================================

/// Confidence/severity proxy of an edge, always within `[0, 1]`.
///
/// Constructed values are clamped; decoded values outside the range are
/// rejected.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct EdgeWeight(f64);

impl EdgeWeight {
    /// Full-confidence weight.
    pub const ONE: EdgeWeight = EdgeWeight(1.0);

    /// Create a weight, clamping into `[0, 1]`. NaN maps to zero.
    #[must_use]
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self(0.0);
        }
        Self(value.clamp(0.0, 1.0))
    }

    #[must_use]
    pub const fn value(&self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for EdgeWeight {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(format!("edge weight {} outside [0, 1]", value))
        }
    }
}

impl From<EdgeWeight> for f64 {
    fn from(weight: EdgeWeight) -> Self {
        weight.0
    }
}

// =============================================================================
// NODE
// =============================================================================

/// Kind-specific attributes carried by a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum NodePayload {
    Disease {
        disease_id: String,
        icd10: Vec<String>,
        ciap2: Vec<String>,
    },
    Symptom {
        text: String,
    },
    Exam {
        text: String,
    },
    Medication {
        medication_id: String,
        atc_code: Option<String>,
    },
    Gene {
        symbol: String,
    },
    Reference {
        reference_id: String,
    },
}

/// One clinical concept in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub label: String,
    pub payload: NodePayload,
}

impl Node {
    #[must_use]
    pub fn new(id: NodeId, kind: NodeKind, label: impl Into<String>, payload: NodePayload) -> Self {
        Self {
            id,
            kind,
            label: label.into(),
            payload,
        }
    }
}

// =============================================================================
// EDGE
// =============================================================================

/// Free-form annotation attached to an edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgePayload {
    pub severity: Option<String>,
    pub mechanism: Option<String>,
}

/// A directed, typed, weighted relationship between two node ids.
///
/// Endpoints are ids rather than references: an edge may point at a node
/// that is never materialized (a dangling edge).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
    pub weight: EdgeWeight,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<EdgePayload>,
}

impl Edge {
    /// Create an unannotated edge; the id is derived from its endpoints and kind.
    #[must_use]
    pub fn new(source: NodeId, target: NodeId, kind: EdgeKind, weight: EdgeWeight) -> Self {
        Self {
            id: EdgeId::derive(&source, &target, kind),
            source,
            target,
            kind,
            weight,
            label: None,
            payload: None,
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_payload(mut self, payload: EdgePayload) -> Self {
        self.payload = Some(payload);
        self
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors surfaced by the MedGraph core.
///
/// Building never fails: malformed records are skipped. Errors come from
/// loading inputs, decoding documents, rejecting queries, or asking for a
/// capability that does not exist yet.
#[derive(Debug, Error)]
pub enum MedGraphError {
    /// The requested capability is declared but not implemented.
    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),

    /// The query parameters are out of bounds or malformed.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// The entity source could not be parsed.
    #[error("Entity source error: {0}")]
    Source(String),

    /// A graph document could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),
}

// =============================================================================
// TESTS
// =============================================================================
