//! # Entity Source
//!
//! Read-only disease and medication records consumed by the builder.
//!
//! The records are authored and stored elsewhere; this module only defines
//! the shape the builder reads and a JSON-backed [`Catalog`]. Every field
//! defaults when absent or `null`, and an empty `id` marks a record the
//! builder will skip. A record that does not decode at all is dropped by
//! [`Catalog::from_json`] and counted, never failing the whole catalog.

use crate::MedGraphError;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

// =============================================================================
// ENTITY SOURCE TRAIT
// =============================================================================

/// Read-only access to the clinical records a graph is built from.
///
/// # Extension Point
///
/// [`Catalog`] is the in-crate implementation. Adapters over other stores
/// implement this trait and hand themselves to the builder; the builder
/// never mutates the source.
pub trait EntitySource {
    /// All disease records, in authoring order.
    fn diseases(&self) -> &[DiseaseRecord];

    /// All medication records, in authoring order.
    fn medications(&self) -> &[MedicationRecord];

    /// Whether a medication record with this raw id exists.
    fn has_medication(&self, id: &str) -> bool {
        self.medications().iter().any(|m| m.id == id)
    }

    /// Records the source dropped because they could not be decoded.
    fn rejected_records(&self) -> usize {
        0
    }
}

/// Decode `null` as the field's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// =============================================================================
// DISEASE RECORDS
// =============================================================================

/// A disease as authored on the platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiseaseRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub icd10: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub ciap2: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub quick_view: QuickView,
    #[serde(deserialize_with = "null_as_default")]
    pub full_content: FullContent,
    /// Raw ids of the medications used to treat this disease.
    #[serde(deserialize_with = "null_as_default")]
    pub medications: Vec<String>,
    /// Raw ids of the related clinical protocols.
    #[serde(deserialize_with = "null_as_default")]
    pub protocols: Vec<String>,
    /// Raw ids of the relevant clinical calculators.
    #[serde(deserialize_with = "null_as_default")]
    pub calculators: Vec<String>,
}

/// One-screen summary of a disease.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuickView {
    /// Free-text diagnostic criteria, scanned for symptom keywords.
    #[serde(deserialize_with = "null_as_default")]
    pub diagnostic_criteria: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub initial_exams: Vec<String>,
}

/// Expanded disease content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FullContent {
    #[serde(deserialize_with = "null_as_default")]
    pub clinical_presentation: ClinicalPresentation,
    #[serde(deserialize_with = "null_as_default")]
    pub diagnosis: DiagnosticWorkup,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClinicalPresentation {
    #[serde(deserialize_with = "null_as_default")]
    pub principal_symptoms: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiagnosticWorkup {
    #[serde(deserialize_with = "null_as_default")]
    pub lab_exams: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub imaging_exams: Vec<String>,
}

// =============================================================================
// MEDICATION RECORDS
// =============================================================================

/// A medication as authored on the platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MedicationRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub generic_name: String,
    /// ATC classification code.
    pub atc_code: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub interactions: Vec<Interaction>,
    #[serde(deserialize_with = "null_as_default")]
    pub pharmacogenomics: Vec<PharmacogenomicAnnotation>,
}

/// A declared drug-drug interaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Interaction {
    /// Raw id of the other medication.
    #[serde(deserialize_with = "null_as_default")]
    pub partner_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub severity: String,
    pub mechanism: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PharmacogenomicAnnotation {
    /// Gene symbol, e.g. `CYP2C9`.
    #[serde(deserialize_with = "null_as_default")]
    pub gene: String,
}

// =============================================================================
// CATALOG
// =============================================================================

/// JSON-backed entity source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    diseases: Vec<DiseaseRecord>,
    medications: Vec<MedicationRecord>,
    #[serde(skip)]
    medication_ids: BTreeSet<String>,
    #[serde(skip)]
    rejected: usize,
}

/// Top-level catalog shape with records left undecoded, so one bad record
/// cannot fail the others.
#[derive(Default, Deserialize)]
#[serde(default)]
struct RawCatalog {
    #[serde(deserialize_with = "null_as_default")]
    diseases: Vec<serde_json::Value>,
    #[serde(deserialize_with = "null_as_default")]
    medications: Vec<serde_json::Value>,
}

/// Decode each record, dropping and counting the ones that do not fit.
fn decode_records<T: for<'de> Deserialize<'de>>(
    values: Vec<serde_json::Value>,
    collection: &'static str,
    rejected: &mut usize,
) -> Vec<T> {
    values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(collection, index, error = %e, "skipping undecodable record");
                *rejected += 1;
                None
            }
        })
        .collect()
}

impl Catalog {
    /// Create a catalog from already-loaded records.
    #[must_use]
    pub fn new(diseases: Vec<DiseaseRecord>, medications: Vec<MedicationRecord>) -> Self {
        let mut catalog = Self {
            diseases,
            medications,
            medication_ids: BTreeSet::new(),
            rejected: 0,
        };
        catalog.rebuild_index();
        catalog
    }

    /// Parse a catalog from its JSON representation.
    ///
    /// Only a document that is not JSON, or whose top level is not a
    /// catalog object, is an error. Individual records that fail to decode
    /// are skipped and reported by [`EntitySource::rejected_records`].
    pub fn from_json(json: &str) -> Result<Self, MedGraphError> {
        let raw: RawCatalog =
            serde_json::from_str(json).map_err(|e| MedGraphError::Source(e.to_string()))?;

        let mut rejected = 0;
        let diseases = decode_records(raw.diseases, "diseases", &mut rejected);
        let medications = decode_records(raw.medications, "medications", &mut rejected);

        let mut catalog = Self::new(diseases, medications);
        catalog.rejected = rejected;
        Ok(catalog)
    }

    /// Read and parse a catalog file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MedGraphError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            MedGraphError::Io(format!("Cannot read catalog '{}': {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Rebuild the medication id index after the record lists change.
    fn rebuild_index(&mut self) {
        self.medication_ids = self
            .medications
            .iter()
            .filter(|m| !m.id.is_empty())
            .map(|m| m.id.clone())
            .collect();
    }
}

impl EntitySource for Catalog {
    fn diseases(&self) -> &[DiseaseRecord] {
        &self.diseases
    }

    fn medications(&self) -> &[MedicationRecord] {
        &self.medications
    }

    fn has_medication(&self, id: &str) -> bool {
        self.medication_ids.contains(id)
    }

    fn rejected_records(&self) -> usize {
        self.rejected
    }
}

// =============================================================================
// TESTS
// =============================================================================
