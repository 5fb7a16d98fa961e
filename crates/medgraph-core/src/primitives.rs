//! # Build Primitives
//!
//! Fixed constants of the MedGraph builder and query engine.
//!
//! The graph starts from whatever the entity source holds, but the rules
//! that turn records into edges are compiled in:
//!
//! 1. **Weights**: every edge kind produced by the builder has a fixed weight,
//!    except `interacts`, whose weight comes from the severity table in
//!    [`crate::normalize::interaction_weight`].
//! 2. **Symptom vocabulary**: keywords matched inside diagnostic criteria.
//! 3. **Bounds**: limits applied to path search.

/// Weight of a `causes` edge (disease → symptom).
pub const CAUSES_WEIGHT: f64 = 1.0;

/// Weight of a `diagnoses` edge (exam → disease).
pub const DIAGNOSES_WEIGHT: f64 = 1.0;

/// Weight of a `treats` edge (medication → disease).
pub const TREATS_WEIGHT: f64 = 0.9;

/// Weight of an `associated` edge (protocol → disease).
pub const PROTOCOL_WEIGHT: f64 = 0.8;

/// Weight of a `calculates` edge (calculator → disease).
pub const CALCULATOR_WEIGHT: f64 = 0.8;

/// Weight of a `metabolizes` edge (gene → medication).
pub const METABOLIZES_WEIGHT: f64 = 0.9;

/// Keywords recognized as symptoms inside free-text diagnostic criteria.
///
/// Matching is a lowercase substring test, so "dor" also fires on
/// "dor torácica" and on "cansaço e dor".
pub const SYMPTOM_KEYWORDS: [&str; 7] = [
    "dor", "febre", "tosse", "dispneia", "náusea", "vômito", "diarreia",
];

/// Maximum path depth accepted from external callers.
///
/// Path search is exponential in dense graphs; the app layer rejects
/// deeper requests before they reach the engine.
pub const MAX_PATH_DEPTH: usize = 12;

/// Default path depth when a caller does not provide one.
pub const DEFAULT_PATH_DEPTH: usize = 3;

/// Default node-expansion budget for bounded path search.
pub const DEFAULT_MAX_EXPANSIONS: usize = 100_000;

/// Maximum number of ids accepted by a subgraph request.
pub const MAX_SUBGRAPH_NODES: usize = 1_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_weights_are_in_range() {
        for w in [
            CAUSES_WEIGHT,
            DIAGNOSES_WEIGHT,
            TREATS_WEIGHT,
            PROTOCOL_WEIGHT,
            CALCULATOR_WEIGHT,
            METABOLIZES_WEIGHT,
        ] {
            assert!((0.0..=1.0).contains(&w));
        }
    }

    #[test]
    fn default_depth_within_bound() {
        assert!(DEFAULT_PATH_DEPTH <= MAX_PATH_DEPTH);
    }
}
