//! # Normalization
//!
//! Id slugging and the interaction severity table.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Convert a free-text label into a stable id fragment.
///
/// Lowercases, strips diacritics (NFD + combining marks removed), replaces
/// every character outside `[a-z0-9]` with `-`, collapses runs of `-` and
/// trims them from both ends. Labels that only differ in case, accents or
/// punctuation collide; different wording does not.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.to_lowercase().nfd().filter(|c| !is_combining_mark(*c)) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Map an interaction severity to an edge weight.
///
/// | Severity | Weight |
/// |----------|--------|
/// | `grave`, `contraindicada`, `contraindicated` | 1.0 |
/// | `moderada` | 0.7 |
/// | `leve` | 0.4 |
/// | anything else | 0.5 |
///
/// Unrecognized severities outrank `leve`. The table is kept as published
/// so weights stay comparable with graphs built by other consumers.
#[must_use]
pub fn interaction_weight(severity: &str) -> f64 {
    match severity.trim().to_lowercase().as_str() {
        "grave" | "contraindicada" | "contraindicated" => 1.0,
        "moderada" => 0.7,
        "leve" => 0.4,
        _ => 0.5,
    }
}
