//! Page matching: does a page's text satisfy every filter term?
//!
//! A pure function with no partial or fuzzy matching and no normalisation
//! beyond case folding. Keeping it trivial is deliberate: detection accuracy
//! lives in the text-extraction strategy, not in clever matching — OCR noise
//! is an accepted source of missed detections.

use crate::config::FilterSpec;

/// True iff every term of `filter` occurs in `text`.
///
/// Empty text always yields `false`: a filter is non-empty by construction,
/// and an unreadable or blank page must never count as a detection, even
/// though a vacuous AND would otherwise be satisfiable by accident.
pub fn page_matches(text: &str, filter: &FilterSpec) -> bool {
    if text.is_empty() {
        return false;
    }

    if filter.case_sensitive() {
        filter.terms().iter().all(|term| text.contains(term.as_str()))
    } else {
        let folded = text.to_lowercase();
        filter
            .terms()
            .iter()
            .all(|term| folded.contains(&term.to_lowercase()))
    }
}
