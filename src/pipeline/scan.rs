//! Detection scanning: evaluate every page of a document in parallel.
//!
//! Pages are independent, so the scan fans out over a bounded
//! `buffer_unordered` pool and merges results after the join. The returned
//! [`DetectionSet`] is always in ascending page order regardless of the
//! nondeterministic completion order of the workers — ordering is restored
//! exactly once, at the merge point, rather than by synchronising appends.

use crate::config::SplitConfig;
use crate::pipeline::{matcher, oracle};
use futures::stream::{self, StreamExt};
use std::path::Path;
use tracing::debug;

/// The ordered, deduplicated set of detection page indices for one document.
///
/// Invariants: indices are 0-based, strictly ascending, and each is below
/// the page count of the document it was scanned from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DetectionSet {
    indices: Vec<usize>,
}

impl DetectionSet {
    /// Build from worker results in whatever order they completed.
    pub fn from_unordered(mut indices: Vec<usize>) -> Self {
        indices.sort_unstable();
        indices.dedup();
        Self { indices }
    }

    /// 0-based page indices, ascending.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// 1-based page numbers for operator-facing output.
    pub fn page_numbers(&self) -> Vec<usize> {
        self.indices.iter().map(|i| i + 1).collect()
    }
}

/// Scan all pages of `path`, returning the pages that satisfy the filter.
///
/// A page whose text cannot be read degrades to "no match" inside the
/// oracle; nothing a single page does can abort the scan of its siblings.
pub async fn scan_document(path: &Path, total_pages: usize, config: &SplitConfig) -> DetectionSet {
    let doc = doc_label(path);

    if let Some(ref cb) = config.progress {
        cb.on_scan_start(&doc, total_pages);
    }

    let results: Vec<(usize, bool)> = stream::iter((0..total_pages).map(|page_index| {
        let doc = doc.clone();
        async move {
            let text = oracle::page_text(
                path,
                page_index,
                &config.strategy,
                config.password.as_deref(),
            )
            .await;
            let matched = matcher::page_matches(&text, &config.filter);
            debug!(
                "{doc}: page {}/{} {}",
                page_index + 1,
                total_pages,
                if matched { "DETECTION" } else { "no match" }
            );
            if let Some(ref cb) = config.progress {
                cb.on_page_scanned(&doc, page_index + 1, total_pages, matched);
            }
            (page_index, matched)
        }
    }))
    .buffer_unordered(config.page_concurrency)
    .collect()
    .await;

    let detections = DetectionSet::from_unordered(
        results
            .into_iter()
            .filter_map(|(idx, matched)| matched.then_some(idx))
            .collect(),
    );

    if let Some(ref cb) = config.progress {
        cb.on_scan_complete(&doc, detections.len());
    }

    detections
}

/// File stem used in progress events and section filenames.
pub fn doc_label(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detection_set_sorts_and_dedupes() {
        let d = DetectionSet::from_unordered(vec![7, 0, 3, 3, 7]);
        assert_eq!(d.indices(), &[0, 3, 7]);
        assert_eq!(d.len(), 3);
    }

    #[test]
    fn detection_set_page_numbers_are_one_based() {
        let d = DetectionSet::from_unordered(vec![0, 3, 7]);
        assert_eq!(d.page_numbers(), vec![1, 4, 8]);
    }

    #[test]
    fn empty_detection_set() {
        let d = DetectionSet::from_unordered(vec![]);
        assert!(d.is_empty());
        assert_eq!(d.len(), 0);
    }

    #[test]
    fn doc_label_uses_file_stem() {
        assert_eq!(doc_label(Path::new("/in/batch_0412.PDF")), "batch_0412");
    }
}
