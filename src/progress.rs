//! Progress-callback trait for per-page and per-section events.
//!
//! Inject an [`Arc<dyn SplitProgressCallback>`] via
//! [`crate::config::SplitConfigBuilder::progress`] to receive real-time
//! events as documents are scanned and sections written.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a channel, a status endpoint, or a terminal progress bar
//! without the library knowing how the host application communicates. The
//! trait is `Send + Sync` because page scans within a document — and whole
//! documents — run concurrently, so events for different documents interleave.
//! Every event therefore carries the document's file stem.

use std::sync::Arc;

/// Called by the splitting pipeline as it processes documents.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must protect shared mutable state:
/// `on_page_scanned` fires from concurrent workers in nondeterministic page
/// order (the final section output is ordered regardless).
pub trait SplitProgressCallback: Send + Sync {
    /// A document was opened and its page scan is about to begin.
    fn on_scan_start(&self, doc: &str, total_pages: usize) {
        let _ = (doc, total_pages);
    }

    /// One page finished scanning.
    ///
    /// `page_num` is 1-indexed; `matched` is whether every filter term was
    /// found on the page.
    fn on_page_scanned(&self, doc: &str, page_num: usize, total_pages: usize, matched: bool) {
        let _ = (doc, page_num, total_pages, matched);
    }

    /// The scan finished; `detections` is the count of matching pages.
    fn on_scan_complete(&self, doc: &str, detections: usize) {
        let _ = (doc, detections);
    }

    /// A section file was written.
    ///
    /// `first_page`/`last_page` are 1-indexed and inclusive.
    fn on_section_written(
        &self,
        doc: &str,
        ordinal: usize,
        file_name: &str,
        first_page: usize,
        last_page: usize,
    ) {
        let _ = (doc, ordinal, file_name, first_page, last_page);
    }

    /// All of a document's sections were written.
    fn on_document_complete(&self, doc: &str, sections: usize) {
        let _ = (doc, sections);
    }

    /// A document failed and was skipped; the batch continues.
    fn on_document_failed(&self, doc: &str, error: &str) {
        let _ = (doc, error);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl SplitProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::SplitConfig`].
pub type ProgressCallback = Arc<dyn SplitProgressCallback>;
