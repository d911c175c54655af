//! Error types for the chartsplit library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ChartsplitError`] — **Fatal**: the invocation (or one whole document)
//!   cannot proceed — missing input folder, invalid filter, corrupt PDF,
//!   unwritable output folder. Returned as `Err(ChartsplitError)` from the
//!   top-level entry points. A document-scoped fatal error is caught by the
//!   batch driver, recorded in the summary, and does not abort the batch.
//!
//! * [`PageError`] — **Non-fatal**: one page could not be read or OCRed.
//!   The page-text oracle logs it and degrades that page to empty text, which
//!   the matcher treats as "no match". Page errors never cross the scanner
//!   boundary.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the chartsplit library.
///
/// Page-level failures use [`PageError`] and are degraded to empty text
/// inside the page-text oracle rather than propagated here.
#[derive(Debug, Error)]
pub enum ChartsplitError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The input folder does not exist or is not a directory.
    #[error("Input folder not found: '{path}'\nCheck the path exists and is a directory.")]
    InputFolderNotFound { path: PathBuf },

    /// The input folder exists but holds no matching documents.
    #[error("No PDF files found in '{path}' (extension match is case-insensitive)")]
    NoDocumentsFound { path: PathBuf },

    // ── Document errors ───────────────────────────────────────────────────
    /// The document could not be opened or parsed at all.
    #[error("Cannot read PDF '{path}': {detail}")]
    DocumentUnreadable { path: PathBuf, detail: String },

    /// The document opened but contains no pages.
    #[error("PDF '{path}' has zero pages")]
    EmptyDocument { path: PathBuf },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create the output folder or write a section file.
    ///
    /// Fatal for the document's remaining unwritten sections; sections
    /// already written are left in place.
    #[error("Failed to write '{path}': {detail}")]
    OutputWriteFailed { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Filter list empty, or empty after trimming whitespace-only terms.
    #[error("Invalid filter: {0}\nProvide at least one non-empty filter string.")]
    InvalidFilter(String),

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Extraction errors ─────────────────────────────────────────────────
    /// The configured VLM provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// A section's model response never produced a parseable JSON record.
    #[error("No valid record for '{section}' after {attempts} attempts: {detail}")]
    RecordExtractionFailed {
        section: String,
        attempts: u32,
        detail: String,
    },

    /// Could not write the aggregated CSV report.
    #[error("Failed to write CSV report '{path}': {detail}")]
    ReportWriteFailed { path: PathBuf, detail: String },

    /// Field-definition file unreadable or malformed.
    #[error("Cannot load field definitions from '{path}': {detail}")]
    FieldDefinitionsInvalid { path: PathBuf, detail: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page.
///
/// Produced inside the page-text oracle; callers receive empty text instead.
#[derive(Debug, Clone, Error)]
pub enum PageError {
    /// Reading the embedded text layer failed.
    #[error("Page {page}: text extraction failed: {detail}")]
    TextExtractionFailed { page: usize, detail: String },

    /// Rasterising the page for OCR failed.
    #[error("Page {page}: rasterisation failed: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// The OCR engine failed or is not installed.
    #[error("Page {page}: OCR failed: {detail}")]
    OcrFailed { page: usize, detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_documents_display_names_folder() {
        let e = ChartsplitError::NoDocumentsFound {
            path: PathBuf::from("/data/input"),
        };
        assert!(e.to_string().contains("/data/input"));
    }

    #[test]
    fn invalid_filter_display() {
        let e = ChartsplitError::InvalidFilter("all terms were blank".into());
        let msg = e.to_string();
        assert!(msg.contains("all terms were blank"));
        assert!(msg.contains("at least one"));
    }

    #[test]
    fn record_extraction_display() {
        let e = ChartsplitError::RecordExtractionFailed {
            section: "chart_section_01_pages_1-3.pdf".into(),
            attempts: 5,
            detail: "response was not JSON".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("5 attempts"), "got: {msg}");
        assert!(msg.contains("chart_section_01_pages_1-3.pdf"));
    }

    #[test]
    fn page_error_display_carries_page_number() {
        let e = PageError::OcrFailed {
            page: 7,
            detail: "tesseract not found".into(),
        };
        assert!(e.to_string().contains("Page 7"));
    }
}
