//! Result types returned by the splitting and extraction entry points.
//!
//! Everything here is serde-serialisable so the CLI's `--json` mode can dump
//! a run verbatim and operators can diff two runs.

use serde::Serialize;
use std::path::PathBuf;

// ── Splitting ────────────────────────────────────────────────────────────

/// One section file written to the output folder.
#[derive(Debug, Clone, Serialize)]
pub struct SectionFile {
    /// 1-based, gapless ordinal within the source document.
    pub ordinal: usize,
    /// Filename inside the output folder.
    pub file_name: String,
    /// Full path of the written file.
    pub path: PathBuf,
    /// First page of the range, 1-based inclusive.
    pub first_page: usize,
    /// Last page of the range, 1-based inclusive.
    pub last_page: usize,
    /// Whether this is the whole-document no-detection fallback.
    pub fallback: bool,
}

impl SectionFile {
    pub fn page_count(&self) -> usize {
        self.last_page - self.first_page + 1
    }
}

/// Outcome of splitting a single document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    /// Source document path.
    pub path: PathBuf,
    /// File stem used in section filenames.
    pub stem: String,
    pub total_pages: usize,
    /// Detection pages, 1-based, ascending.
    pub detection_pages: Vec<usize>,
    /// Sections written, in ordinal order.
    pub sections: Vec<SectionFile>,
}

/// A document that failed and was skipped; the batch continued without it.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Aggregate outcome of a batch split run.
#[derive(Debug, Clone, Serialize, Default)]
pub struct BatchSummary {
    pub documents_processed: usize,
    pub documents_failed: usize,
    pub sections_created: usize,
    /// Per-document results, in input order.
    pub reports: Vec<DocumentReport>,
    pub failures: Vec<DocumentFailure>,
    pub duration_ms: u64,
}

// ── Extraction ───────────────────────────────────────────────────────────

/// One extracted record: the model's JSON object after cleanup, plus the
/// section file it came from.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractedRecord {
    /// Section filename the record was extracted from.
    pub source_file: String,
    /// Cleaned field values keyed by field name. Fields the model omitted
    /// or returned as `null` are absent; the CSV writer emits them as empty
    /// cells.
    pub values: serde_json::Map<String, serde_json::Value>,
    /// Retries consumed before a valid record was obtained.
    pub retries: u32,
}

/// Aggregate outcome of an extraction run.
#[derive(Debug, Clone, Serialize, Default)]
pub struct ExtractionSummary {
    pub records_extracted: usize,
    pub sections_failed: usize,
    pub records: Vec<ExtractedRecord>,
    pub failures: Vec<DocumentFailure>,
    /// Where the aggregated CSV was written, if any records succeeded.
    pub csv_path: Option<PathBuf>,
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_file_page_count_is_inclusive() {
        let s = SectionFile {
            ordinal: 1,
            file_name: "x_section_01_pages_4-7.pdf".into(),
            path: PathBuf::from("/out/x_section_01_pages_4-7.pdf"),
            first_page: 4,
            last_page: 7,
            fallback: false,
        };
        assert_eq!(s.page_count(), 4);
    }

    #[test]
    fn batch_summary_serialises() {
        let summary = BatchSummary {
            documents_processed: 1,
            sections_created: 2,
            ..Default::default()
        };
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"documents_processed\":1"));
        assert!(json.contains("\"sections_created\":2"));
    }
}
