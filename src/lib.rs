//! # chartsplit
//!
//! Split scanned medical charts into per-patient PDF sections and extract
//! billing fields with Vision Language Models.
//!
//! ## Why this crate?
//!
//! Source systems fax or scan whole batches of patient paperwork into one
//! multi-page PDF. Downstream billing tools need one document per patient.
//! The boundary between two records is rarely marked structurally — but each
//! record opens with a recognisable sheet (a demographics form, a billing
//! summary) whose wording is stable per site. chartsplit scans every page
//! for a configurable AND-combination of marker strings, infers section
//! boundaries from the detected pages, and writes each section as its own
//! PDF. An optional second stage sends each section to a vision model and
//! aggregates the returned JSON records into a CSV.
//!
//! ## Pipeline Overview
//!
//! ```text
//! input folder
//!  │
//!  ├─ 1. Scan      page text per page (text layer, or rasterise + OCR)
//!  ├─ 2. Match     AND-match of filter strings (case-configurable)
//!  ├─ 3. Plan      detections → contiguous sections (separator/start policy)
//!  ├─ 4. Write     one PDF per section (pdfium page import)
//!  └─ 5. Extract   section pages → VLM → JSON record → combined CSV
//! ```
//!
//! Stages 1–4 are [`split_folder`]; stage 5 is [`extract_folder`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chartsplit::{split_folder, FilterSpec, SplitConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let filter = FilterSpec::new(["Patient Demographics"], false)?;
//!     let config = SplitConfig::builder(filter).build()?;
//!     let summary = split_folder("input", "output", &config).await?;
//!     println!(
//!         "{} sections from {} documents",
//!         summary.sections_created, summary.documents_processed
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Guarantees
//!
//! * Section files are numbered 1-based, gaplessly, in page order —
//!   regardless of the completion order of the parallel page scan.
//! * A document with zero detections still produces exactly one output
//!   (`{stem}_all_pages.pdf`), never zero.
//! * One unreadable page degrades to "no match"; one unreadable document is
//!   skipped and reported; neither aborts the batch.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod retry;
pub mod split;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    BoundaryPolicy, ExtractConfig, ExtractConfigBuilder, FilterSpec, SplitConfig,
    SplitConfigBuilder, TextStrategy,
};
pub use error::{ChartsplitError, PageError};
pub use extract::extract_folder;
pub use extract::fields::{default_fields, load_fields, FieldDef};
pub use output::{
    BatchSummary, DocumentFailure, DocumentReport, ExtractedRecord, ExtractionSummary,
    SectionFile,
};
pub use pipeline::scan::DetectionSet;
pub use pipeline::sections::{plan_sections, Section};
pub use progress::{NoopProgressCallback, ProgressCallback, SplitProgressCallback};
pub use retry::RetryPolicy;
pub use split::{split_document, split_folder};
