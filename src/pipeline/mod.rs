//! Pipeline stages for detection scanning and section splitting.
//!
//! Each submodule implements exactly one step, so each is independently
//! testable and replaceable (e.g. a different OCR engine only touches
//! [`oracle`]).
//!
//! ## Data Flow
//!
//! ```text
//! folder ──▶ oracle ──▶ matcher ──▶ scan ──▶ sections ──▶ writer
//! (PDFs)    (page text) (AND match) (parallel) (ranges)   (section PDFs)
//! ```
//!
//! 1. [`oracle`]   — page text via the text layer or rasterise+OCR; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 2. [`matcher`]  — pure AND-match of filter terms against page text
//! 3. [`scan`]     — fan out over pages, merge into an ordered detection set
//! 4. [`sections`] — turn detections into contiguous page ranges
//! 5. [`writer`]   — materialise each range as its own PDF

pub mod matcher;
pub mod oracle;
pub mod scan;
pub mod sections;
pub mod writer;
