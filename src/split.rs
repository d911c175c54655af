//! Batch splitting entry points.
//!
//! ## Orchestration
//!
//! [`split_folder`] iterates every PDF in the input folder and drives each
//! through scan → plan → write. Documents are independent: a fatal failure in
//! one (unreadable file, zero pages, write error) is caught, logged, and
//! recorded in the summary without touching the rest of the batch.
//!
//! Two bounded concurrency levels compose here: an outer pool over documents
//! and, inside [`split_document`], an inner pool over pages during the scan.
//! Documents may finish in any order; each document's own section files are
//! still gaplessly numbered in page order because the plan is derived from
//! the post-join, ascending detection set.

use crate::config::SplitConfig;
use crate::error::ChartsplitError;
use crate::output::{BatchSummary, DocumentFailure, DocumentReport};
use crate::pipeline::{oracle, scan, sections, writer};
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Split every PDF in `input_dir` into section files under `output_dir`.
///
/// # Errors
/// Fatal for the whole invocation only when the input folder does not exist,
/// contains no PDFs (case-insensitive extension match), or the output folder
/// cannot be created. Per-document failures are reported in the returned
/// [`BatchSummary`], not as `Err`.
pub async fn split_folder(
    input_dir: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    config: &SplitConfig,
) -> Result<BatchSummary, ChartsplitError> {
    let started = Instant::now();
    let input_dir = input_dir.as_ref();
    let output_dir = output_dir.as_ref();

    let files = collect_pdfs(input_dir)?;

    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|e| ChartsplitError::OutputWriteFailed {
            path: output_dir.to_path_buf(),
            detail: e.to_string(),
        })?;

    info!(
        "Splitting {} documents from '{}' into '{}' (filter: {}, case sensitive: {})",
        files.len(),
        input_dir.display(),
        output_dir.display(),
        config.filter.display(),
        config.filter.case_sensitive(),
    );

    let results: Vec<(PathBuf, Result<DocumentReport, ChartsplitError>)> =
        stream::iter(files.into_iter().map(|path| async move {
            let outcome = split_document(&path, output_dir, config).await;
            (path, outcome)
        }))
        .buffer_unordered(config.doc_concurrency)
        .collect()
        .await;

    let mut summary = BatchSummary::default();
    for (path, outcome) in results {
        match outcome {
            Ok(report) => {
                summary.documents_processed += 1;
                summary.sections_created += report.sections.len();
                summary.reports.push(report);
            }
            Err(e) => {
                let reason = e.to_string();
                warn!("Skipping '{}': {reason}", path.display());
                if let Some(ref cb) = config.progress {
                    cb.on_document_failed(&scan::doc_label(&path), &reason);
                }
                summary.documents_failed += 1;
                summary.failures.push(DocumentFailure { path, reason });
            }
        }
    }

    // Input order makes repeated runs diff cleanly even though documents
    // complete in arbitrary order.
    summary.reports.sort_by(|a, b| a.path.cmp(&b.path));
    summary.failures.sort_by(|a, b| a.path.cmp(&b.path));
    summary.duration_ms = started.elapsed().as_millis() as u64;

    info!(
        "Batch complete: {} sections from {} documents ({} failed) in {}ms",
        summary.sections_created,
        summary.documents_processed,
        summary.documents_failed,
        summary.duration_ms
    );

    Ok(summary)
}

/// Split a single document into section files under `output_dir`.
///
/// The full per-document pipeline: validate and count pages, scan for
/// detections (parallel over pages), plan sections under the configured
/// boundary policy, then write each section sequentially. With zero
/// detections the whole document is written once as the `_all_pages`
/// fallback — a scan that finds nothing still produces output.
pub async fn split_document(
    path: &Path,
    output_dir: &Path,
    config: &SplitConfig,
) -> Result<DocumentReport, ChartsplitError> {
    let stem = scan::doc_label(path);
    let total_pages = oracle::document_page_count(path, config.password.as_deref()).await?;

    info!("{stem}: scanning {total_pages} pages for {}", config.filter.display());
    let detections = scan::scan_document(path, total_pages, config).await;

    if detections.is_empty() {
        info!("{stem}: no detections — emitting whole document as fallback");
    } else {
        info!(
            "{stem}: {} detections on pages {:?}",
            detections.len(),
            detections.page_numbers()
        );
    }

    let plan = sections::plan_sections(&detections, total_pages, config.policy);
    let written = writer::write_sections(
        path,
        output_dir,
        &stem,
        plan,
        config.password.as_deref(),
        config.progress.clone(),
    )
    .await?;

    if let Some(ref cb) = config.progress {
        cb.on_document_complete(&stem, written.len());
    }

    Ok(DocumentReport {
        path: path.to_path_buf(),
        stem,
        total_pages,
        detection_pages: detections.page_numbers(),
        sections: written,
    })
}

/// List the PDFs in `dir`, matching the extension case-insensitively
/// (source systems emit `.pdf` and `.PDF` interchangeably).
///
/// Sorted by path so batch output is stable run to run.
pub(crate) fn collect_pdfs(dir: &Path) -> Result<Vec<PathBuf>, ChartsplitError> {
    if !dir.is_dir() {
        return Err(ChartsplitError::InputFolderNotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|_| ChartsplitError::InputFolderNotFound {
            path: dir.to_path_buf(),
        })?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("pdf"))
                    .unwrap_or(false)
        })
        .collect();

    if files.is_empty() {
        return Err(ChartsplitError::NoDocumentsFound {
            path: dir.to_path_buf(),
        });
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_pdfs_rejects_missing_folder() {
        let err = collect_pdfs(Path::new("/definitely/not/a/folder")).unwrap_err();
        assert!(matches!(err, ChartsplitError::InputFolderNotFound { .. }));
    }

    #[test]
    fn collect_pdfs_rejects_empty_folder() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"not a pdf").unwrap();
        let err = collect_pdfs(dir.path()).unwrap_err();
        assert!(matches!(err, ChartsplitError::NoDocumentsFound { .. }));
    }

    #[test]
    fn collect_pdfs_matches_extension_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.pdf"), b"%PDF-1.4").unwrap();
        std::fs::write(dir.path().join("b.PDF"), b"%PDF-1.4").unwrap();
        std::fs::write(dir.path().join("c.Pdf"), b"%PDF-1.4").unwrap();
        std::fs::write(dir.path().join("skip.txt"), b"x").unwrap();

        let files = collect_pdfs(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.pdf", "b.PDF", "c.Pdf"]);
    }
}
