//! Section materialisation: write each planned page range as its own PDF.
//!
//! Runs after the scan has fully completed, sequentially within a document —
//! file writes are fast next to scanning, and sequential writes keep the
//! ordinal/filename order trivially consistent with page order. A write
//! failure is fatal for the document's remaining sections; sections already
//! on disk stay there.

use crate::error::ChartsplitError;
use crate::output::SectionFile;
use crate::pipeline::sections::Section;
use crate::progress::ProgressCallback;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::info;

/// Write every planned section of `source` into `out_dir`.
///
/// The source document is opened once; each section is assembled in a fresh
/// in-memory document via pdfium's page-import and saved under
/// [`Section::file_name`]. Returns the written files in ordinal order.
pub async fn write_sections(
    source: &Path,
    out_dir: &Path,
    stem: &str,
    sections: Vec<Section>,
    password: Option<&str>,
    progress: Option<ProgressCallback>,
) -> Result<Vec<SectionFile>, ChartsplitError> {
    let source = source.to_path_buf();
    let out_dir = out_dir.to_path_buf();
    let stem = stem.to_string();
    let password = password.map(|s| s.to_string());

    tokio::task::spawn_blocking(move || {
        write_sections_blocking(
            &source,
            &out_dir,
            &stem,
            &sections,
            password.as_deref(),
            progress.as_ref(),
        )
    })
    .await
    .map_err(|e| ChartsplitError::Internal(format!("section write task panicked: {e}")))?
}

fn write_sections_blocking(
    source: &Path,
    out_dir: &Path,
    stem: &str,
    sections: &[Section],
    password: Option<&str>,
    progress: Option<&ProgressCallback>,
) -> Result<Vec<SectionFile>, ChartsplitError> {
    let pdfium = Pdfium::default();
    let document =
        pdfium
            .load_pdf_from_file(source, password)
            .map_err(|e| ChartsplitError::DocumentUnreadable {
                path: source.to_path_buf(),
                detail: format!("{e:?}"),
            })?;

    let mut written = Vec::with_capacity(sections.len());

    for section in sections {
        let file_name = section.file_name(stem);
        let target = out_dir.join(&file_name);

        let mut output = pdfium
            .create_new_pdf()
            .map_err(|e| ChartsplitError::OutputWriteFailed {
                path: target.clone(),
                detail: format!("{e:?}"),
            })?;

        // pdfium's import API takes a 1-based inclusive page-range string.
        let range = format!("{}-{}", section.first_page(), section.last_page());
        output
            .pages_mut()
            .copy_pages_from_document(&document, &range, 0)
            .map_err(|e| ChartsplitError::OutputWriteFailed {
                path: target.clone(),
                detail: format!("importing pages {range}: {e:?}"),
            })?;

        output
            .save_to_file(&target)
            .map_err(|e| ChartsplitError::OutputWriteFailed {
                path: target.clone(),
                detail: format!("{e:?}"),
            })?;

        info!(
            "{stem}: wrote {} ({} pages)",
            file_name,
            section.page_count()
        );
        if let Some(cb) = progress {
            cb.on_section_written(
                stem,
                section.ordinal,
                &file_name,
                section.first_page(),
                section.last_page(),
            );
        }

        written.push(SectionFile {
            ordinal: section.ordinal,
            file_name,
            path: target,
            first_page: section.first_page(),
            last_page: section.last_page(),
            fallback: section.fallback,
        });
    }

    Ok(written)
}
