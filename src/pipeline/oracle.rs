//! Page-text oracle: extract the text of a single page, by either strategy.
//!
//! ## Contract
//!
//! [`page_text`] never fails. A corrupt page, a rasterisation error, or a
//! missing OCR binary produces empty text plus a `tracing` diagnostic, and
//! the matcher treats empty text as "no match". An empty page must never
//! count as a detection, so degrading to empty text is always safe for the
//! caller.
//!
//! ## Why open the document per call?
//!
//! pdfium document handles are not `Send`, and page scans run on separate
//! blocking threads. Each call opens its own handle, reads one page, and
//! drops everything before returning — including the transient raster buffer
//! and temp PNG the OCR path creates. The `thread_safe` pdfium feature
//! serialises the underlying C library calls.

use crate::config::TextStrategy;
use crate::error::{ChartsplitError, PageError};
use pdfium_render::prelude::*;
use std::path::Path;
use std::process::Command;
use tracing::{debug, warn};

/// Extract the text of page `page_index` (0-based) using `strategy`.
///
/// Returns trimmed text; empty on any internal failure (logged, not raised).
pub async fn page_text(
    path: &Path,
    page_index: usize,
    strategy: &TextStrategy,
    password: Option<&str>,
) -> String {
    let path = path.to_path_buf();
    let strategy = strategy.clone();
    let password = password.map(|s| s.to_string());

    let result = tokio::task::spawn_blocking(move || {
        page_text_blocking(&path, page_index, &strategy, password.as_deref())
    })
    .await;

    match result {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            warn!("{e} — treating page as empty");
            String::new()
        }
        Err(e) => {
            warn!("Page {} text task panicked: {e}", page_index + 1);
            String::new()
        }
    }
}

/// Count the pages of a document, validating it is readable and non-empty.
///
/// Unlike page-level reads this is fatal for the document: an unreadable or
/// zero-page file cannot be scanned at all.
pub async fn document_page_count(
    path: &Path,
    password: Option<&str>,
) -> Result<usize, ChartsplitError> {
    let path = path.to_path_buf();
    let password = password.map(|s| s.to_string());

    tokio::task::spawn_blocking(move || {
        let pdfium = Pdfium::default();
        let document = pdfium
            .load_pdf_from_file(&path, password.as_deref())
            .map_err(|e| ChartsplitError::DocumentUnreadable {
                path: path.clone(),
                detail: format!("{e:?}"),
            })?;
        let count = document.pages().len() as usize;
        if count == 0 {
            return Err(ChartsplitError::EmptyDocument { path });
        }
        Ok(count)
    })
    .await
    .map_err(|e| ChartsplitError::Internal(format!("page-count task panicked: {e}")))?
}

/// Whether the `tesseract` binary is runnable.
///
/// The OCR strategy degrades per-page when the engine is missing; callers
/// can probe up front to warn the operator once instead of once per page.
pub fn ocr_available() -> bool {
    Command::new("tesseract")
        .arg("--version")
        .output()
        .is_ok()
}

// ── Blocking internals ───────────────────────────────────────────────────

fn page_text_blocking(
    path: &Path,
    page_index: usize,
    strategy: &TextStrategy,
    password: Option<&str>,
) -> Result<String, PageError> {
    match strategy {
        TextStrategy::Direct => direct_text(path, page_index, password),
        TextStrategy::Ocr { dpi, language } => ocr_text(path, page_index, *dpi, language, password),
    }
}

/// Read the embedded text layer of one page.
fn direct_text(path: &Path, page_index: usize, password: Option<&str>) -> Result<String, PageError> {
    let page_num = page_index + 1;
    let err = |detail: String| PageError::TextExtractionFailed {
        page: page_num,
        detail,
    };

    let pdfium = Pdfium::default();
    let document = pdfium
        .load_pdf_from_file(path, password)
        .map_err(|e| err(format!("{e:?}")))?;
    let page = document
        .pages()
        .get(page_index as u16)
        .map_err(|e| err(format!("{e:?}")))?;
    let text = page.text().map_err(|e| err(format!("{e:?}")))?.all();

    debug!("Page {page_num}: {} chars via text layer", text.len());
    Ok(text.trim().to_string())
}

/// Rasterise one page and run it through the OCR engine.
///
/// The raster goes to a temp PNG that is deleted when this function returns;
/// nothing survives the call.
fn ocr_text(
    path: &Path,
    page_index: usize,
    dpi: u32,
    language: &str,
    password: Option<&str>,
) -> Result<String, PageError> {
    let page_num = page_index + 1;

    let pdfium = Pdfium::default();
    let document = pdfium
        .load_pdf_from_file(path, password)
        .map_err(|e| PageError::RenderFailed {
            page: page_num,
            detail: format!("{e:?}"),
        })?;
    let page = document
        .pages()
        .get(page_index as u16)
        .map_err(|e| PageError::RenderFailed {
            page: page_num,
            detail: format!("{e:?}"),
        })?;

    // Matches the conventional point-to-pixel mapping: 72 pt/inch.
    let render_config = PdfRenderConfig::new().scale_page_by_factor(dpi as f32 / 72.0);
    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| PageError::RenderFailed {
            page: page_num,
            detail: format!("{e:?}"),
        })?;
    let image = bitmap.as_image();
    debug!(
        "Page {page_num}: rasterised {}x{} px for OCR",
        image.width(),
        image.height()
    );

    let raster = write_temp_png(&image, page_num)?;
    let text = run_tesseract(raster.path(), page_num, language)?;
    Ok(text)
}

fn write_temp_png(
    image: &image::DynamicImage,
    page_num: usize,
) -> Result<tempfile::NamedTempFile, PageError> {
    let raster = tempfile::Builder::new()
        .prefix("chartsplit-ocr-")
        .suffix(".png")
        .tempfile()
        .map_err(|e| PageError::RenderFailed {
            page: page_num,
            detail: format!("temp raster: {e}"),
        })?;
    image
        .save_with_format(raster.path(), image::ImageFormat::Png)
        .map_err(|e| PageError::RenderFailed {
            page: page_num,
            detail: format!("PNG encode: {e}"),
        })?;
    Ok(raster)
}

/// Invoke the system `tesseract` binary on a rendered page image.
///
/// `--psm 1`: automatic page segmentation with orientation detection, the
/// right mode for whole scanned form pages.
fn run_tesseract(image_path: &Path, page_num: usize, language: &str) -> Result<String, PageError> {
    let output = Command::new("tesseract")
        .arg(image_path)
        .arg("stdout")
        .args(["-l", language, "--psm", "1"])
        .output()
        .map_err(|e| PageError::OcrFailed {
            page: page_num,
            detail: format!("failed to run tesseract: {e}"),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        // tesseract exits non-zero for some recoverable warnings while still
        // printing usable text; only fail when there is nothing to use.
        if output.stdout.is_empty() {
            return Err(PageError::OcrFailed {
                page: page_num,
                detail: stderr.trim().to_string(),
            });
        }
        warn!("Page {page_num}: tesseract warning: {}", stderr.trim());
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
