//! Record extraction: one JSON record per section PDF, aggregated to CSV.
//!
//! This stage consumes the splitter's output folder. Each section file is an
//! independent unit of work: its leading pages go to the vision model with a
//! prompt generated from the configured field definitions, the response is
//! validated as a single JSON object, cleaned, and collected. Sections that
//! never yield a valid record after retries are reported as failures without
//! stopping the rest of the batch.
//!
//! ```text
//! sections/ ──▶ render ──▶ VLM ──▶ parse+clean ──▶ records ──▶ CSV
//! ```

pub mod clean;
pub mod fields;
pub mod llm;
pub mod prompt;
pub mod report;

use crate::config::ExtractConfig;
use crate::error::ChartsplitError;
use crate::output::{DocumentFailure, ExtractionSummary};
use crate::split::collect_pdfs;
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Extract a record from every section PDF in `input_dir` and write the
/// aggregated CSV to `csv_path`.
///
/// # Errors
/// Fatal only when the input folder is missing or empty, no provider can be
/// resolved, or the CSV cannot be written. Per-section failures land in the
/// returned [`ExtractionSummary`].
pub async fn extract_folder(
    input_dir: impl AsRef<Path>,
    csv_path: impl AsRef<Path>,
    config: &ExtractConfig,
) -> Result<ExtractionSummary, ChartsplitError> {
    let started = Instant::now();
    let input_dir = input_dir.as_ref();
    let csv_path = csv_path.as_ref();

    let files = collect_pdfs(input_dir)?;
    let provider = llm::resolve_provider(config).await?;
    let prompt = config
        .prompt
        .clone()
        .unwrap_or_else(|| prompt::build_extraction_prompt(&config.fields));

    info!(
        "Extracting {} fields from {} section files ({} concurrent)",
        config.fields.len(),
        files.len(),
        config.concurrency
    );

    let results: Vec<_> = stream::iter(files.iter().map(|path| {
        let provider = std::sync::Arc::clone(&provider);
        let prompt = prompt.as_str();
        async move {
            let outcome = llm::extract_record(&provider, path, prompt, config).await;
            (path.clone(), outcome)
        }
    }))
    .buffer_unordered(config.concurrency)
    .collect()
    .await;

    let mut summary = ExtractionSummary::default();
    for (path, outcome) in results {
        match outcome {
            Ok(record) => {
                if record.retries > 0 {
                    info!("{}: recovered after {} retries", record.source_file, record.retries);
                }
                summary.records.push(record);
            }
            Err(e) => {
                let reason = e.to_string();
                warn!("Giving up on '{}': {reason}", path.display());
                summary.sections_failed += 1;
                summary.failures.push(DocumentFailure { path, reason });
            }
        }
    }

    summary.records.sort_by(|a, b| a.source_file.cmp(&b.source_file));
    summary.failures.sort_by(|a, b| a.path.cmp(&b.path));
    summary.records_extracted = summary.records.len();

    if summary.records.is_empty() {
        warn!("No records extracted; skipping CSV report");
    } else {
        report::write_csv(&summary.records, &config.fields, csv_path)?;
        summary.csv_path = Some(csv_path.to_path_buf());
    }

    summary.duration_ms = started.elapsed().as_millis() as u64;
    info!(
        "Extraction complete: {}/{} sections in {}ms",
        summary.records_extracted,
        summary.records_extracted + summary.sections_failed,
        summary.duration_ms
    );

    Ok(summary)
}
