//! VLM interaction: turn one section PDF into one JSON record.
//!
//! The section's leading pages are rasterised, PNG-encoded, and sent as a
//! single multimodal chat request with the generated extraction prompt as the
//! system message. The response must be a single JSON object (optionally
//! fenced); an unparseable response costs a retry exactly like an API error,
//! because from the pipeline's point of view both mean "no record yet".
//!
//! ## Retry strategy
//!
//! Transient 429/5xx errors are frequent under concurrent load, and models
//! occasionally emit malformed JSON. Both go through the configured
//! [`crate::retry::RetryPolicy`] — capped attempts, exponential backoff,
//! jitter — and end in [`ChartsplitError::RecordExtractionFailed`] carrying
//! the last failure.

use crate::config::ExtractConfig;
use crate::error::ChartsplitError;
use crate::extract::clean;
use crate::output::ExtractedRecord;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use pdfium_render::prelude::*;
use serde_json::Value;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolve the LLM provider, from most-specific to least-specific:
/// a pre-built provider, then a named provider (API key from the
/// environment), then full auto-detection across known key variables.
pub async fn resolve_provider(
    config: &ExtractConfig,
) -> Result<Arc<dyn LLMProvider>, ChartsplitError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or("gpt-4.1-mini");
        return ProviderFactory::create_llm_provider(name, model).map_err(|e| {
            ChartsplitError::ProviderNotConfigured {
                provider: name.clone(),
                hint: format!("{e}"),
            }
        });
    }

    let (provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| ChartsplitError::ProviderNotConfigured {
            provider: "auto".into(),
            hint: format!(
                "No LLM provider could be auto-detected from the environment.\n\
                 Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or GEMINI_API_KEY, or pass --provider.\n\
                 Error: {e}"
            ),
        })?;
    Ok(provider)
}

/// Extract one record from a section PDF.
pub async fn extract_record(
    provider: &Arc<dyn LLMProvider>,
    path: &Path,
    prompt: &str,
    config: &ExtractConfig,
) -> Result<ExtractedRecord, ChartsplitError> {
    let section = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let images = render_section_pages(path, config.pages_per_record, config.dpi).await?;
    debug!("{section}: sending {} page image(s) to the model", images.len());

    let messages = vec![
        ChatMessage::system(prompt),
        // VLM APIs require a user turn to respond to; the images carry all
        // the actual content.
        ChatMessage::user_with_images("", images),
    ];
    let options = CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    };

    let mut last_err = String::from("no attempts made");
    let mut attempt = 0;
    while config.retry.allows(attempt) {
        if attempt > 0 {
            warn!(
                "{section}: retry {}/{} — {last_err}",
                attempt,
                config.retry.max_attempts - 1
            );
            config.retry.wait(attempt).await;
        }

        match provider.chat(&messages, Some(&options)).await {
            Ok(response) => {
                debug!(
                    "{section}: {} input tokens, {} output tokens",
                    response.prompt_tokens, response.completion_tokens
                );
                match parse_record(&response.content) {
                    Ok(values) => {
                        return Ok(ExtractedRecord {
                            source_file: section,
                            values: clean_record(values),
                            retries: attempt,
                        });
                    }
                    Err(detail) => last_err = detail,
                }
            }
            Err(e) => last_err = format!("{e}"),
        }
        attempt += 1;
    }

    Err(ChartsplitError::RecordExtractionFailed {
        section,
        attempts: config.retry.max_attempts,
        detail: last_err,
    })
}

/// Parse a model response into a JSON object, tolerating code fences.
fn parse_record(content: &str) -> Result<serde_json::Map<String, Value>, String> {
    let cleaned = clean::strip_code_fences(content);
    if cleaned.len() < 2 {
        return Err(format!("response too short: {cleaned:?}"));
    }
    let value: Value =
        serde_json::from_str(&cleaned).map_err(|e| format!("response was not JSON: {e}"))?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(format!(
            "expected a JSON object, got {}",
            json_type_name(&other)
        )),
    }
}

/// Apply field-value cleanup to every string value of a parsed record.
///
/// Nulls are dropped (the CSV writer emits empty cells); non-string values
/// pass through untouched so numeric types survive to the report stage.
fn clean_record(values: serde_json::Map<String, Value>) -> serde_json::Map<String, Value> {
    values
        .into_iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(name, value)| {
            let value = match value {
                Value::String(s) => {
                    let mut cleaned = clean::clean_field_value(&s, Some(&name));
                    if name.to_lowercase().contains("phone") {
                        cleaned = clean::format_phone_number(&cleaned);
                    }
                    Value::String(cleaned)
                }
                other => other,
            };
            (name, value)
        })
        .collect()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ── Rendering ────────────────────────────────────────────────────────────

/// Rasterise the first `max_pages` pages of a section PDF for the model.
///
/// Runs inside `spawn_blocking` since pdfium is CPU-bound and not async-safe.
async fn render_section_pages(
    path: &Path,
    max_pages: usize,
    dpi: u32,
) -> Result<Vec<ImageData>, ChartsplitError> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let pdfium = Pdfium::default();
        let document = pdfium.load_pdf_from_file(&path, None).map_err(|e| {
            ChartsplitError::DocumentUnreadable {
                path: path.clone(),
                detail: format!("{e:?}"),
            }
        })?;

        let total = document.pages().len() as usize;
        let take = max_pages.min(total);
        let render_config = PdfRenderConfig::new().scale_page_by_factor(dpi as f32 / 72.0);

        let mut images = Vec::with_capacity(take);
        for index in 0..take {
            let page = document.pages().get(index as u16).map_err(|e| {
                ChartsplitError::DocumentUnreadable {
                    path: path.clone(),
                    detail: format!("page {}: {e:?}", index + 1),
                }
            })?;
            let bitmap = page.render_with_config(&render_config).map_err(|e| {
                ChartsplitError::DocumentUnreadable {
                    path: path.clone(),
                    detail: format!("rendering page {}: {e:?}", index + 1),
                }
            })?;
            images.push(encode_image(&bitmap.as_image()).map_err(|e| {
                ChartsplitError::Internal(format!("PNG encode of page {}: {e}", index + 1))
            })?);
        }
        Ok(images)
    })
    .await
    .map_err(|e| ChartsplitError::Internal(format!("render task panicked: {e}")))?
}

/// PNG-encode and base64-wrap a rendered page.
///
/// PNG over JPEG: lossless compression keeps printed text crisp, and text
/// crispness matters more than payload size for extraction accuracy.
fn encode_image(image: &image::DynamicImage) -> Result<ImageData, image::ImageError> {
    let mut buf = Vec::new();
    image.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    let b64 = STANDARD.encode(&buf);
    Ok(ImageData::new(b64, "image/png").with_detail("high"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_record_accepts_plain_object() {
        let map = parse_record(r#"{"Patient Name": "DOE, JOHN A"}"#).unwrap();
        assert_eq!(map["Patient Name"], "DOE, JOHN A");
    }

    #[test]
    fn parse_record_accepts_fenced_object() {
        let map = parse_record("```json\n{\"MRN\": \"00123\"}\n```").unwrap();
        assert_eq!(map["MRN"], "00123");
    }

    #[test]
    fn parse_record_rejects_non_object() {
        let err = parse_record(r#"["a", "b"]"#).unwrap_err();
        assert!(err.contains("an array"), "got: {err}");
    }

    #[test]
    fn parse_record_rejects_garbage() {
        assert!(parse_record("the patient is John").is_err());
        assert!(parse_record("").is_err());
    }

    #[test]
    fn clean_record_drops_nulls_and_cleans_strings() {
        let raw: serde_json::Map<String, Value> = serde_json::from_str(
            r#"{
                "Patient Name": "??DOE, JOHN A",
                "Cell Phone": "(712)3016622",
                "Primary Subsc ID": "AB 12-3!",
                "Address 2": null,
                "Copay": 25
            }"#,
        )
        .unwrap();

        let cleaned = clean_record(raw);
        assert_eq!(cleaned["Patient Name"], "DOE, JOHN A");
        assert_eq!(cleaned["Cell Phone"], "(712) 301-6622");
        assert_eq!(cleaned["Primary Subsc ID"], "AB12-3");
        assert_eq!(cleaned["Copay"], 25);
        assert!(!cleaned.contains_key("Address 2"));
    }

    #[test]
    fn encode_image_produces_png_payload() {
        use image::{DynamicImage, Rgba, RgbaImage};
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 255])));
        let data = encode_image(&img).unwrap();
        assert_eq!(data.mime_type, "image/png");
        let decoded = STANDARD.decode(&data.data).unwrap();
        assert_eq!(&decoded[1..4], b"PNG");
    }
}
