//! Configuration types for splitting and extraction.
//!
//! All splitting behaviour is controlled through [`SplitConfig`], built via
//! its [`SplitConfigBuilder`]; extraction has its own [`ExtractConfig`].
//! Keeping every knob in one value makes it trivial to share configs across
//! worker tasks and rules out the process-wide mutable defaults the original
//! tooling relied on — a filter is always an explicit argument, never an
//! ambient constant.

use crate::error::ChartsplitError;
use crate::extract::fields::FieldDef;
use crate::progress::ProgressCallback;
use crate::retry::RetryPolicy;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

// ── FilterSpec ───────────────────────────────────────────────────────────

/// The AND-combined set of substrings that defines a detection page.
///
/// Invariant: at least one term, every term non-empty after trimming.
/// [`FilterSpec::new`] enforces this by dropping blank terms and rejecting an
/// empty remainder, so a constructed `FilterSpec` is always usable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    terms: Vec<String>,
    case_sensitive: bool,
}

impl FilterSpec {
    /// Build a filter from raw user-supplied terms.
    ///
    /// Terms are trimmed; whitespace-only terms are discarded. Returns
    /// [`ChartsplitError::InvalidFilter`] if nothing survives — this is the
    /// configuration error that must abort an invocation before any document
    /// is touched.
    pub fn new<I, S>(terms: I, case_sensitive: bool) -> Result<Self, ChartsplitError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut supplied_any = false;
        let terms: Vec<String> = terms
            .into_iter()
            .map(|t| {
                supplied_any = true;
                t.into().trim().to_string()
            })
            .filter(|t| !t.is_empty())
            .collect();

        if terms.is_empty() {
            return Err(ChartsplitError::InvalidFilter(if supplied_any {
                "all filter strings were empty or whitespace".into()
            } else {
                "no filter strings were supplied".into()
            }));
        }

        Ok(Self {
            terms,
            case_sensitive,
        })
    }

    /// The trimmed, non-empty terms, in supplied order.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Operator-facing rendering: `'Gender' AND 'Address 1'`.
    pub fn display(&self) -> String {
        self.terms
            .iter()
            .map(|t| format!("'{t}'"))
            .collect::<Vec<_>>()
            .join(" AND ")
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How detection pages delimit sections.
///
/// The upstream tooling shipped both behaviours in separate scripts without
/// naming the difference; here the choice is an explicit, documented enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BoundaryPolicy {
    /// Detection pages are separators: boundaries are `{0} ∪ detections ∪
    /// {total}`, each consecutive pair forms one section, and zero-length
    /// gaps (e.g. a detection on the very first page) are dropped. Every
    /// page of the document appears in exactly one section. (default)
    #[default]
    Separator,
    /// Each detection page starts a section, which runs to the next
    /// detection or to the end of the document. Pages ahead of the first
    /// detection are cover-sheet preamble and are not emitted.
    Start,
}

/// How page text is obtained.
///
/// Chosen at configuration time, not by inspecting the file at runtime —
/// a folder of inputs is either born-digital or scanned, and the operator
/// knows which.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TextStrategy {
    /// Read the embedded text layer. Fast and exact; yields empty text (and
    /// therefore no detections) on scanned image-only pages.
    Direct,
    /// Rasterise each page at `dpi` and run optical character recognition.
    /// Slow and approximate — OCR misreads make missed detections possible,
    /// which is accepted: detection is a heuristic, not a guarantee.
    Ocr {
        /// Rasterisation resolution. 200 keeps body text legible to the OCR
        /// engine without ballooning raster buffers.
        dpi: u32,
        /// OCR language code passed to the engine, e.g. `"eng"`.
        language: String,
    },
}

impl Default for TextStrategy {
    fn default() -> Self {
        TextStrategy::Direct
    }
}

impl TextStrategy {
    /// Standard OCR strategy at 200 DPI, English.
    pub fn ocr() -> Self {
        TextStrategy::Ocr {
            dpi: 200,
            language: "eng".into(),
        }
    }
}

// ── SplitConfig ──────────────────────────────────────────────────────────

/// Configuration for a split run.
///
/// Built via [`SplitConfig::builder()`]; the filter is the only required
/// field.
///
/// # Example
/// ```rust
/// use chartsplit::{FilterSpec, SplitConfig, BoundaryPolicy};
///
/// let filter = FilterSpec::new(["Patient Demographics"], false).unwrap();
/// let config = SplitConfig::builder(filter)
///     .policy(BoundaryPolicy::Start)
///     .page_concurrency(8)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct SplitConfig {
    /// What makes a page a detection page.
    pub filter: FilterSpec,

    /// How detections delimit sections. Default: [`BoundaryPolicy::Separator`].
    pub policy: BoundaryPolicy,

    /// How page text is obtained. Default: [`TextStrategy::Direct`].
    pub strategy: TextStrategy,

    /// Concurrent page scans within one document. Default: available
    /// parallelism.
    ///
    /// Page scans are CPU-bound under OCR and I/O-bound under direct
    /// extraction; either way each scan opens its own document handle, so
    /// parallel pages never share state.
    pub page_concurrency: usize,

    /// Concurrent documents in flight. Default: 4.
    ///
    /// Orthogonal to `page_concurrency`: the effective worker ceiling is the
    /// product of the two, so keep this modest when OCR is enabled.
    pub doc_concurrency: usize,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Optional per-page / per-section progress events.
    pub progress: Option<ProgressCallback>,
}

impl SplitConfig {
    /// Create a builder seeded with the required filter.
    pub fn builder(filter: FilterSpec) -> SplitConfigBuilder {
        SplitConfigBuilder {
            config: SplitConfig {
                filter,
                policy: BoundaryPolicy::default(),
                strategy: TextStrategy::default(),
                page_concurrency: default_page_concurrency(),
                doc_concurrency: 4,
                password: None,
                progress: None,
            },
        }
    }
}

fn default_page_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

impl fmt::Debug for SplitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SplitConfig")
            .field("filter", &self.filter)
            .field("policy", &self.policy)
            .field("strategy", &self.strategy)
            .field("page_concurrency", &self.page_concurrency)
            .field("doc_concurrency", &self.doc_concurrency)
            .field("password", &self.password.as_ref().map(|_| "<set>"))
            .field("progress", &self.progress.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

/// Builder for [`SplitConfig`].
pub struct SplitConfigBuilder {
    config: SplitConfig,
}

impl SplitConfigBuilder {
    pub fn policy(mut self, policy: BoundaryPolicy) -> Self {
        self.config.policy = policy;
        self
    }

    pub fn strategy(mut self, strategy: TextStrategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    pub fn page_concurrency(mut self, n: usize) -> Self {
        self.config.page_concurrency = n.max(1);
        self
    }

    pub fn doc_concurrency(mut self, n: usize) -> Self {
        self.config.doc_concurrency = n.max(1);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn progress(mut self, cb: ProgressCallback) -> Self {
        self.config.progress = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SplitConfig, ChartsplitError> {
        if let TextStrategy::Ocr { dpi, ref language } = self.config.strategy {
            if !(72..=600).contains(&dpi) {
                return Err(ChartsplitError::InvalidConfig(format!(
                    "OCR DPI must be 72–600, got {dpi}"
                )));
            }
            if language.trim().is_empty() {
                return Err(ChartsplitError::InvalidConfig(
                    "OCR language must not be empty".into(),
                ));
            }
        }
        Ok(self.config)
    }
}

// ── ExtractConfig ────────────────────────────────────────────────────────

/// Configuration for extracting one JSON record per section PDF.
#[derive(Clone)]
pub struct ExtractConfig {
    /// Field definitions; their order defines the CSV column order.
    pub fields: Vec<FieldDef>,

    /// Pages sent to the model per section, counted from the section's
    /// first page. Default: 2 — patient demographics sheets front-load the
    /// fields of interest, and later pages only add cost and noise.
    pub pages_per_record: usize,

    /// Rendering DPI for the page images sent to the model. Default: 150.
    pub dpi: u32,

    /// LLM model identifier. If `None`, uses the provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "gemini"). If `None` along with
    /// `provider`, the provider is auto-detected from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.0 — transcription wants determinism.
    pub temperature: f32,

    /// Maximum tokens the model may generate per record. Default: 2048.
    pub max_tokens: usize,

    /// Retry schedule for API failures and unparseable responses.
    pub retry: RetryPolicy,

    /// Concurrent section extractions. Default: 5.
    pub concurrency: usize,

    /// Custom prompt override. If `None`, the prompt is generated from
    /// `fields`.
    pub prompt: Option<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            fields: crate::extract::fields::default_fields(),
            pages_per_record: 2,
            dpi: 150,
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.0,
            max_tokens: 2048,
            retry: RetryPolicy::default(),
            concurrency: 5,
            prompt: None,
        }
    }
}

impl fmt::Debug for ExtractConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractConfig")
            .field("fields", &self.fields.len())
            .field("pages_per_record", &self.pages_per_record)
            .field("dpi", &self.dpi)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("retry", &self.retry)
            .field("concurrency", &self.concurrency)
            .finish()
    }
}

impl ExtractConfig {
    /// Create a builder pre-populated with defaults.
    pub fn builder() -> ExtractConfigBuilder {
        ExtractConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractConfig`].
pub struct ExtractConfigBuilder {
    config: ExtractConfig,
}

impl ExtractConfigBuilder {
    pub fn fields(mut self, fields: Vec<FieldDef>) -> Self {
        self.config.fields = fields;
        self
    }

    pub fn pages_per_record(mut self, n: usize) -> Self {
        self.config.pages_per_record = n.max(1);
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 400);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.prompt = Some(prompt.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractConfig, ChartsplitError> {
        if self.config.fields.is_empty() {
            return Err(ChartsplitError::InvalidConfig(
                "field list must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}
