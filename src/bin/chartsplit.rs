//! CLI binary for chartsplit.
//!
//! A thin shim over the library crate that maps CLI flags to the split and
//! extract configs and renders progress.

use anyhow::{Context, Result};
use chartsplit::{
    extract_folder, load_fields, split_folder, BatchSummary, BoundaryPolicy, ExtractConfig,
    ExtractionSummary, FilterSpec, SplitConfig, SplitProgressCallback, TextStrategy,
};
use clap::{Parser, Subcommand};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: one bar per in-flight document under a [`MultiProgress`],
/// detection and section lines printed above the bars. Documents are scanned
/// concurrently, so every event routes through the per-document bar map.
struct CliProgress {
    multi: MultiProgress,
    bars: Mutex<HashMap<String, ProgressBar>>,
}

impl CliProgress {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            multi: MultiProgress::new(),
            bars: Mutex::new(HashMap::new()),
        })
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:32.green/238}] {pos:>3}/{len} pages  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
    }

    fn println(&self, line: String) {
        // Falls back to stderr when no bar is alive to anchor against.
        if self.multi.println(&line).is_err() {
            eprintln!("{line}");
        }
    }
}

impl SplitProgressCallback for CliProgress {
    fn on_scan_start(&self, doc: &str, total_pages: usize) {
        let bar = self.multi.add(ProgressBar::new(total_pages as u64));
        bar.set_style(Self::bar_style());
        bar.set_prefix(doc.to_string());
        bar.set_message("scanning");
        bar.enable_steady_tick(Duration::from_millis(80));
        self.bars.lock().unwrap().insert(doc.to_string(), bar);
    }

    fn on_page_scanned(&self, doc: &str, page_num: usize, total_pages: usize, matched: bool) {
        if matched {
            self.println(format!(
                "  {} {}  page {page_num}/{total_pages}  DETECTION",
                green("✓"),
                dim(doc),
            ));
        }
        if let Some(bar) = self.bars.lock().unwrap().get(doc) {
            bar.inc(1);
        }
    }

    fn on_scan_complete(&self, doc: &str, detections: usize) {
        if let Some(bar) = self.bars.lock().unwrap().get(doc) {
            bar.set_message(format!("{detections} detections, writing sections"));
        }
    }

    fn on_section_written(
        &self,
        doc: &str,
        _ordinal: usize,
        file_name: &str,
        first_page: usize,
        last_page: usize,
    ) {
        self.println(format!(
            "  {} {}  {}  {}",
            green("✓"),
            dim(doc),
            file_name,
            dim(&format!("pages {first_page}-{last_page}")),
        ));
    }

    fn on_document_complete(&self, doc: &str, sections: usize) {
        if let Some(bar) = self.bars.lock().unwrap().remove(doc) {
            bar.finish_and_clear();
            self.multi.remove(&bar);
        }
        self.println(format!(
            "{} {}  {} section{}",
            green("✔"),
            bold(doc),
            sections,
            if sections == 1 { "" } else { "s" },
        ));
    }

    fn on_document_failed(&self, doc: &str, error: &str) {
        if let Some(bar) = self.bars.lock().unwrap().remove(doc) {
            bar.finish_and_clear();
            self.multi.remove(&bar);
        }
        // Truncate very long error messages to keep output tidy.
        let msg = if error.len() > 120 {
            format!("{}\u{2026}", &error[..119])
        } else {
            error.to_string()
        };
        self.println(format!("{} {}  {}", red("✗"), bold(doc), red(&msg)));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Split a folder of born-digital PDFs on a demographics-sheet marker
  chartsplit split input/ output/ --filter "Patient Demographics"

  # Scanned documents: rasterise + OCR, several markers ANDed together
  chartsplit split input/ output/ --ocr \
      --filter "Anesthesia Billing" --filter "Address 1" --filter "Gender"

  # Detection pages start sections instead of separating them
  chartsplit split input/ output/ --policy start --filter "Billing and Compliance Report"

  # Extract one record per section into a combined CSV
  chartsplit extract output/ -o records.csv --provider openai --model gpt-4.1-mini

  # Site-specific field set
  chartsplit extract output/ -o records.csv --fields wpa_fields.json

  # Page count and text-layer overview (no model, no OCR)
  chartsplit inspect batch_0412.pdf

SPLITTING MODEL:
  A page is a DETECTION when it contains every --filter string (AND logic,
  case-insensitive unless --case-sensitive). Detections delimit sections:

    --policy separator   sections are the runs between detections; every
                         page of the input appears in exactly one section
    --policy start       each detection starts a section; pages before the
                         first detection are dropped as cover sheets

  Zero detections always produce one '{stem}_all_pages.pdf' fallback file.

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
                          API keys for `extract` (auto-detected)
  PDFIUM_LIB_PATH         Path to an existing libpdfium build
  RUST_LOG                Overrides the log filter (tracing EnvFilter syntax)

OCR:
  --ocr shells out to the `tesseract` binary (install tesseract-ocr) and
  rasterises pages at --dpi (default 200). Pages that fail OCR are treated
  as empty, never as errors.
"#;

/// Split scanned medical charts into per-patient sections and extract fields.
#[derive(Parser, Debug)]
#[command(
    name = "chartsplit",
    version,
    about = "Split scanned medical charts into per-patient PDF sections and extract billing fields",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "CHARTSPLIT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "CHARTSPLIT_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Split every PDF in a folder into per-record section files.
    Split(SplitArgs),
    /// Extract one JSON record per section PDF into a combined CSV.
    Extract(ExtractArgs),
    /// Print page count and text-layer overview for one PDF.
    Inspect(InspectArgs),
}

#[derive(clap::Args, Debug)]
struct SplitArgs {
    /// Folder containing the input PDFs (.pdf / .PDF).
    input_dir: PathBuf,

    /// Folder for the section files; created if absent.
    output_dir: PathBuf,

    /// Marker string that must appear on a detection page. Repeat the flag
    /// to AND several markers together.
    #[arg(short, long = "filter", value_name = "STRING", required = true)]
    filters: Vec<String>,

    /// Match filter strings case-sensitively.
    #[arg(long)]
    case_sensitive: bool,

    /// How detection pages delimit sections.
    #[arg(long, value_enum, default_value = "separator")]
    policy: PolicyArg,

    /// Rasterise pages and OCR them instead of reading the text layer.
    #[arg(long)]
    ocr: bool,

    /// Rasterisation DPI for OCR (72–600).
    #[arg(long, default_value_t = 200,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// OCR language code passed to tesseract.
    #[arg(long, default_value = "eng")]
    ocr_lang: String,

    /// Concurrent page scans per document. Default: CPU count.
    #[arg(long, value_name = "N")]
    page_workers: Option<usize>,

    /// Concurrent documents. Default: 4.
    #[arg(long, value_name = "N")]
    doc_workers: Option<usize>,

    /// PDF user password for encrypted inputs.
    #[arg(long)]
    password: Option<String>,

    /// Print the run summary as JSON instead of the human-readable report.
    #[arg(long)]
    json: bool,

    /// Disable progress bars.
    #[arg(long)]
    no_progress: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum PolicyArg {
    /// Detections separate sections; all pages are kept.
    Separator,
    /// Detections start sections; leading non-detection pages are dropped.
    Start,
}

impl From<PolicyArg> for BoundaryPolicy {
    fn from(v: PolicyArg) -> Self {
        match v {
            PolicyArg::Separator => BoundaryPolicy::Separator,
            PolicyArg::Start => BoundaryPolicy::Start,
        }
    }
}

#[derive(clap::Args, Debug)]
struct ExtractArgs {
    /// Folder of section PDFs produced by `split`.
    input_dir: PathBuf,

    /// Path of the combined CSV report.
    #[arg(short, long, default_value = "records.csv")]
    output: PathBuf,

    /// JSON file with the field definitions; built-in set if omitted.
    #[arg(long, value_name = "JSON")]
    fields: Option<PathBuf>,

    /// Pages per section sent to the model, from the section start.
    #[arg(long, default_value_t = 2, value_name = "N")]
    pages: usize,

    /// LLM model ID (e.g. gpt-4.1-mini, gemini-2.5-pro).
    #[arg(long, env = "CHARTSPLIT_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "CHARTSPLIT_PROVIDER")]
    provider: Option<String>,

    /// Concurrent section extractions.
    #[arg(short, long, default_value_t = 5)]
    concurrency: usize,

    /// Total attempts per section (API failures and bad JSON both count).
    #[arg(long, default_value_t = 5)]
    max_attempts: u32,

    /// Rendering DPI for the page images sent to the model (72–400).
    #[arg(long, default_value_t = 150,
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: u32,

    /// Max model output tokens per record.
    #[arg(long, default_value_t = 2048)]
    max_tokens: usize,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, default_value_t = 0.0)]
    temperature: f32,

    /// Path to a text file overriding the generated extraction prompt.
    #[arg(long, value_name = "FILE")]
    prompt: Option<PathBuf>,

    /// Print the run summary as JSON instead of the human-readable report.
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args, Debug)]
struct InspectArgs {
    /// PDF file to inspect.
    input: PathBuf,

    /// Optionally evaluate these filter strings against each page's
    /// text layer.
    #[arg(short, long = "filter", value_name = "STRING")]
    filters: Vec<String>,

    /// Match filter strings case-sensitively.
    #[arg(long)]
    case_sensitive: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when progress bars are active; the
    // bars provide all the feedback that matters to the operator.
    let show_progress = match &cli.command {
        Command::Split(args) => !cli.quiet && !args.no_progress && !args.json,
        _ => false,
    };
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Split(args) => run_split(args, cli.quiet, show_progress).await,
        Command::Extract(args) => run_extract(args, cli.quiet).await,
        Command::Inspect(args) => run_inspect(args).await,
    }
}

async fn run_split(args: SplitArgs, quiet: bool, show_progress: bool) -> Result<()> {
    let filter = FilterSpec::new(args.filters.iter().cloned(), args.case_sensitive)
        .context("Invalid --filter")?;

    let strategy = if args.ocr {
        if !chartsplit::pipeline::oracle::ocr_available() {
            eprintln!(
                "{} tesseract not found on PATH — OCR pages will come back empty.\n  \
                 Install tesseract-ocr, or drop --ocr for text-layer extraction.",
                cyan("⚠"),
            );
        }
        TextStrategy::Ocr {
            dpi: args.dpi,
            language: args.ocr_lang.clone(),
        }
    } else {
        TextStrategy::Direct
    };

    let mut builder = SplitConfig::builder(filter)
        .policy(args.policy.clone().into())
        .strategy(strategy);
    if let Some(n) = args.page_workers {
        builder = builder.page_concurrency(n);
    }
    if let Some(n) = args.doc_workers {
        builder = builder.doc_concurrency(n);
    }
    if let Some(ref pwd) = args.password {
        builder = builder.password(pwd.clone());
    }
    if show_progress {
        builder = builder.progress(CliProgress::new());
    }
    let config = builder.build().context("Invalid configuration")?;

    let summary = split_folder(&args.input_dir, &args.output_dir, &config)
        .await
        .context("Split failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if !quiet {
        print_split_summary(&summary);
    }

    Ok(())
}

fn print_split_summary(summary: &BatchSummary) {
    eprintln!(
        "{} {} sections from {} documents  {}",
        if summary.documents_failed == 0 {
            green("✔")
        } else {
            cyan("⚠")
        },
        bold(&summary.sections_created.to_string()),
        summary.documents_processed,
        dim(&format!("{}ms", summary.duration_ms)),
    );
    for failure in &summary.failures {
        eprintln!(
            "  {} {}  {}",
            red("✗"),
            failure.path.display(),
            red(&failure.reason)
        );
    }
}

async fn run_extract(args: ExtractArgs, quiet: bool) -> Result<()> {
    let mut builder = ExtractConfig::builder()
        .pages_per_record(args.pages)
        .dpi(args.dpi)
        .max_tokens(args.max_tokens)
        .temperature(args.temperature)
        .concurrency(args.concurrency)
        .retry(chartsplit::RetryPolicy {
            max_attempts: args.max_attempts.max(1),
            ..Default::default()
        });

    if let Some(ref path) = args.fields {
        builder = builder.fields(
            load_fields(path).with_context(|| format!("Failed to load fields from {path:?}"))?,
        );
    }
    if let Some(model) = args.model.clone() {
        builder = builder.model(model);
    }
    if let Some(provider) = args.provider.clone() {
        builder = builder.provider_name(provider);
    }
    if let Some(ref path) = args.prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read prompt from {path:?}"))?;
        builder = builder.prompt(prompt);
    }
    let config = builder.build().context("Invalid configuration")?;

    let summary = extract_folder(&args.input_dir, &args.output, &config)
        .await
        .context("Extraction failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if !quiet {
        print_extract_summary(&summary);
    }

    Ok(())
}

fn print_extract_summary(summary: &ExtractionSummary) {
    eprintln!(
        "{} {} records extracted, {} sections failed  {}",
        if summary.sections_failed == 0 {
            green("✔")
        } else {
            cyan("⚠")
        },
        bold(&summary.records_extracted.to_string()),
        summary.sections_failed,
        dim(&format!("{}ms", summary.duration_ms)),
    );
    if let Some(ref path) = summary.csv_path {
        eprintln!("   CSV → {}", bold(&path.display().to_string()));
    }
    for failure in &summary.failures {
        eprintln!(
            "  {} {}  {}",
            red("✗"),
            failure.path.display(),
            red(&failure.reason)
        );
    }
}

async fn run_inspect(args: InspectArgs) -> Result<()> {
    use chartsplit::pipeline::{matcher, oracle};

    let total_pages = oracle::document_page_count(&args.input, None)
        .await
        .context("Failed to inspect PDF")?;

    let filter = if args.filters.is_empty() {
        None
    } else {
        Some(FilterSpec::new(args.filters.iter().cloned(), args.case_sensitive)
            .context("Invalid --filter")?)
    };

    println!("File:   {}", args.input.display());
    println!("Pages:  {total_pages}");

    for page_index in 0..total_pages {
        let text = oracle::page_text(&args.input, page_index, &TextStrategy::Direct, None).await;
        let status = if text.is_empty() {
            dim("no text layer")
        } else {
            format!("{} chars", text.len())
        };
        match &filter {
            Some(f) if matcher::page_matches(&text, f) => {
                println!("  page {:>3}  {status}  {}", page_index + 1, green("MATCH"));
            }
            Some(_) => println!("  page {:>3}  {status}", page_index + 1),
            None => println!("  page {:>3}  {status}", page_index + 1),
        }
    }

    Ok(())
}
