//! CLI binary for flashgen.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `GenerationConfig`, runs one request and prints the artifact.

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use flashgen::pipeline::extract::{DocumentFormat, PDF_MEDIA_TYPE};
use flashgen::{
    resolve_upload, respond, Artifact, ArtifactKind, GenerationConfig, GenerationProgressCallback,
    GenerationRequest, Generator, DEFAULT_MODEL,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner on stderr that follows the request through its attempts.
struct CliProgressCallback {
    bar: ProgressBar,
    started: Instant,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.set_message("Starting…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            started: Instant::now(),
        })
    }
}

impl GenerationProgressCallback for CliProgressCallback {
    fn on_generation_start(&self, kind: ArtifactKind) {
        self.bar.set_prefix("Generating");
        self.bar.set_message(format!("{kind}"));
    }

    fn on_content_resolved(&self, chars: usize, truncated: bool) {
        let note = if truncated { " (truncated)" } else { "" };
        self.bar
            .println(format!("  {} {chars} characters of source{note}", dim("·")));
    }

    fn on_attempt_start(&self, attempt: u32) {
        let label = if attempt == 1 { "asking the model" } else { "strict retry" };
        self.bar.set_message(format!("attempt {attempt}: {label}"));
    }

    fn on_retry(&self, reason: &str) {
        let msg = if reason.chars().count() > 80 {
            let cut: String = reason.chars().take(79).collect();
            format!("{cut}\u{2026}")
        } else {
            reason.to_string()
        };
        self.bar
            .println(format!("  {} response was not JSON: {}", yellow("⚠"), dim(&msg)));
    }

    fn on_generation_complete(&self, success: bool) {
        self.bar.finish_and_clear();
        let secs = self.started.elapsed().as_secs_f64();
        if success {
            eprintln!("{} done in {:.1}s", green("✔"), secs);
        } else {
            eprintln!("{} failed after {:.1}s", red("✘"), secs);
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Quiz from a PDF (default kind)
  flashgen --file lecture.pdf

  # Flashcards from inline text
  flashgen --kind flashcards --text "Photosynthesis converts light energy into chemical energy..."

  # Word document from a URL, printed as the POST /generate reply envelope
  flashgen --file https://example.com/notes.docx --json

  # Explicit provider and model
  flashgen --provider openai --model gpt-4.1-mini --file notes.docx

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key (selects OpenAI when no provider is named)
  EDGEQUAKE_LLM_PROVIDER  Provider used when --provider is not given
  EDGEQUAKE_MODEL         Model ID used when --model is not given
  PDFIUM_LIB_PATH         Path to an existing libpdfium (skips auto-download)
  RUST_LOG                Overrides the log filter chosen by -v / -q

EXIT STATUS:
  0 on success, 1 when generation fails (the reply status is printed with --json).
"#;

/// Generate flashcards or a multiple-choice quiz from text, PDF or Word documents.
#[derive(Parser, Debug)]
#[command(
    name = "flashgen",
    version,
    about = "Generate flashcards or a multiple-choice quiz with an LLM",
    long_about = "Generate ten flashcards or ten four-option multiple-choice questions from \
inline text, a PDF or a Word document (local file or URL). The model's answer is sanitised, \
retried once with a stricter instruction if it is not JSON, and validated before printing.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP,
    group(ArgGroup::new("source").required(true).args(["text", "file"]))
)]
struct Cli {
    /// Source text.
    #[arg(long)]
    text: Option<String>,

    /// PDF or Word document: local path or HTTP/HTTPS URL.
    #[arg(long)]
    file: Option<String>,

    /// What to generate: flashcards or quiz.
    #[arg(short, long, env = "FLASHGEN_KIND", default_value = "quiz")]
    kind: ArtifactKind,

    /// Media type of --file, overriding detection from extension / Content-Type.
    #[arg(long)]
    media_type: Option<String>,

    /// LLM model ID.
    #[arg(long, env = "EDGEQUAKE_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// LLM provider (openai, ollama, ...). Auto-detected when not set.
    #[arg(long, env = "FLASHGEN_PROVIDER")]
    provider: Option<String>,

    /// Temperature of the first completion (0.0–2.0).
    #[arg(long, env = "FLASHGEN_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Source text is cut to this many characters.
    #[arg(long, env = "FLASHGEN_MAX_CHARS", default_value_t = 8000)]
    max_chars: usize,

    /// Per-completion timeout in seconds.
    #[arg(long, env = "FLASHGEN_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "FLASHGEN_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Print the `{status, body}` reply of POST /generate as JSON.
    #[arg(long)]
    json: bool,

    /// Disable the spinner.
    #[arg(long, env = "FLASHGEN_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors and the result.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner replaces INFO logs unless -v is given.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
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

    let mut config = build_config(&cli)?;

    // ── Resolve input ────────────────────────────────────────────────────
    let request = match (&cli.text, &cli.file) {
        (_, Some(file)) => {
            let upload = resolve_upload(
                file,
                cli.media_type.as_deref(),
                config.max_upload_bytes,
                config.download_timeout_secs,
            )
            .await
            .with_context(|| format!("Failed to read '{file}'"))?;

            if DocumentFormat::from_media_type(&upload.media_type) == Some(DocumentFormat::Pdf) {
                ensure_pdf_engine(cli.quiet)?;
            }
            GenerationRequest::from_upload(cli.kind, upload)
        }
        (Some(text), None) => GenerationRequest::from_text(cli.kind, text.as_str()),
        (None, None) => anyhow::bail!("either --text or --file is required"),
    };

    // Started after any engine download so the two bars never overlap.
    if show_progress {
        let cb = CliProgressCallback::new();
        config.progress_callback = Some(cb as Arc<dyn GenerationProgressCallback>);
    }

    // ── Generate ─────────────────────────────────────────────────────────
    let generator = Generator::from_config(config).context("Failed to configure LLM provider")?;
    let outcome = generator.generate(request).await;

    if cli.json {
        let reply = respond(&outcome);
        println!(
            "{}",
            serde_json::to_string_pretty(&reply).context("Failed to serialise reply")?
        );
        if !reply.is_success() {
            std::process::exit(1);
        }
        return Ok(());
    }

    let artifact = outcome.context("Generation failed")?;
    print_artifact(&artifact);
    Ok(())
}

/// Map CLI args to `GenerationConfig`.
fn build_config(cli: &Cli) -> Result<GenerationConfig> {
    let mut builder = GenerationConfig::builder()
        .model(cli.model.as_str())
        .temperature(cli.temperature)
        .max_chars(cli.max_chars)
        .api_timeout_secs(cli.api_timeout)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref name) = cli.provider {
        builder = builder.provider_name(name.as_str());
    }
    builder.build().context("Invalid configuration")
}

/// Download pdfium on first use, with a byte counter unless quiet.
fn ensure_pdf_engine(quiet: bool) -> Result<()> {
    if pdfium_auto::is_pdfium_cached() {
        return Ok(());
    }

    if quiet {
        tokio::task::block_in_place(|| pdfium_auto::ensure_pdfium_library(None))
            .context("Failed to download PDFium engine")?;
        return Ok(());
    }

    let dl_bar = ProgressBar::new(0);
    dl_bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS),
    );
    dl_bar.set_prefix("PDF engine");
    dl_bar.enable_steady_tick(Duration::from_millis(80));

    let bar = dl_bar.clone();
    tokio::task::block_in_place(|| {
        pdfium_auto::ensure_pdfium_library(Some(&|downloaded, total| {
            if let Some(t) = total {
                if bar.length().unwrap_or(0) != t {
                    bar.set_length(t);
                }
            }
            bar.set_position(downloaded);
        }))
    })
    .with_context(|| format!("Failed to download PDFium engine (needed for {PDF_MEDIA_TYPE})"))?;

    dl_bar.finish_with_message("ready ✓");
    Ok(())
}

fn print_artifact(artifact: &Artifact) {
    match artifact {
        Artifact::Flashcards(set) => {
            for (i, card) in set.flashcards.iter().enumerate() {
                println!("{} {}", bold(&format!("{:>2}.", i + 1)), card.question);
                println!("    {}", dim(&card.answer));
            }
        }
        Artifact::Quiz(set) => {
            for (i, q) in set.questions.iter().enumerate() {
                println!("{} {}", bold(&format!("{:>2}.", i + 1)), q.question);
                for (j, choice) in q.choices.iter().enumerate() {
                    let letter = (b'A' + j as u8) as char;
                    if j == q.answer_index as usize {
                        println!("    {}", green(&format!("{letter}) {choice}")));
                    } else {
                        println!("    {letter}) {choice}");
                    }
                }
            }
        }
    }
}
