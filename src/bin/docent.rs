//! CLI binary for docent.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `SessionConfig`, prints the generated content, and drives the
//! interactive feedback loop.

use anyhow::{Context, Result};
use clap::Parser;
use docent::{
    DocumentSource, Language, Session, SessionConfig, SessionReport, Stage, StageCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
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

/// Terminal stage spinner: one live spinner line that follows the workflow
/// through ingestion, generation, and synthesis.
struct CliProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliProgress {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            bar: Mutex::new(None),
        })
    }

    fn spinner(message: String) -> ProgressBar {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_message(message);
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    }
}

impl StageCallback for CliProgress {
    fn on_stage_start(&self, stage: Stage) {
        let mut guard = self.bar.lock().unwrap();
        if let Some(old) = guard.take() {
            old.finish_and_clear();
        }
        *guard = Some(Self::spinner(format!("{}…", stage.label())));
    }

    fn on_stage_done(&self, stage: Stage) {
        let mut guard = self.bar.lock().unwrap();
        if let Some(bar) = guard.take() {
            bar.finish_and_clear();
        }
        eprintln!("{} {}", green("✓"), stage.label());
    }

    fn on_document_done(&self, index: usize, total: usize, corpus_chars: usize) {
        let guard = self.bar.lock().unwrap();
        if let Some(bar) = guard.as_ref() {
            bar.set_message(format!(
                "Extracting text… document {}/{} ({} chars so far)",
                index + 1,
                total,
                corpus_chars
            ));
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Summarize, explain, and voice a paper in English
  docent paper.pdf

  # Hindi explanation with emphasis on specific topics
  docent --language hindi --keywords cricket,monsoon notes.pdf

  # Several documents as one corpus, audio saved next to you
  docent a.pdf b.pdf https://arxiv.org/pdf/1706.03762 --audio-out attention.mp3

  # Iterate on the explanation until it lands
  docent --interactive textbook-chapter.pdf

  # Text only, no OCR fallback, JSON report
  docent --no-audio --no-ocr --json scan.pdf > report.json

  # List the supported languages
  docent --list-languages

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  DOCENT_LLM_PROVIDER     Override provider (gemini, openai, anthropic, ollama)
  DOCENT_MODEL            Override model ID
  PDFIUM_DYNAMIC_LIB_PATH Path to an existing libpdfium

SETUP:
  1. Set an API key:  export GEMINI_API_KEY=...
  2. Process a PDF:   docent document.pdf
"#;

/// Turn PDF documents into spoken, beginner-friendly AI explanations.
#[derive(Parser, Debug)]
#[command(
    name = "docent",
    version,
    about = "Turn PDF documents into spoken, beginner-friendly AI explanations",
    long_about = "Ingest PDF documents (with vision-model OCR for image-only pages), generate a \
summary and a long, analogy-driven explanation in your language, and render the explanation \
as audio. Feedback regenerates the explanation against everything you have said so far.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF files or HTTP/HTTPS URLs, processed together as one corpus.
    #[arg(required_unless_present = "list_languages")]
    inputs: Vec<String>,

    /// Target language for the explanation and the audio.
    #[arg(short, long, env = "DOCENT_LANGUAGE", default_value = "English")]
    language: String,

    /// Topics to emphasize, comma-separated.
    #[arg(short, long, env = "DOCENT_KEYWORDS", value_delimiter = ',')]
    keywords: Vec<String>,

    /// Write the audio artifact to this path instead of a temp file.
    #[arg(short = 'o', long, env = "DOCENT_AUDIO_OUT")]
    audio_out: Option<PathBuf>,

    /// Skip speech synthesis entirely.
    #[arg(long, env = "DOCENT_NO_AUDIO")]
    no_audio: bool,

    /// Skip the OCR fallback; image-only pages contribute nothing.
    #[arg(long, env = "DOCENT_NO_OCR")]
    no_ocr: bool,

    /// Read feedback lines from stdin and revise until an empty line.
    #[arg(short, long, conflicts_with = "json")]
    interactive: bool,

    /// Emit the session report as pretty JSON instead of formatted text.
    #[arg(long, env = "DOCENT_JSON")]
    json: bool,

    /// LLM model ID (e.g. gemini-2.0-flash, gpt-4.1-nano).
    #[arg(long, env = "DOCENT_MODEL")]
    model: Option<String>,

    /// LLM provider: gemini, openai, anthropic, ollama.
    #[arg(long, env = "DOCENT_PROVIDER")]
    provider: Option<String>,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "DOCENT_PASSWORD")]
    password: Option<String>,

    /// Max LLM output tokens per request.
    #[arg(long, env = "DOCENT_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "DOCENT_TEMPERATURE", default_value_t = 0.7)]
    temperature: f32,

    /// Retries per LLM request on transient failure.
    #[arg(long, env = "DOCENT_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "DOCENT_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Per-request speech-synthesis timeout in seconds.
    #[arg(long, env = "DOCENT_SYNTHESIS_TIMEOUT", default_value_t = 30)]
    synthesis_timeout: u64,

    /// Print the supported languages and exit.
    #[arg(long)]
    list_languages: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "DOCENT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCENT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and results.
    #[arg(short, long, env = "DOCENT_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the spinner is active; the
    // spinner provides all the feedback that matters to the user.
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

    // ── List-languages mode ──────────────────────────────────────────────
    if cli.list_languages {
        println!("{:<12} code", "language");
        for language in Language::ALL {
            println!("{:<12} {}", language.display_name(), language.synthesis_code());
        }
        return Ok(());
    }

    let language: Language = cli
        .language
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    // ── Build config ─────────────────────────────────────────────────────
    let mut builder = SessionConfig::builder()
        .language(language)
        .keywords(cli.keywords.clone())
        .ocr(!cli.no_ocr)
        .audio(!cli.no_audio)
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .max_retries(cli.max_retries)
        .download_timeout_secs(cli.download_timeout)
        .synthesis_timeout_secs(cli.synthesis_timeout);

    if show_progress {
        builder = builder.progress_callback(CliProgress::new());
    }

    let mut config = builder.build().context("Invalid configuration")?;
    config.model = cli.model.clone();
    config.provider_name = cli.provider.clone();
    config.password = cli.password.clone();

    // ── Run the workflow ─────────────────────────────────────────────────
    let sources: Vec<DocumentSource> = cli
        .inputs
        .iter()
        .map(|input| DocumentSource::from_input(input))
        .collect();

    let mut session = Session::new(config);
    let report = session
        .process_documents(&sources)
        .await
        .context("Processing failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
        // The JSON report references the temp audio path; keep the file.
        if let Some(artifact) = session.take_audio() {
            let _ = artifact.into_path();
        }
        return Ok(());
    }

    print_report(&report);

    if cli.interactive {
        feedback_loop(&mut session).await?;
    }

    // ── Persist the audio artifact ───────────────────────────────────────
    if let Some(artifact) = session.take_audio() {
        let temp_path = artifact.into_path();
        let final_path = match &cli.audio_out {
            Some(target) => {
                move_file(&temp_path, target)
                    .with_context(|| format!("Failed to write audio to {}", target.display()))?;
                target.clone()
            }
            None => temp_path,
        };
        eprintln!("{} Audio: {}", green("♪"), bold(&final_path.display().to_string()));
    } else if !cli.no_audio && !cli.quiet {
        eprintln!("{} No audio produced (see log for the reason)", cyan("⚠"));
    }

    Ok(())
}

/// Print summary and explanation sections, flagging failures in red.
fn print_report(report: &SessionReport) {
    println!("{}", bold("── Summary ─────────────────────────────────"));
    if report.summary.is_failure() {
        println!("{}", red(&report.summary.to_string()));
    } else {
        println!("{}", report.summary);
    }
    println!();
    println!("{}", bold("── Explanation ─────────────────────────────"));
    if report.explanation.is_failure() {
        println!("{}", red(&report.explanation.to_string()));
    } else {
        println!("{}", report.explanation);
    }
    println!();
    eprintln!(
        "{}",
        dim(&format!(
            "{} document(s), {} chars, {} OCR page(s), {} feedback round(s)",
            report.ingest.documents_with_text,
            report.ingest.corpus_chars,
            report.ingest.ocr_pages,
            report.feedback_rounds
        ))
    );
}

/// Read feedback lines until an empty line or EOF; revise after each.
async fn feedback_loop(session: &mut Session) -> Result<()> {
    let stdin = io::stdin();
    loop {
        eprint!("{} ", cyan("feedback (empty line to finish):"));
        io::stderr().flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).context("Failed to read feedback")? == 0 {
            break; // EOF
        }
        let feedback = line.trim();
        if feedback.is_empty() {
            break;
        }

        let report = session
            .submit_feedback(feedback)
            .await
            .context("Revision failed")?;
        print_report(&report);
    }
    Ok(())
}

/// Move a file, falling back to copy+remove across file systems.
fn move_file(from: &std::path::Path, to: &std::path::Path) -> io::Result<()> {
    if let Some(parent) = to.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    match std::fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(_) => {
            std::fs::copy(from, to)?;
            std::fs::remove_file(from)
        }
    }
}
