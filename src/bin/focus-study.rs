//! CLI binary for focus-study.
//!
//! A thin shim over the library crate: `serve` runs the web front-end,
//! `ask` answers one question in the terminal.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use focus_study::pipeline::input::load_upload;
use focus_study::{Mode, PdfiumTextSource, StudyConfig, StudyRequest, Tutor};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
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

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run the web front-end on http://127.0.0.1:5000
  focus-study serve

  # Ask from the terminal, no notes
  focus-study ask -Q "What is osmosis?"

  # Exam-style answer grounded in typed PDF notes
  focus-study ask --mode exam --pdf biology.pdf -Q "Explain osmosis"

  # Handwritten notes from a photo
  focus-study ask --image page3.jpg -Q "Balance this equation"

  # JSON output (StudyAnswer)
  focus-study ask --json -Q "Define entropy"

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY            Google Gemini API key (required for the default provider)
  OPENAI_API_KEY            OpenAI API key (with --provider openai)
  ANTHROPIC_API_KEY         Anthropic API key (with --provider anthropic)
  FOCUS_STUDY_PROVIDER      Override provider
  FOCUS_STUDY_TEXT_MODEL    Override answer model
  FOCUS_STUDY_VISION_MODEL  Override transcription model
  FOCUS_STUDY_PDFIUM_LIB    Directory holding libpdfium
  RUST_LOG                  tracing filter, e.g. focus_study=debug
"#;

/// Exam-focused study tutor backed by a hosted LLM.
#[derive(Parser, Debug)]
#[command(
    name = "focus-study",
    version,
    about = "Answer study questions from your own PDF and photo notes",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    model: ModelArgs,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "FOCUS_STUDY_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "FOCUS_STUDY_QUIET")]
    quiet: bool,
}

#[derive(Args, Debug)]
struct ModelArgs {
    /// LLM provider: gemini, openai, anthropic, ollama (no key needed).
    #[arg(long, global = true, env = "FOCUS_STUDY_PROVIDER", default_value = "gemini")]
    provider: String,

    /// Model that writes the answer.
    #[arg(long, global = true, env = "FOCUS_STUDY_TEXT_MODEL", default_value = "gemini-2.5-flash")]
    text_model: String,

    /// Multimodal model that transcribes images.
    #[arg(long, global = true, env = "FOCUS_STUDY_VISION_MODEL", default_value = "gemini-2.5-flash")]
    vision_model: String,

    /// Total attempts per model call.
    #[arg(long, global = true, env = "FOCUS_STUDY_MAX_ATTEMPTS", default_value_t = 3)]
    max_attempts: u32,

    /// Backoff unit in milliseconds (waits are 2, 4, 6 … units).
    #[arg(long, global = true, env = "FOCUS_STUDY_BACKOFF_MS", default_value_t = 1000)]
    backoff_ms: u64,

    /// Path to a text file replacing the default prompt preamble.
    #[arg(long, global = true, env = "FOCUS_STUDY_PREAMBLE")]
    preamble: Option<PathBuf>,

    /// Directory holding the pdfium shared library.
    #[arg(long, global = true, env = "FOCUS_STUDY_PDFIUM_LIB")]
    pdfium_lib: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the web front-end.
    #[cfg(feature = "server")]
    Serve {
        /// Address to listen on.
        #[arg(long, env = "FOCUS_STUDY_ADDR", default_value = "127.0.0.1:5000")]
        addr: std::net::SocketAddr,

        /// Request body ceiling in MiB.
        #[arg(long, env = "FOCUS_STUDY_MAX_UPLOAD_MB", default_value_t = 10)]
        max_upload_mb: usize,
    },

    /// Answer one question in the terminal.
    Ask(AskArgs),
}

#[derive(Args, Debug)]
struct AskArgs {
    /// The question.
    #[arg(short = 'Q', long)]
    question: String,

    /// Answer style.
    #[arg(short, long, value_enum, default_value = "explain")]
    mode: ModeArg,

    /// Typed PDF notes (selectable text; scanned PDFs are rejected).
    #[arg(long)]
    pdf: Option<PathBuf>,

    /// Photo of notes (handwriting is transcribed).
    #[arg(long)]
    image: Option<PathBuf>,

    /// Print the display markup instead of plain text.
    #[arg(long, conflicts_with = "json")]
    html: bool,

    /// Print the full answer as JSON.
    #[arg(long)]
    json: bool,

    /// Disable the spinner.
    #[arg(long, env = "FOCUS_STUDY_NO_PROGRESS")]
    no_progress: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum ModeArg {
    Explain,
    Exam,
    Revision,
}

impl From<ModeArg> for Mode {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::Explain => Mode::Explain,
            ModeArg::Exam => Mode::Exam,
            ModeArg::Revision => Mode::Revision,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || matches!(cli.command, Command::Ask(_)) {
        // The spinner and the answer are the feedback that matters in `ask`.
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
        #[cfg(feature = "server")]
        Command::Serve {
            addr,
            max_upload_mb,
        } => {
            let config = build_config(&cli.model, Some(max_upload_mb)).await?;
            PdfiumTextSource::new(config.pdfium_lib_path.clone())
                .probe()
                .context("PDF notes need pdfium")?;
            let tutor = Tutor::new(config).context("Failed to initialise tutor")?;
            focus_study::server::serve(std::sync::Arc::new(tutor), addr)
                .await
                .context("Server failed")?;
        }
        Command::Ask(args) => {
            let config = build_config(&cli.model, None).await?;
            ask(config, args, cli.quiet).await?;
        }
    }

    Ok(())
}

async fn ask(config: StudyConfig, args: AskArgs, quiet: bool) -> Result<()> {
    if args.pdf.is_some() {
        PdfiumTextSource::new(config.pdfium_lib_path.clone())
            .probe()
            .context("--pdf needs pdfium")?;
    }

    let mut request = StudyRequest::new(args.mode.clone().into(), args.question.clone());
    if let Some(ref path) = args.pdf {
        request = request.with_pdf(load_upload(path).await.context("Failed to read --pdf")?);
    }
    if let Some(ref path) = args.image {
        request = request.with_image(load_upload(path).await.context("Failed to read --image")?);
    }

    let tutor = Tutor::new(config).context("Failed to initialise tutor")?;

    let spinner = (!quiet && !args.no_progress && !args.json).then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_message("Thinking…");
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    });

    let result = tutor.answer(request).await;
    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }

    let answer = match result {
        Ok(answer) => answer,
        Err(e) => {
            eprintln!("{} {}", red("✘"), e);
            std::process::exit(1);
        }
    };

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if args.json {
        let json = serde_json::to_string_pretty(&answer).context("Failed to serialise answer")?;
        writeln!(handle, "{json}").context("Failed to write to stdout")?;
    } else {
        let body = if args.html { &answer.markup } else { &answer.text };
        handle
            .write_all(body.as_bytes())
            .context("Failed to write to stdout")?;
        if !body.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    }

    if !quiet && !args.json {
        eprintln!(
            "{} {} mode  {}",
            green("✔"),
            answer.mode,
            dim(&format!(
                "{}ms, attempt {}, {} chars of notes",
                answer.duration_ms, answer.attempts, answer.notes_chars
            )),
        );
    }

    Ok(())
}

/// Map CLI args to `StudyConfig`.
async fn build_config(
    args: &ModelArgs,
    max_upload_mb: Option<usize>,
) -> Result<StudyConfig> {
    let mut builder = StudyConfig::builder()
        .provider_name(&args.provider)
        .text_model(&args.text_model)
        .vision_model(&args.vision_model)
        .max_attempts(args.max_attempts)
        .backoff_unit_ms(args.backoff_ms);

    if let Some(ref path) = args.preamble {
        let preamble = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read preamble from {:?}", path))?;
        builder = builder.preamble(preamble);
    }
    if let Some(ref dir) = args.pdfium_lib {
        builder = builder.pdfium_lib_path(dir);
    }
    if let Some(mb) = max_upload_mb {
        builder = builder.max_upload_bytes(mb.saturating_mul(1024 * 1024));
    }

    // Fails when the provider's credential is missing from the environment.
    builder.build().context("Cannot start with this configuration")
}
