//! CLI binary for notespark.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `EnhanceConfig`, drives one session run, and prints the result.

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use notespark::{
    EnhanceConfig, Glossary, GlossarySegment, NoteSession, PipelineObserver, ProcessingStatus,
    PromptProfile,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
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
fn term_mark(s: &str) -> String {
    // Black on yellow, the terminal cousin of the tooltip highlight.
    format!("\x1b[30;43m{s}\x1b[0m")
}

// ── CLI progress observer using indicatif ────────────────────────────────────

/// Terminal stage display: one spinner that renames itself as the pipeline
/// advances, then clears before the summary is printed.
struct CliObserver {
    bar: ProgressBar,
}

impl CliObserver {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl PipelineObserver for CliObserver {
    fn on_run_start(&self) {
        self.bar.set_prefix("Starting");
        self.bar.set_message("checking input…");
    }

    fn on_stage(&self, status: ProcessingStatus) {
        let (prefix, msg) = match status {
            ProcessingStatus::Uploading => ("Uploading", "encoding the image…"),
            ProcessingStatus::Extracting => ("Extracting", "reading text from the image…"),
            ProcessingStatus::Summarizing => ("Summarizing", "asking the model for an enhanced summary…"),
            _ => return,
        };
        self.bar.set_prefix(prefix);
        self.bar
            .set_message(format!("{msg}  {}%", status.progress_percent()));
    }

    fn on_run_complete(&self, summary_len: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} Summary ready  {}",
            green("✔"),
            dim(&format!("{summary_len} chars"))
        );
    }

    fn on_run_error(&self, message: &str) {
        self.bar.finish_and_clear();
        eprintln!("{} {}", red("✘"), red(message));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Enhance a photo of whiteboard notes
  notespark board.jpg

  # Enhance typed text directly (no OCR call)
  notespark --text "Newton's first law: objects at rest stay at rest..."

  # Shorter, more deterministic output
  notespark --profile summary board.jpg

  # Ask follow-up questions after the summary
  notespark board.jpg --ask "What does eligibility mean here?" --ask "Give an example"

  # Highlight glossary terms in the output
  notespark board.jpg --glossary

  # Machine-readable output
  notespark board.jpg --json > result.json

ACCEPTED UPLOADS:
  JPEG, PNG, or WebP images up to 5 MiB.

ENVIRONMENT VARIABLES:
  RAPIDAPI_KEY   OCR service key (required for image input)
  GROQ_API_KEY   Chat completion bearer token (always required)

SETUP:
  1. Set keys:   export RAPIDAPI_KEY=...  GROQ_API_KEY=...
  2. Enhance:    notespark board.jpg
"#;

/// Enhance photos of handwritten notes into study-friendly summaries.
#[derive(Parser, Debug)]
#[command(
    name = "notespark",
    version,
    about = "Enhance photos of handwritten notes into study-friendly summaries",
    long_about = "Extract text from a photo of handwritten or whiteboard notes via OCR, \
enhance it into a structured study summary with an LLM, and optionally ask \
follow-up questions about the result.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Image file to enhance (JPEG/PNG/WebP, ≤ 5 MiB).
    input: Option<PathBuf>,

    /// Enhance this text directly instead of an image (skips OCR).
    #[arg(long, conflicts_with = "input")]
    text: Option<String>,

    /// Sampling profile: summary (short, focused) or enhance (longer).
    #[arg(long, env = "NOTESPARK_PROFILE", value_enum, default_value = "enhance")]
    profile: ProfileArg,

    /// Chat model id.
    #[arg(long, env = "NOTESPARK_MODEL")]
    model: Option<String>,

    /// Sampling temperature override (0.0–2.0).
    #[arg(long, env = "NOTESPARK_TEMPERATURE")]
    temperature: Option<f32>,

    /// Max output tokens override.
    #[arg(long, env = "NOTESPARK_MAX_TOKENS")]
    max_tokens: Option<usize>,

    /// Path to a text file containing a custom enhancement system prompt.
    #[arg(long, env = "NOTESPARK_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// OCR endpoint URL.
    #[arg(long, env = "NOTESPARK_OCR_ENDPOINT")]
    ocr_endpoint: Option<String>,

    /// Chat-completions endpoint URL.
    #[arg(long, env = "NOTESPARK_CHAT_ENDPOINT")]
    chat_endpoint: Option<String>,

    /// OCR call timeout in seconds.
    #[arg(long, env = "NOTESPARK_OCR_TIMEOUT", default_value_t = 30)]
    ocr_timeout: u64,

    /// Chat call timeout in seconds (enhancement and Q&A).
    #[arg(long, env = "NOTESPARK_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Ask a follow-up question after the summary (repeatable).
    #[arg(long = "ask", value_name = "QUESTION")]
    questions: Vec<String>,

    /// Print the extracted text before the summary.
    #[arg(long)]
    show_text: bool,

    /// Highlight glossary terms in the summary and append their definitions.
    #[arg(long)]
    glossary: bool,

    /// Output the result as JSON instead of formatted text.
    #[arg(long, env = "NOTESPARK_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "NOTESPARK_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "NOTESPARK_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the result.
    #[arg(short, long, env = "NOTESPARK_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum ProfileArg {
    Summary,
    Enhance,
}

impl From<ProfileArg> for PromptProfile {
    fn from(v: ProfileArg) -> Self {
        match v {
            ProfileArg::Summary => PromptProfile::Summary,
            ProfileArg::Enhance => PromptProfile::Enhance,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner is the user-facing feedback; keep library logs quiet
    // unless explicitly asked for.
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

    // ── Build config ─────────────────────────────────────────────────────
    let mut builder = EnhanceConfig::builder()
        .profile(cli.profile.clone().into())
        .ocr_timeout_secs(cli.ocr_timeout)
        .chat_timeout_secs(cli.api_timeout);
    if let Some(model) = &cli.model {
        builder = builder.model(model);
    }
    if let Some(t) = cli.temperature {
        builder = builder.temperature(t);
    }
    if let Some(n) = cli.max_tokens {
        builder = builder.max_tokens(n);
    }
    if let Some(path) = &cli.system_prompt {
        let prompt = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read system prompt file {}", path.display()))?;
        builder = builder.system_prompt(prompt);
    }
    if let Some(url) = &cli.ocr_endpoint {
        builder = builder.ocr_endpoint(url);
    }
    if let Some(url) = &cli.chat_endpoint {
        builder = builder.chat_endpoint(url);
    }
    if show_progress {
        builder = builder.observer(CliObserver::new());
    }
    let config = builder.build().context("Invalid configuration")?;

    let mut session = NoteSession::new(config).context("Session setup failed")?;

    // ── Run the pipeline ─────────────────────────────────────────────────
    let item = match (&cli.input, &cli.text) {
        (Some(path), None) => session.process_image(path).await?,
        (None, Some(text)) => session.process_text(text).await?,
        (None, None) => bail!("Provide an image file or --text. See --help."),
        (Some(_), Some(_)) => unreachable!("clap conflicts_with prevents this"),
    };

    // ── Follow-up questions ──────────────────────────────────────────────
    let mut answers: Vec<(String, String)> = Vec::new();
    for question in &cli.questions {
        match session.ask(question).await {
            Ok(answer) => answers.push((question.clone(), answer)),
            Err(e) => {
                // The transcript already carries the fallback turn; surface
                // the cause on stderr and keep going with later questions.
                eprintln!("{} {}", red("✘"), e);
                answers.push((question.clone(), notespark::prompts::QA_FALLBACK.to_string()));
            }
        }
    }

    // ── Output ───────────────────────────────────────────────────────────
    if cli.json {
        let payload = serde_json::json!({
            "status": session.status(),
            "item": item,
            "chat": session.chat(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).context("Failed to serialize result")?
        );
        return Ok(());
    }

    if cli.show_text && !session.extracted_text().is_empty() {
        println!("{}", bold("Extracted text"));
        println!("{}\n", dim(session.extracted_text()));
    }

    println!("{}", bold("Summary"));
    if cli.glossary {
        print_with_glossary(item.summary.as_str());
    } else {
        println!("{}", item.summary);
    }

    for (question, answer) in &answers {
        println!("\n{} {}", bold("Q:"), question);
        println!("{} {}", bold("A:"), answer);
    }

    Ok(())
}

/// Print the summary with glossary terms highlighted, then the definitions
/// of every term that actually appeared.
fn print_with_glossary(summary: &str) {
    let segments = Glossary::builtin().annotate(summary);
    let mut seen: Vec<(String, String)> = Vec::new();
    for segment in &segments {
        match segment {
            GlossarySegment::Plain(text) => print!("{text}"),
            GlossarySegment::Term {
                text,
                term,
                definition,
            } => {
                print!("{}", term_mark(text));
                if !seen.iter().any(|(t, _)| t == term) {
                    seen.push((term.clone(), definition.clone()));
                }
            }
        }
    }
    println!();

    if !seen.is_empty() {
        println!("\n{}", bold("Glossary"));
        for (term, definition) in seen {
            println!("  {}  {}", term_mark(&term), dim(&definition));
        }
    }
}
