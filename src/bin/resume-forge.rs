//! CLI binary for resume-forge.
//!
//! A thin shim over the library crate that maps CLI flags to `ForgeConfig`,
//! keeps the editable form in a JSON file between invocations, and prints
//! diagnostics to stderr so stdout stays clean for JSON and documents.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use resume_forge::{
    deliver, generate_to_file, parse_path, regenerate, DocumentRenderer, EditableForm,
    ExtractionError, ForgeConfig, PdfRenderer, ReDerivationError, ReDeriveMode, ResumeRecord,
    SessionObserver, Stage, StructureError, TextRenderer,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
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

// ── Terminal observer using indicatif ────────────────────────────────────────

/// Prints pipeline events to stderr above a spinner.
struct TerminalObserver {
    bar: Option<ProgressBar>,
    quiet: bool,
}

impl TerminalObserver {
    fn new(quiet: bool, spinner: bool) -> Self {
        let bar = (spinner && !quiet).then(|| {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner())
                    .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
            );
            bar.enable_steady_tick(Duration::from_millis(80));
            bar
        });
        Self { bar, quiet }
    }

    fn say(&self, line: String) {
        // `println` is a no-op on a hidden bar (stderr not a TTY); `suspend` is not.
        match self.bar {
            Some(ref bar) => bar.suspend(|| eprintln!("{line}")),
            None => eprintln!("{line}"),
        }
    }

    fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}

impl SessionObserver for TerminalObserver {
    fn on_stage_start(&self, stage: Stage) {
        if let Some(ref bar) = self.bar {
            bar.set_message(format!("{stage}…"));
        }
    }

    fn on_extraction_error(&self, error: &ExtractionError) {
        self.say(format!("{} {}", red("✗"), red(&error.to_string())));
        if !self.quiet {
            self.say(dim("  continuing with empty résumé text"));
        }
    }

    fn on_model_reply(&self, raw_reply: &str) {
        if self.quiet {
            return;
        }
        self.say(format!("{} {}", bold("◆"), bold("Model reply:")));
        for line in raw_reply.lines() {
            self.say(dim(&format!("  {line}")));
        }
    }

    fn on_structuring_error(&self, error: &StructureError, raw_reply: Option<&str>) {
        self.say(format!("{} {}", red("✗"), red(&error.to_string())));
        // Quiet mode skipped the reply in on_model_reply; show it now.
        if let (true, Some(raw)) = (self.quiet, raw_reply) {
            self.say(raw.to_string());
        }
        if !self.quiet {
            self.say(dim("  continuing with an empty record"));
        }
    }

    fn on_rederive_error(&self, error: &ReDerivationError) {
        self.say(format!("  {} {}", yellow("⚠"), error));
    }

    fn on_delivered(&self, file_name: &str, bytes: u64) {
        if !self.quiet {
            self.say(format!(
                "{} {}  {}",
                green("✔"),
                bold(file_name),
                dim(&format!("{bytes} bytes"))
            ));
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Parse a résumé into an editable form
  resume-forge parse resume.pdf --form resume.json

  # Edit resume.json, check what it reads back as, then generate
  resume-forge show resume.json
  resume-forge generate resume.json -o resume.pdf

  # One shot, no edit step
  resume-forge run resume.pdf -o out.pdf

  # Plain-text document to stdout
  resume-forge generate resume.json --format text -o -

  # Local model via Ollama
  resume-forge --provider ollama --model llama3.2 parse resume.pdf

FORM FILE:
  The form is JSON. Skills, experience, publication and certifications are
  free text that must keep the shape `parse` wrote:

    experience      - {Role} at {Company} ({Start} - {End}), {Location}
                        • {bullet}
                      (blank line between entries)
    publication     - {Title} ({Journal}, {Volume}, {Issue})
    certifications  - {Name} ({Issuer}, {Date})   one per line

  `generate` refuses a form with malformed entries and lists them. An entry
  is malformed when a delimiter is missing, or when a field contains one so
  the line reads more than one way (`Acme (UK)` as a company). Pass
  --lenient to keep what can be read and leave the rest empty.

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  OLLAMA_HOST             Ollama endpoint
  EDGEQUAKE_LLM_PROVIDER  Provider used with EDGEQUAKE_MODEL when --provider is unset
  EDGEQUAKE_MODEL         Model ID
  PDFIUM_LIB_PATH         Path to libpdfium (else next to the binary, else system)
"#;

/// Parse résumés with an LLM, edit them as text, and regenerate documents.
#[derive(Parser, Debug)]
#[command(
    name = "resume-forge",
    version,
    about = "Parse résumés with an LLM, edit them as text, regenerate documents",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    global: GlobalArgs,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// LLM model ID (e.g. llama3.2, gpt-4.1-nano).
    #[arg(long, global = true, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: ollama, openai, anthropic, gemini, …
    #[arg(
        long,
        global = true,
        env = "EDGEQUAKE_PROVIDER",
        long_help = "LLM provider. Auto-detected from the environment if not set.\n\
          Naming a provider without --model uses its default (ollama: llama3.2)."
    )]
    provider: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, global = true, env = "RESUME_FORGE_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Max LLM output tokens.
    #[arg(long, global = true, env = "RESUME_FORGE_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// LLM call timeout in seconds.
    #[arg(long, global = true, env = "RESUME_FORGE_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// PDF user password for encrypted résumés.
    #[arg(long, global = true, env = "RESUME_FORGE_PASSWORD")]
    password: Option<String>,

    /// Text file with a custom prompt; must contain {resume_text}.
    #[arg(long, global = true, env = "RESUME_FORGE_PROMPT")]
    prompt_file: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "RESUME_FORGE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "RESUME_FORGE_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract and structure a résumé, write the editable form as JSON.
    Parse {
        /// Résumé file (PDF or text).
        input: PathBuf,

        /// Write the form here instead of stdout.
        #[arg(long)]
        form: Option<PathBuf>,
    },

    /// Read an edited form back and render the document.
    Generate {
        /// Form JSON written by `parse`.
        form: PathBuf,

        #[command(flatten)]
        output: OutputArgs,

        /// Keep partial entries instead of refusing malformed ones.
        #[arg(long)]
        lenient: bool,
    },

    /// Parse and render the model's record as is, without an edit step.
    Run {
        /// Résumé file (PDF or text).
        input: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Print the record an edited form reads back as.
    Show {
        /// Form JSON written by `parse`.
        form: PathBuf,

        /// Keep partial entries instead of refusing malformed ones.
        #[arg(long)]
        lenient: bool,
    },
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Output path, or `-` for stdout. Default: resume.pdf / resume.txt.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Document format.
    #[arg(long, value_enum, default_value = "pdf")]
    format: FormatArg,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Pdf,
    Text,
}

fn mode(lenient: bool) -> ReDeriveMode {
    if lenient {
        ReDeriveMode::Lenient
    } else {
        ReDeriveMode::Strict
    }
}

impl OutputArgs {
    fn renderer(&self) -> Box<dyn DocumentRenderer> {
        match self.format {
            FormatArg::Pdf => Box::new(PdfRenderer::default()),
            FormatArg::Text => Box::new(TextRenderer),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let g = &cli.global;

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner and observer already report every stage, so INFO logs are
    // only shown with --verbose (as DEBUG) or via RUST_LOG.
    let filter = if g.verbose {
        "debug"
    } else if g.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Parse {
            ref input,
            ref form,
        } => cmd_parse(g, input, form.as_deref()).await,
        Command::Generate {
            ref form,
            ref output,
            lenient,
        } => cmd_generate(g, form, output, mode(lenient)),
        Command::Run {
            ref input,
            ref output,
        } => cmd_run(g, input, output).await,
        Command::Show { ref form, lenient } => cmd_show(g, form, lenient),
    }
}

async fn cmd_parse(g: &GlobalArgs, input: &Path, form_path: Option<&Path>) -> Result<()> {
    let config = build_config(g).await?;
    let observer = TerminalObserver::new(g.quiet, !g.verbose);
    let parsed = parse_path(input, &config, &observer).await;
    observer.finish();
    let parsed = parsed.with_context(|| format!("Failed to parse {}", input.display()))?;

    let json =
        serde_json::to_string_pretty(&parsed.form).context("Failed to serialise the form")?;
    match form_path {
        Some(path) => {
            std::fs::write(path, format!("{json}\n"))
                .with_context(|| format!("Failed to write form to {}", path.display()))?;
            if !g.quiet {
                eprintln!("{} form written to {}", green("✔"), bold(&path.display().to_string()));
            }
        }
        None => println!("{json}"),
    }

    if !g.quiet {
        let s = &parsed.structure;
        eprintln!(
            "   {} pages  /  {} chars  /  {} tokens in  /  {} tokens out  /  {}ms total",
            parsed.extraction.page_count,
            parsed.extraction.text.len(),
            dim(&s.prompt_tokens.to_string()),
            dim(&s.completion_tokens.to_string()),
            parsed.total_duration_ms,
        );
    }
    Ok(())
}

fn cmd_generate(
    g: &GlobalArgs,
    form_path: &Path,
    out: &OutputArgs,
    mode: ReDeriveMode,
) -> Result<()> {
    let form = read_form(form_path)?;
    let observer = TerminalObserver::new(g.quiet, false);
    let record = regenerate(&form, mode, &observer).context("Regeneration failed")?;
    write_document(&record, out, &observer)
}

async fn cmd_run(g: &GlobalArgs, input: &Path, out: &OutputArgs) -> Result<()> {
    let config = build_config(g).await?;
    let observer = TerminalObserver::new(g.quiet, !g.verbose);
    let parsed = parse_path(input, &config, &observer).await;
    observer.finish();
    let parsed = parsed.with_context(|| format!("Failed to parse {}", input.display()))?;
    // Nothing was edited, so the form would only round-trip the record.
    write_document(parsed.record(), out, &observer)
}

fn cmd_show(g: &GlobalArgs, form_path: &Path, lenient: bool) -> Result<()> {
    let form = read_form(form_path)?;
    let observer = TerminalObserver::new(g.quiet, false);
    let record =
        regenerate(&form, mode(lenient), &observer).context("The form could not be read back")?;
    println!(
        "{}",
        serde_json::to_string_pretty(&record).context("Failed to serialise the record")?
    );
    Ok(())
}

/// Render `record` to the requested output.
fn write_document(
    record: &ResumeRecord,
    out: &OutputArgs,
    observer: &TerminalObserver,
) -> Result<()> {
    let renderer = out.renderer();

    match out.output.as_deref() {
        Some(p) if p == Path::new("-") => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            deliver(record, renderer.as_ref(), &mut handle, observer)
                .context("Failed to write the document to stdout")?;
            handle.flush().ok();
        }
        Some(path) => {
            generate_to_file(record, renderer.as_ref(), path, observer)
                .context("Failed to write the document")?;
        }
        None => {
            let path = PathBuf::from(renderer.file_name());
            generate_to_file(record, renderer.as_ref(), &path, observer)
                .context("Failed to write the document")?;
        }
    }
    Ok(())
}

fn read_form(path: &Path) -> Result<EditableForm> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read form {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not a form file", path.display()))
}

/// Map CLI args to `ForgeConfig`.
async fn build_config(g: &GlobalArgs) -> Result<ForgeConfig> {
    let mut builder = ForgeConfig::builder()
        .temperature(g.temperature)
        .max_tokens(g.max_tokens)
        .api_timeout_secs(g.api_timeout);

    if let Some(ref model) = g.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = g.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref password) = g.password {
        builder = builder.password(password);
    }
    if let Some(ref path) = g.prompt_file {
        let template = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read prompt from {:?}", path))?;
        builder = builder.prompt_template(template);
    }

    builder.build().context("Invalid configuration")
}
