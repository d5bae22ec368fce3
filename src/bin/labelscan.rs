//! CLI binary for labelscan.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig` and prints the extracted record as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use labelscan::{analyze, ExtractionConfig};
use std::io::{self, Read};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Read a label photo (JSON record on stdout)
  labelscan label.jpg

  # Read image bytes from stdin
  cat label.jpg | labelscan -

  # One-line output for piping into jq
  labelscan --compact label.jpg | jq -r .janCode

  # Use a different model and a tuned instruction prompt
  labelscan --model gemini-2.5-flash --instruction prompt.txt label.jpg

  # Retry transient API failures up to 3 times
  labelscan --retries 3 label.jpg

OUTPUT SHAPE:
  {
    "productName": "カットキャベツ",   // or null
    "origin":      "茨城県産",         // or null
    "mngId":       "123",              // or null
    "janCode":     "4901234567890"     // or null
  }

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY        Google Gemini API key (required)
  LABELSCAN_MODEL       Override model ID
  LABELSCAN_API_BASE    Override API base URL

SETUP:
  1. Set API key:  export GEMINI_API_KEY=...
  2. Extract:      labelscan label.jpg
"#;

/// Read a product-label photo into a structured record using a vision model.
#[derive(Parser, Debug)]
#[command(
    name = "labelscan",
    version,
    about = "Read Japanese product labels into structured records using a vision model",
    long_about = "Send a product-label photograph to a hosted multimodal model (Google Gemini) \
and print the extracted record — product name, origin, management id, JAN code — as JSON. \
Fields the model cannot read are explicit nulls.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Image file path (JPEG/PNG), or `-` to read bytes from stdin.
    input: String,

    /// Vision model ID (e.g. gemini-2.0-flash, gemini-2.5-flash).
    #[arg(long, env = "LABELSCAN_MODEL")]
    model: Option<String>,

    /// Model API base URL.
    #[arg(long, env = "LABELSCAN_API_BASE")]
    api_base: Option<String>,

    /// Path to a text file containing a custom instruction prompt.
    #[arg(long, env = "LABELSCAN_INSTRUCTION")]
    instruction: Option<PathBuf>,

    /// Per-call timeout in seconds.
    #[arg(long, env = "LABELSCAN_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// Retries on transient API failure (timeout, 429, 5xx).
    #[arg(long, env = "LABELSCAN_RETRIES", default_value_t = 0)]
    retries: u32,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, env = "LABELSCAN_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Print the record on one line instead of pretty-printed.
    #[arg(long)]
    compact: bool,

    /// Print timing stats to stderr after the record.
    #[arg(long)]
    stats: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "LABELSCAN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except the record and errors.
    #[arg(short, long, env = "LABELSCAN_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
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

    // ── Read the image ───────────────────────────────────────────────────
    let bytes = if cli.input == "-" {
        let mut buf = Vec::new();
        io::stdin()
            .read_to_end(&mut buf)
            .context("Failed to read image bytes from stdin")?;
        buf
    } else {
        std::fs::read(&cli.input)
            .with_context(|| format!("Failed to read image file '{}'", cli.input))?
    };

    // ── Build config ─────────────────────────────────────────────────────
    let config = build_config(&cli).await?;

    // ── Run extraction ───────────────────────────────────────────────────
    let output = analyze(&bytes, &config)
        .await
        .context("Label extraction failed")?;

    let json = if cli.compact {
        serde_json::to_string(&output.record)
    } else {
        serde_json::to_string_pretty(&output.record)
    }
    .context("Failed to serialise record")?;
    println!("{json}");

    if cli.stats && !cli.quiet {
        eprintln!(
            "{}ms total  ({}ms in model, {} retries)",
            output.stats.duration_ms, output.stats.model_duration_ms, output.stats.retries
        );
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
async fn build_config(cli: &Cli) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .api_timeout_secs(cli.timeout)
        .max_retries(cli.retries)
        .temperature(cli.temperature);

    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref base) = cli.api_base {
        builder = builder.api_base(base);
    }
    if let Some(ref path) = cli.instruction {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read instruction prompt from {path:?}"))?;
        builder = builder.instruction(prompt);
    }

    builder.build().context("Invalid configuration")
}
