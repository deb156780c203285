use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use legal_lens_core::{Config, PdfBackend, extract_text_blocking, is_unreadable};
use legal_lens_pdf_mupdf::MupdfBackend;

mod output;

use output::ColorMode;

/// Legal Lens - plain-language summaries and key clauses from legal PDFs
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging (to stderr)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize a PDF and extract its liability, termination and confidentiality clauses
    Analyze {
        /// Path to the PDF to analyze
        file_path: PathBuf,

        /// Print the result as JSON instead of formatted text
        #[arg(long)]
        json: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,

        /// Model name (overrides config and LEGAL_LENS_MODEL)
        #[arg(long)]
        model: Option<String>,

        /// Timeout for each model call, in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Print the text extracted from a PDF without contacting the model
    Extract {
        /// Path to the PDF
        file_path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Analyze {
            file_path,
            json,
            no_color,
            model,
            timeout_secs,
        } => analyze(file_path, json, no_color, model, timeout_secs).await,
        Command::Extract { file_path } => extract(&file_path).await,
    }
}

async fn read_text(file_path: &Path) -> anyhow::Result<String> {
    if !file_path.exists() {
        anyhow::bail!("File not found: {}", file_path.display());
    }
    let backend: Arc<dyn PdfBackend> = Arc::new(MupdfBackend::new());
    let text = extract_text_blocking(backend, file_path).await;
    if is_unreadable(&text) {
        anyhow::bail!(
            "{} is unreadable: no text could be extracted (scanned, encrypted, or corrupt?)",
            file_path.display()
        );
    }
    Ok(text)
}

async fn analyze(
    file_path: PathBuf,
    json: bool,
    no_color: bool,
    model: Option<String>,
    timeout_secs: Option<u64>,
) -> anyhow::Result<()> {
    let mut config = Config::load();
    if let Some(model) = model {
        config.model = model;
    }
    if let Some(t) = timeout_secs {
        config.timeout_secs = t;
    }
    tracing::debug!(?config, "resolved configuration");

    let text = read_text(&file_path).await?;
    tracing::info!(chars = text.len(), "extracted text");

    let analyzer = config.build_analyzer();
    if !analyzer.model().is_configured() {
        eprintln!(
            "Warning: {} is not set; the summary and clauses will be placeholders",
            legal_lens_core::API_KEY_ENV
        );
    }
    let result = analyzer.analyze(&text).await?;

    let mut stdout = std::io::stdout().lock();
    if json {
        output::print_json(&mut stdout, &result)?;
    } else {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_path.display().to_string());
        output::print_analysis(&mut stdout, &file_name, &result, ColorMode(!no_color))?;
    }
    stdout.flush()?;
    Ok(())
}

async fn extract(file_path: &Path) -> anyhow::Result<()> {
    let text = read_text(file_path).await?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", text)?;
    stdout.flush()?;
    Ok(())
}
