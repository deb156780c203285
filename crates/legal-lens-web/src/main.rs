//! legal-lens web server
//!
//! Accepts a PDF legal document and returns a plain-language summary plus the
//! document's liability, termination and confidentiality clauses, produced by
//! a Gemini model.
//!
//! - `POST /simplify_document`: multipart upload (`uploaded_file` field)
//! - `GET /health`

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use legal_lens_core::Config;
use legal_lens_pdf_mupdf::MupdfBackend;

mod app;
mod error;
mod handlers;
mod models;
mod state;
#[cfg(test)]
mod tests;
mod upload;

use state::AppState;

/// Command-line arguments; each overrides config files and environment.
#[derive(Parser, Debug)]
#[command(name = "legal-lens-web", version, about = "Legal document simplification API")]
struct Args {
    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Host address to bind to
    #[arg(long)]
    host: Option<String>,

    /// Timeout for each model call, in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Retries after a failed model call
    #[arg(long)]
    max_retries: Option<u32>,

    /// Directory for temporary uploads (default: system temp dir)
    #[arg(long)]
    upload_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn apply(self, config: &mut Config) {
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(t) = self.timeout_secs {
            config.timeout_secs = t;
        }
        if let Some(r) = self.max_retries {
            config.max_retries = r;
        }
        if let Some(dir) = self.upload_dir {
            config.upload_dir = Some(dir);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::load();
    args.apply(&mut config);
    tracing::debug!(?config, "resolved configuration");

    let state = Arc::new(AppState {
        analyzer: config.build_analyzer(),
        pdf_backend: Arc::new(MupdfBackend::new()),
        upload_dir: config.upload_dir.clone(),
    });

    let app = app::router(state, &config.allowed_origins, config.max_upload_bytes());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Listening on http://{}", addr);
    info!("Allowed origins: {}", config.allowed_origins.join(", "));
    info!(
        "Model: {} (timeout {}s, {} retries)",
        config.model, config.timeout_secs, config.max_retries
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
