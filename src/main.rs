//! PDF Offline command-line front-end
//!
//! Opens documents through the offline cache, fetching them on a miss,
//! and manages what is stored.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pdf_offline::engine::HeadlessEngine;
use pdf_offline::interaction::{ConsoleInteraction, FixedAnswer, UserInteraction};
use pdf_offline::resolver::{display_name, filename_from_url, DocumentSource};
use pdf_offline::{AppState, Config};

#[derive(Parser)]
#[command(name = "pdf-offline", version, about = "Offline PDF document cache")]
struct Cli {
    /// Discard unsaved edits instead of asking
    ///
    /// The bundled headless engine never reports edits, so with it no
    /// session is ever dirty and the save prompt does not appear. The flag
    /// matters for engines that do report changes.
    #[arg(long, global = true)]
    no_save: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List stored documents
    List,
    /// Open a document from the store, or from --url on a miss
    Open {
        filename: String,
        #[arg(long)]
        url: Option<String>,
        /// Write the opened document's bytes here
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Open a remote document, named after the last URL segment
    Fetch {
        url: String,
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Open a local PDF and add it to the store
    Import { path: PathBuf },
    /// Delete one stored document
    Remove { filename: String },
    /// Delete every stored document
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdf_offline=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    let config = Config::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
        Config::default()
    });

    let cli = Cli::parse();

    tracing::debug!(store = ?config.store.backend, "Starting PDF Offline v{}", env!("CARGO_PKG_VERSION"));

    let interaction: Arc<dyn UserInteraction> = if cli.no_save {
        Arc::new(FixedAnswer { save: false })
    } else {
        Arc::new(ConsoleInteraction)
    };

    let state = AppState::new(config, Arc::new(HeadlessEngine::new()), interaction)
        .context("Failed to initialize application state")?;

    let outcome = run(&state, cli.command).await;
    state.shutdown().await;
    outcome
}

async fn run(state: &AppState, command: Command) -> anyhow::Result<ExitCode> {
    let resolver = state.resolver();

    match command {
        Command::List => {
            for name in resolver.list_documents().await {
                println!("{}", display_name(&name));
            }
        }
        Command::Open { filename, url, export } => {
            let Ok(source) = resolver.open(&filename, url.as_deref()).await else {
                return Ok(ExitCode::FAILURE);
            };
            report_opened(&filename, source);
            export_current(state, export.as_deref()).await?;
        }
        Command::Fetch { url, export } => {
            let filename = filename_from_url(&url).with_context(|| format!("No file name in {}", url))?;
            let Ok(source) = resolver.open(&filename, Some(&url)).await else {
                return Ok(ExitCode::FAILURE);
            };
            report_opened(&filename, source);
            export_current(state, export.as_deref()).await?;
        }
        Command::Import { path } => {
            let filename = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .with_context(|| format!("No file name in {}", path.display()))?;
            let content = tokio::fs::read(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let Ok(source) = resolver.import(&filename, content).await else {
                return Ok(ExitCode::FAILURE);
            };
            report_opened(&filename, source);
        }
        Command::Remove { filename } => {
            if resolver.remove(&filename).await.is_err() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Clear => {
            if resolver.clear().await.is_err() {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn report_opened(filename: &str, source: DocumentSource) {
    let origin = match source {
        DocumentSource::Cache => "store",
        DocumentSource::Network => "network",
        DocumentSource::Import => "local file",
    };
    println!("Opened {} from {}", display_name(filename), origin);
}

async fn export_current(state: &AppState, path: Option<&Path>) -> anyhow::Result<()> {
    let Some(path) = path else {
        return Ok(());
    };

    let Some(content) = state.controller().export_current().await? else {
        bail!("No document is open");
    };
    tokio::fs::write(path, &content)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Exported {} bytes to {}", content.len(), path.display());
    Ok(())
}
