//! logbot CLI
//!
//! Run with: cargo run -p logbot -- --config logbot.toml ingest

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use logbot::config::LogbotConfig;
use logbot::providers::local::{LocalRecordStore, LocalSemanticIndex};
use logbot::providers::ollama::OllamaEmbedder;
use logbot::providers::RecordStore;
use logbot::storage::LogDb;
use logbot::IngestionOrchestrator;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "logbot", version, about = "Ingest service logs and transaction reports")]
struct Cli {
    /// TOML configuration file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one full ingestion pass
    Ingest,
    /// Show ERROR counts grouped by error code
    Errors {
        /// Restrict to one source file
        #[arg(long)]
        file: Option<String>,
    },
    /// List ingested source files
    Files,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "logbot=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => LogbotConfig::from_file(path)?,
        None => LogbotConfig::default(),
    };

    tracing::info!("Configuration loaded");
    tracing::info!("  - Log directory: {}", config.input.log_dir.display());
    tracing::info!("  - Database: {}", config.database.path.display());
    tracing::info!("  - Embedding model: {}", config.embeddings.model);

    let store = Arc::new(LocalRecordStore::new(Arc::new(LogDb::new(&config.database.path)?)));

    match cli.command {
        Command::Ingest => {
            let embedder = OllamaEmbedder::new(&config.embeddings)?;
            if !embedder.health_check().await {
                tracing::warn!(
                    "Ollama not available at {}; semantic writes will fail",
                    config.embeddings.base_url
                );
            }
            let index = Arc::new(LocalSemanticIndex::open(
                &config.semantic_index,
                Arc::new(embedder),
            )?);

            let orchestrator = IngestionOrchestrator::new(config.input.clone(), store, index);
            let summary = orchestrator.ingest_logs().await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Errors { file } => {
            let counts = match &file {
                Some(name) => store.count_errors_by_code_and_file(name).await?,
                None => store.count_errors_by_code().await?,
            };
            if counts.is_empty() {
                println!("No errors found in the logs.");
            } else {
                println!("Error Summary:");
                for row in counts {
                    println!("- {}: {} occurrences", row.error_code, row.count);
                }
            }
        }
        Command::Files => {
            for name in store.distinct_source_files().await? {
                println!("{}", name);
            }
        }
    }

    Ok(())
}
