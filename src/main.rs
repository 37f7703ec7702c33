use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use gavel::blob::{BlobStore, FsBlobStore};
use gavel::config::Config;
use gavel::output::{report, terminal};
use gavel::pipeline::{batch, PipelineOrchestrator, PipelineOutcome};
use gavel::review::payload::Invocation;
use gavel::sentiment::download;
use gavel::text::lemmatizer::Lemmatizer;
use gavel::text::TextNormalizer;

/// Gavel: Review moderation pipeline.
///
/// Normalizes product reviews, flags profanity, scores sentiment and bans
/// authors who keep posting profane reviews.
#[derive(Parser)]
#[command(name = "gavel", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database and blob store
    Init,

    /// Run one event document through the pipeline
    Process {
        /// Path to the event JSON, or `-` to read stdin
        input: String,

        /// Print the outcome as JSON instead of the colored summary
        #[arg(long)]
        json: bool,
    },

    /// Run the pipeline for a review already stored in the blob store
    Trigger {
        /// Bucket holding the raw review
        #[arg(long)]
        bucket: String,

        /// Object key of the raw review
        #[arg(long)]
        key: String,
    },

    /// Process a JSONL file of reviews or events
    Batch {
        /// Path to the JSONL file
        file: PathBuf,

        /// Only process the first N lines
        #[arg(long)]
        limit: Option<usize>,

        /// Number of reviews to process in parallel (default: 8)
        #[arg(long, default_value = "8")]
        concurrency: usize,
    },

    /// Generate the aggregate moderation report
    Report {
        /// Also write the report as JSON to this path
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Show system status
    Status,

    /// Download the ONNX sentiment model (~67 MB)
    DownloadModel,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("gavel=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            info!("Initializing Gavel database...");
            let config = Config::load()?;
            let conn = gavel::db::initialize(&config.db_path, &config.tables)?;
            let table_count = gavel::db::schema::table_count(&conn)?;
            std::fs::create_dir_all(&config.blob_root).with_context(|| {
                format!("Failed to create blob root {}", config.blob_root.display())
            })?;
            println!("Database initialized at: {}", config.db_path);
            println!("Tables created: {table_count}");
            println!("Blob store: {}", config.blob_root.display());
            println!("\nGavel is ready. Optional: run `gavel download-model`");
            println!("  (without it, sentiment uses the built-in lexicon)");
        }

        Commands::Process { input, json } => {
            let config = Config::load()?;
            let raw = read_input(&input)?;
            let event: serde_json::Value = serde_json::from_str(&raw)
                .with_context(|| format!("{input} is not valid JSON"))?;

            let orchestrator = build_orchestrator(&config)?;
            let outcome = orchestrator.handle_event(&event).await;
            finish(&outcome, json)?;
        }

        Commands::Trigger { bucket, key } => {
            let config = Config::load()?;
            let orchestrator = build_orchestrator(&config)?;
            let outcome = orchestrator
                .handle(Invocation::BlobCreated { bucket, key })
                .await;
            finish(&outcome, false)?;
        }

        Commands::Batch {
            file,
            limit,
            concurrency,
        } => {
            let config = Config::load()?;
            let lines = batch::read_lines(&file, limit)?;
            if lines.is_empty() {
                println!("No reviews in {}", file.display());
                return Ok(());
            }

            let orchestrator = build_orchestrator(&config)?;
            println!(
                "Processing {} reviews ({} at a time, sentiment: {})...",
                lines.len(),
                concurrency,
                orchestrator.sentiment_method()
            );
            let (summary, outcomes) = batch::run(&orchestrator, lines, concurrency, true).await;

            for outcome in outcomes.iter().filter(|o| !o.is_complete()) {
                terminal::display_outcome(outcome);
            }
            terminal::display_batch_summary(&summary);
        }

        Commands::Report { output } => {
            let config = Config::load()?;
            let store = gavel::db::open_store(&config.db_path, &config.tables)?;
            let report = report::generate(store.as_ref()).await?;
            terminal::display_report(&report);

            if let Some(path) = output {
                report::write_json(&report, &path)?;
                println!("\n{}", format!("Report written to {}", path.display()).dimmed());
            }
        }

        Commands::Status => {
            let config = Config::load()?;
            let store = gavel::db::open_store(&config.db_path, &config.tables)?;
            gavel::status::show(&store, &config).await?;
        }

        Commands::DownloadModel => {
            let config = Config::load()?;
            let model_dir = &config.model_dir;

            println!("Downloading ONNX sentiment model...");
            println!("  Destination: {}", model_dir.display());

            download::download_model(model_dir).await?;

            println!("\n{}", "Model downloaded successfully.".bold());
            println!("Sentiment scoring will use it on the next run.");
        }
    }

    Ok(())
}

/// Read an event document from a file, or from stdin when `input` is `-`.
fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read event from stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(input).with_context(|| format!("Failed to read {input}"))
    }
}

/// Print an outcome and turn a failed one into a non-zero exit.
fn finish(outcome: &PipelineOutcome, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
    } else {
        terminal::display_outcome(outcome);
    }
    match &outcome.error {
        Some(error) if !outcome.is_complete() => {
            anyhow::bail!("review processing failed ({})", error.kind)
        }
        _ => Ok(()),
    }
}

/// Wire the stores and the stage components from configuration.
///
/// Missing optional capabilities (lemma dictionary, sentiment model) degrade
/// the pipeline instead of failing it; the orchestrator records a note on
/// each review they affect.
fn build_orchestrator(config: &Config) -> Result<PipelineOrchestrator> {
    let blobs: Arc<dyn BlobStore> = Arc::new(FsBlobStore::new(&config.blob_root));
    let records = gavel::db::open_store(&config.db_path, &config.tables)?;

    let lemmatizer = if config.lemma_file_present() {
        match Lemmatizer::load(&config.lemma_path) {
            Ok(lemmatizer) => Some(lemmatizer),
            Err(e) => {
                warn!(error = %e, "Failed to load lemma dictionary, tokens will not be lemmatized");
                None
            }
        }
    } else {
        warn!(
            path = %config.lemma_path.display(),
            "Lemma dictionary not found, tokens will not be lemmatized"
        );
        None
    };
    let normalizer = TextNormalizer::new(config.stop_words.load(), lemmatizer);
    let scorer = gavel::sentiment::select_scorer(config.sentiment_mode, &config.model_dir);

    Ok(PipelineOrchestrator::new(
        blobs,
        records,
        normalizer,
        scorer,
        config.buckets.clone(),
        config.max_conflict_retries,
    ))
}
