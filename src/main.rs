use anyhow::Context;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::error;

use product_health::apis::{LabelTextFile, OpenFoodFactsClient, TesseractOcr};
use product_health::config::Config;
use product_health::logging;
use product_health::pipeline::{LookupOutcome, Pipeline};
use product_health::report;
use product_health::storage::{HistoryStore, JsonFileHistory};
use product_health::types::LookupRequest;

#[derive(Parser)]
#[command(name = "product_health")]
#[command(about = "Look up a packaged food product and compute its health score")]
#[command(version)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true, default_value = "config.toml")]
    config: String,

    /// Print results as JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Do not record this lookup in history
    #[arg(long, global = true)]
    no_history: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up a product by barcode
    Barcode { code: String },
    /// Search products by name
    Search { name: String },
    /// OCR a label image from a URL
    ImageUrl { url: String },
    /// OCR a local label image
    Image { path: String },
    /// Score already-extracted label text from a file, or `-` for stdin
    Text { path: String },
    /// Show recent lookups, newest first
    History {
        #[arg(long)]
        limit: Option<usize>,
    },
}

fn print_outcome(outcome: &LookupOutcome, as_json: bool) -> anyhow::Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }

    // Warnings share stderr with the console log so stdout stays the report
    if let Some(err) = &outcome.error {
        eprintln!("{}", report::render_failure(err));
    }
    for (i, evaluation) in outcome.evaluations.iter().enumerate() {
        if outcome.evaluations.len() > 1 {
            println!("\n📦 Result {} of {}", i + 1, outcome.evaluations.len());
        }
        println!("{}", report::render(&evaluation.product, &evaluation.result));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::load(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config))?;
    let _log_guard = logging::init_logging(&config.logging);

    let history: Arc<dyn HistoryStore> = Arc::new(JsonFileHistory::new(&config.history.path));

    let request = match cli.command {
        Commands::Barcode { code } => LookupRequest::Barcode(code),
        Commands::Search { name } => LookupRequest::Name(name),
        Commands::ImageUrl { url } => LookupRequest::ImageUrl(url),
        Commands::Image { path } => LookupRequest::ImagePath(path),
        Commands::Text { path } => LookupRequest::LabelText(path),
        Commands::History { limit } => {
            let limit = limit.unwrap_or(config.history.display_limit);
            let entries = history.recent(limit).await.context("Failed to read history")?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                print!("{}", report::render_history(&entries));
            }
            return Ok(());
        }
    };

    let mut pipeline = Pipeline::new()
        .with_source(Box::new(
            OpenFoodFactsClient::new(&config.open_food_facts)
                .context("Failed to build Open Food Facts client")?,
        ))
        .with_source(Box::new(
            TesseractOcr::new(&config.ocr).context("Failed to build OCR client")?,
        ))
        .with_source(Box::new(LabelTextFile::new()));
    if !cli.no_history {
        pipeline = pipeline.with_history(history);
    }

    let outcome = pipeline.lookup(&request).await;
    if let Err(e) = print_outcome(&outcome, cli.json) {
        error!("Failed to print results: {}", e);
        return Err(e);
    }
    Ok(())
}
