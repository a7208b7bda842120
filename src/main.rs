//! linkdoc-ingest main entry point
//!
//! This is the command-line interface for the link ingestion pipeline.

use clap::{Parser, Subcommand};
use linkdoc_ingest::clients::{HttpCrawlClient, HttpEmbedder};
use linkdoc_ingest::config::{load_config_with_hash, Config};
use linkdoc_ingest::storage::SqliteStorage;
use linkdoc_ingest::trigger::{
    handle_crawl_trigger, handle_import, CrawlRequest, SourceIngestRequest, TriggerResponse,
};
use linkdoc_ingest::{IngestError, Orchestrator};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// linkdoc-ingest: crawl, embed and store the links found in messages
///
/// Links from source records are crawled through an external crawl service,
/// embedded, and stored once per URL together with the crawl session and
/// parent page they were found through.
#[derive(Parser, Debug)]
#[command(name = "linkdoc-ingest")]
#[command(version)]
#[command(about = "Lineage-aware link ingestion", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl unprocessed links and print the trigger response
    Crawl {
        /// Maximum number of source records to read
        #[arg(long)]
        max_links: Option<u32>,

        /// Only read source records older than this many minutes
        #[arg(long)]
        older_than_minutes: Option<u32>,
    },

    /// Read a crawl trigger JSON body from stdin and run it
    Trigger,

    /// Import source records from a JSON file of messages
    ImportSources {
        /// JSON array of {source_id, received_at, body?, links?}
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Only import messages received within this many hours
        #[arg(long)]
        since_hours: Option<u32>,
    },

    /// Show the crawl tree containing a stored URL
    Lineage {
        #[arg(value_name = "URL")]
        url: String,
    },

    /// Show statistics from the database and exit
    Stats,
}

impl Command {
    /// Trigger-style commands always print a JSON response
    fn prints_response(&self) -> bool {
        matches!(
            self,
            Command::Crawl { .. } | Command::Trigger | Command::ImportSources { .. }
        )
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            if cli.command.prints_response() {
                return finish(TriggerResponse::failure(IngestError::from(e)));
            }
            return Err(e.into());
        }
    };

    match cli.command {
        Command::Crawl {
            max_links,
            older_than_minutes,
        } => {
            let request = CrawlRequest {
                max_links,
                older_than_minutes,
            };
            handle_crawl_command(&config, request).await
        }
        Command::Trigger => {
            let mut body = String::new();
            std::io::stdin().read_to_string(&mut body)?;
            match CrawlRequest::from_body(&body) {
                Ok(request) => handle_crawl_command(&config, request).await,
                Err(e) => finish(TriggerResponse::failure(format!(
                    "Invalid request body: {}",
                    e
                ))),
            }
        }
        Command::ImportSources { file, since_hours } => {
            handle_import_command(&config, &file, SourceIngestRequest { since_hours })
        }
        Command::Lineage { url } => handle_lineage(&config, &url),
        Command::Stats => handle_stats(&config),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("linkdoc_ingest=info,warn"),
            1 => EnvFilter::new("linkdoc_ingest=debug,info"),
            2 => EnvFilter::new("linkdoc_ingest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // Logs go to stderr so stdout carries only the JSON response.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Builds the clients, runs one crawl pass, and prints the response
async fn handle_crawl_command(
    config: &Config,
    request: CrawlRequest,
) -> Result<(), Box<dyn std::error::Error>> {
    let response = handle_crawl_trigger(
        || {
            let crawler = HttpCrawlClient::from_config(&config.crawl_service)?;
            let embedder = HttpEmbedder::from_config(&config.embedding)?;
            let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;

            Ok(Orchestrator::new(crawler, embedder, storage)
                .with_max_child_links(config.pipeline.max_child_links))
        },
        &request,
        &config.pipeline,
    )
    .await;

    finish(response)
}

/// Prints a trigger response and turns a failed one into a non-zero exit
fn finish(response: TriggerResponse) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(&response)?);

    if response.status_code() != 200 {
        let message = response.error.unwrap_or_else(|| "run failed".to_string());
        return Err(message.into());
    }

    Ok(())
}

fn handle_import_command(
    config: &Config,
    file: &Path,
    request: SourceIngestRequest,
) -> Result<(), Box<dyn std::error::Error>> {
    let response = handle_import(
        || Ok(SqliteStorage::new(Path::new(&config.output.database_path))?),
        file,
        &request,
        &config.pipeline,
        chrono::Utc::now(),
    );

    finish(response)
}

fn handle_lineage(config: &Config, url: &str) -> Result<(), Box<dyn std::error::Error>> {
    use linkdoc_ingest::lineage::{build_tree, print_tree};

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let tree = build_tree(&storage, url)?.ok_or_else(|| IngestError::NotFound(url.to_string()))?;
    print_tree(&tree);

    Ok(())
}

/// Handles the stats command: shows statistics from the database
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use linkdoc_ingest::output::{load_statistics, print_statistics};

    println!("Database: {}\n", config.output.database_path);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}
