//! # News Harness CLI (`nh`)
//!
//! Provision a document-store collection for news articles, ingest article
//! records into it, and query it.
//!
//! ## Usage
//!
//! ```bash
//! nh --config ./config/nh.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `nh provision` | Create the collection if it does not exist |
//! | `nh ingest <file>` | Normalize and upload records from a JSON file |
//! | `nh filter <field> <value>` | Exact-match lookup on one property |
//! | `nh search "<query>"` | Keyword-ranked lookup |
//! | `nh list` | Unfiltered listing |
//! | `nh stats` | Collection overview |
//!
//! Logging goes to stderr and honors `RUST_LOG`; `--verbose` raises the
//! default level to `debug`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use news_harness::config;
use news_harness::ingest::{self, IngestOptions};
use news_harness::provision;
use news_harness::query::{self, QueryRequest};
use news_harness::stats;

/// News Harness CLI: ingest news articles into a document store and query them.
#[derive(Parser)]
#[command(
    name = "nh",
    about = "News Harness: ingest news articles into a document store and query them",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/nh.toml")]
    config: PathBuf,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the configured collection if it does not exist.
    ///
    /// Safe to run repeatedly; an existing collection is left unchanged.
    Provision,

    /// Ingest article records from a JSON file.
    ///
    /// The file holds a JSON array of objects, or an object with an
    /// `articles` or `results` array. Records are normalized to the article
    /// shape and uploaded in batches.
    Ingest {
        /// Path to the JSON records file.
        file: PathBuf,

        /// Records per batch (overrides `ingest.batch_size`).
        #[arg(long)]
        batch_size: Option<usize>,

        /// Stop once more than this many records have failed
        /// (overrides `ingest.max_errors`).
        #[arg(long)]
        max_errors: Option<usize>,

        /// Maximum number of records to read from the file.
        #[arg(long)]
        limit: Option<usize>,

        /// Show record and batch counts without contacting the store.
        #[arg(long)]
        dry_run: bool,
    },

    /// Fetch records whose property equals a value exactly.
    Filter {
        /// Property name (`title`, `content`, `url`, `published_date`, `source`).
        field: String,

        /// Value to match.
        value: String,

        /// Maximum number of results.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Keyword search, ranked by the store's relevance score.
    Search {
        /// The search query string.
        query: String,

        /// Maximum number of results.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// List records without filtering.
    List {
        /// Maximum number of results.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show collection properties and object count.
    Stats,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Provision => {
            provision::run_provision(&cfg).await?;
        }
        Commands::Ingest {
            file,
            batch_size,
            max_errors,
            limit,
            dry_run,
        } => {
            let opts = IngestOptions {
                batch_size,
                max_errors,
                limit,
                dry_run,
            };
            ingest::run_ingest(&cfg, &file, &opts).await?;
        }
        Commands::Filter {
            field,
            value,
            limit,
        } => {
            query::run_query(&cfg, &QueryRequest::Filter { field, value }, limit).await?;
        }
        Commands::Search { query, limit } => {
            query::run_query(&cfg, &QueryRequest::Keyword { query }, limit).await?;
        }
        Commands::List { limit } => {
            query::run_query(&cfg, &QueryRequest::All, limit).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}
