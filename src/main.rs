//! Sitedex main entry point
//!
//! This is the command-line interface for the Sitedex site indexer.

use anyhow::Context;
use clap::{Parser, Subcommand};
use sitedex::config::{load_config_with_hash, Config};
use sitedex::output::{
    load_statistics, print_page_outcome, print_run_summary, print_search_results,
    print_statistics,
};
use sitedex::storage::{into_shared, open_storage, SharedStorage};
use sitedex::{Indexer, SearchEngine, SearchQuery};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Sitedex: crawl sites, index their words, search them
///
/// Sitedex crawls the configured websites, stores every page it reaches and
/// builds a per-site index of normalized Russian word forms for ranked
/// full-text search.
#[derive(Parser, Debug)]
#[command(name = "sitedex")]
#[command(version)]
#[command(about = "A site crawler with a lemma index and ranked search", long_about = None)]
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
    /// Drop stored data and crawl every configured site (Ctrl-C stops the run)
    Index,

    /// Fetch one page again and replace it in the index
    IndexPage {
        #[arg(value_name = "URL")]
        url: String,
    },

    /// Rebuild a site's index from its stored pages
    Rebuild {
        #[arg(value_name = "SITE-URL")]
        site: String,
    },

    /// Run a ranked search query
    Search {
        #[arg(value_name = "QUERY")]
        query: String,

        /// Restrict the search to one site
        #[arg(long, value_name = "URL")]
        site: Option<String>,

        #[arg(long, default_value_t = 0)]
        offset: usize,

        /// Results per page (configured default when omitted)
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show statistics from the database
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let storage = open_database(&config)?;

    match cli.command {
        Command::Index => handle_index(config, storage).await,
        Command::IndexPage { url } => handle_index_page(config, storage, &url).await,
        Command::Rebuild { site } => handle_rebuild(config, storage, &site),
        Command::Search {
            query,
            site,
            offset,
            limit,
        } => handle_search(config, storage, query, site, offset, limit),
        Command::Stats => handle_stats(storage),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitedex=info,warn"),
            1 => EnvFilter::new("sitedex=debug,info"),
            2 => EnvFilter::new("sitedex=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn open_database(config: &Config) -> anyhow::Result<SharedStorage> {
    let path = Path::new(&config.storage.database_path);
    tracing::debug!("Opening database {}", path.display());
    let storage = open_storage(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    Ok(into_shared(storage))
}

/// Runs a full indexing of every configured site
async fn handle_index(config: Config, storage: SharedStorage) -> anyhow::Result<()> {
    tracing::info!("Sites to index: {}", config.sites.len());
    for site in &config.sites {
        tracing::info!("  - {} ({})", site.name, site.url);
    }

    let indexer = Arc::new(Indexer::new(config, storage)?);
    let mut run = {
        let indexer = Arc::clone(&indexer);
        tokio::spawn(async move { indexer.run_full_indexing().await })
    };

    let summary = tokio::select! {
        result = &mut run => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupt received, stopping");
            if let Err(e) = indexer.force_stop() {
                tracing::debug!("Stop ignored: {}", e);
            }
            run.await?
        }
    }?;

    print_run_summary(&summary);
    Ok(())
}

/// Reindexes a single page
async fn handle_index_page(config: Config, storage: SharedStorage, url: &str) -> anyhow::Result<()> {
    let indexer = Indexer::new(config, storage)?;
    let outcome = indexer
        .index_page_url(url)
        .await
        .with_context(|| format!("Failed to reindex {}", url))?;

    print_page_outcome(url, &outcome);
    Ok(())
}

/// Rebuilds a site's index from stored pages
fn handle_rebuild(config: Config, storage: SharedStorage, site: &str) -> anyhow::Result<()> {
    let indexer = Indexer::new(config, storage)?;
    let pages = indexer
        .rebuild_site_index(site)
        .with_context(|| format!("Failed to rebuild index of {}", site))?;

    println!("Rebuilt index of {} from {} pages", site, pages);
    Ok(())
}

fn handle_search(
    config: Config,
    storage: SharedStorage,
    text: String,
    site: Option<String>,
    offset: usize,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    let engine = SearchEngine::new(storage, config.search);
    let query = SearchQuery {
        text,
        site,
        offset,
        limit,
    };

    let response = engine.search(&query)?;
    print_search_results(&query.text, offset, &response);
    Ok(())
}

/// Shows statistics from the database
fn handle_stats(storage: SharedStorage) -> anyhow::Result<()> {
    let stats = load_statistics(&*storage.lock(), false)?;
    print_statistics(&stats);
    Ok(())
}
