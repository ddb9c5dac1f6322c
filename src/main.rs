//! Catalog-Harvest main entry point
//!
//! This is the command-line interface for the catalog listing harvester.

use anyhow::Context;
use catalog_harvest::config::{load_config_with_hash, proxy_from_env, Config};
use catalog_harvest::harvest::{
    parser_for, resolve_leaves, run_harvest, Fetcher, HttpFetcher, SessionConfig,
};
use catalog_harvest::output::{generate_markdown_summary, load_statistics, print_statistics};
use catalog_harvest::storage::open_sink;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Catalog-Harvest: a software-directory listing harvester
///
/// Resolves a directory site's category tree to its leaf categories, then
/// harvests every listing page under each leaf into a SQLite database.
#[derive(Parser, Debug)]
#[command(name = "catalog-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A software-directory listing harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Discover and resolve categories without harvesting listings
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.stats {
        return handle_stats(&config);
    }

    // Proxy credentials are checked before any network activity
    let proxy = proxy_from_env(&config).context("Proxy configuration is incomplete")?;
    if proxy.is_none() {
        tracing::warn!("No proxy configured, fetching directly");
    }
    let fetcher: Arc<dyn Fetcher> = Arc::new(
        HttpFetcher::new(SessionConfig::from_config(&config, proxy))
            .context("Failed to build HTTP client")?,
    );

    if cli.dry_run {
        handle_dry_run(&config, fetcher.as_ref()).await
    } else {
        handle_harvest(&config, &config_hash, fetcher).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_harvest=info,warn"),
            1 => EnvFilter::new("catalog_harvest=debug,info"),
            2 => EnvFilter::new("catalog_harvest=trace,debug"),
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

/// Handles the --dry-run mode: shows the leaf categories that would be harvested
async fn handle_dry_run(config: &Config, fetcher: &dyn Fetcher) -> anyhow::Result<()> {
    let parser = parser_for(config)?;
    let resolution = resolve_leaves(config, parser.as_ref(), fetcher).await?;

    println!("=== Catalog-Harvest Dry Run ===\n");
    println!("Site: {} ({})", config.site.id, parser.root_url());
    println!("Max depth: {}", config.site.max_depth);
    println!(
        "Pool: {} shards, {} workers per shard",
        config.pool.shards, config.pool.workers
    );
    println!();
    println!(
        "Category nodes: {} ({} internal, {} leaf)",
        resolution.node_count, resolution.internal_count, resolution.leaf_node_count
    );
    println!(
        "Dropped leaves: {} duplicate links, {} without link",
        resolution.duplicate_links, resolution.unlinked
    );

    println!("\nLeaf categories ({}):", resolution.leaves.len());
    for leaf in &resolution.leaves {
        println!(
            "  - {} -> {}",
            leaf,
            parser.listing_url(leaf).unwrap_or_default()
        );
    }

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let sink = open_sink(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&sink)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(
    config: &Config,
    config_hash: &str,
    fetcher: Arc<dyn Fetcher>,
) -> anyhow::Result<()> {
    let mut sink = open_sink(Path::new(&config.output.database_path)).with_context(|| {
        format!("Failed to open database {}", config.output.database_path)
    })?;

    let (table, report) = match run_harvest(config, config_hash, fetcher, &mut sink).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            return Err(e.into());
        }
    };

    generate_markdown_summary(&report, Path::new(&config.output.summary_path))
        .with_context(|| format!("Failed to write summary {}", config.output.summary_path))?;

    tracing::info!(
        "Wrote {} rows to {} and summary to {}",
        table.rows.len(),
        config.output.database_path,
        config.output.summary_path
    );

    Ok(())
}
