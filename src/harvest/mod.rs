//! Harvest pipeline
//!
//! This module contains the listing harvest, including:
//! - The fetch boundary (`Fetcher`/`Session`) and its HTTP implementation
//! - Bounded retries around page fetches
//! - Page-count detection
//! - The per-category harvester and the sharded worker pool
//! - `run_harvest`, which wires discovery, resolution, harvesting and
//!   aggregation together for one run

mod coordinator;
mod fetcher;
mod harvester;
mod pagination;
mod retry;

pub use coordinator::{split_into_shards, Orchestrator};
pub use fetcher::{
    build_http_client, Fetcher, HttpFetcher, HttpSession, RenderedPage, Session, SessionConfig,
};
pub use harvester::Harvester;
pub use pagination::{detect_page_count, parse_page_count, PaginationParseError};
pub use retry::{open_with_retry, RetryExhausted, RetryPolicy};

use crate::category::{discover_categories, resolve, Resolution};
use crate::config::Config;
use crate::output::{HarvestTable, RunReport};
use crate::sites::{build_parser, PageParser, SiteId};
use crate::storage::Sink;
use crate::ConfigError;
use chrono::Utc;
use std::sync::Arc;

/// Builds the page parser selected by the configuration
pub fn parser_for(config: &Config) -> Result<Arc<dyn PageParser>, ConfigError> {
    let site = SiteId::parse(&config.site.id)
        .ok_or_else(|| ConfigError::UnknownSite(config.site.id.clone()))?;
    Ok(build_parser(site, config.site.root_url.as_deref()))
}

/// Discovers the site's categories and resolves them to leaves
///
/// A malformed category tree is fatal and is reported before any listing
/// page is fetched.
pub async fn resolve_leaves(
    config: &Config,
    parser: &dyn PageParser,
    fetcher: &dyn Fetcher,
) -> crate::Result<Resolution> {
    let policy = RetryPolicy::from_config(&config.harvest);
    let nodes = discover_categories(fetcher, parser, &policy, config.site.max_depth).await?;
    let resolution = resolve(&nodes, config.site.max_depth)?;

    tracing::info!(
        "Resolved {} leaf categories from {} nodes ({} internal, {} duplicate links, {} unlinked)",
        resolution.leaves.len(),
        resolution.node_count,
        resolution.internal_count,
        resolution.duplicate_links,
        resolution.unlinked
    );

    Ok(resolution)
}

/// Runs a complete harvest and hands the final table to `sink`
///
/// # Arguments
///
/// * `config` - Validated run configuration
/// * `config_hash` - Hash of the configuration file, stored with the table
/// * `fetcher` - Session factory shared by discovery and every job
/// * `sink` - Receives shard checkpoints and the final table
///
/// # Returns
///
/// * `Ok((table, report))` - The aggregated table and the run report
/// * `Err(HarvestError)` - Discovery, resolution, or the final write failed
pub async fn run_harvest(
    config: &Config,
    config_hash: &str,
    fetcher: Arc<dyn Fetcher>,
    sink: &mut dyn Sink,
) -> crate::Result<(HarvestTable, RunReport)> {
    let started_at = Utc::now();
    let parser = parser_for(config)?;

    let resolution = resolve_leaves(config, parser.as_ref(), fetcher.as_ref()).await?;

    let harvester = Harvester::from_config(config, parser);
    let orchestrator = Orchestrator::new(harvester, fetcher, &config.pool);
    let aggregator = orchestrator.run(&resolution.leaves, sink).await;
    let (table, summary) = aggregator.finish();

    let report = RunReport {
        site: config.site.id.clone(),
        config_hash: config_hash.to_string(),
        started_at,
        finished_at: Utc::now(),
        summary,
    };

    sink.write_final(&table, &report)?;

    tracing::info!(
        "Harvest finished: {} complete, {} partial, {} skipped, {} records",
        report.summary.complete,
        report.summary.partial,
        report.summary.skipped,
        report.summary.records
    );

    Ok((table, report))
}
