//! Output module for aggregating and reporting harvest results
//!
//! This module handles:
//! - Merging shard batches into the final, sanitized record table
//! - Generating markdown summaries of a run
//! - Reading back stored run statistics

mod aggregator;
mod markdown;
mod report;
pub mod stats;

pub use aggregator::{
    sanitize, AggregationError, Aggregator, CategoryFailure, HarvestSummary, HarvestTable,
    CATEGORY_LINK_COLUMN,
};
pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use report::{OutputError, OutputResult, RunReport};
pub use stats::{load_statistics, print_statistics, RunStatistics};
