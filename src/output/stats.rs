//! Statistics from the result database
//!
//! This module reads back what the last run stored and prints it.

use crate::storage::{RunRecord, SinkResult, SqliteSink};

/// Stored state of the result database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStatistics {
    /// The most recent finished run, if any
    pub last_run: Option<RunRecord>,

    /// Shards with a written checkpoint
    pub checkpointed_shards: Vec<usize>,

    /// Records held across all shard checkpoints
    pub checkpointed_records: u64,

    /// Rows in the final listings table
    pub listing_rows: u64,
}

/// Loads statistics from the result database
///
/// # Arguments
///
/// * `sink` - The opened result database
///
/// # Returns
///
/// * `Ok(RunStatistics)` - Successfully loaded statistics
/// * `Err(SinkError)` - Failed to query the database
pub fn load_statistics(sink: &SqliteSink) -> SinkResult<RunStatistics> {
    let checkpointed_shards = sink.checkpointed_shards()?;

    let mut checkpointed_records = 0;
    for shard in &checkpointed_shards {
        checkpointed_records += sink.checkpoint_record_count(*shard)?.unwrap_or(0);
    }

    Ok(RunStatistics {
        last_run: sink.latest_run()?,
        checkpointed_shards,
        checkpointed_records,
        listing_rows: sink.listing_count()?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &RunStatistics) {
    println!("=== Harvest Statistics ===\n");

    match &stats.last_run {
        Some(run) => {
            println!("Last run:");
            println!("  Site: {}", run.site);
            println!("  Started: {}", run.started_at);
            println!("  Finished: {}", run.finished_at);
            if let Some(duration) = run.duration_seconds() {
                println!("  Duration: {} seconds", duration);
            }
            println!("  Config hash: {}", run.config_hash);
            println!();

            println!("Categories ({}):", run.categories());
            println!("  Complete: {}", run.complete);
            println!("  Partial: {}", run.partial);
            println!("  Skipped: {}", run.skipped);
            println!("  Records: {}", run.records);
            println!();
        }
        None => {
            println!("No finished runs recorded.");
            println!();
        }
    }

    println!(
        "Checkpointed shards: {}",
        if stats.checkpointed_shards.is_empty() {
            "none".to_string()
        } else {
            stats
                .checkpointed_shards
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        }
    );
    println!("Checkpointed records: {}", stats.checkpointed_records);
    println!("Listing rows: {}", stats.listing_rows);
}
