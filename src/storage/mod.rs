//! Storage module for persisting harvest results
//!
//! This module handles all database operations of a run, including:
//! - Per-shard checkpoints, overwritten when a shard is written again
//! - The consolidated listings table and run metadata
//! - Reading back stored runs for statistics

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteSink;
pub use traits::{Sink, SinkError, SinkResult};

use std::path::Path;

/// Opens or creates the result database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteSink)` - Successfully initialized storage
/// * `Err(SinkError)` - Failed to initialize storage
pub fn open_sink(path: &Path) -> SinkResult<SqliteSink> {
    SqliteSink::new(path)
}

/// A finished run as stored in the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRecord {
    pub id: i64,
    pub site: String,
    pub config_hash: String,
    pub started_at: String,
    pub finished_at: String,
    pub complete: u64,
    pub partial: u64,
    pub skipped: u64,
    pub records: u64,
}

impl RunRecord {
    /// Total categories the run attempted
    pub fn categories(&self) -> u64 {
        self.complete + self.partial + self.skipped
    }

    /// Run duration, when both timestamps parse
    pub fn duration_seconds(&self) -> Option<i64> {
        let started = self.started_at.parse::<chrono::DateTime<chrono::Utc>>().ok()?;
        let finished = self.finished_at.parse::<chrono::DateTime<chrono::Utc>>().ok()?;
        Some((finished - started).num_seconds())
    }
}
