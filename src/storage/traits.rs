//! Sink trait and error types
//!
//! This module defines the interface the harvest writes its results
//! through, and the errors a sink can raise.

use crate::output::{HarvestTable, RunReport};
use crate::state::PartialBatch;
use thiserror::Error;

/// Errors that can occur while persisting results
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Destination of shard checkpoints and the final table
pub trait Sink: Send {
    /// Persists a shard checkpoint, replacing any earlier checkpoint of the same shard
    fn write_batch(&mut self, batch: &PartialBatch) -> SinkResult<()>;

    /// Persists the consolidated table along with the run report
    ///
    /// Rows are written one per record; columns missing from a record are null.
    fn write_final(&mut self, table: &HarvestTable, report: &RunReport) -> SinkResult<()>;
}
