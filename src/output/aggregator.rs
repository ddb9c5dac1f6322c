//! Deterministic merging of shard batches
//!
//! Batches are keyed by shard index, so the merged table is ordered by shard
//! and then by job no matter in which order shards were added.

use crate::state::{JobStatus, PartialBatch};
use std::collections::BTreeMap;
use thiserror::Error;

/// Name of the column holding the leaf's canonical link
pub const CATEGORY_LINK_COLUMN: &str = "Category Link";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AggregationError {
    #[error("Shard {0} produced no jobs")]
    EmptyShard(usize),
}

/// Removes C0 and C1 control characters, leaving all other text untouched
pub fn sanitize(value: &str) -> String {
    value.chars().filter(|c| !c.is_control()).collect()
}

/// The consolidated record table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestTable {
    /// Category columns, the category link column, then site fields in first-seen order
    pub columns: Vec<String>,

    /// One row per record, aligned with `columns`
    pub rows: Vec<Vec<Option<String>>>,
}

impl HarvestTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Value of `column` in row `row`
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index)?.as_deref()
    }
}

/// A category that did not harvest completely
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryFailure {
    pub category: String,
    pub status: JobStatus,
    pub error: String,
}

/// Per-run counts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestSummary {
    /// Categories fully harvested
    pub complete: usize,

    /// Categories with some pages harvested
    pub partial: usize,

    /// Categories with nothing harvested
    pub skipped: usize,

    pub records: usize,

    pub failures: Vec<CategoryFailure>,
}

impl HarvestSummary {
    pub fn categories(&self) -> usize {
        self.complete + self.partial + self.skipped
    }
}

/// Collects shard batches until the final hand-off
#[derive(Debug, Default)]
pub struct Aggregator {
    batches: BTreeMap<usize, PartialBatch>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a shard's batch, replacing any earlier batch of the same shard
    ///
    /// An empty batch is still recorded; the returned error only reports it.
    pub fn add(&mut self, batch: PartialBatch) -> Result<(), AggregationError> {
        let shard_index = batch.shard_index;
        let empty = batch.jobs.is_empty();
        self.batches.insert(shard_index, batch);

        if empty {
            Err(AggregationError::EmptyShard(shard_index))
        } else {
            Ok(())
        }
    }

    pub fn shard_count(&self) -> usize {
        self.batches.len()
    }

    /// Flattens every record into a sanitized table
    pub fn table(&self) -> HarvestTable {
        let jobs = || self.batches.values().flat_map(|batch| batch.jobs.iter());

        let depth = jobs().map(|job| job.leaf.chain.len()).max().unwrap_or(0);
        let mut columns: Vec<String> = (1..=depth).map(|level| format!("Category {}", level)).collect();
        columns.push(CATEGORY_LINK_COLUMN.to_string());
        let fixed = columns.len();

        for record in jobs().flat_map(|job| job.records.iter()) {
            for (name, _) in &record.fields {
                if !columns.iter().any(|column| column == name) {
                    columns.push(name.clone());
                }
            }
        }

        let rows = jobs()
            .flat_map(|job| job.records.iter())
            .map(|record| {
                let mut row: Vec<Option<String>> = vec![None; columns.len()];
                for (level, name) in record.category.iter().enumerate().take(depth) {
                    row[level] = Some(sanitize(name));
                }
                row[depth] = Some(sanitize(&record.category_link));
                for (name, value) in &record.fields {
                    if let Some(index) = columns[fixed..].iter().position(|column| column == name) {
                        row[fixed + index] = value.as_deref().map(sanitize);
                    }
                }
                row
            })
            .collect();

        HarvestTable { columns, rows }
    }

    /// Counts job outcomes across every shard
    pub fn summary(&self) -> HarvestSummary {
        let mut summary = HarvestSummary::default();

        for job in self.batches.values().flat_map(|batch| batch.jobs.iter()) {
            match job.status {
                JobStatus::Complete => summary.complete += 1,
                JobStatus::Partial => summary.partial += 1,
                JobStatus::Skipped | JobStatus::Pending => summary.skipped += 1,
            }
            summary.records += job.records.len();

            if job.status != JobStatus::Complete {
                summary.failures.push(CategoryFailure {
                    category: job.leaf.to_string(),
                    status: job.status,
                    error: job.error.clone().unwrap_or_default(),
                });
            }
        }

        summary
    }

    /// Ends aggregation, returning the table and its counts
    pub fn finish(self) -> (HarvestTable, HarvestSummary) {
        (self.table(), self.summary())
    }
}
