//! Harvested records and per-shard batches

use crate::category::LeafCategory;
use crate::state::JobStatus;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// One product listing with its category context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRecord {
    /// Names of the owning leaf's defined levels, root first
    pub category: Vec<String>,

    /// Canonical link of the owning leaf
    pub category_link: String,

    /// Site-specific fields in the order the site parser emits them
    pub fields: Vec<(String, Option<String>)>,
}

impl ListingRecord {
    /// Attaches category context from `leaf` to a parsed field map
    pub fn new(leaf: &LeafCategory, fields: Vec<(String, Option<String>)>) -> Self {
        Self {
            category: leaf.names(),
            category_link: leaf.canonical_link().unwrap_or_default().to_string(),
            fields,
        }
    }

    /// Looks up a field value by name
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .and_then(|(_, value)| value.as_deref())
    }

    /// Sets a field, replacing an existing value of the same name
    pub fn set_field(&mut self, name: &str, value: Option<String>) {
        match self.fields.iter_mut().find(|(key, _)| key == name) {
            Some(entry) => entry.1 = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }
}

/// Terminal outcome of one harvest job
#[derive(Debug, Clone)]
pub struct JobOutcome {
    /// Position of the job within its shard
    pub index: usize,

    pub leaf: Arc<LeafCategory>,

    pub status: JobStatus,

    /// Records in page order, then listing order within a page
    pub records: Vec<ListingRecord>,

    /// Page count detected on the first page (0 when it never loaded)
    pub pages_expected: u32,

    pub pages_harvested: u32,

    /// Fetch attempts made across all pages
    pub attempts: u32,

    /// The error that ended the job early, if any
    pub error: Option<String>,
}

impl JobOutcome {
    /// Outcome for a job that produced nothing
    pub fn skipped(index: usize, leaf: Arc<LeafCategory>, error: impl Into<String>) -> Self {
        Self {
            index,
            leaf,
            status: JobStatus::Skipped,
            records: Vec::new(),
            pages_expected: 0,
            pages_harvested: 0,
            attempts: 0,
            error: Some(error.into()),
        }
    }
}

/// The checkpoint unit: every job outcome of one shard
#[derive(Debug, Clone)]
pub struct PartialBatch {
    pub shard_index: usize,

    /// Job outcomes ordered by job index
    pub jobs: Vec<JobOutcome>,

    pub completed_at: DateTime<Utc>,
}

impl PartialBatch {
    /// Creates a batch, ordering the outcomes by job index
    pub fn new(shard_index: usize, mut jobs: Vec<JobOutcome>) -> Self {
        jobs.sort_by_key(|job| job.index);
        Self {
            shard_index,
            jobs,
            completed_at: Utc::now(),
        }
    }

    /// Total records across all jobs
    pub fn record_count(&self) -> usize {
        self.jobs.iter().map(|job| job.records.len()).sum()
    }

    /// Number of jobs that ended in `status`
    pub fn count_status(&self, status: JobStatus) -> usize {
        self.jobs.iter().filter(|job| job.status == status).count()
    }
}
