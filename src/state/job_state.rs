/// Harvest job definitions for tracking per-category progress
///
/// This module defines the lifecycle states of a harvest job and the job
/// itself as the orchestrator dispatches it.
use crate::category::LeafCategory;
use std::fmt;
use std::sync::Arc;

/// Represents the current status of one category's harvest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JobStatus {
    // ===== Active States =====
    /// Job has been dispatched but has not reached an outcome yet
    Pending,

    // ===== Terminal States =====
    /// Some pages were harvested before a page exhausted its retries
    Partial,

    /// Every detected page was harvested
    Complete,

    /// Nothing was harvested (first page unreachable, or the worker crashed)
    Skipped,
}

impl JobStatus {
    /// Converts the status to a database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Partial => "partial",
            Self::Complete => "complete",
            Self::Skipped => "skipped",
        }
    }

    /// Parses a status from a database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "partial" => Some(Self::Partial),
            "complete" => Some(Self::Complete),
            "skipped" => Some(Self::Skipped),
            _ => None,
        }
    }

    /// Returns all possible statuses
    pub fn all_statuses() -> Vec<Self> {
        vec![Self::Pending, Self::Partial, Self::Complete, Self::Skipped]
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

/// One leaf category scheduled for harvesting
#[derive(Debug, Clone)]
pub struct HarvestJob {
    /// Position of the job within its shard
    pub index: usize,

    /// The category to harvest (shared, read-only)
    pub leaf: Arc<LeafCategory>,

    /// Total fetch attempts made so far across all pages
    pub attempts: u32,

    pub status: JobStatus,
}

impl HarvestJob {
    /// Creates a pending job
    pub fn new(index: usize, leaf: Arc<LeafCategory>) -> Self {
        Self {
            index,
            leaf,
            attempts: 0,
            status: JobStatus::Pending,
        }
    }
}
