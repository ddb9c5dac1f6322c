//! Run report types
//!
//! This module defines the end-of-run report and the error type of the
//! reporting outputs.

use crate::output::aggregator::HarvestSummary;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur while writing reports
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// What one harvest run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Site identifier
    pub site: String,

    pub config_hash: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub summary: HarvestSummary,
}

impl RunReport {
    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds().max(0)
    }

    /// Share of categories harvested completely, as a percentage
    pub fn completion_rate(&self) -> f64 {
        let categories = self.summary.categories();
        if categories == 0 {
            return 0.0;
        }
        (self.summary.complete as f64 / categories as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn report() -> RunReport {
        let started_at = Utc::now();
        RunReport {
            site: "g2".to_string(),
            config_hash: "abc123".to_string(),
            started_at,
            finished_at: started_at + Duration::seconds(90),
            summary: HarvestSummary {
                complete: 8,
                partial: 1,
                skipped: 1,
                records: 240,
                failures: Vec::new(),
            },
        }
    }

    #[test]
    fn test_duration_seconds() {
        assert_eq!(report().duration_seconds(), 90);
    }

    #[test]
    fn test_completion_rate() {
        let rate = report().completion_rate();
        assert!((rate - 80.0).abs() < 0.01);
    }

    #[test]
    fn test_completion_rate_without_categories() {
        let mut report = report();
        report.summary = HarvestSummary::default();
        assert_eq!(report.completion_rate(), 0.0);
    }
}
