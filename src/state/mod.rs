//! State module for tracking harvest progress
//!
//! # Components
//!
//! - `JobStatus` / `HarvestJob`: lifecycle of one category's harvest
//! - `ListingRecord`: one harvested product with its category context
//! - `JobOutcome` / `PartialBatch`: per-job results and the per-shard checkpoint unit

mod batch;
mod job_state;

// Re-export main types
pub use batch::{JobOutcome, ListingRecord, PartialBatch};
pub use job_state::{HarvestJob, JobStatus};
