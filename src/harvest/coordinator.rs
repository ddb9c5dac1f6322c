//! Sharded worker pool
//!
//! The leaf list is split into shards that run one after another. Within a
//! shard, up to `workers` jobs run concurrently, each on its own session. A
//! shard's checkpoint is written once every job in it has reached a terminal
//! status, before the next shard is dispatched.

use crate::config::PoolConfig;
use crate::harvest::fetcher::Fetcher;
use crate::harvest::harvester::Harvester;
use crate::output::Aggregator;
use crate::state::{HarvestJob, JobOutcome, JobStatus, PartialBatch};
use crate::storage::Sink;
use crate::LeafCategory;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::Instrument;

/// Splits `items` into `shards` contiguous parts whose sizes differ by at most one
///
/// The first `items.len() % shards` parts get the extra item. When there are
/// fewer items than shards, the trailing parts are empty.
pub fn split_into_shards<T: Clone>(items: &[T], shards: usize) -> Vec<Vec<T>> {
    let shards = shards.max(1);
    let base = items.len() / shards;
    let extra = items.len() % shards;

    let mut parts = Vec::with_capacity(shards);
    let mut start = 0;
    for shard in 0..shards {
        let size = base + usize::from(shard < extra);
        parts.push(items[start..start + size].to_vec());
        start += size;
    }
    parts
}

/// Drives harvest jobs shard by shard
pub struct Orchestrator {
    harvester: Harvester,
    fetcher: Arc<dyn Fetcher>,
    shards: usize,
    workers: usize,
}

impl Orchestrator {
    pub fn new(harvester: Harvester, fetcher: Arc<dyn Fetcher>, pool: &PoolConfig) -> Self {
        Self {
            harvester,
            fetcher,
            shards: pool.shards.max(1),
            workers: pool.workers.max(1),
        }
    }

    /// Harvests every leaf, checkpointing each shard through `sink`
    ///
    /// # Arguments
    ///
    /// * `leaves` - The resolved leaf categories, in resolution order
    /// * `sink` - Receives one checkpoint per shard
    ///
    /// # Returns
    ///
    /// An aggregator holding every shard's batch
    pub async fn run(&self, leaves: &[LeafCategory], sink: &mut dyn Sink) -> Aggregator {
        let leaves: Vec<Arc<LeafCategory>> = leaves.iter().cloned().map(Arc::new).collect();
        let shards = split_into_shards(&leaves, self.shards);
        let shard_count = shards.len();
        let mut aggregator = Aggregator::new();

        for (shard_index, shard) in shards.into_iter().enumerate() {
            tracing::info!(
                "Dispatching shard {}/{} ({} categories)",
                shard_index + 1,
                shard_count,
                shard.len()
            );

            let batch = self.run_shard(shard_index, shard).await;

            tracing::info!(
                "Shard {} done: {} complete, {} partial, {} skipped, {} records",
                shard_index + 1,
                batch.count_status(JobStatus::Complete),
                batch.count_status(JobStatus::Partial),
                batch.count_status(JobStatus::Skipped),
                batch.record_count()
            );

            match sink.write_batch(&batch) {
                Ok(()) => tracing::debug!("Checkpoint written for shard {}", shard_index),
                Err(e) => tracing::error!("Failed to checkpoint shard {}: {}", shard_index, e),
            }

            if let Err(e) = aggregator.add(batch) {
                tracing::warn!("{}", e);
            }
        }

        aggregator
    }

    /// Runs one shard's jobs to completion under the worker bound
    async fn run_shard(&self, shard_index: usize, leaves: Vec<Arc<LeafCategory>>) -> PartialBatch {
        let semaphore = Arc::new(Semaphore::new(self.workers.min(leaves.len()).max(1)));
        let mut handles = Vec::with_capacity(leaves.len());

        for (index, leaf) in leaves.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let harvester = self.harvester.clone();
            let fetcher = Arc::clone(&self.fetcher);
            let mut job = HarvestJob::new(index, Arc::clone(&leaf));
            let span = tracing::info_span!("job", shard = shard_index, category = %leaf);

            let handle = tokio::spawn(
                async move {
                    // The semaphore is never closed, so acquisition only waits
                    let _permit = semaphore.acquire_owned().await.ok();
                    harvester.harvest(&mut job, fetcher.as_ref()).await
                }
                .instrument(span),
            );
            handles.push((index, leaf, handle));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (index, leaf, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("Worker for {} crashed: {}", leaf, e);
                    JobOutcome::skipped(index, leaf, format!("worker crashed: {}", e))
                }
            };
            outcomes.push(outcome);
        }

        PartialBatch::new(shard_index, outcomes)
    }
}
