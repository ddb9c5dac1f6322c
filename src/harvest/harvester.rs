//! Paginated harvesting of one leaf category

use crate::config::Config;
use crate::harvest::fetcher::{Fetcher, RenderedPage, Session};
use crate::harvest::pagination::detect_page_count;
use crate::harvest::retry::{open_with_retry, RetryPolicy};
use crate::sites::{PageParser, VENDOR_LINK_FIELD};
use crate::state::{HarvestJob, JobOutcome, JobStatus, ListingRecord};
use crate::LeafCategory;
use std::sync::Arc;

/// Harvests every listing page of a leaf category
///
/// Pages are fetched strictly in ascending order on a single session. A page
/// whose retries are exhausted ends the job: the records already collected
/// are kept and the job is reported as partial, or as skipped when not even
/// the first page loaded.
#[derive(Clone)]
pub struct Harvester {
    parser: Arc<dyn PageParser>,
    policy: RetryPolicy,
    resolve_vendor_links: bool,
}

impl Harvester {
    pub fn new(parser: Arc<dyn PageParser>, policy: RetryPolicy, resolve_vendor_links: bool) -> Self {
        Self {
            parser,
            policy,
            resolve_vendor_links,
        }
    }

    pub fn from_config(config: &Config, parser: Arc<dyn PageParser>) -> Self {
        Self::new(
            parser,
            RetryPolicy::from_config(&config.harvest),
            config.harvest.resolve_vendor_links,
        )
    }

    /// Runs `job` to a terminal status
    ///
    /// # Arguments
    ///
    /// * `job` - The pending job; its attempt counter and status are updated
    /// * `fetcher` - Opens the job's own session
    ///
    /// # Returns
    ///
    /// The job outcome. Fetch failures never escape this call.
    pub async fn harvest(&self, job: &mut HarvestJob, fetcher: &dyn Fetcher) -> JobOutcome {
        let leaf = Arc::clone(&job.leaf);
        tracing::info!("Harvesting category {}", leaf);

        let Some(listing_url) = self.parser.listing_url(&leaf) else {
            return self.skip(job, "category has no link".to_string());
        };

        let mut session = match fetcher.open_session() {
            Ok(session) => session,
            Err(e) => return self.skip(job, e.to_string()),
        };

        let first = match open_with_retry(session.as_mut(), &listing_url, &self.policy).await {
            Ok((page, attempts)) => {
                job.attempts += attempts;
                page
            }
            Err(failure) => {
                job.attempts += failure.attempts;
                return self.skip(job, format!("page 1: {}", failure.error));
            }
        };

        let indicator = self.parser.extract_pagination_indicator(&first);
        let pages_expected = detect_page_count(indicator.as_deref());
        tracing::debug!("{} has {} page(s)", leaf, pages_expected);

        let mut records = self.records_on(&first, &leaf, session.as_mut()).await;
        let mut pages_harvested = 1;
        let mut error = None;

        for page in 2..=pages_expected {
            let url = self.parser.page_url(&listing_url, page);
            match open_with_retry(session.as_mut(), &url, &self.policy).await {
                Ok((loaded, attempts)) => {
                    job.attempts += attempts;
                    records.extend(self.records_on(&loaded, &leaf, session.as_mut()).await);
                    pages_harvested += 1;
                }
                Err(failure) => {
                    job.attempts += failure.attempts;
                    tracing::warn!(
                        "Abandoning {} at page {}/{}: {}",
                        leaf,
                        page,
                        pages_expected,
                        failure.error
                    );
                    error = Some(format!("page {}: {}", page, failure.error));
                    break;
                }
            }
        }

        job.status = if error.is_some() {
            JobStatus::Partial
        } else {
            JobStatus::Complete
        };

        tracing::info!(
            "Finished {} ({}): {} records from {}/{} pages",
            leaf,
            job.status,
            records.len(),
            pages_harvested,
            pages_expected
        );

        JobOutcome {
            index: job.index,
            leaf,
            status: job.status,
            records,
            pages_expected,
            pages_harvested,
            attempts: job.attempts,
            error,
        }
    }

    fn skip(&self, job: &mut HarvestJob, error: String) -> JobOutcome {
        tracing::warn!("Skipping category {}: {}", job.leaf, error);
        job.status = JobStatus::Skipped;

        let mut outcome = JobOutcome::skipped(job.index, Arc::clone(&job.leaf), error);
        outcome.attempts = job.attempts;
        outcome
    }

    /// Attaches category context to the listings of one page
    async fn records_on(
        &self,
        page: &RenderedPage,
        leaf: &LeafCategory,
        session: &mut dyn Session,
    ) -> Vec<ListingRecord> {
        let mut records = Vec::new();

        for fragment in self.parser.extract_listings(page) {
            let mut record = ListingRecord::new(leaf, fragment.fields);

            if self.resolve_vendor_links {
                if let Some(target) = fragment.vendor_target.as_deref() {
                    let destination = self.resolve_vendor(session, target).await;
                    record.set_field(VENDOR_LINK_FIELD, destination);
                }
            }

            records.push(record);
        }

        records
    }

    /// Best-effort vendor navigation; any failure yields an absent link
    async fn resolve_vendor(&self, session: &mut dyn Session, target: &str) -> Option<String> {
        match tokio::time::timeout(self.policy.attempt_timeout, session.resolve_destination(target))
            .await
        {
            Ok(Ok(destination)) => Some(destination),
            Ok(Err(e)) => {
                tracing::debug!("Vendor link {} not resolved: {}", target, e);
                None
            }
            Err(_) => {
                tracing::debug!("Vendor link {} timed out", target);
                None
            }
        }
    }
}
