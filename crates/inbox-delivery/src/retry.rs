//! Retry sweeper for failed uploads.
//!
//! A sweep selects every item in `failed` state whose retry count is below
//! the automatic retry cap and re-dispatches them one at a time, each full
//! dispatch completing before the next starts. Items at or above the cap
//! are left for manual retry.

use std::{sync::Arc, time::Duration};

use inbox_core::{Clock, ContentId, ContentItem, UploadStatus};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::dispatch::{DispatchOutcome, Dispatcher};

/// Automatic retry eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Items with this many failures or more are never retried
    /// automatically.
    pub max_automatic_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_automatic_retries: crate::DEFAULT_MAX_AUTOMATIC_RETRIES }
    }
}

impl RetryPolicy {
    /// Creates a policy with the given cap.
    pub fn new(max_automatic_retries: u32) -> Self {
        Self { max_automatic_retries }
    }

    /// Returns true if a sweep should re-dispatch this item.
    pub fn is_eligible(&self, item: &ContentItem) -> bool {
        item.upload_status == UploadStatus::Failed
            && item.retry_count < self.max_automatic_retries
    }
}

/// Result of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Items re-dispatched, in the order they were attempted.
    pub attempted: Vec<ContentId>,
    /// Dispatches that ended in `success`.
    pub succeeded: usize,
    /// Dispatches that ended in `failed` again.
    pub failed: usize,
}

impl SweepReport {
    /// Returns true if no item was eligible.
    pub fn is_empty(&self) -> bool {
        self.attempted.is_empty()
    }

    fn record(&mut self, id: ContentId, outcome: DispatchOutcome) {
        self.attempted.push(id);
        match outcome.final_status() {
            Some(UploadStatus::Success) => self.succeeded += 1,
            Some(UploadStatus::Failed) => self.failed += 1,
            _ => {},
        }
    }
}

/// Re-dispatches failed items, on demand or periodically.
#[derive(Debug)]
pub struct RetrySweeper {
    dispatcher: Arc<Dispatcher>,
    policy: RetryPolicy,
    clock: Arc<dyn Clock>,
}

impl RetrySweeper {
    /// Creates a sweeper over the dispatcher's content registry.
    pub fn new(dispatcher: Arc<Dispatcher>, policy: RetryPolicy, clock: Arc<dyn Clock>) -> Self {
        Self { dispatcher, policy, clock }
    }

    /// Eligibility policy in use.
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Runs one sweep over the current items.
    ///
    /// Items are processed sequentially in registry order (most recent
    /// first). Never fails; per-item results land in the item status.
    pub async fn retry_failed_uploads(&self) -> SweepReport {
        let eligible: Vec<ContentId> = self
            .dispatcher
            .content()
            .items()
            .await
            .iter()
            .filter(|item| self.policy.is_eligible(item))
            .map(|item| item.id)
            .collect();

        let mut report = SweepReport::default();
        if eligible.is_empty() {
            debug!("retry sweep found no eligible items");
            return report;
        }

        info!(eligible = eligible.len(), "retrying failed uploads");

        for id in eligible {
            let outcome = self.dispatcher.upload_to_all_webhooks(id).await;
            debug!(content_id = %id, ?outcome, "retry dispatch finished");
            report.record(id, outcome);
        }

        info!(
            attempted = report.attempted.len(),
            succeeded = report.succeeded,
            failed = report.failed,
            "retry sweep complete"
        );
        report
    }

    /// Sweeps immediately, then once per `interval`, until cancelled.
    ///
    /// Cancellation is checked between sweeps; a sweep in progress runs to
    /// completion.
    pub async fn run_periodic(&self, interval: Duration, cancellation_token: CancellationToken) {
        info!(interval_secs = interval.as_secs(), "periodic retry sweeper starting");

        loop {
            if cancellation_token.is_cancelled() {
                break;
            }

            self.retry_failed_uploads().await;

            tokio::select! {
                () = self.clock.sleep(interval) => {},
                () = cancellation_token.cancelled() => break,
            }
        }

        info!("periodic retry sweeper stopped");
    }
}
