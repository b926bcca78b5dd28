//! Scheduled publishing.
//!
//! [`ScheduledPublisher`] periodically scans for reviewing documents whose
//! `scheduled_at` has elapsed and publishes each exactly as a manual approval
//! would. Every write is a compare-and-swap on the row read by the scan and
//! on the schedule still being due, so a human action that lands first (a
//! reject, an approval, a reschedule) wins and the scheduler skips the row.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use pressroom_core::document::ContentDocument;
use pressroom_core::error::CoreError;
use pressroom_core::store::{Commit, DocumentStore};
use pressroom_core::types::{DbId, Timestamp};
use pressroom_core::workflow::publish_if_due;
use pressroom_events::{ContentEvent, EventBus, EventKind};
use tokio_util::sync::CancellationToken;

/// Default poll interval.
pub const DEFAULT_INTERVAL_SECS: u64 = 60;

/// Default maximum number of due documents handled per pass.
pub const DEFAULT_BATCH_LIMIT: i64 = 100;

/// Scheduler configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub interval: Duration,
    pub batch_limit: i64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            batch_limit: DEFAULT_BATCH_LIMIT,
        }
    }
}

impl SchedulerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default |
    /// |---------------------------|---------|
    /// | `SCHEDULER_INTERVAL_SECS` | `60`    |
    /// | `SCHEDULER_BATCH_LIMIT`   | `100`   |
    pub fn from_env() -> Self {
        let interval_secs: u64 = std::env::var("SCHEDULER_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_INTERVAL_SECS);
        let batch_limit: i64 = std::env::var("SCHEDULER_BATCH_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|limit| *limit > 0)
            .unwrap_or(DEFAULT_BATCH_LIMIT);
        Self {
            interval: Duration::from_secs(interval_secs),
            batch_limit,
        }
    }
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Documents this pass published.
    pub published: Vec<DbId>,
    /// Due documents another writer got to first.
    pub skipped: Vec<DbId>,
    /// Due documents whose commit failed for another reason.
    pub failed: Vec<DbId>,
}

pub struct ScheduledPublisher {
    store: Arc<dyn DocumentStore>,
    events: Arc<EventBus>,
    config: SchedulerConfig,
}

impl ScheduledPublisher {
    pub fn new(store: Arc<dyn DocumentStore>, events: Arc<EventBus>, config: SchedulerConfig) -> Self {
        Self {
            store,
            events,
            config,
        }
    }

    /// Run the reconciliation loop until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!(
            interval_secs = self.config.interval.as_secs(),
            batch_limit = self.config.batch_limit,
            "Scheduled publisher started"
        );

        let mut interval = tokio::time::interval(self.config.interval);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Scheduled publisher stopping");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.reconcile_once(Utc::now()).await {
                        tracing::error!(error = %e, "Scheduled publish pass failed");
                    }
                }
            }
        }
    }

    /// Publish every document that is due at `now`.
    ///
    /// Only a failed scan is an error. Per-document outcomes are reported.
    pub async fn reconcile_once(&self, now: Timestamp) -> Result<ReconcileReport, CoreError> {
        let due = self.store.list_due(now, self.config.batch_limit).await?;
        let mut report = ReconcileReport::default();

        for doc in &due {
            match self.publish_one(doc, now).await {
                Ok(true) => report.published.push(doc.id),
                Ok(false) => report.skipped.push(doc.id),
                Err(e) => {
                    tracing::error!(
                        document_id = doc.id,
                        error = %e,
                        "Scheduled publish failed"
                    );
                    report.failed.push(doc.id);
                }
            }
        }

        if !report.published.is_empty() {
            tracing::info!(
                published = report.published.len(),
                skipped = report.skipped.len(),
                "Scheduled publish pass complete"
            );
        } else {
            tracing::debug!(due = due.len(), "Scheduled publish pass: nothing published");
        }
        Ok(report)
    }

    /// Publish `doc` if it is still due. Returns `false` on a lost race.
    pub async fn publish_one(&self, doc: &ContentDocument, now: Timestamp) -> Result<bool, CoreError> {
        let Some(next) = publish_if_due(doc, now) else {
            tracing::debug!(document_id = doc.id, "Document no longer due, skipping");
            return Ok(false);
        };

        match self
            .store
            .commit(Commit::transition(doc, next).due_by(now))
            .await
        {
            Ok(committed) => {
                let published = committed.document;
                tracing::info!(
                    document_id = published.id,
                    slug = %published.slug,
                    status = %published.status,
                    "Scheduled document published"
                );
                self.events
                    .publish(ContentEvent::new(EventKind::Published, &published));
                Ok(true)
            }
            Err(e) if e.is_conflict() || matches!(e, CoreError::NotFound { .. }) => {
                tracing::debug!(
                    document_id = doc.id,
                    "Document changed since scan, scheduled publish skipped"
                );
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}
