//! Scheduled publishing against the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use pressroom_core::document::{ContentDocument, DocumentKind, NewDocument};
use pressroom_core::error::CoreError;
use pressroom_core::memory::MemoryDocumentStore;
use pressroom_core::roles::Role;
use pressroom_core::store::{Commit, Committed, DocumentFilter, DocumentStore};
use pressroom_core::types::{DbId, Timestamp};
use pressroom_core::version::VersionSnapshot;
use pressroom_core::workflow::{apply_transition, DocumentStatus, Transition};
use pressroom_engine::{ContentService, ScheduledPublisher, SchedulerConfig};
use pressroom_events::{ContentEvent, EventBus, EventKind};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn published_events(rx: &mut broadcast::Receiver<ContentEvent>) -> usize {
    let mut count = 0;
    while let Ok(event) = rx.try_recv() {
        if event.kind == EventKind::Published {
            count += 1;
        }
    }
    count
}

async fn submit_scheduled(
    service: &ContentService,
    title: &str,
    offset: chrono::Duration,
) -> ContentDocument {
    let doc = service
        .create(NewDocument::new(DocumentKind::Post, title))
        .await
        .unwrap()
        .document;
    service
        .transition(
            doc.id,
            None,
            Transition::Submit {
                scheduled_at: Some(Utc::now() + offset),
            },
            Role::Author,
            Some(1),
        )
        .await
        .unwrap()
}

/// Delegates to an in-memory store, but lets an approver reject every due
/// document between the scheduler's scan and its commit.
struct RejectAfterScan {
    inner: MemoryDocumentStore,
}

#[async_trait]
impl DocumentStore for RejectAfterScan {
    async fn create(&self, input: &NewDocument, slug: &str) -> Result<Committed, CoreError> {
        self.inner.create(input, slug).await
    }

    async fn find(&self, id: DbId) -> Result<Option<ContentDocument>, CoreError> {
        self.inner.find(id).await
    }

    async fn find_by_slug(
        &self,
        kind: DocumentKind,
        slug: &str,
    ) -> Result<Option<ContentDocument>, CoreError> {
        self.inner.find_by_slug(kind, slug).await
    }

    async fn list(&self, filter: &DocumentFilter) -> Result<Vec<ContentDocument>, CoreError> {
        self.inner.list(filter).await
    }

    async fn commit(&self, commit: Commit) -> Result<Committed, CoreError> {
        self.inner.commit(commit).await
    }

    async fn soft_delete(
        &self,
        id: DbId,
        expected_updated_at: Timestamp,
    ) -> Result<ContentDocument, CoreError> {
        self.inner.soft_delete(id, expected_updated_at).await
    }

    async fn list_versions(
        &self,
        document_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<VersionSnapshot>, CoreError> {
        self.inner.list_versions(document_id, limit, offset).await
    }

    async fn find_version(
        &self,
        document_id: DbId,
        version_id: DbId,
    ) -> Result<Option<VersionSnapshot>, CoreError> {
        self.inner.find_version(document_id, version_id).await
    }

    async fn list_due(&self, now: Timestamp, limit: i64) -> Result<Vec<ContentDocument>, CoreError> {
        let due = self.inner.list_due(now, limit).await?;
        for doc in &due {
            let rejected = apply_transition(
                doc,
                &Transition::Reject {
                    feedback: Some("Not yet".into()),
                },
                Role::Approver,
                Some(2),
                Utc::now(),
            )
            .map_err(CoreError::from)?;
            self.inner.commit(Commit::transition(doc, rejected)).await?;
        }
        Ok(due)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn due_document_is_published_exactly_once() {
    let store = Arc::new(MemoryDocumentStore::new());
    let bus = Arc::new(EventBus::default());
    let mut rx = bus.subscribe();
    let service = ContentService::new(store.clone(), bus.clone());
    let publisher = ScheduledPublisher::new(store.clone(), bus, SchedulerConfig::default());

    let doc = submit_scheduled(&service, "Launch", -chrono::Duration::seconds(1)).await;
    assert_eq!(doc.status, DocumentStatus::Reviewing);
    assert!(doc.scheduled_at.is_some());

    let report = publisher.reconcile_once(Utc::now()).await.unwrap();
    assert_eq!(report.published, vec![doc.id]);

    let published = service.get(doc.id).await.unwrap();
    assert_eq!(published.status, DocumentStatus::Published);
    assert!(published.scheduled_at.is_none());
    assert!(published.published_at.is_some());
    assert!(published.reviewed_at.is_some());
    assert_eq!(published_events(&mut rx), 1);

    // A second pass finds nothing to do.
    let again = publisher.reconcile_once(Utc::now()).await.unwrap();
    assert!(again.published.is_empty());
    assert_eq!(published_events(&mut rx), 0);
}

#[tokio::test]
async fn future_schedule_is_left_alone() {
    let store = Arc::new(MemoryDocumentStore::new());
    let bus = Arc::new(EventBus::default());
    let service = ContentService::new(store.clone(), bus.clone());
    let publisher = ScheduledPublisher::new(store.clone(), bus, SchedulerConfig::default());

    let doc = submit_scheduled(&service, "Later", chrono::Duration::hours(2)).await;
    let report = publisher.reconcile_once(Utc::now()).await.unwrap();
    assert!(report.published.is_empty());
    assert_eq!(
        service.get(doc.id).await.unwrap().status,
        DocumentStatus::Reviewing
    );

    // Once the clock passes the schedule it goes live.
    let report = publisher
        .reconcile_once(Utc::now() + chrono::Duration::hours(3))
        .await
        .unwrap();
    assert_eq!(report.published, vec![doc.id]);
}

#[tokio::test]
async fn human_reject_first_means_no_scheduled_write() {
    let store = Arc::new(RejectAfterScan {
        inner: MemoryDocumentStore::new(),
    });
    let bus = Arc::new(EventBus::default());
    let mut rx = bus.subscribe();
    let service = ContentService::new(store.clone(), bus.clone());
    let publisher = ScheduledPublisher::new(store.clone(), bus, SchedulerConfig::default());

    let doc = submit_scheduled(&service, "Contested", -chrono::Duration::seconds(5)).await;

    let report = publisher.reconcile_once(Utc::now()).await.unwrap();
    assert!(report.published.is_empty());
    assert_eq!(report.skipped, vec![doc.id]);
    assert!(report.failed.is_empty());

    let stored = service.get(doc.id).await.unwrap();
    assert_eq!(stored.status, DocumentStatus::Draft);
    assert!(stored.published_at.is_none());
    assert_eq!(stored.review_feedback.as_deref(), Some("Not yet"));
    assert_eq!(published_events(&mut rx), 0);
}

#[tokio::test]
async fn rescheduled_document_is_skipped() {
    let store = Arc::new(MemoryDocumentStore::new());
    let bus = Arc::new(EventBus::default());
    let service = ContentService::new(store.clone(), bus.clone());
    let publisher = ScheduledPublisher::new(store.clone(), bus, SchedulerConfig::default());

    let doc = submit_scheduled(&service, "Moved", -chrono::Duration::seconds(5)).await;
    let now = Utc::now();
    let scanned = store.list_due(now, 10).await.unwrap();
    assert_eq!(scanned.len(), 1);

    service
        .transition(
            doc.id,
            None,
            Transition::Reschedule {
                scheduled_at: Some(now + chrono::Duration::days(1)),
            },
            Role::Approver,
            Some(2),
        )
        .await
        .unwrap();

    assert!(!publisher.publish_one(&scanned[0], now).await.unwrap());
    assert_eq!(
        service.get(doc.id).await.unwrap().status,
        DocumentStatus::Reviewing
    );
}

#[tokio::test]
async fn run_publishes_until_cancelled() {
    let store = Arc::new(MemoryDocumentStore::new());
    let bus = Arc::new(EventBus::default());
    let service = ContentService::new(store.clone(), bus.clone());
    let publisher = ScheduledPublisher::new(
        store.clone(),
        bus,
        SchedulerConfig {
            interval: Duration::from_millis(10),
            batch_limit: 10,
        },
    );

    let doc = submit_scheduled(&service, "Looped", -chrono::Duration::seconds(1)).await;

    let cancel = CancellationToken::new();
    let handle = {
        let cancel = cancel.clone();
        tokio::spawn(async move { publisher.run(cancel).await })
    };

    let mut published = false;
    for _ in 0..100 {
        if service.get(doc.id).await.unwrap().status == DocumentStatus::Published {
            published = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cancel.cancel();
    handle.await.unwrap();
    assert!(published);
}
