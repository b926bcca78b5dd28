//! Durable event persistence service.
//!
//! [`EventPersistence`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! and writes every received [`ContentEvent`] to `content_events`. It runs
//! as a long-lived background task and stops when the bus is dropped or the
//! cancellation token fires.

use pressroom_core::types::DbId;
use pressroom_db::models::event::NewEventRow;
use pressroom_db::repositories::EventRepo;
use pressroom_db::DbPool;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::bus::ContentEvent;

/// Background service that persists content events to the database.
pub struct EventPersistence;

impl EventPersistence {
    /// Run the persistence loop until the channel closes or `cancel` fires.
    pub async fn run(
        pool: DbPool,
        mut receiver: broadcast::Receiver<ContentEvent>,
        cancel: CancellationToken,
    ) {
        loop {
            let received = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Event persistence cancelled");
                    break;
                }
                received = receiver.recv() => received,
            };
            match received {
                Ok(event) => {
                    if let Err(e) = Self::persist(&pool, &event).await {
                        tracing::error!(
                            error = %e,
                            event = %event.kind,
                            document_id = event.document_id,
                            "Failed to persist event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        skipped = n,
                        "Event persistence lagged, some events were not persisted"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, persistence shutting down");
                    break;
                }
            }
        }
    }

    /// Write a single event to the `content_events` table.
    pub async fn persist(pool: &DbPool, event: &ContentEvent) -> Result<DbId, sqlx::Error> {
        let payload = event.body();
        EventRepo::insert(
            pool,
            &NewEventRow {
                event_type: event.kind.as_str(),
                document_id: event.document_id,
                document_kind: event.document_kind.as_str(),
                actor_user_id: event.actor_user_id,
                payload: &payload,
                occurred_at: event.timestamp,
            },
        )
        .await
    }
}
