//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`ContentEvent`]s. It is
//! shared via `Arc<EventBus>` between the engine, the API and the worker.

use chrono::{DateTime, Utc};
use pressroom_core::document::{ContentDocument, DocumentKind};
use pressroom_core::types::DbId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// EventKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Created,
    Updated,
    Published,
    Unpublished,
    Archived,
    Deleted,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Created => "created",
            EventKind::Updated => "updated",
            EventKind::Published => "published",
            EventKind::Unpublished => "unpublished",
            EventKind::Archived => "archived",
            EventKind::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ContentEvent
// ---------------------------------------------------------------------------

/// Something that happened to a content document.
///
/// Constructed via [`ContentEvent::new`] from the committed document and
/// enriched with [`with_actor`](ContentEvent::with_actor) and
/// [`with_payload`](ContentEvent::with_payload).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentEvent {
    pub kind: EventKind,
    pub document_id: DbId,
    pub document_kind: DocumentKind,
    pub slug: String,
    pub title: String,
    pub actor_user_id: Option<DbId>,
    /// Event-specific extras, merged into the persisted payload.
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl ContentEvent {
    pub fn new(kind: EventKind, doc: &ContentDocument) -> Self {
        Self {
            kind,
            document_id: doc.id,
            document_kind: doc.kind,
            slug: doc.slug.clone(),
            title: doc.title.clone(),
            actor_user_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// Attach the acting user, if known. Scheduler events have none.
    pub fn with_actor(mut self, user_id: Option<DbId>) -> Self {
        self.actor_user_id = user_id;
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// The `{documentId, slug, title}` body every consumer receives, with
    /// any extra payload fields merged in.
    pub fn body(&self) -> serde_json::Value {
        let mut body = serde_json::json!({
            "documentId": self.document_id,
            "kind": self.document_kind,
            "slug": self.slug,
            "title": self.title,
        });
        if let (Some(target), Some(extra)) = (body.as_object_mut(), self.payload.as_object()) {
            for (key, value) in extra {
                target.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }
        body
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
pub struct EventBus {
    sender: broadcast::Sender<ContentEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest unconsumed messages are dropped
    /// and slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// With no subscribers the event is dropped.
    pub fn publish(&self, event: ContentEvent) {
        tracing::debug!(
            event = %event.kind,
            document_id = event.document_id,
            slug = %event.slug,
            "Publishing content event"
        );
        // A SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ContentEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
