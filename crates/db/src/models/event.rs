//! Content event rows.

use pressroom_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `content_events` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EventRow {
    pub id: DbId,
    pub event_type: String,
    pub document_id: DbId,
    pub document_kind: String,
    pub actor_user_id: Option<DbId>,
    pub payload: serde_json::Value,
    pub occurred_at: Timestamp,
    pub created_at: Timestamp,
}

/// Insert DTO for an event row.
#[derive(Debug, Clone)]
pub struct NewEventRow<'a> {
    pub event_type: &'a str,
    pub document_id: DbId,
    pub document_kind: &'a str,
    pub actor_user_id: Option<DbId>,
    pub payload: &'a serde_json::Value,
    pub occurred_at: Timestamp,
}
