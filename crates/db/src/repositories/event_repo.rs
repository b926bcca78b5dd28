//! Repository for the `content_events` table.

use pressroom_core::types::DbId;
use sqlx::PgPool;

use crate::models::event::{EventRow, NewEventRow};

/// Column list for content_events queries.
const COLUMNS: &str =
    "id, event_type, document_id, document_kind, actor_user_id, payload, occurred_at, created_at";

/// Provides write and read operations for persisted content events.
pub struct EventRepo;

impl EventRepo {
    /// Insert a new event row, returning the generated ID.
    pub async fn insert(pool: &PgPool, event: &NewEventRow<'_>) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO content_events \
                (event_type, document_id, document_kind, actor_user_id, payload, occurred_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id",
        )
        .bind(event.event_type)
        .bind(event.document_id)
        .bind(event.document_kind)
        .bind(event.actor_user_id)
        .bind(event.payload)
        .bind(event.occurred_at)
        .fetch_one(pool)
        .await
    }

    /// List events for one document, newest first.
    pub async fn list_by_document(
        pool: &PgPool,
        document_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<EventRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM content_events WHERE document_id = $1 \
             ORDER BY occurred_at DESC, id DESC LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, EventRow>(&query)
            .bind(document_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}
