//! Repository for the `content_documents` table.
//!
//! Every read filters out soft-deleted rows. Writes to existing rows are
//! conditional on the caller's last-read `updated_at` and return `None` when
//! that precondition no longer holds.

use pressroom_core::document::ContentDocument;
use pressroom_core::types::{DbId, Timestamp};
use pressroom_core::workflow::DocumentStatus;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use crate::models::document::DocumentRow;

/// Column list for content_documents queries.
const COLUMNS: &str = "id, kind, slug, title, content, meta, status, scheduled_at, published_at, \
    author_id, reviewer_id, reviewed_at, review_feedback, created_at, updated_at, \
    created_by, updated_by";

/// Name of the partial unique index guarding `(kind, slug)` on live rows.
pub const SLUG_CONSTRAINT: &str = "uq_content_documents_kind_slug";

/// Provides CRUD operations for content documents.
pub struct DocumentRepo;

impl DocumentRepo {
    /// Insert a freshly materialized draft. `doc.id` is ignored; the row
    /// gets the next sequence value.
    pub async fn insert(
        conn: &mut PgConnection,
        doc: &ContentDocument,
    ) -> Result<DocumentRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO content_documents \
                (kind, slug, title, content, meta, status, author_id, \
                 created_at, updated_at, created_by, updated_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DocumentRow>(&query)
            .bind(doc.kind.as_str())
            .bind(&doc.slug)
            .bind(&doc.title)
            .bind(Json(&doc.blocks))
            .bind(&doc.meta)
            .bind(doc.status.as_str())
            .bind(doc.author_id)
            .bind(doc.created_at)
            .bind(doc.updated_at)
            .bind(doc.created_by)
            .bind(doc.updated_by)
            .fetch_one(conn)
            .await
    }

    /// Find a live document by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<DocumentRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM content_documents WHERE id = $1 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, DocumentRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a live document by kind and slug.
    pub async fn find_by_slug(
        pool: &PgPool,
        kind: &str,
        slug: &str,
    ) -> Result<Option<DocumentRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM content_documents \
             WHERE kind = $1 AND slug = $2 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, DocumentRow>(&query)
            .bind(kind)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// List live documents, optionally filtered, most recently updated first.
    pub async fn list(
        pool: &PgPool,
        kind: Option<&str>,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<DocumentRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM content_documents \
             WHERE deleted_at IS NULL \
               AND ($1::TEXT IS NULL OR kind = $1) \
               AND ($2::TEXT IS NULL OR status = $2) \
             ORDER BY updated_at DESC, id DESC \
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, DocumentRow>(&query)
            .bind(kind)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Reviewing documents whose schedule has come due, oldest first.
    pub async fn list_due(
        pool: &PgPool,
        now: Timestamp,
        limit: i64,
    ) -> Result<Vec<DocumentRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM content_documents \
             WHERE status = $1 AND scheduled_at IS NOT NULL AND scheduled_at <= $2 \
               AND deleted_at IS NULL \
             ORDER BY scheduled_at ASC, id ASC \
             LIMIT $3"
        );
        sqlx::query_as::<_, DocumentRow>(&query)
            .bind(DocumentStatus::Reviewing.as_str())
            .bind(now)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Overwrite a live row with `doc` if it still carries `expected_updated_at`
    /// and `expected_status` (and, when `due_by` is set, is still scheduled at
    /// or before it).
    ///
    /// Returns `None` without writing if any precondition fails.
    pub async fn update_if_current(
        conn: &mut PgConnection,
        doc: &ContentDocument,
        expected_updated_at: Timestamp,
        expected_status: DocumentStatus,
        due_by: Option<Timestamp>,
    ) -> Result<Option<DocumentRow>, sqlx::Error> {
        let query = format!(
            "UPDATE content_documents SET \
                slug = $2, title = $3, content = $4, meta = $5, status = $6, \
                scheduled_at = $7, published_at = $8, reviewer_id = $9, reviewed_at = $10, \
                review_feedback = $11, updated_at = $12, updated_by = $13 \
             WHERE id = $1 AND deleted_at IS NULL \
               AND updated_at = $14 AND status = $15 \
               AND ($16::TIMESTAMPTZ IS NULL OR scheduled_at <= $16) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DocumentRow>(&query)
            .bind(doc.id)
            .bind(&doc.slug)
            .bind(&doc.title)
            .bind(Json(&doc.blocks))
            .bind(&doc.meta)
            .bind(doc.status.as_str())
            .bind(doc.scheduled_at)
            .bind(doc.published_at)
            .bind(doc.reviewer_id)
            .bind(doc.reviewed_at)
            .bind(&doc.review_feedback)
            .bind(doc.updated_at)
            .bind(doc.updated_by)
            .bind(expected_updated_at)
            .bind(expected_status.as_str())
            .bind(due_by)
            .fetch_optional(conn)
            .await
    }

    /// Soft-delete a live row if it still carries `expected_updated_at`.
    ///
    /// Returns the row as it was, or `None` if the precondition failed.
    pub async fn soft_delete_if_current(
        pool: &PgPool,
        id: DbId,
        expected_updated_at: Timestamp,
    ) -> Result<Option<DocumentRow>, sqlx::Error> {
        let query = format!(
            "UPDATE content_documents SET deleted_at = NOW() \
             WHERE id = $1 AND updated_at = $2 AND deleted_at IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DocumentRow>(&query)
            .bind(id)
            .bind(expected_updated_at)
            .fetch_optional(pool)
            .await
    }

    /// Whether a live row with this ID exists.
    pub async fn exists<'c, E>(executor: E, id: DbId) -> Result<bool, sqlx::Error>
    where
        E: sqlx::PgExecutor<'c>,
    {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM content_documents WHERE id = $1 AND deleted_at IS NULL)",
        )
        .bind(id)
        .fetch_one(executor)
        .await
    }
}
