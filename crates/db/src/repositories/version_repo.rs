//! Repository for the `content_versions` table.
//!
//! Versions are immutable snapshots numbered per document. The next number
//! is computed inside the insert, so callers holding the document row lock
//! (any `UPDATE` in the same transaction) get gap-free numbering.

use pressroom_core::types::DbId;
use pressroom_core::version::NewVersion;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use crate::models::version::VersionRow;

/// Column list for content_versions queries.
const COLUMNS: &str =
    "id, document_id, version_number, title, content, meta, created_at, created_by";

/// Provides create and read operations for content versions.
pub struct VersionRepo;

impl VersionRepo {
    /// Append the next snapshot for `version.document_id`.
    pub async fn insert_next(
        conn: &mut PgConnection,
        version: &NewVersion,
    ) -> Result<VersionRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO content_versions \
                (document_id, version_number, title, content, meta, created_at, created_by) \
             SELECT $1, COALESCE(MAX(version_number), 0) + 1, $2, $3, $4, $5, $6 \
             FROM content_versions WHERE document_id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, VersionRow>(&query)
            .bind(version.document_id)
            .bind(&version.title)
            .bind(Json(&version.blocks))
            .bind(&version.meta)
            .bind(version.created_at)
            .bind(version.created_by)
            .fetch_one(conn)
            .await
    }

    /// List versions of a document, newest first.
    pub async fn list_by_document(
        pool: &PgPool,
        document_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<VersionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM content_versions \
             WHERE document_id = $1 \
             ORDER BY version_number DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, VersionRow>(&query)
            .bind(document_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Find one version belonging to a document.
    pub async fn find(
        pool: &PgPool,
        document_id: DbId,
        version_id: DbId,
    ) -> Result<Option<VersionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM content_versions WHERE id = $1 AND document_id = $2"
        );
        sqlx::query_as::<_, VersionRow>(&query)
            .bind(version_id)
            .bind(document_id)
            .fetch_optional(pool)
            .await
    }

    /// Number of versions stored for a document.
    pub async fn count_by_document(pool: &PgPool, document_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM content_versions WHERE document_id = $1")
            .bind(document_id)
            .fetch_one(pool)
            .await
    }
}
