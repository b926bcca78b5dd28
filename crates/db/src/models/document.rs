//! Content document rows.

use pressroom_core::block::Block;
use pressroom_core::document::ContentDocument;
use pressroom_core::error::CoreError;
use pressroom_core::types::{DbId, Timestamp};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `content_documents` table.
#[derive(Debug, Clone, FromRow)]
pub struct DocumentRow {
    pub id: DbId,
    pub kind: String,
    pub slug: String,
    pub title: String,
    pub content: Json<Vec<Block>>,
    pub meta: serde_json::Value,
    pub status: String,
    pub scheduled_at: Option<Timestamp>,
    pub published_at: Option<Timestamp>,
    pub author_id: Option<DbId>,
    pub reviewer_id: Option<DbId>,
    pub reviewed_at: Option<Timestamp>,
    pub review_feedback: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub created_by: Option<DbId>,
    pub updated_by: Option<DbId>,
}

impl TryFrom<DocumentRow> for ContentDocument {
    type Error = CoreError;

    fn try_from(row: DocumentRow) -> Result<Self, Self::Error> {
        Ok(ContentDocument {
            id: row.id,
            kind: row.kind.parse()?,
            slug: row.slug,
            title: row.title,
            blocks: row.content.0,
            meta: row.meta,
            status: row.status.parse()?,
            scheduled_at: row.scheduled_at,
            published_at: row.published_at,
            author_id: row.author_id,
            reviewer_id: row.reviewer_id,
            reviewed_at: row.reviewed_at,
            review_feedback: row.review_feedback,
            created_at: row.created_at,
            updated_at: row.updated_at,
            created_by: row.created_by,
            updated_by: row.updated_by,
        })
    }
}
