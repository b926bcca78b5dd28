//! Content version rows.

use pressroom_core::block::Block;
use pressroom_core::types::{DbId, Timestamp};
use pressroom_core::version::VersionSnapshot;
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `content_versions` table.
#[derive(Debug, Clone, FromRow)]
pub struct VersionRow {
    pub id: DbId,
    pub document_id: DbId,
    pub version_number: i32,
    pub title: String,
    pub content: Json<Vec<Block>>,
    pub meta: serde_json::Value,
    pub created_at: Timestamp,
    pub created_by: Option<DbId>,
}

impl From<VersionRow> for VersionSnapshot {
    fn from(row: VersionRow) -> Self {
        VersionSnapshot {
            id: row.id,
            document_id: row.document_id,
            version_number: row.version_number,
            title: row.title,
            blocks: row.content.0,
            meta: row.meta,
            created_at: row.created_at,
            created_by: row.created_by,
        }
    }
}
