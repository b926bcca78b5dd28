//! PostgreSQL-backed [`DocumentStore`].
//!
//! Commits run in one transaction: the conditional `UPDATE` takes the row
//! lock, then the version snapshot (for saves) is appended. When the update
//! matches nothing, an existence check decides between `NotFound` and
//! `ConcurrencyConflict`, and the transaction is dropped without writing.

use async_trait::async_trait;
use chrono::Utc;
use pressroom_core::document::{ContentDocument, DocumentKind, NewDocument};
use pressroom_core::error::CoreError;
use pressroom_core::store::{Commit, Committed, DocumentFilter, DocumentStore, ENTITY_DOCUMENT};
use pressroom_core::types::{DbId, Timestamp};
use pressroom_core::version::{NewVersion, VersionSnapshot};

use crate::models::document::DocumentRow;
use crate::repositories::document_repo::SLUG_CONSTRAINT;
use crate::repositories::{DocumentRepo, VersionRepo};
use crate::DbPool;

/// A [`DocumentStore`] over a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: DbPool,
}

impl PgDocumentStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

/// Translate a sqlx error into the domain error space.
///
/// Slug collisions surface as `Validation`; everything else is `Internal`.
fn map_db_error(err: sqlx::Error) -> CoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505")
            && db_err.constraint() == Some(SLUG_CONSTRAINT)
        {
            return CoreError::Validation(
                "Slug is already used by another document of the same kind".to_string(),
            );
        }
    }
    tracing::error!(error = %err, "Database error");
    CoreError::Internal(err.to_string())
}

fn to_document(row: DocumentRow) -> Result<ContentDocument, CoreError> {
    ContentDocument::try_from(row)
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn create(&self, input: &NewDocument, slug: &str) -> Result<Committed, CoreError> {
        let draft = ContentDocument::from_new(0, input.clone(), slug.to_string(), Utc::now());

        let mut tx = self.pool.begin().await.map_err(map_db_error)?;
        let row = DocumentRepo::insert(&mut *tx, &draft)
            .await
            .map_err(map_db_error)?;
        let document = to_document(row)?;
        let version = VersionRepo::insert_next(&mut *tx, &NewVersion::capture(&document))
            .await
            .map_err(map_db_error)?;
        tx.commit().await.map_err(map_db_error)?;

        Ok(Committed {
            document,
            version: Some(version.into()),
        })
    }

    async fn find(&self, id: DbId) -> Result<Option<ContentDocument>, CoreError> {
        DocumentRepo::find_by_id(&self.pool, id)
            .await
            .map_err(map_db_error)?
            .map(to_document)
            .transpose()
    }

    async fn find_by_slug(
        &self,
        kind: DocumentKind,
        slug: &str,
    ) -> Result<Option<ContentDocument>, CoreError> {
        DocumentRepo::find_by_slug(&self.pool, kind.as_str(), slug)
            .await
            .map_err(map_db_error)?
            .map(to_document)
            .transpose()
    }

    async fn list(&self, filter: &DocumentFilter) -> Result<Vec<ContentDocument>, CoreError> {
        DocumentRepo::list(
            &self.pool,
            filter.kind.map(DocumentKind::as_str),
            filter.status.map(|s| s.as_str()),
            filter.limit,
            filter.offset,
        )
        .await
        .map_err(map_db_error)?
        .into_iter()
        .map(to_document)
        .collect()
    }

    async fn commit(&self, commit: Commit) -> Result<Committed, CoreError> {
        let id = commit.document.id;
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let updated = DocumentRepo::update_if_current(
            &mut *tx,
            &commit.document,
            commit.expected_updated_at,
            commit.expected_status,
            commit.due_by,
        )
        .await
        .map_err(map_db_error)?;

        let Some(row) = updated else {
            let exists = DocumentRepo::exists(&mut *tx, id)
                .await
                .map_err(map_db_error)?;
            return Err(if exists {
                CoreError::ConcurrencyConflict {
                    entity: ENTITY_DOCUMENT,
                    id,
                }
            } else {
                CoreError::NotFound {
                    entity: ENTITY_DOCUMENT,
                    id,
                }
            });
        };
        let document = to_document(row)?;

        let version = if commit.snapshot {
            let row = VersionRepo::insert_next(&mut *tx, &NewVersion::capture(&document))
                .await
                .map_err(map_db_error)?;
            Some(VersionSnapshot::from(row))
        } else {
            None
        };

        tx.commit().await.map_err(map_db_error)?;
        Ok(Committed { document, version })
    }

    async fn soft_delete(
        &self,
        id: DbId,
        expected_updated_at: Timestamp,
    ) -> Result<ContentDocument, CoreError> {
        match DocumentRepo::soft_delete_if_current(&self.pool, id, expected_updated_at)
            .await
            .map_err(map_db_error)?
        {
            Some(row) => to_document(row),
            None => {
                let exists = DocumentRepo::exists(&self.pool, id)
                    .await
                    .map_err(map_db_error)?;
                Err(if exists {
                    CoreError::ConcurrencyConflict {
                        entity: ENTITY_DOCUMENT,
                        id,
                    }
                } else {
                    CoreError::NotFound {
                        entity: ENTITY_DOCUMENT,
                        id,
                    }
                })
            }
        }
    }

    async fn list_versions(
        &self,
        document_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<VersionSnapshot>, CoreError> {
        let rows = VersionRepo::list_by_document(&self.pool, document_id, limit, offset)
            .await
            .map_err(map_db_error)?;
        Ok(rows.into_iter().map(VersionSnapshot::from).collect())
    }

    async fn find_version(
        &self,
        document_id: DbId,
        version_id: DbId,
    ) -> Result<Option<VersionSnapshot>, CoreError> {
        let row = VersionRepo::find(&self.pool, document_id, version_id)
            .await
            .map_err(map_db_error)?;
        Ok(row.map(VersionSnapshot::from))
    }

    async fn list_due(
        &self,
        now: Timestamp,
        limit: i64,
    ) -> Result<Vec<ContentDocument>, CoreError> {
        DocumentRepo::list_due(&self.pool, now, limit)
            .await
            .map_err(map_db_error)?
            .into_iter()
            .map(to_document)
            .collect()
    }
}
