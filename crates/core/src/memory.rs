//! In-process [`DocumentStore`].
//!
//! All state sits behind one async mutex, so every commit (row update plus
//! snapshot) is atomic with respect to every other call. Used for embedding
//! the engine without a database and throughout the test suites.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::document::{ContentDocument, DocumentKind, NewDocument};
use crate::error::CoreError;
use crate::store::{Commit, Committed, DocumentFilter, DocumentStore, ENTITY_DOCUMENT};
use crate::types::{DbId, Timestamp};
use crate::version::{NewVersion, VersionSnapshot};
use crate::workflow::DocumentStatus;

#[derive(Debug, Default)]
struct State {
    documents: BTreeMap<DbId, ContentDocument>,
    deleted: BTreeMap<DbId, ContentDocument>,
    versions: Vec<VersionSnapshot>,
    next_document_id: DbId,
    next_version_id: DbId,
}

impl State {
    fn slug_taken(&self, kind: DocumentKind, slug: &str, except: Option<DbId>) -> bool {
        self.documents
            .values()
            .any(|d| d.kind == kind && d.slug == slug && Some(d.id) != except)
    }

    fn append_version(&mut self, version: NewVersion) -> VersionSnapshot {
        self.next_version_id += 1;
        let version_number = self
            .versions
            .iter()
            .filter(|v| v.document_id == version.document_id)
            .map(|v| v.version_number)
            .max()
            .unwrap_or(0)
            + 1;
        let snapshot = VersionSnapshot {
            id: self.next_version_id,
            document_id: version.document_id,
            version_number,
            title: version.title,
            blocks: version.blocks,
            meta: version.meta,
            created_at: version.created_at,
            created_by: version.created_by,
        };
        self.versions.push(snapshot.clone());
        snapshot
    }

    fn guard(&self, id: DbId, expected_updated_at: Timestamp) -> Result<&ContentDocument, CoreError> {
        let current = self.documents.get(&id).ok_or(CoreError::NotFound {
            entity: ENTITY_DOCUMENT,
            id,
        })?;
        if current.updated_at != expected_updated_at {
            return Err(CoreError::ConcurrencyConflict {
                entity: ENTITY_DOCUMENT,
                id,
            });
        }
        Ok(current)
    }
}

fn slug_error(kind: DocumentKind, slug: &str) -> CoreError {
    CoreError::Validation(format!("Slug '{slug}' is already used by another {kind}"))
}

/// A [`DocumentStore`] held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    state: Mutex<State>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored versions across all documents.
    pub async fn version_count(&self) -> usize {
        self.state.lock().await.versions.len()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn create(&self, input: &NewDocument, slug: &str) -> Result<Committed, CoreError> {
        let mut state = self.state.lock().await;
        if state.slug_taken(input.kind, slug, None) {
            return Err(slug_error(input.kind, slug));
        }
        state.next_document_id += 1;
        let doc = ContentDocument::from_new(
            state.next_document_id,
            input.clone(),
            slug.to_string(),
            Utc::now(),
        );
        let version = state.append_version(NewVersion::capture(&doc));
        state.documents.insert(doc.id, doc.clone());
        Ok(Committed {
            document: doc,
            version: Some(version),
        })
    }

    async fn find(&self, id: DbId) -> Result<Option<ContentDocument>, CoreError> {
        Ok(self.state.lock().await.documents.get(&id).cloned())
    }

    async fn find_by_slug(
        &self,
        kind: DocumentKind,
        slug: &str,
    ) -> Result<Option<ContentDocument>, CoreError> {
        let state = self.state.lock().await;
        Ok(state
            .documents
            .values()
            .find(|d| d.kind == kind && d.slug == slug)
            .cloned())
    }

    async fn list(&self, filter: &DocumentFilter) -> Result<Vec<ContentDocument>, CoreError> {
        let state = self.state.lock().await;
        let mut docs: Vec<ContentDocument> = state
            .documents
            .values()
            .filter(|d| filter.kind.map_or(true, |k| d.kind == k))
            .filter(|d| filter.status.map_or(true, |s| d.status == s))
            .cloned()
            .collect();
        docs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(docs
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect())
    }

    async fn commit(&self, commit: Commit) -> Result<Committed, CoreError> {
        let mut state = self.state.lock().await;
        let id = commit.document.id;
        let current = state.guard(id, commit.expected_updated_at)?;

        let still_due = commit
            .due_by
            .map_or(true, |now| current.scheduled_at.is_some_and(|at| at <= now));
        if current.status != commit.expected_status || !still_due {
            return Err(CoreError::ConcurrencyConflict {
                entity: ENTITY_DOCUMENT,
                id,
            });
        }
        if state.slug_taken(commit.document.kind, &commit.document.slug, Some(id)) {
            return Err(slug_error(commit.document.kind, &commit.document.slug));
        }

        let version = commit
            .snapshot
            .then(|| state.append_version(NewVersion::capture(&commit.document)));
        state.documents.insert(id, commit.document.clone());
        Ok(Committed {
            document: commit.document,
            version,
        })
    }

    async fn soft_delete(
        &self,
        id: DbId,
        expected_updated_at: Timestamp,
    ) -> Result<ContentDocument, CoreError> {
        let mut state = self.state.lock().await;
        state.guard(id, expected_updated_at)?;
        let doc = state.documents.remove(&id).ok_or(CoreError::NotFound {
            entity: ENTITY_DOCUMENT,
            id,
        })?;
        state.deleted.insert(id, doc.clone());
        Ok(doc)
    }

    async fn list_versions(
        &self,
        document_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<VersionSnapshot>, CoreError> {
        let state = self.state.lock().await;
        let mut versions: Vec<VersionSnapshot> = state
            .versions
            .iter()
            .filter(|v| v.document_id == document_id)
            .cloned()
            .collect();
        versions.sort_by(|a, b| b.version_number.cmp(&a.version_number));
        Ok(versions
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn find_version(
        &self,
        document_id: DbId,
        version_id: DbId,
    ) -> Result<Option<VersionSnapshot>, CoreError> {
        let state = self.state.lock().await;
        Ok(state
            .versions
            .iter()
            .find(|v| v.id == version_id && v.document_id == document_id)
            .cloned())
    }

    async fn list_due(
        &self,
        now: Timestamp,
        limit: i64,
    ) -> Result<Vec<ContentDocument>, CoreError> {
        let state = self.state.lock().await;
        let mut due: Vec<ContentDocument> = state
            .documents
            .values()
            .filter(|d| d.status == DocumentStatus::Reviewing)
            .filter(|d| d.scheduled_at.is_some_and(|at| at <= now))
            .cloned()
            .collect();
        due.sort_by_key(|d| d.scheduled_at);
        due.truncate(limit.max(0) as usize);
        Ok(due)
    }
}
