//! The persistence seam.
//!
//! [`DocumentStore`] is what the content engine needs from a transactional
//! store: conditional single-row commits (optimistic concurrency on
//! `updated_at`) that write the matching version snapshot in the same atomic
//! unit. `pressroom-db` implements it over PostgreSQL; [`crate::memory`]
//! provides an in-process implementation.

use async_trait::async_trait;

use crate::document::{ContentDocument, DocumentKind, NewDocument};
use crate::error::CoreError;
use crate::types::{DbId, Timestamp};
use crate::version::VersionSnapshot;
use crate::workflow::DocumentStatus;

/// Entity name used in `NotFound` / `ConcurrencyConflict` errors.
pub const ENTITY_DOCUMENT: &str = "ContentDocument";

/// Entity name used in `NotFound` errors for versions.
pub const ENTITY_VERSION: &str = "VersionSnapshot";

/// A conditional write of a document's complete next state.
#[derive(Debug, Clone)]
pub struct Commit {
    /// The full next state. `id` selects the row.
    pub document: ContentDocument,
    /// The row must still carry this `updated_at`.
    pub expected_updated_at: Timestamp,
    /// The row must still be in this status.
    pub expected_status: DocumentStatus,
    /// When set, the row must still have `scheduled_at <= due_by`.
    pub due_by: Option<Timestamp>,
    /// Write a version snapshot of `document` in the same atomic unit.
    pub snapshot: bool,
}

impl Commit {
    /// A content save: guarded on `current`, snapshotting `next`.
    pub fn save(current: &ContentDocument, next: ContentDocument) -> Self {
        Self {
            expected_updated_at: current.updated_at,
            expected_status: current.status,
            due_by: None,
            snapshot: true,
            document: next,
        }
    }

    /// A workflow transition: guarded on `current`, no snapshot.
    pub fn transition(current: &ContentDocument, next: ContentDocument) -> Self {
        Self {
            expected_updated_at: current.updated_at,
            expected_status: current.status,
            due_by: None,
            snapshot: false,
            document: next,
        }
    }

    /// Require the stored row to still be due at `now`.
    pub fn due_by(mut self, now: Timestamp) -> Self {
        self.due_by = Some(now);
        self
    }

    /// Override the optimistic precondition with a caller-supplied value.
    pub fn expecting(mut self, updated_at: Timestamp) -> Self {
        self.expected_updated_at = updated_at;
        self
    }
}

/// Result of a successful commit.
#[derive(Debug, Clone)]
pub struct Committed {
    pub document: ContentDocument,
    pub version: Option<VersionSnapshot>,
}

/// Listing filter for documents.
#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    pub kind: Option<DocumentKind>,
    pub status: Option<DocumentStatus>,
    pub limit: i64,
    pub offset: i64,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new draft together with its first version snapshot.
    ///
    /// Fails with `Validation` if `slug` is already used by a live document
    /// of the same kind.
    async fn create(
        &self,
        input: &NewDocument,
        slug: &str,
    ) -> Result<Committed, CoreError>;

    /// Find a live (not deleted) document.
    async fn find(&self, id: DbId) -> Result<Option<ContentDocument>, CoreError>;

    async fn find_by_slug(
        &self,
        kind: DocumentKind,
        slug: &str,
    ) -> Result<Option<ContentDocument>, CoreError>;

    /// List live documents, most recently updated first.
    async fn list(&self, filter: &DocumentFilter) -> Result<Vec<ContentDocument>, CoreError>;

    /// Atomically apply `commit` if all its preconditions still hold.
    ///
    /// Returns `NotFound` if the row is gone and `ConcurrencyConflict` if any
    /// precondition fails. Nothing is written in either case.
    async fn commit(&self, commit: Commit) -> Result<Committed, CoreError>;

    /// Soft-delete a document guarded on `expected_updated_at`. Versions stay.
    async fn soft_delete(
        &self,
        id: DbId,
        expected_updated_at: Timestamp,
    ) -> Result<ContentDocument, CoreError>;

    /// Versions of a document, newest first.
    async fn list_versions(
        &self,
        document_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<VersionSnapshot>, CoreError>;

    async fn find_version(
        &self,
        document_id: DbId,
        version_id: DbId,
    ) -> Result<Option<VersionSnapshot>, CoreError>;

    /// Reviewing documents whose `scheduled_at` is at or before `now`,
    /// oldest schedule first.
    async fn list_due(&self, now: Timestamp, limit: i64)
        -> Result<Vec<ContentDocument>, CoreError>;
}
