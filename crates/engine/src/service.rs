//! Content write and read operations.
//!
//! Every write is a single [`Commit`] against the store, guarded on the
//! caller's last-read `updated_at`. Validation and workflow gates run before
//! the commit, so a rejected call never reaches storage. Events are published
//! only after the commit succeeded.

use std::sync::Arc;

use chrono::Utc;
use pressroom_core::document::{ContentDocument, DocumentKind, DraftPatch, NewDocument};
use pressroom_core::error::CoreError;
use pressroom_core::roles::Role;
use pressroom_core::session::EditSession;
use pressroom_core::store::{
    Commit, Committed, DocumentFilter, DocumentStore, ENTITY_DOCUMENT, ENTITY_VERSION,
};
use pressroom_core::types::{DbId, Timestamp};
use pressroom_core::version::{
    clamp_limit, clamp_offset, diff_versions, BlockDiff, VersionSnapshot, DEFAULT_VERSION_LIMIT,
    MAX_VERSION_LIMIT,
};
use pressroom_core::workflow::{
    apply_transition, check_deletable, check_editable, DocumentStatus, Transition,
};
use pressroom_events::{ContentEvent, EventBus, EventKind};

/// Default page size when listing documents.
pub const DEFAULT_DOCUMENT_LIMIT: i64 = 25;

/// Maximum page size when listing documents.
pub const MAX_DOCUMENT_LIMIT: i64 = 100;

/// The event a committed status change announces.
pub fn transition_event(from: DocumentStatus, to: DocumentStatus) -> EventKind {
    match (from, to) {
        (_, DocumentStatus::Published) => EventKind::Published,
        (DocumentStatus::Published, DocumentStatus::Draft) => EventKind::Unpublished,
        (_, DocumentStatus::Archived) => EventKind::Archived,
        _ => EventKind::Updated,
    }
}

#[derive(Clone)]
pub struct ContentService {
    store: Arc<dyn DocumentStore>,
    events: Arc<EventBus>,
}

impl ContentService {
    pub fn new(store: Arc<dyn DocumentStore>, events: Arc<EventBus>) -> Self {
        Self { store, events }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    // -- Reads ----------------------------------------------------------------

    /// Load a live document or fail with `NotFound`.
    pub async fn get(&self, id: DbId) -> Result<ContentDocument, CoreError> {
        self.store.find(id).await?.ok_or(CoreError::NotFound {
            entity: ENTITY_DOCUMENT,
            id,
        })
    }

    pub async fn list(
        &self,
        kind: Option<DocumentKind>,
        status: Option<DocumentStatus>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<ContentDocument>, CoreError> {
        self.store
            .list(&DocumentFilter {
                kind,
                status,
                limit: clamp_limit(limit, DEFAULT_DOCUMENT_LIMIT, MAX_DOCUMENT_LIMIT),
                offset: clamp_offset(offset),
            })
            .await
    }

    /// The published document at `kind`/`slug`, if there is one.
    ///
    /// Drafts, documents under review and archived documents are invisible
    /// here even when the slug matches.
    pub async fn get_published(
        &self,
        kind: DocumentKind,
        slug: &str,
    ) -> Result<Option<ContentDocument>, CoreError> {
        Ok(self
            .store
            .find_by_slug(kind, slug)
            .await?
            .filter(|doc| doc.status == DocumentStatus::Published))
    }

    pub async fn list_published(
        &self,
        kind: DocumentKind,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<ContentDocument>, CoreError> {
        self.list(Some(kind), Some(DocumentStatus::Published), limit, offset)
            .await
    }

    // -- Create -----------------------------------------------------------------

    /// Create a draft and its first version snapshot.
    pub async fn create(&self, input: NewDocument) -> Result<Committed, CoreError> {
        let slug = input.resolve_slug()?;
        let committed = self.store.create(&input, &slug).await?;
        let doc = &committed.document;

        tracing::info!(
            document_id = doc.id,
            kind = %doc.kind,
            slug = %doc.slug,
            "Document created"
        );
        self.events
            .publish(ContentEvent::new(EventKind::Created, doc).with_actor(doc.created_by));
        Ok(committed)
    }

    // -- Save -------------------------------------------------------------------

    /// Commit `patch` onto the document as a new save with a fresh snapshot.
    ///
    /// `expected_updated_at` is the `updated_at` the caller last read. If the
    /// row has moved on since, nothing is written and `ConcurrencyConflict`
    /// is returned.
    pub async fn save(
        &self,
        id: DbId,
        expected_updated_at: Timestamp,
        patch: DraftPatch,
        role: Role,
        actor: Option<DbId>,
    ) -> Result<Committed, CoreError> {
        let current = self.get(id).await?;
        if current.updated_at != expected_updated_at {
            return Err(CoreError::ConcurrencyConflict {
                entity: ENTITY_DOCUMENT,
                id,
            });
        }
        check_editable(current.status, role)?;

        let draft = current.draft().update_fields(patch);
        draft.validate()?;

        let next = current.with_draft(draft, actor, Utc::now());
        let committed = self
            .store
            .commit(Commit::save(&current, next).expecting(expected_updated_at))
            .await?;

        let doc = &committed.document;
        let version_number = committed.version.as_ref().map(|v| v.version_number);
        tracing::info!(
            document_id = doc.id,
            slug = %doc.slug,
            status = %doc.status,
            role = %role,
            version_number,
            "Document saved"
        );
        self.events.publish(
            ContentEvent::new(EventKind::Updated, doc)
                .with_actor(actor)
                .with_payload(serde_json::json!({ "versionNumber": version_number })),
        );
        Ok(committed)
    }

    /// Save an edit session's draft and rebase the session onto the result.
    pub async fn save_session(
        &self,
        session: &mut EditSession,
        role: Role,
        actor: Option<DbId>,
    ) -> Result<Committed, CoreError> {
        let committed = self
            .save(
                session.document_id(),
                session.base_updated_at(),
                session.patch(),
                role,
                actor,
            )
            .await?;
        session.mark_saved(&committed.document)?;
        Ok(committed)
    }

    // -- Workflow ---------------------------------------------------------------

    /// Apply a workflow transition.
    ///
    /// When `expected_updated_at` is given the transition is additionally
    /// guarded on it; otherwise it is guarded on the row just read.
    pub async fn transition(
        &self,
        id: DbId,
        expected_updated_at: Option<Timestamp>,
        transition: Transition,
        role: Role,
        actor: Option<DbId>,
    ) -> Result<ContentDocument, CoreError> {
        let current = self.get(id).await?;
        if expected_updated_at.is_some_and(|at| at != current.updated_at) {
            return Err(CoreError::ConcurrencyConflict {
                entity: ENTITY_DOCUMENT,
                id,
            });
        }

        let next = apply_transition(&current, &transition, role, actor, Utc::now()).inspect_err(
            |e| {
                tracing::debug!(
                    document_id = id,
                    status = %current.status,
                    role = %role,
                    error = %e,
                    "Transition rejected"
                )
            },
        )?;
        let committed = self.store.commit(Commit::transition(&current, next)).await?;
        let doc = committed.document;

        tracing::info!(
            document_id = doc.id,
            slug = %doc.slug,
            transition = transition.name(),
            from = %current.status,
            status = %doc.status,
            role = %role,
            "Document transitioned"
        );
        let mut event = ContentEvent::new(transition_event(current.status, doc.status), &doc)
            .with_actor(actor);
        if let Transition::Reject {
            feedback: Some(feedback),
        } = &transition
        {
            event = event.with_payload(serde_json::json!({ "feedback": feedback }));
        }
        self.events.publish(event);
        Ok(doc)
    }

    // -- Versions ---------------------------------------------------------------

    pub async fn list_versions(
        &self,
        id: DbId,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<VersionSnapshot>, CoreError> {
        self.get(id).await?;
        self.store
            .list_versions(
                id,
                clamp_limit(limit, DEFAULT_VERSION_LIMIT, MAX_VERSION_LIMIT),
                clamp_offset(offset),
            )
            .await
    }

    pub async fn get_version(
        &self,
        id: DbId,
        version_id: DbId,
    ) -> Result<VersionSnapshot, CoreError> {
        self.store
            .find_version(id, version_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: ENTITY_VERSION,
                id: version_id,
            })
    }

    /// Overwrite the document's content with a snapshot's and commit it as a
    /// new save. History is never rewritten: the restore gets its own version.
    pub async fn restore(
        &self,
        id: DbId,
        version_id: DbId,
        expected_updated_at: Timestamp,
        role: Role,
        actor: Option<DbId>,
    ) -> Result<Committed, CoreError> {
        let version = self.get_version(id, version_id).await?;
        let committed = self
            .save(id, expected_updated_at, version.restore_patch(), role, actor)
            .await?;
        tracing::info!(
            document_id = id,
            restored_version = version.version_number,
            "Document restored from version"
        );
        Ok(committed)
    }

    /// Block-level differences between two versions of one document.
    pub async fn diff(
        &self,
        id: DbId,
        from_version_id: DbId,
        to_version_id: DbId,
    ) -> Result<BlockDiff, CoreError> {
        let from = self.get_version(id, from_version_id).await?;
        let to = self.get_version(id, to_version_id).await?;
        Ok(diff_versions(&from, &to))
    }

    // -- Delete -----------------------------------------------------------------

    /// Soft-delete a document. Its versions are retained.
    ///
    /// Only drafts are open to authors; see [`check_deletable`].
    pub async fn delete(
        &self,
        id: DbId,
        expected_updated_at: Timestamp,
        role: Role,
        actor: Option<DbId>,
    ) -> Result<(), CoreError> {
        let current = self.get(id).await?;
        if current.updated_at != expected_updated_at {
            return Err(CoreError::ConcurrencyConflict {
                entity: ENTITY_DOCUMENT,
                id,
            });
        }
        check_deletable(current.status, role).inspect_err(|e| {
            tracing::debug!(
                document_id = id,
                status = %current.status,
                role = %role,
                error = %e,
                "Delete rejected"
            )
        })?;

        let doc = self.store.soft_delete(id, expected_updated_at).await?;
        tracing::info!(
            document_id = id,
            slug = %doc.slug,
            status = %doc.status,
            role = %role,
            "Document deleted"
        );
        self.events
            .publish(ContentEvent::new(EventKind::Deleted, &doc).with_actor(actor));
        Ok(())
    }
}
