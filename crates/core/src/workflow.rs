//! Editorial workflow state machine.
//!
//! Documents move through `draft -> reviewing -> published -> archived`.
//! Every transition is gated by a [`Role`] through the single table in
//! [`required_role`]; callers never check roles themselves. Applying a
//! transition produces the complete next document state, including the
//! metadata that must change with it (`scheduled_at`, `published_at`, review
//! fields), so the store can commit it as one conditional write.

use serde::{Deserialize, Serialize};

use crate::document::{advance_timestamp, ContentDocument};
use crate::error::CoreError;
use crate::roles::Role;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

pub const STATUS_DRAFT: &str = "draft";
pub const STATUS_REVIEWING: &str = "reviewing";
pub const STATUS_PUBLISHED: &str = "published";
pub const STATUS_ARCHIVED: &str = "archived";

/// All valid status names, in lifecycle order.
pub const VALID_STATUSES: &[&str] = &[
    STATUS_DRAFT,
    STATUS_REVIEWING,
    STATUS_PUBLISHED,
    STATUS_ARCHIVED,
];

/// Publication lifecycle status of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Draft,
    Reviewing,
    Published,
    Archived,
}

impl DocumentStatus {
    pub const ALL: [DocumentStatus; 4] = [
        DocumentStatus::Draft,
        DocumentStatus::Reviewing,
        DocumentStatus::Published,
        DocumentStatus::Archived,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentStatus::Draft => STATUS_DRAFT,
            DocumentStatus::Reviewing => STATUS_REVIEWING,
            DocumentStatus::Published => STATUS_PUBLISHED,
            DocumentStatus::Archived => STATUS_ARCHIVED,
        }
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            STATUS_DRAFT => Ok(DocumentStatus::Draft),
            STATUS_REVIEWING => Ok(DocumentStatus::Reviewing),
            STATUS_PUBLISHED => Ok(DocumentStatus::Published),
            STATUS_ARCHIVED => Ok(DocumentStatus::Archived),
            other => Err(CoreError::Validation(format!(
                "Invalid status '{other}'. Must be one of: {}",
                VALID_STATUSES.join(", ")
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    #[error("Illegal transition '{transition}' from {from} to {to}")]
    IllegalTransition {
        transition: &'static str,
        from: DocumentStatus,
        to: DocumentStatus,
    },

    #[error("Role '{role}' may not move a document from {from} to {to}")]
    RoleNotPermitted {
        role: Role,
        from: DocumentStatus,
        to: DocumentStatus,
    },

    #[error("A {status} document is not editable by role '{role}'")]
    NotEditable { status: DocumentStatus, role: Role },

    #[error("A {status} document may not be deleted by role '{role}'")]
    NotDeletable { status: DocumentStatus, role: Role },
}

// ---------------------------------------------------------------------------
// Transition table
// ---------------------------------------------------------------------------

/// Minimum role for the edge `from -> to`, or `None` if the edge does not exist.
pub fn required_role(from: DocumentStatus, to: DocumentStatus) -> Option<Role> {
    use DocumentStatus::*;
    match (from, to) {
        // Submit for review.
        (Draft, Reviewing) => Some(Role::Author),
        // Reject, approve & publish, reschedule.
        (Reviewing, Draft) | (Reviewing, Published) | (Reviewing, Reviewing) => {
            Some(Role::Approver)
        }
        // Administrative edges outside the review flow.
        (Published, Archived) | (Published, Draft) | (Draft, Archived) | (Archived, Draft) => {
            Some(Role::Admin)
        }
        _ => None,
    }
}

/// Check whether `role` may move a document from `from` to `to`.
pub fn can_transition(role: Role, from: DocumentStatus, to: DocumentStatus) -> bool {
    required_role(from, to).is_some_and(|required| role.at_least(required))
}

/// Check whether `role` may commit content edits to a document in `status`.
///
/// Drafts are open to authors. A document under review (or live) may only be
/// changed by an approver, so nothing slips in after review started. Archived
/// documents must be restored to draft before they can be edited.
pub fn check_editable(status: DocumentStatus, role: Role) -> Result<(), WorkflowError> {
    let required = match status {
        DocumentStatus::Draft => Some(Role::Author),
        DocumentStatus::Reviewing | DocumentStatus::Published => Some(Role::Approver),
        DocumentStatus::Archived => None,
    };
    match required {
        Some(r) if role.at_least(r) => Ok(()),
        _ => Err(WorkflowError::NotEditable { status, role }),
    }
}

/// Check whether `role` may soft-delete a document in `status`.
///
/// Authors may discard their own drafts. Anything that has entered review
/// or gone live leaves the lifecycle only through an admin, the same role
/// that gates unpublishing.
pub fn check_deletable(status: DocumentStatus, role: Role) -> Result<(), WorkflowError> {
    let required = match status {
        DocumentStatus::Draft => Role::Author,
        DocumentStatus::Reviewing | DocumentStatus::Published | DocumentStatus::Archived => {
            Role::Admin
        }
    };
    if role.at_least(required) {
        Ok(())
    } else {
        Err(WorkflowError::NotDeletable { status, role })
    }
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// A requested workflow action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Transition {
    /// `draft -> reviewing`, optionally scheduling publication.
    Submit {
        #[serde(default)]
        scheduled_at: Option<Timestamp>,
    },
    /// `reviewing -> draft` with optional feedback for the author.
    Reject {
        #[serde(default)]
        feedback: Option<String>,
    },
    /// `reviewing -> published`.
    Approve,
    /// `reviewing -> reviewing`, setting or clearing the scheduled time.
    Reschedule {
        #[serde(default)]
        scheduled_at: Option<Timestamp>,
    },
    /// `published | draft -> archived`.
    Archive,
    /// `archived -> draft`.
    Unarchive,
    /// `published -> draft`.
    Unpublish,
}

impl Transition {
    pub fn name(&self) -> &'static str {
        match self {
            Transition::Submit { .. } => "submit",
            Transition::Reject { .. } => "reject",
            Transition::Approve => "approve",
            Transition::Reschedule { .. } => "reschedule",
            Transition::Archive => "archive",
            Transition::Unarchive => "unarchive",
            Transition::Unpublish => "unpublish",
        }
    }

    /// Status the document ends up in.
    pub fn target(&self) -> DocumentStatus {
        match self {
            Transition::Submit { .. } | Transition::Reschedule { .. } => DocumentStatus::Reviewing,
            Transition::Reject { .. } | Transition::Unarchive | Transition::Unpublish => {
                DocumentStatus::Draft
            }
            Transition::Approve => DocumentStatus::Published,
            Transition::Archive => DocumentStatus::Archived,
        }
    }

    /// Whether this action is defined from `from` at all.
    fn applies_from(&self, from: DocumentStatus) -> bool {
        use DocumentStatus::*;
        match self {
            Transition::Submit { .. } => from == Draft,
            Transition::Reject { .. } | Transition::Approve | Transition::Reschedule { .. } => {
                from == Reviewing
            }
            Transition::Archive => matches!(from, Published | Draft),
            Transition::Unarchive => from == Archived,
            Transition::Unpublish => from == Published,
        }
    }
}

/// Validate `transition` for `role` against the document's current status.
pub fn validate_transition(
    from: DocumentStatus,
    transition: &Transition,
    role: Role,
) -> Result<DocumentStatus, WorkflowError> {
    let to = transition.target();
    if !transition.applies_from(from) || required_role(from, to).is_none() {
        return Err(WorkflowError::IllegalTransition {
            transition: transition.name(),
            from,
            to,
        });
    }
    if !can_transition(role, from, to) {
        return Err(WorkflowError::RoleNotPermitted { role, from, to });
    }
    Ok(to)
}

/// Apply `transition` to `doc`, returning the next document state.
///
/// `doc` is left untouched; on error nothing changes. The returned document's
/// `updated_at` is advanced past the current one.
pub fn apply_transition(
    doc: &ContentDocument,
    transition: &Transition,
    role: Role,
    actor: Option<DbId>,
    now: Timestamp,
) -> Result<ContentDocument, WorkflowError> {
    let to = validate_transition(doc.status, transition, role)?;

    let mut next = doc.clone();
    next.status = to;

    match transition {
        Transition::Submit { scheduled_at } => {
            next.scheduled_at = *scheduled_at;
            next.review_feedback = None;
        }
        Transition::Reject { feedback } => {
            mark_reviewed(&mut next, actor, now);
            next.review_feedback = feedback.clone();
        }
        Transition::Approve => {
            mark_reviewed(&mut next, actor, now);
            next.published_at = Some(now);
        }
        Transition::Reschedule { scheduled_at } => {
            next.scheduled_at = *scheduled_at;
        }
        Transition::Archive | Transition::Unarchive | Transition::Unpublish => {}
    }

    if next.status != DocumentStatus::Reviewing {
        next.scheduled_at = None;
    }
    next.updated_at = advance_timestamp(doc.updated_at, now);
    if actor.is_some() {
        next.updated_by = actor;
    }
    Ok(next)
}

fn mark_reviewed(doc: &mut ContentDocument, actor: Option<DbId>, now: Timestamp) {
    if actor.is_some() {
        doc.reviewer_id = actor;
    }
    doc.reviewed_at = Some(now);
}

// ---------------------------------------------------------------------------
// Scheduled publishing
// ---------------------------------------------------------------------------

/// A reviewing document whose scheduled time has elapsed.
pub fn is_due(doc: &ContentDocument, now: Timestamp) -> bool {
    doc.status == DocumentStatus::Reviewing && doc.scheduled_at.is_some_and(|at| at <= now)
}

/// Publish a due document exactly as a manual approval would.
///
/// Returns `None` when the document is no longer due (already approved,
/// rejected, or rescheduled into the future).
pub fn publish_if_due(doc: &ContentDocument, now: Timestamp) -> Option<ContentDocument> {
    if !is_due(doc, now) {
        return None;
    }
    apply_transition(doc, &Transition::Approve, Role::Approver, None, now).ok()
}
