//! Handlers for authoring documents: CRUD, saves and workflow transitions.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use pressroom_core::document::{ContentDocument, DocumentKind, DraftPatch, NewDocument};
use pressroom_core::store::Committed;
use pressroom_core::types::{DbId, Timestamp};
use pressroom_core::version::VersionSnapshot;
use pressroom_core::workflow::{DocumentStatus, Transition};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::middleware::actor::Actor;
use crate::query::{DocumentListParams, ExpectedParams};
use crate::response::DataResponse;
use crate::state::AppState;

/* --------------------------------------------------------------------------
Request / response types
-------------------------------------------------------------------------- */

/// Body of `PUT /documents/{id}`: the last-read `updated_at` plus the fields
/// to replace.
#[derive(Debug, Deserialize)]
pub struct SaveDocumentRequest {
    pub expected_updated_at: Timestamp,
    #[serde(flatten)]
    pub patch: DraftPatch,
}

/// Body of `POST /documents/{id}/transitions`.
#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    #[serde(default)]
    pub expected_updated_at: Option<Timestamp>,
    pub transition: Transition,
}

/// A committed document together with the snapshot the commit wrote.
#[derive(Debug, Serialize)]
pub struct CommittedResponse {
    pub document: ContentDocument,
    pub version: Option<VersionSnapshot>,
}

impl From<Committed> for CommittedResponse {
    fn from(committed: Committed) -> Self {
        Self {
            document: committed.document,
            version: committed.version,
        }
    }
}

/* --------------------------------------------------------------------------
Handlers
-------------------------------------------------------------------------- */

/// GET /documents
///
/// List live documents, optionally filtered by `kind` and `status`.
pub async fn list_documents(
    _actor: Actor,
    State(state): State<AppState>,
    Query(params): Query<DocumentListParams>,
) -> AppResult<impl IntoResponse> {
    let kind = params
        .kind
        .as_deref()
        .map(str::parse::<DocumentKind>)
        .transpose()?;
    let status = params
        .status
        .as_deref()
        .map(str::parse::<DocumentStatus>)
        .transpose()?;

    let documents = state
        .service
        .list(kind, status, params.limit, params.offset)
        .await?;
    Ok(Json(DataResponse { data: documents }))
}

/// POST /documents
///
/// Create a draft. The slug is generated from the title when absent and the
/// caller becomes the author unless the body names one.
pub async fn create_document(
    actor: Actor,
    State(state): State<AppState>,
    Json(mut input): Json<NewDocument>,
) -> AppResult<impl IntoResponse> {
    if input.author_id.is_none() {
        input.author_id = actor.user_id;
    }
    let committed = state.service.create(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: CommittedResponse::from(committed),
        }),
    ))
}

/// GET /documents/{id}
pub async fn get_document(
    _actor: Actor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let document = state.service.get(id).await?;
    Ok(Json(DataResponse { data: document }))
}

/// PUT /documents/{id}
///
/// Save a new revision. Fails with 409 `CONCURRENCY_CONFLICT` when the
/// document changed after `expected_updated_at`.
pub async fn save_document(
    actor: Actor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<SaveDocumentRequest>,
) -> AppResult<impl IntoResponse> {
    let committed = state
        .service
        .save(
            id,
            body.expected_updated_at,
            body.patch,
            actor.role,
            actor.user_id,
        )
        .await?;
    Ok(Json(DataResponse {
        data: CommittedResponse::from(committed),
    }))
}

/// DELETE /documents/{id}?expected_updated_at=
///
/// Authors may delete drafts. Any other status needs an admin.
pub async fn delete_document(
    actor: Actor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<ExpectedParams>,
) -> AppResult<StatusCode> {
    state
        .service
        .delete(id, params.expected_updated_at, actor.role, actor.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /documents/{id}/transitions
///
/// Apply a workflow action such as `{"transition": {"action": "approve"}}`.
pub async fn transition_document(
    actor: Actor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<TransitionRequest>,
) -> AppResult<impl IntoResponse> {
    let document = state
        .service
        .transition(
            id,
            body.expected_updated_at,
            body.transition,
            actor.role,
            actor.user_id,
        )
        .await?;
    Ok(Json(DataResponse { data: document }))
}
