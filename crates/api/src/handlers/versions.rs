//! Handlers for version history: listing, inspection, restore and diff.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use pressroom_core::types::{DbId, Timestamp};
use serde::Deserialize;

use super::documents::CommittedResponse;
use crate::error::AppResult;
use crate::middleware::actor::Actor;
use crate::query::{DiffParams, PaginationParams};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RestoreRequest {
    pub expected_updated_at: Timestamp,
}

/// GET /documents/{id}/versions
///
/// Newest first.
pub async fn list_versions(
    _actor: Actor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let versions = state
        .service
        .list_versions(id, params.limit, params.offset)
        .await?;
    Ok(Json(DataResponse { data: versions }))
}

/// GET /documents/{id}/versions/{version_id}
pub async fn get_version(
    _actor: Actor,
    State(state): State<AppState>,
    Path((id, version_id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let version = state.service.get_version(id, version_id).await?;
    Ok(Json(DataResponse { data: version }))
}

/// POST /documents/{id}/versions/{version_id}/restore
///
/// Writes the snapshot's content back as a new save.
pub async fn restore_version(
    actor: Actor,
    State(state): State<AppState>,
    Path((id, version_id)): Path<(DbId, DbId)>,
    Json(body): Json<RestoreRequest>,
) -> AppResult<impl IntoResponse> {
    let committed = state
        .service
        .restore(
            id,
            version_id,
            body.expected_updated_at,
            actor.role,
            actor.user_id,
        )
        .await?;
    Ok(Json(DataResponse {
        data: CommittedResponse::from(committed),
    }))
}

/// GET /documents/{id}/diff?from=&to=
pub async fn diff_versions(
    _actor: Actor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<DiffParams>,
) -> AppResult<impl IntoResponse> {
    let diff = state.service.diff(id, params.from, params.to).await?;
    Ok(Json(DataResponse { data: diff }))
}
