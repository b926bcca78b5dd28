//! Public read path. Only published documents are visible here and no
//! caller role is required.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use pressroom_core::document::DocumentKind;

use crate::error::{AppError, AppResult};
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /published/{kind}
pub async fn list_published(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let kind: DocumentKind = kind.parse()?;
    let documents = state
        .service
        .list_published(kind, params.limit, params.offset)
        .await?;
    Ok(Json(DataResponse { data: documents }))
}

/// GET /published/{kind}/{slug}
pub async fn get_published(
    State(state): State<AppState>,
    Path((kind, slug)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    let kind: DocumentKind = kind.parse()?;
    let document = state
        .service
        .get_published(kind, &slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No published {kind} with slug '{slug}'")))?;
    Ok(Json(DataResponse { data: document }))
}
