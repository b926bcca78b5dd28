use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{documents, versions};
use crate::state::AppState;

/// Routes mounted at `/documents`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(documents::list_documents).post(documents::create_document),
        )
        .route(
            "/{id}",
            get(documents::get_document)
                .put(documents::save_document)
                .delete(documents::delete_document),
        )
        .route("/{id}/transitions", post(documents::transition_document))
        .route("/{id}/versions", get(versions::list_versions))
        .route("/{id}/versions/{version_id}", get(versions::get_version))
        .route(
            "/{id}/versions/{version_id}/restore",
            post(versions::restore_version),
        )
        .route("/{id}/diff", get(versions::diff_versions))
}
