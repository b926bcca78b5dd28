pub mod documents;
pub mod health;
pub mod published;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /documents                                       list, create
/// /documents/{id}                                  get, save (PUT), delete
/// /documents/{id}/transitions                      workflow action (POST)
/// /documents/{id}/versions                         version history
/// /documents/{id}/versions/{version_id}            single snapshot
/// /documents/{id}/versions/{version_id}/restore    restore (POST)
/// /documents/{id}/diff                             block diff (?from=&to=)
///
/// /published/{kind}                                published documents (public)
/// /published/{kind}/{slug}                         one published document (public)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/documents", documents::router())
        .nest("/published", published::router())
}
