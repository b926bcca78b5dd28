use axum::routing::get;
use axum::Router;

use crate::handlers::published;
use crate::state::AppState;

/// Routes mounted at `/published`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{kind}", get(published::list_published))
        .route("/{kind}/{slug}", get(published::get_published))
}
