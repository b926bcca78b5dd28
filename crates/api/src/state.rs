use std::sync::Arc;

use pressroom_engine::ContentService;
use pressroom_events::EventBus;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Content operations over the configured document store.
    pub service: ContentService,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Event bus the service publishes to.
    pub event_bus: Arc<EventBus>,
    /// Database pool when running against PostgreSQL. `None` for the
    /// in-memory store.
    pub pool: Option<pressroom_db::DbPool>,
}
