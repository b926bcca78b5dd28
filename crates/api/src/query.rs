//! Shared query parameter types for API handlers.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Generic pagination parameters (`?limit=&offset=`).
///
/// Values are clamped in the engine via `clamp_limit` / `clamp_offset`.
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Filters for `GET /documents`.
#[derive(Debug, Default, Deserialize)]
pub struct DocumentListParams {
    pub kind: Option<String>,
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// The optimistic precondition for writes that carry no body.
#[derive(Debug, Deserialize)]
pub struct ExpectedParams {
    pub expected_updated_at: DateTime<Utc>,
}

/// Version ids to compare (`?from=&to=`).
#[derive(Debug, Deserialize)]
pub struct DiffParams {
    pub from: i64,
    pub to: i64,
}
