//! Caller identity extractor.
//!
//! Authentication happens upstream. The gateway in front of this service
//! resolves the caller and forwards the content role and user id as
//! headers, which [`Actor`] reads and validates.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use pressroom_core::roles::Role;
use pressroom_core::types::DbId;

use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the resolved content role.
pub const ROLE_HEADER: &str = "x-content-role";

/// Header carrying the caller's user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The resolved caller of a request.
///
/// ```ignore
/// async fn my_handler(actor: Actor) -> AppResult<Json<()>> {
///     tracing::info!(role = %actor.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub role: Role,
    pub user_id: Option<DbId>,
}

impl FromRequestParts<AppState> for Actor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let role = parts
            .headers
            .get(ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing X-Content-Role header".into()))?
            .parse::<Role>()
            .map_err(|e| AppError::Unauthorized(e.to_string()))?;

        let user_id = match parts.headers.get(USER_ID_HEADER) {
            None => None,
            Some(value) => Some(
                value
                    .to_str()
                    .ok()
                    .and_then(|v| v.parse::<DbId>().ok())
                    .ok_or_else(|| {
                        AppError::BadRequest("X-User-Id must be an integer id".into())
                    })?,
            ),
        };

        Ok(Actor { role, user_id })
    }
}
