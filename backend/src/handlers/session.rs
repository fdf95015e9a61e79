use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use uuid::Uuid;

use crate::chat::session::SessionGuard;
use crate::handlers::{AppState, error::ApiError};

/// The caller's session, resolved from `Authorization: Bearer <token>` and
/// held locked until the handler returns.
pub struct Session(pub SessionGuard);

impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .and_then(|token| Uuid::parse_str(token.trim()).ok())
            .ok_or(ApiError::Unauthorized)?;

        state
            .sessions
            .acquire(&token)
            .await
            .map(Session)
            .ok_or(ApiError::Unauthorized)
    }
}
