//! Request extractors.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::{
    domain::{SessionId, UserId},
    usecase::ServiceError,
};

use super::state::AppState;

/// Caller identity taken from `Authorization: Bearer <token>`.
pub struct AuthUser(pub UserId);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(ServiceError::Unauthorized)?;

        let user = state
            .token_verifier
            .verify(token)
            .await
            .ok_or(ServiceError::Unauthorized)?;
        Ok(AuthUser(user.user_id))
    }
}

pub fn session_id(raw: String) -> Result<SessionId, ServiceError> {
    Ok(SessionId::new(raw)?)
}
