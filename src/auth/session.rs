use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use chrono::Utc;

use super::{extract_session_token, verify_session_token};
use crate::database::models::{Session, User};
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated session, re-verified server-side for every request.
///
/// Rejects with 401 when the token is missing, badly signed, expired, or
/// refers to a session row that no longer exists.
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub session: Session,
    pub user: User,
}

/// Like `CurrentSession` but never rejects for a missing or invalid session
#[derive(Debug, Clone)]
pub struct OptionalSession(pub Option<CurrentSession>);

#[async_trait]
impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        resolve_session(parts, state)
            .await?
            .ok_or_else(|| ApiError::unauthorized("Unauthorized"))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for OptionalSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(OptionalSession(resolve_session(parts, state).await?))
    }
}

async fn resolve_session(parts: &Parts, state: &AppState) -> Result<Option<CurrentSession>, ApiError> {
    let security = &state.config.security;

    let Some(token) = extract_session_token(&parts.headers, &security.session_cookie_name) else {
        return Ok(None);
    };

    let claims = match verify_session_token(&token, &security.session_secret) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!("Rejected session token: {}", e);
            return Ok(None);
        }
    };

    let Some(session) = state.store.find_session(claims.sid).await? else {
        tracing::debug!("Session {} no longer exists", claims.sid);
        return Ok(None);
    };

    if session.user_id != claims.sub || session.is_expired(Utc::now()) {
        tracing::debug!("Session {} expired or mismatched", session.id);
        return Ok(None);
    }

    let Some(user) = state.store.find_user(session.user_id).await? else {
        tracing::warn!("Session {} refers to missing user {}", session.id, session.user_id);
        return Ok(None);
    };

    Ok(Some(CurrentSession { session, user }))
}
