use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::extract_session_token;
use crate::error::ApiError;
use crate::state::AppState;

/// Edge gate for protected routes.
///
/// Only checks that a session token is present. Validity is checked again by
/// the `CurrentSession` extractor inside each handler.
pub async fn require_session_cookie(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let cookie_name = &state.config.security.session_cookie_name;

    if extract_session_token(request.headers(), cookie_name).is_none() {
        tracing::debug!("No session token on {} {}", request.method(), request.uri().path());
        return Err(ApiError::unauthorized("Unauthorized"));
    }

    Ok(next.run(request).await)
}
