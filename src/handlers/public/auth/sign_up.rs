// handlers/public/auth/sign_up.rs - POST /api/auth/sign-up/email handler

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::Value;

use crate::auth::session_cookie;
use crate::handlers::utils::json_body;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{AccountService, AuthPayload};
use crate::state::AppState;

/// POST /api/auth/sign-up/email - Register and start a session
///
/// Input: `{ "name": "...", "email": "...", "password": "..." }`
/// Output: `{ "token", "user", "session" }` plus the session cookie.
pub async fn sign_up_email(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<AuthPayload> {
    let body = json_body(body)?;
    let service = AccountService::new(state.store.clone(), state.config.clone());
    let payload = service.sign_up(&body).await?;

    let cookie = session_cookie(&payload.token, &state.config.security);
    Ok(ApiResponse::success(payload).with_cookie(cookie))
}
