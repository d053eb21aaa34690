use axum::extract::State;
use serde_json::{json, Value};

use crate::auth::{clear_session_cookie, CurrentSession};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::AccountService;
use crate::state::AppState;

/// POST /api/auth/sign-out - Delete the session row and expire the cookie
pub async fn sign_out(State(state): State<AppState>, current: CurrentSession) -> ApiResult<Value> {
    let service = AccountService::new(state.store.clone(), state.config.clone());
    service.sign_out(&current).await?;

    let cookie = clear_session_cookie(&state.config.security);
    Ok(ApiResponse::success(json!({ "success": true })).with_cookie(cookie))
}
