use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::{json, Value};

use crate::auth::CurrentSession;
use crate::handlers::utils::json_body;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// POST /api/auth/organization/set-active - Select the session's active organization
///
/// Input: `{ "organizationId": "<uuid>" | null }`
pub async fn set_active(
    State(state): State<AppState>,
    current: CurrentSession,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let body = json_body(body)?;
    let session = super::service(&state).set_active(&current, &body).await?;
    Ok(ApiResponse::success(json!({ "session": session })))
}
