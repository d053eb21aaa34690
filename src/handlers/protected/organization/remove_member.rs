use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::Value;

use crate::auth::CurrentSession;
use crate::handlers::utils::json_body;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::RemovedMember;
use crate::state::AppState;

/// POST /api/auth/organization/remove-member - Owner-only membership removal
///
/// Input: `{ "memberId": "<membership id>", "organizationId"?: "<uuid>" }`.
/// `memberId` is the membership record id, not the user id.
pub async fn remove_member(
    State(state): State<AppState>,
    current: CurrentSession,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<RemovedMember> {
    let body = json_body(body)?;
    let removed = super::service(&state).remove_member(&current, &body).await?;
    Ok(ApiResponse::success(removed))
}
