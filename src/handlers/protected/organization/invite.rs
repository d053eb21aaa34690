use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::Value;

use crate::auth::CurrentSession;
use crate::database::models::Invitation;
use crate::handlers::utils::json_body;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// POST /api/auth/organization/invite-member - Owner-only pending invitation
///
/// Input: `{ "email": "...", "role": "member", "organizationId"?: "<uuid>" }`
pub async fn invite_member(
    State(state): State<AppState>,
    current: CurrentSession,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Invitation> {
    let body = json_body(body)?;
    let invitation = super::service(&state).invite(&current, &body).await?;
    Ok(ApiResponse::success(invitation))
}
