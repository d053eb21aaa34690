use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::Value;

use crate::auth::CurrentSession;
use crate::handlers::utils::json_body;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::AcceptedInvitation;
use crate::state::AppState;

/// POST /api/auth/organization/accept-invitation - Redeem an invitation addressed to the caller
pub async fn accept_invitation(
    State(state): State<AppState>,
    current: CurrentSession,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<AcceptedInvitation> {
    let body = json_body(body)?;
    let accepted = super::service(&state).accept(&current, &body).await?;
    Ok(ApiResponse::success(accepted))
}
