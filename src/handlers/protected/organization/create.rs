use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::Value;

use crate::auth::CurrentSession;
use crate::database::models::Organization;
use crate::handlers::utils::json_body;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// POST /api/auth/organization/create - Create an organization owned by the caller
///
/// The new organization becomes the session's active organization.
pub async fn create(
    State(state): State<AppState>,
    current: CurrentSession,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Organization> {
    let body = json_body(body)?;
    let organization = super::service(&state).create(&current, &body).await?;
    Ok(ApiResponse::success(organization))
}
