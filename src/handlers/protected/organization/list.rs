use axum::extract::State;

use crate::auth::CurrentSession;
use crate::database::models::Organization;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /api/auth/organization/list - Organizations the caller belongs to
pub async fn list(State(state): State<AppState>, current: CurrentSession) -> ApiResult<Vec<Organization>> {
    let organizations = super::service(&state).list(&current).await?;
    Ok(ApiResponse::success(organizations))
}
