use axum::extract::{Path, State};

use crate::auth::CurrentSession;
use crate::database::models::Outline;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// POST /api/outlines/:id/duplicate - Copy an outline with " (Copy)" appended to the header
pub async fn post(
    State(state): State<AppState>,
    current: CurrentSession,
    Path(id): Path<String>,
) -> ApiResult<Outline> {
    let outline = super::service(&state).duplicate(current.user.id, &id).await?;
    Ok(ApiResponse::created(outline))
}
