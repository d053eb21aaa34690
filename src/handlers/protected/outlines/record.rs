use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::{json, Value};

use crate::auth::CurrentSession;
use crate::database::models::Outline;
use crate::handlers::utils::json_body;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// PUT /api/outlines/:id - Partial update; absent fields are left untouched
pub async fn put(
    State(state): State<AppState>,
    current: CurrentSession,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Outline> {
    // The stored row is resolved and authorized before the body is looked at
    let body = json_body(body).unwrap_or_else(|e| {
        tracing::debug!("Outline update body rejected: {}", e);
        Value::Null
    });
    let outline = super::service(&state).update(current.user.id, &id, &body).await?;
    Ok(ApiResponse::success(outline))
}

/// DELETE /api/outlines/:id - Remove an outline
pub async fn delete(
    State(state): State<AppState>,
    current: CurrentSession,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    super::service(&state).delete(current.user.id, &id).await?;
    Ok(ApiResponse::success(json!({ "message": "Outline deleted successfully" })))
}
