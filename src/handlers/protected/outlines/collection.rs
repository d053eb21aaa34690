use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::auth::CurrentSession;
use crate::database::models::Outline;
use crate::handlers::utils::json_body;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct OutlineListQuery {
    #[serde(rename = "organizationId")]
    pub organization_id: Option<String>,
}

/// GET /api/outlines?organizationId= - Outlines of one organization, newest first
pub async fn get(
    State(state): State<AppState>,
    current: CurrentSession,
    Query(query): Query<OutlineListQuery>,
) -> ApiResult<Vec<Outline>> {
    let outlines = super::service(&state)
        .list(current.user.id, query.organization_id.as_deref())
        .await?;
    Ok(ApiResponse::success(outlines))
}

/// POST /api/outlines - Create an outline
///
/// Input: `organizationId` plus every outline field.
pub async fn post(
    State(state): State<AppState>,
    current: CurrentSession,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Outline> {
    // Unparseable bodies still go through the missing-organization check
    let body = json_body(body).unwrap_or_else(|e| {
        tracing::debug!("Outline create body rejected: {}", e);
        Value::Null
    });
    let outline = super::service(&state).create(current.user.id, &body).await?;
    Ok(ApiResponse::created(outline))
}
