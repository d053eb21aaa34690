use axum::extract::{Query, State};
use serde::Deserialize;

use crate::auth::CurrentSession;
use crate::database::models::FullOrganization;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FullOrganizationQuery {
    /// Defaults to the session's active organization when omitted
    #[serde(rename = "organizationId")]
    pub organization_id: Option<String>,
}

/// GET /api/auth/organization/get-full-organization - Organization with members and invitations
pub async fn get_full_organization(
    State(state): State<AppState>,
    current: CurrentSession,
    Query(query): Query<FullOrganizationQuery>,
) -> ApiResult<FullOrganization> {
    let full = super::service(&state)
        .full(&current, query.organization_id.as_deref())
        .await?;
    Ok(ApiResponse::success(full))
}
