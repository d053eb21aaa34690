// handlers/public/auth/session.rs - GET /api/auth/get-session handler

use crate::auth::OptionalSession;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::SessionView;

/// GET /api/auth/get-session - Current session and user, or `null`
pub async fn get_session(OptionalSession(current): OptionalSession) -> ApiResult<Option<SessionView>> {
    Ok(ApiResponse::success(current.map(SessionView::from)))
}
