pub mod auth;
pub mod response;

pub use auth::require_session_cookie;
pub use response::{ApiResponse, ApiResult};
