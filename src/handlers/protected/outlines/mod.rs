// handlers/protected/outlines/mod.rs - Outline endpoints
//
// Collection:  GET/POST   /api/outlines
// Record:      PUT/DELETE /api/outlines/:id
// Duplicate:   POST       /api/outlines/:id/duplicate

pub mod collection;
pub mod duplicate;
pub mod record;

pub use collection::get as outlines_get;
pub use collection::post as outlines_post;
pub use duplicate::post as outline_duplicate;
pub use record::delete as outline_delete;
pub use record::put as outline_put;

use crate::services::OutlineService;
use crate::state::AppState;

fn service(state: &AppState) -> OutlineService {
    OutlineService::new(state.store.clone())
}
