// handlers/protected/organization/mod.rs - Organization, membership and
// invitation endpoints under /api/auth/organization

pub mod accept; // POST /api/auth/organization/accept-invitation
pub mod create; // POST /api/auth/organization/create
pub mod full; // GET  /api/auth/organization/get-full-organization
pub mod invite; // POST /api/auth/organization/invite-member
pub mod list; // GET  /api/auth/organization/list
pub mod remove_member; // POST /api/auth/organization/remove-member
pub mod set_active; // POST /api/auth/organization/set-active

pub use accept::accept_invitation;
pub use create::create;
pub use full::get_full_organization;
pub use invite::invite_member;
pub use list::list;
pub use remove_member::remove_member;
pub use set_active::set_active;

use crate::services::OrganizationService;
use crate::state::AppState;

fn service(state: &AppState) -> OrganizationService {
    OrganizationService::new(state.store.clone(), state.config.clone())
}
