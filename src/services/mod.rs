pub mod access;
pub mod account_service;
pub mod organization_service;
pub mod outline_service;

pub use account_service::{AccountService, AuthPayload, SessionView};
pub use organization_service::{AcceptedInvitation, OrganizationService, RemovedMember};
pub use outline_service::OutlineService;
