pub mod organization;
pub mod outline;
pub mod user;

pub use organization::{
    FullOrganization, Invitation, InvitationStatus, Member, MemberRole, MemberWithUser, Organization,
};
pub use outline::{Outline, OutlineFields, OutlinePatch, OutlineStatus, Reviewer, SectionType, WireEnum};
pub use user::{Session, User, UserSummary};
