use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use super::models::{
    Invitation, InvitationStatus, Member, MemberRole, MemberWithUser, Organization, Outline,
    OutlineFields, OutlinePatch, Session, User,
};

/// Errors from a Store implementation
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewOrganization {
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone)]
pub struct NewInvitation {
    pub organization_id: Uuid,
    pub email: String,
    pub role: MemberRole,
    pub inviter_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Data access for every persistent record the API touches.
///
/// Implementations are constructed once at startup and shared through
/// `AppState`. Each method is a single logical statement; callers compose
/// them without an enclosing transaction.
#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> Result<(), StoreError>;

    // Users
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    // Sessions
    async fn create_session(&self, user_id: Uuid, expires_at: DateTime<Utc>) -> Result<Session, StoreError>;
    async fn find_session(&self, id: Uuid) -> Result<Option<Session>, StoreError>;
    async fn delete_session(&self, id: Uuid) -> Result<bool, StoreError>;
    async fn set_active_organization(
        &self,
        session_id: Uuid,
        organization_id: Option<Uuid>,
    ) -> Result<Session, StoreError>;

    // Organizations
    /// Insert the organization and the owner's membership together.
    /// A taken slug yields `StoreError::Conflict`.
    async fn create_organization(
        &self,
        organization: NewOrganization,
        owner_id: Uuid,
    ) -> Result<(Organization, Member), StoreError>;
    async fn find_organization(&self, id: Uuid) -> Result<Option<Organization>, StoreError>;
    async fn find_organization_by_slug(&self, slug: &str) -> Result<Option<Organization>, StoreError>;
    async fn list_organizations_for_user(&self, user_id: Uuid) -> Result<Vec<Organization>, StoreError>;
    async fn count_memberships(&self, user_id: Uuid) -> Result<usize, StoreError>;

    // Members
    /// Point lookup on (organization, user). Backs every authorization check.
    async fn find_member(&self, organization_id: Uuid, user_id: Uuid) -> Result<Option<Member>, StoreError>;
    async fn find_member_by_id(&self, id: Uuid) -> Result<Option<Member>, StoreError>;
    async fn list_members(&self, organization_id: Uuid) -> Result<Vec<MemberWithUser>, StoreError>;
    async fn add_member(&self, organization_id: Uuid, user_id: Uuid, role: MemberRole) -> Result<Member, StoreError>;
    async fn delete_member(&self, id: Uuid) -> Result<bool, StoreError>;

    // Invitations
    async fn create_invitation(&self, invitation: NewInvitation) -> Result<Invitation, StoreError>;
    async fn find_invitation(&self, id: Uuid) -> Result<Option<Invitation>, StoreError>;
    async fn find_pending_invitation(
        &self,
        organization_id: Uuid,
        email: &str,
    ) -> Result<Option<Invitation>, StoreError>;
    async fn list_invitations(&self, organization_id: Uuid) -> Result<Vec<Invitation>, StoreError>;
    async fn set_invitation_status(&self, id: Uuid, status: InvitationStatus) -> Result<Invitation, StoreError>;

    // Outlines
    /// All outlines of an organization, newest first
    async fn list_outlines(&self, organization_id: Uuid) -> Result<Vec<Outline>, StoreError>;
    async fn find_outline(&self, id: Uuid) -> Result<Option<Outline>, StoreError>;
    async fn insert_outline(&self, organization_id: Uuid, fields: OutlineFields) -> Result<Outline, StoreError>;
    /// Returns `None` when the row no longer exists
    async fn update_outline(&self, id: Uuid, patch: OutlinePatch) -> Result<Option<Outline>, StoreError>;
    async fn delete_outline(&self, id: Uuid) -> Result<bool, StoreError>;
}
