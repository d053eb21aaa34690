use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::access::{parse_organization_id, require_membership, require_owner};
use crate::auth::CurrentSession;
use crate::config::AppConfig;
use crate::database::models::{FullOrganization, Invitation, InvitationStatus, Member, Organization, Session};
use crate::database::{NewInvitation, NewOrganization, Store, StoreError};
use crate::error::ApiError;
use crate::validation;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptedInvitation {
    pub invitation: Invitation,
    pub member: Member,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemovedMember {
    pub member: Member,
}

/// Organizations, memberships and invitations
pub struct OrganizationService {
    store: Arc<dyn Store>,
    config: Arc<AppConfig>,
}

impl OrganizationService {
    pub fn new(store: Arc<dyn Store>, config: Arc<AppConfig>) -> Self {
        Self { store, config }
    }

    /// Create an organization owned by the caller and make it the active one
    pub async fn create(&self, current: &CurrentSession, body: &Value) -> Result<Organization, ApiError> {
        let input = validation::create_organization(body)?;
        self.check_membership_limit(current.user.id).await?;

        let (organization, _owner) = self
            .store
            .create_organization(
                NewOrganization {
                    name: input.name,
                    slug: input.slug,
                },
                current.user.id,
            )
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => ApiError::conflict("Organization already exists"),
                other => other.into(),
            })?;

        self.store
            .set_active_organization(current.session.id, Some(organization.id))
            .await?;

        tracing::info!("User {} created organization {}", current.user.id, organization.id);
        Ok(organization)
    }

    pub async fn list(&self, current: &CurrentSession) -> Result<Vec<Organization>, ApiError> {
        Ok(self.store.list_organizations_for_user(current.user.id).await?)
    }

    /// Select (or clear, with `null`) the session's active organization
    pub async fn set_active(&self, current: &CurrentSession, body: &Value) -> Result<Session, ApiError> {
        let organization_id = validation::optional_id(body, "organizationId")?;
        if let Some(organization_id) = organization_id {
            require_membership(self.store.as_ref(), organization_id, current.user.id).await?;
        }
        Ok(self
            .store
            .set_active_organization(current.session.id, organization_id)
            .await?)
    }

    pub async fn full(
        &self,
        current: &CurrentSession,
        organization_id: Option<&str>,
    ) -> Result<FullOrganization, ApiError> {
        let organization_id = match organization_id.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => parse_organization_id(raw)?,
            None => active_organization(current)?,
        };
        require_membership(self.store.as_ref(), organization_id, current.user.id).await?;

        let organization = self
            .store
            .find_organization(organization_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Organization not found"))?;
        let members = self.store.list_members(organization_id).await?;
        let invitations = self.store.list_invitations(organization_id).await?;

        Ok(FullOrganization {
            organization,
            members,
            invitations,
        })
    }

    pub async fn invite(&self, current: &CurrentSession, body: &Value) -> Result<Invitation, ApiError> {
        let input = validation::invite_member(body)?;
        let organization_id = match input.organization_id {
            Some(id) => id,
            None => active_organization(current)?,
        };
        require_owner(self.store.as_ref(), organization_id, current.user.id, "invite members").await?;

        if let Some(user) = self.store.find_user_by_email(&input.email).await? {
            if self.store.find_member(organization_id, user.id).await?.is_some() {
                return Err(ApiError::conflict("User is already a member of this organization"));
            }
        }
        if self
            .store
            .find_pending_invitation(organization_id, &input.email)
            .await?
            .is_some()
        {
            return Err(ApiError::conflict("User is already invited to this organization"));
        }

        let expires_at = self.config.organization.invitation_expiry(Utc::now()).ok_or_else(|| {
            tracing::error!(
                "Invitation TTL of {} hours is out of range",
                self.config.organization.invitation_ttl_hours
            );
            ApiError::internal_server_error("Internal server error")
        })?;
        let invitation = self
            .store
            .create_invitation(NewInvitation {
                organization_id,
                email: input.email,
                role: input.role,
                inviter_id: current.user.id,
                expires_at,
            })
            .await?;

        // Delivery is handled outside this service; the id is what recipients redeem
        tracing::info!(
            "Invitation {} created for organization {}",
            invitation.id,
            organization_id
        );
        Ok(invitation)
    }

    pub async fn accept(&self, current: &CurrentSession, body: &Value) -> Result<AcceptedInvitation, ApiError> {
        let invitation_id = validation::required_id(body, "invitationId")?;
        let invitation = self
            .store
            .find_invitation(invitation_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Invitation not found"))?;

        if invitation.status != InvitationStatus::Pending {
            return Err(ApiError::bad_request("Invitation is no longer pending"));
        }
        if invitation.is_expired(Utc::now()) {
            return Err(ApiError::bad_request("Invitation has expired"));
        }
        if !invitation.email.eq_ignore_ascii_case(&current.user.email) {
            tracing::warn!(
                "User {} tried to accept invitation {} addressed to someone else",
                current.user.id,
                invitation.id
            );
            return Err(ApiError::forbidden("This invitation is not addressed to you"));
        }
        self.check_membership_limit(current.user.id).await?;

        let member = self
            .store
            .add_member(invitation.organization_id, current.user.id, invitation.role)
            .await?;
        let invitation = self
            .store
            .set_invitation_status(invitation.id, InvitationStatus::Accepted)
            .await?;
        self.store
            .set_active_organization(current.session.id, Some(invitation.organization_id))
            .await?;

        tracing::info!(
            "User {} joined organization {}",
            current.user.id,
            invitation.organization_id
        );
        Ok(AcceptedInvitation { invitation, member })
    }

    /// Remove a membership record. Only owners may remove, and never themselves.
    pub async fn remove_member(&self, current: &CurrentSession, body: &Value) -> Result<RemovedMember, ApiError> {
        let member_id = validation::required_id(body, "memberId")?;
        let organization_id = match validation::optional_id(body, "organizationId")? {
            Some(id) => id,
            None => active_organization(current)?,
        };
        require_owner(self.store.as_ref(), organization_id, current.user.id, "remove members").await?;

        let member = self
            .store
            .find_member_by_id(member_id)
            .await?
            .filter(|m| m.organization_id == organization_id)
            .ok_or_else(|| ApiError::not_found("Member not found"))?;

        if member.user_id == current.user.id {
            return Err(ApiError::bad_request("You cannot remove yourself from the organization"));
        }

        if !self.store.delete_member(member.id).await? {
            return Err(ApiError::not_found("Member not found"));
        }

        tracing::info!(
            "User {} removed member {} from organization {}",
            current.user.id,
            member.id,
            organization_id
        );
        Ok(RemovedMember { member })
    }

    async fn check_membership_limit(&self, user_id: Uuid) -> Result<(), ApiError> {
        let count = self.store.count_memberships(user_id).await?;
        if count >= self.config.organization.limit_per_user {
            return Err(ApiError::forbidden(
                "You have reached the maximum number of organizations",
            ));
        }
        Ok(())
    }
}

fn active_organization(current: &CurrentSession) -> Result<Uuid, ApiError> {
    current
        .session
        .active_organization_id
        .ok_or_else(|| ApiError::bad_request("No active organization"))
}
