use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::{
    Invitation, InvitationStatus, Member, MemberRole, MemberWithUser, Organization, Outline,
    OutlineFields, OutlinePatch, Session, User,
};
use super::store::{NewInvitation, NewOrganization, NewUser, Store, StoreError};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    sessions: HashMap<Uuid, Session>,
    organizations: HashMap<Uuid, Organization>,
    members: Vec<Member>,
    invitations: HashMap<Uuid, Invitation>,
    /// Insertion sequence breaks ties between identical creation timestamps
    outlines: Vec<(u64, Outline)>,
    next_seq: u64,
}

/// Process-local store with the same observable semantics as `PgStore`.
/// Used by the test suite and by development runs without `DATABASE_URL`.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(format!("User with email '{}' already exists", user.email)));
        }
        let now = Utc::now();
        let record = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn create_session(&self, user_id: Uuid, expires_at: DateTime<Utc>) -> Result<Session, StoreError> {
        let session = Session {
            id: Uuid::new_v4(),
            user_id,
            active_organization_id: None,
            expires_at,
            created_at: Utc::now(),
        };
        let mut tables = self.tables.write().await;
        let now = session.created_at;
        tables.sessions.retain(|_, s| s.expires_at > now);
        tables.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn find_session(&self, id: Uuid) -> Result<Option<Session>, StoreError> {
        Ok(self.tables.read().await.sessions.get(&id).cloned())
    }

    async fn delete_session(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.tables.write().await.sessions.remove(&id).is_some())
    }

    async fn set_active_organization(
        &self,
        session_id: Uuid,
        organization_id: Option<Uuid>,
    ) -> Result<Session, StoreError> {
        let mut tables = self.tables.write().await;
        let session = tables
            .sessions
            .get_mut(&session_id)
            .ok_or_else(|| StoreError::NotFound("Session not found".to_string()))?;
        session.active_organization_id = organization_id;
        Ok(session.clone())
    }

    async fn create_organization(
        &self,
        organization: NewOrganization,
        owner_id: Uuid,
    ) -> Result<(Organization, Member), StoreError> {
        let mut tables = self.tables.write().await;
        if tables.organizations.values().any(|o| o.slug == organization.slug) {
            return Err(StoreError::Conflict(format!(
                "Organization with slug '{}' already exists",
                organization.slug
            )));
        }
        let now = Utc::now();
        let record = Organization {
            id: Uuid::new_v4(),
            name: organization.name,
            slug: organization.slug,
            created_at: now,
        };
        let owner = Member {
            id: Uuid::new_v4(),
            organization_id: record.id,
            user_id: owner_id,
            role: MemberRole::Owner,
            created_at: now,
        };
        tables.organizations.insert(record.id, record.clone());
        tables.members.push(owner.clone());
        Ok((record, owner))
    }

    async fn find_organization(&self, id: Uuid) -> Result<Option<Organization>, StoreError> {
        Ok(self.tables.read().await.organizations.get(&id).cloned())
    }

    async fn find_organization_by_slug(&self, slug: &str) -> Result<Option<Organization>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.organizations.values().find(|o| o.slug == slug).cloned())
    }

    async fn list_organizations_for_user(&self, user_id: Uuid) -> Result<Vec<Organization>, StoreError> {
        let tables = self.tables.read().await;
        let mut organizations: Vec<Organization> = tables
            .members
            .iter()
            .filter(|m| m.user_id == user_id)
            .filter_map(|m| tables.organizations.get(&m.organization_id).cloned())
            .collect();
        organizations.sort_by_key(|o| o.created_at);
        Ok(organizations)
    }

    async fn count_memberships(&self, user_id: Uuid) -> Result<usize, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.members.iter().filter(|m| m.user_id == user_id).count())
    }

    async fn find_member(&self, organization_id: Uuid, user_id: Uuid) -> Result<Option<Member>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .members
            .iter()
            .find(|m| m.organization_id == organization_id && m.user_id == user_id)
            .cloned())
    }

    async fn find_member_by_id(&self, id: Uuid) -> Result<Option<Member>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.members.iter().find(|m| m.id == id).cloned())
    }

    async fn list_members(&self, organization_id: Uuid) -> Result<Vec<MemberWithUser>, StoreError> {
        let tables = self.tables.read().await;
        let mut members: Vec<MemberWithUser> = tables
            .members
            .iter()
            .filter(|m| m.organization_id == organization_id)
            .filter_map(|m| {
                tables.users.get(&m.user_id).map(|u| MemberWithUser {
                    member: m.clone(),
                    user: u.summary(),
                })
            })
            .collect();
        members.sort_by_key(|m| m.member.created_at);
        Ok(members)
    }

    async fn add_member(&self, organization_id: Uuid, user_id: Uuid, role: MemberRole) -> Result<Member, StoreError> {
        let mut tables = self.tables.write().await;
        if tables
            .members
            .iter()
            .any(|m| m.organization_id == organization_id && m.user_id == user_id)
        {
            return Err(StoreError::Conflict("User is already a member of this organization".to_string()));
        }
        let member = Member {
            id: Uuid::new_v4(),
            organization_id,
            user_id,
            role,
            created_at: Utc::now(),
        };
        tables.members.push(member.clone());
        Ok(member)
    }

    async fn delete_member(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.members.len();
        tables.members.retain(|m| m.id != id);
        Ok(tables.members.len() != before)
    }

    async fn create_invitation(&self, invitation: NewInvitation) -> Result<Invitation, StoreError> {
        let record = Invitation {
            id: Uuid::new_v4(),
            organization_id: invitation.organization_id,
            email: invitation.email,
            role: invitation.role,
            status: InvitationStatus::Pending,
            inviter_id: invitation.inviter_id,
            expires_at: invitation.expires_at,
            created_at: Utc::now(),
        };
        self.tables.write().await.invitations.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_invitation(&self, id: Uuid) -> Result<Option<Invitation>, StoreError> {
        Ok(self.tables.read().await.invitations.get(&id).cloned())
    }

    async fn find_pending_invitation(
        &self,
        organization_id: Uuid,
        email: &str,
    ) -> Result<Option<Invitation>, StoreError> {
        let now = Utc::now();
        let tables = self.tables.read().await;
        Ok(tables
            .invitations
            .values()
            .find(|i| {
                i.organization_id == organization_id
                    && i.email == email
                    && i.status == InvitationStatus::Pending
                    && !i.is_expired(now)
            })
            .cloned())
    }

    async fn list_invitations(&self, organization_id: Uuid) -> Result<Vec<Invitation>, StoreError> {
        let tables = self.tables.read().await;
        let mut invitations: Vec<Invitation> = tables
            .invitations
            .values()
            .filter(|i| i.organization_id == organization_id)
            .cloned()
            .collect();
        invitations.sort_by_key(|i| i.created_at);
        Ok(invitations)
    }

    async fn set_invitation_status(&self, id: Uuid, status: InvitationStatus) -> Result<Invitation, StoreError> {
        let mut tables = self.tables.write().await;
        let invitation = tables
            .invitations
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound("Invitation not found".to_string()))?;
        invitation.status = status;
        Ok(invitation.clone())
    }

    async fn list_outlines(&self, organization_id: Uuid) -> Result<Vec<Outline>, StoreError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<&(u64, Outline)> = tables
            .outlines
            .iter()
            .filter(|(_, o)| o.organization_id == organization_id)
            .collect();
        rows.sort_by(|(a_seq, a), (b_seq, b)| b.created_at.cmp(&a.created_at).then(b_seq.cmp(a_seq)));
        Ok(rows.into_iter().map(|(_, o)| o.clone()).collect())
    }

    async fn find_outline(&self, id: Uuid) -> Result<Option<Outline>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.outlines.iter().find(|(_, o)| o.id == id).map(|(_, o)| o.clone()))
    }

    async fn insert_outline(&self, organization_id: Uuid, fields: OutlineFields) -> Result<Outline, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.organizations.contains_key(&organization_id) {
            return Err(StoreError::NotFound("Organization not found".to_string()));
        }
        let now = Utc::now();
        let outline = Outline {
            id: Uuid::new_v4(),
            header: fields.header,
            section_type: fields.section_type,
            status: fields.status,
            target: fields.target,
            limit: fields.limit,
            reviewer: fields.reviewer,
            organization_id,
            created_at: now,
            updated_at: now,
        };
        let seq = tables.next_seq;
        tables.next_seq += 1;
        tables.outlines.push((seq, outline.clone()));
        Ok(outline)
    }

    async fn update_outline(&self, id: Uuid, patch: OutlinePatch) -> Result<Option<Outline>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some((_, outline)) = tables.outlines.iter_mut().find(|(_, o)| o.id == id) else {
            return Ok(None);
        };
        outline.apply(&patch);
        outline.updated_at = Utc::now();
        Ok(Some(outline.clone()))
    }

    async fn delete_outline(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.outlines.len();
        tables.outlines.retain(|(_, o)| o.id != id);
        Ok(tables.outlines.len() != before)
    }
}
