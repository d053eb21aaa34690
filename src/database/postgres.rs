use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use tracing::{debug, info};
use uuid::Uuid;

use super::models::{
    Invitation, InvitationStatus, Member, MemberRole, MemberWithUser, Organization, Outline,
    OutlineFields, OutlinePatch, Session, User, UserSummary,
};
use super::store::{NewInvitation, NewOrganization, NewUser, Store, StoreError};
use crate::config::DatabaseConfig;

const OUTLINE_COLUMNS: &str =
    r#"id, header, section_type, status, target, "limit", reviewer, organization_id, created_at, updated_at"#;
const INVITATION_COLUMNS: &str = "id, organization_id, email, role, status, inviter_id, expires_at, created_at";
const SESSION_COLUMNS: &str = "id, user_id, active_organization_id, expires_at, created_at";

/// Postgres-backed store. Built once at startup and shared through `AppState`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str, config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(url)
            .await?;
        info!("Created database pool (max {} connections)", config.max_connections);
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }
}

/// Map unique-constraint violations to `Conflict`, everything else passes through
fn conflict_on_unique(err: sqlx::Error, message: impl Into<String>) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict(message.into()),
        _ => StoreError::Sqlx(err),
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let email = user.email.clone();
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, name, email, password_hash)
             VALUES ($1, $2, $3, $4)
             RETURNING id, name, email, password_hash, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, format!("User with email '{}' already exists", email)))
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, password_hash, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, password_hash, created_at, updated_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create_session(&self, user_id: Uuid, expires_at: DateTime<Utc>) -> Result<Session, StoreError> {
        let pruned = sqlx::query("DELETE FROM sessions WHERE expires_at <= now()")
            .execute(&self.pool)
            .await?
            .rows_affected();
        if pruned > 0 {
            debug!("Pruned {} expired sessions", pruned);
        }

        let sql = format!(
            "INSERT INTO sessions (id, user_id, expires_at) VALUES ($1, $2, $3) RETURNING {}",
            SESSION_COLUMNS
        );
        let session = sqlx::query_as::<_, Session>(&sql)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(expires_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(session)
    }

    async fn find_session(&self, id: Uuid) -> Result<Option<Session>, StoreError> {
        let sql = format!("SELECT {} FROM sessions WHERE id = $1", SESSION_COLUMNS);
        let session = sqlx::query_as::<_, Session>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(session)
    }

    async fn delete_session(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_active_organization(
        &self,
        session_id: Uuid,
        organization_id: Option<Uuid>,
    ) -> Result<Session, StoreError> {
        let sql = format!(
            "UPDATE sessions SET active_organization_id = $2 WHERE id = $1 RETURNING {}",
            SESSION_COLUMNS
        );
        sqlx::query_as::<_, Session>(&sql)
            .bind(session_id)
            .bind(organization_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound("Session not found".to_string()))
    }

    async fn create_organization(
        &self,
        organization: NewOrganization,
        owner_id: Uuid,
    ) -> Result<(Organization, Member), StoreError> {
        let slug = organization.slug.clone();
        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, Organization>(
            "INSERT INTO organizations (id, name, slug) VALUES ($1, $2, $3)
             RETURNING id, name, slug, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&organization.name)
        .bind(&organization.slug)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, format!("Organization with slug '{}' already exists", slug)))?;

        let owner = sqlx::query_as::<_, Member>(
            "INSERT INTO members (id, organization_id, user_id, role) VALUES ($1, $2, $3, $4)
             RETURNING id, organization_id, user_id, role, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(record.id)
        .bind(owner_id)
        .bind(MemberRole::Owner)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((record, owner))
    }

    async fn find_organization(&self, id: Uuid) -> Result<Option<Organization>, StoreError> {
        let organization = sqlx::query_as::<_, Organization>(
            "SELECT id, name, slug, created_at FROM organizations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(organization)
    }

    async fn find_organization_by_slug(&self, slug: &str) -> Result<Option<Organization>, StoreError> {
        let organization = sqlx::query_as::<_, Organization>(
            "SELECT id, name, slug, created_at FROM organizations WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(organization)
    }

    async fn list_organizations_for_user(&self, user_id: Uuid) -> Result<Vec<Organization>, StoreError> {
        let organizations = sqlx::query_as::<_, Organization>(
            "SELECT o.id, o.name, o.slug, o.created_at
             FROM organizations o
             JOIN members m ON m.organization_id = o.id
             WHERE m.user_id = $1
             ORDER BY o.created_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(organizations)
    }

    async fn count_memberships(&self, user_id: Uuid) -> Result<usize, StoreError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM members WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0 as usize)
    }

    async fn find_member(&self, organization_id: Uuid, user_id: Uuid) -> Result<Option<Member>, StoreError> {
        let member = sqlx::query_as::<_, Member>(
            "SELECT id, organization_id, user_id, role, created_at
             FROM members WHERE organization_id = $1 AND user_id = $2",
        )
        .bind(organization_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(member)
    }

    async fn find_member_by_id(&self, id: Uuid) -> Result<Option<Member>, StoreError> {
        let member = sqlx::query_as::<_, Member>(
            "SELECT id, organization_id, user_id, role, created_at FROM members WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(member)
    }

    async fn list_members(&self, organization_id: Uuid) -> Result<Vec<MemberWithUser>, StoreError> {
        let rows = sqlx::query(
            "SELECT m.id, m.organization_id, m.user_id, m.role, m.created_at,
                    u.name AS user_name, u.email AS user_email
             FROM members m
             JOIN users u ON u.id = m.user_id
             WHERE m.organization_id = $1
             ORDER BY m.created_at ASC",
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let user_id: Uuid = row.try_get("user_id")?;
                Ok(MemberWithUser {
                    member: Member {
                        id: row.try_get("id")?,
                        organization_id: row.try_get("organization_id")?,
                        user_id,
                        role: row.try_get("role")?,
                        created_at: row.try_get("created_at")?,
                    },
                    user: UserSummary {
                        id: user_id,
                        name: row.try_get("user_name")?,
                        email: row.try_get("user_email")?,
                    },
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(StoreError::from)
    }

    async fn add_member(&self, organization_id: Uuid, user_id: Uuid, role: MemberRole) -> Result<Member, StoreError> {
        sqlx::query_as::<_, Member>(
            "INSERT INTO members (id, organization_id, user_id, role) VALUES ($1, $2, $3, $4)
             RETURNING id, organization_id, user_id, role, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(organization_id)
        .bind(user_id)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "User is already a member of this organization"))
    }

    async fn delete_member(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM members WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_invitation(&self, invitation: NewInvitation) -> Result<Invitation, StoreError> {
        let sql = format!(
            "INSERT INTO invitations (id, organization_id, email, role, status, inviter_id, expires_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            INVITATION_COLUMNS
        );
        let record = sqlx::query_as::<_, Invitation>(&sql)
            .bind(Uuid::new_v4())
            .bind(invitation.organization_id)
            .bind(&invitation.email)
            .bind(invitation.role)
            .bind(InvitationStatus::Pending)
            .bind(invitation.inviter_id)
            .bind(invitation.expires_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(record)
    }

    async fn find_invitation(&self, id: Uuid) -> Result<Option<Invitation>, StoreError> {
        let sql = format!("SELECT {} FROM invitations WHERE id = $1", INVITATION_COLUMNS);
        let invitation = sqlx::query_as::<_, Invitation>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(invitation)
    }

    async fn find_pending_invitation(
        &self,
        organization_id: Uuid,
        email: &str,
    ) -> Result<Option<Invitation>, StoreError> {
        let sql = format!(
            "SELECT {} FROM invitations
             WHERE organization_id = $1 AND email = $2 AND status = $3 AND expires_at > now()
             ORDER BY created_at DESC LIMIT 1",
            INVITATION_COLUMNS
        );
        let invitation = sqlx::query_as::<_, Invitation>(&sql)
            .bind(organization_id)
            .bind(email)
            .bind(InvitationStatus::Pending)
            .fetch_optional(&self.pool)
            .await?;
        Ok(invitation)
    }

    async fn list_invitations(&self, organization_id: Uuid) -> Result<Vec<Invitation>, StoreError> {
        let sql = format!(
            "SELECT {} FROM invitations WHERE organization_id = $1 ORDER BY created_at ASC",
            INVITATION_COLUMNS
        );
        let invitations = sqlx::query_as::<_, Invitation>(&sql)
            .bind(organization_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(invitations)
    }

    async fn set_invitation_status(&self, id: Uuid, status: InvitationStatus) -> Result<Invitation, StoreError> {
        let sql = format!(
            "UPDATE invitations SET status = $2 WHERE id = $1 RETURNING {}",
            INVITATION_COLUMNS
        );
        sqlx::query_as::<_, Invitation>(&sql)
            .bind(id)
            .bind(status)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound("Invitation not found".to_string()))
    }

    async fn list_outlines(&self, organization_id: Uuid) -> Result<Vec<Outline>, StoreError> {
        let sql = format!(
            "SELECT {} FROM outlines WHERE organization_id = $1 ORDER BY created_at DESC",
            OUTLINE_COLUMNS
        );
        let outlines = sqlx::query_as::<_, Outline>(&sql)
            .bind(organization_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(outlines)
    }

    async fn find_outline(&self, id: Uuid) -> Result<Option<Outline>, StoreError> {
        let sql = format!("SELECT {} FROM outlines WHERE id = $1", OUTLINE_COLUMNS);
        let outline = sqlx::query_as::<_, Outline>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(outline)
    }

    async fn insert_outline(&self, organization_id: Uuid, fields: OutlineFields) -> Result<Outline, StoreError> {
        let sql = format!(
            r#"INSERT INTO outlines (id, header, section_type, status, target, "limit", reviewer, organization_id)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}"#,
            OUTLINE_COLUMNS
        );
        let outline = sqlx::query_as::<_, Outline>(&sql)
            .bind(Uuid::new_v4())
            .bind(&fields.header)
            .bind(fields.section_type)
            .bind(fields.status)
            .bind(fields.target)
            .bind(fields.limit)
            .bind(fields.reviewer)
            .bind(organization_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(outline)
    }

    async fn update_outline(&self, id: Uuid, patch: OutlinePatch) -> Result<Option<Outline>, StoreError> {
        // Single statement: absent fields keep their stored value
        let sql = format!(
            r#"UPDATE outlines SET
                   header = COALESCE($2, header),
                   section_type = COALESCE($3, section_type),
                   status = COALESCE($4, status),
                   target = COALESCE($5, target),
                   "limit" = COALESCE($6, "limit"),
                   reviewer = COALESCE($7, reviewer),
                   updated_at = now()
               WHERE id = $1
               RETURNING {}"#,
            OUTLINE_COLUMNS
        );
        let outline = sqlx::query_as::<_, Outline>(&sql)
            .bind(id)
            .bind(patch.header)
            .bind(patch.section_type)
            .bind(patch.status)
            .bind(patch.target)
            .bind(patch.limit)
            .bind(patch.reviewer)
            .fetch_optional(&self.pool)
            .await?;
        Ok(outline)
    }

    async fn delete_outline(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM outlines WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
