use uuid::Uuid;

use super::api::{ApiClient, ClientError};
use crate::database::models::{Organization, Session, User};

/// Explicit client-side store for the signed-in session and its active
/// organization.
///
/// Nothing refetches implicitly: callers invoke [`ClientState::refresh`]
/// after any mutation that can change either projection.
#[derive(Debug, Default, Clone)]
pub struct ClientState {
    session: Option<Session>,
    user: Option<User>,
    active_organization: Option<Organization>,
}

impl ClientState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn active_organization(&self) -> Option<&Organization> {
        self.active_organization.as_ref()
    }

    pub fn active_organization_id(&self) -> Option<Uuid> {
        self.session.as_ref().and_then(|s| s.active_organization_id)
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }

    /// Re-read the session, then resolve the active organization against the
    /// caller's organization list.
    pub async fn refresh(&mut self, client: &ApiClient) -> Result<(), ClientError> {
        let Some(view) = client.get_session().await? else {
            self.clear();
            return Ok(());
        };

        let active = match view.session.active_organization_id {
            Some(id) => client
                .list_organizations()
                .await?
                .into_iter()
                .find(|org| org.id == id),
            None => None,
        };

        self.apply(view.session, view.user, active);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.session = None;
        self.user = None;
        self.active_organization = None;
    }

    fn apply(&mut self, session: Session, user: User, active: Option<Organization>) {
        self.session = Some(session);
        self.user = Some(user);
        self.active_organization = active;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn projections_follow_applied_state() {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password_hash: String::new(),
            created_at: now,
            updated_at: now,
        };
        let org = Organization {
            id: Uuid::new_v4(),
            name: "Acme".into(),
            slug: "acme".into(),
            created_at: now,
        };
        let session = Session {
            id: Uuid::new_v4(),
            user_id: user.id,
            active_organization_id: Some(org.id),
            expires_at: now + Duration::hours(1),
            created_at: now,
        };

        let mut state = ClientState::new();
        assert!(!state.is_signed_in());
        assert!(state.active_organization().is_none());

        state.apply(session, user, Some(org.clone()));
        assert!(state.is_signed_in());
        assert_eq!(state.active_organization_id(), Some(org.id));
        assert_eq!(state.active_organization().map(|o| o.slug.as_str()), Some("acme"));

        state.clear();
        assert!(state.session().is_none());
        assert!(state.user().is_none());
    }
}
