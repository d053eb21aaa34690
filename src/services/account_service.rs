use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::{hash_password, issue_session_token, verify_password, CurrentSession, SessionClaims};
use crate::config::AppConfig;
use crate::database::models::{Session, User};
use crate::database::{NewUser, Store, StoreError};
use crate::error::ApiError;
use crate::validation;

/// Issued credentials returned by sign-up and sign-in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthPayload {
    pub token: String,
    pub user: User,
    pub session: Session,
}

/// Current session as reported by `get-session`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub session: Session,
    pub user: User,
}

impl From<CurrentSession> for SessionView {
    fn from(current: CurrentSession) -> Self {
        Self {
            session: current.session,
            user: current.user,
        }
    }
}

/// Email/password accounts and their server-side sessions
pub struct AccountService {
    store: Arc<dyn Store>,
    config: Arc<AppConfig>,
}

impl AccountService {
    pub fn new(store: Arc<dyn Store>, config: Arc<AppConfig>) -> Self {
        Self { store, config }
    }

    pub async fn sign_up(&self, body: &Value) -> Result<AuthPayload, ApiError> {
        let input = validation::sign_up(body)?;

        if self.store.find_user_by_email(&input.email).await?.is_some() {
            return Err(ApiError::unprocessable_entity("User already exists"));
        }

        let user = self
            .store
            .create_user(NewUser {
                name: input.name,
                email: input.email,
                password_hash: hash_password(&input.password),
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => ApiError::unprocessable_entity("User already exists"),
                other => other.into(),
            })?;

        tracing::info!("Registered user {}", user.id);
        self.start_session(user).await
    }

    pub async fn sign_in(&self, body: &Value) -> Result<AuthPayload, ApiError> {
        let input = validation::sign_in(body)?;

        let user = match self.store.find_user_by_email(&input.email).await? {
            Some(user) if verify_password(&input.password, &user.password_hash) => user,
            _ => {
                tracing::warn!("Failed sign-in attempt");
                return Err(ApiError::unauthorized("Invalid email or password"));
            }
        };

        self.start_session(user).await
    }

    pub async fn sign_out(&self, current: &CurrentSession) -> Result<(), ApiError> {
        self.store.delete_session(current.session.id).await?;
        tracing::info!("Session {} signed out", current.session.id);
        Ok(())
    }

    async fn start_session(&self, user: User) -> Result<AuthPayload, ApiError> {
        let expires_at = self.config.security.session_expiry(Utc::now()).ok_or_else(|| {
            tracing::error!(
                "Session TTL of {} hours is out of range",
                self.config.security.session_ttl_hours
            );
            ApiError::internal_server_error("Internal server error")
        })?;
        let session = self.store.create_session(user.id, expires_at).await?;

        let claims = SessionClaims::new(session.id, user.id, session.expires_at);
        let token = issue_session_token(&claims, &self.config.security.session_secret).map_err(|e| {
            tracing::error!("Failed to issue session token: {}", e);
            ApiError::internal_server_error("Internal server error")
        })?;

        tracing::debug!("Started session {} for user {}", session.id, user.id);
        Ok(AuthPayload { token, user, session })
    }
}
