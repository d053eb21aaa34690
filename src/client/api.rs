use reqwest::{header, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use url::Url;
use uuid::Uuid;

use crate::database::models::{FullOrganization, Invitation, Organization, Outline, OutlineFields, OutlinePatch, Session};
use crate::services::{AcceptedInvitation, AuthPayload, RemovedMember, SessionView};
use crate::validation::FieldError;

pub const DEFAULT_COOKIE_NAME: &str = "workspace.session_token";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Invalid server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("{message} (HTTP {status})")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
        details: Vec<FieldError>,
    },

    #[error("Not signed in")]
    NotSignedIn,
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Error body produced by the server for every non-2xx response
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    code: Option<String>,
    #[serde(default)]
    details: Vec<FieldError>,
}

#[derive(Debug, Deserialize)]
struct SessionEnvelope {
    session: Session,
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateOutlineRequest<'a> {
    organization_id: Uuid,
    #[serde(flatten)]
    fields: &'a OutlineFields,
}

/// Typed access to every HTTP endpoint. The session token, once known, is
/// sent as the session cookie on each request. No request timeout is set.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    cookie_name: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            token: None,
        })
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    // Server

    pub async fn health(&self) -> Result<Value, ClientError> {
        self.send(Method::GET, "health", None).await
    }

    // Session

    /// Registers and keeps the issued token for subsequent calls
    pub async fn sign_up(&mut self, name: &str, email: &str, password: &str) -> Result<AuthPayload, ClientError> {
        let body = json!({ "name": name, "email": email, "password": password });
        let payload: AuthPayload = self.send(Method::POST, "api/auth/sign-up/email", Some(body)).await?;
        self.token = Some(payload.token.clone());
        Ok(payload)
    }

    /// Signs in and keeps the issued token for subsequent calls
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<AuthPayload, ClientError> {
        let body = json!({ "email": email, "password": password });
        let payload: AuthPayload = self.send(Method::POST, "api/auth/sign-in/email", Some(body)).await?;
        self.token = Some(payload.token.clone());
        Ok(payload)
    }

    pub async fn sign_out(&mut self) -> Result<(), ClientError> {
        self.require_token()?;
        let _: Value = self.send(Method::POST, "api/auth/sign-out", None).await?;
        self.token = None;
        Ok(())
    }

    pub async fn get_session(&self) -> Result<Option<SessionView>, ClientError> {
        if self.token.is_none() {
            return Ok(None);
        }
        self.send(Method::GET, "api/auth/get-session", None).await
    }

    // Organizations

    pub async fn create_organization(&self, name: &str, slug: &str) -> Result<Organization, ClientError> {
        let body = json!({ "name": name, "slug": slug });
        self.send(Method::POST, "api/auth/organization/create", Some(body)).await
    }

    pub async fn list_organizations(&self) -> Result<Vec<Organization>, ClientError> {
        self.send(Method::GET, "api/auth/organization/list", None).await
    }

    pub async fn set_active_organization(&self, organization_id: Option<Uuid>) -> Result<Session, ClientError> {
        let body = json!({ "organizationId": organization_id });
        let envelope: SessionEnvelope = self
            .send(Method::POST, "api/auth/organization/set-active", Some(body))
            .await?;
        Ok(envelope.session)
    }

    pub async fn full_organization(&self, organization_id: Option<Uuid>) -> Result<FullOrganization, ClientError> {
        let mut url = self.url("api/auth/organization/get-full-organization")?;
        if let Some(id) = organization_id {
            url.query_pairs_mut().append_pair("organizationId", &id.to_string());
        }
        self.execute(self.request(Method::GET, url)).await
    }

    pub async fn invite_member(&self, email: &str, organization_id: Option<Uuid>) -> Result<Invitation, ClientError> {
        let body = json!({ "email": email, "role": "member", "organizationId": organization_id });
        self.send(Method::POST, "api/auth/organization/invite-member", Some(body)).await
    }

    pub async fn accept_invitation(&self, invitation_id: Uuid) -> Result<AcceptedInvitation, ClientError> {
        let body = json!({ "invitationId": invitation_id });
        self.send(Method::POST, "api/auth/organization/accept-invitation", Some(body)).await
    }

    pub async fn remove_member(
        &self,
        member_id: Uuid,
        organization_id: Option<Uuid>,
    ) -> Result<RemovedMember, ClientError> {
        let body = json!({ "memberId": member_id, "organizationId": organization_id });
        self.send(Method::POST, "api/auth/organization/remove-member", Some(body)).await
    }

    // Outlines

    pub async fn list_outlines(&self, organization_id: Uuid) -> Result<Vec<Outline>, ClientError> {
        let mut url = self.url("api/outlines")?;
        url.query_pairs_mut()
            .append_pair("organizationId", &organization_id.to_string());
        self.execute(self.request(Method::GET, url)).await
    }

    pub async fn create_outline(&self, organization_id: Uuid, fields: &OutlineFields) -> Result<Outline, ClientError> {
        let body = serde_json::to_value(CreateOutlineRequest { organization_id, fields })?;
        self.send(Method::POST, "api/outlines", Some(body)).await
    }

    pub async fn update_outline(&self, id: Uuid, patch: &OutlinePatch) -> Result<Outline, ClientError> {
        let body = serde_json::to_value(patch)?;
        self.send(Method::PUT, &format!("api/outlines/{}", id), Some(body)).await
    }

    pub async fn delete_outline(&self, id: Uuid) -> Result<String, ClientError> {
        let body: MessageBody = self.send(Method::DELETE, &format!("api/outlines/{}", id), None).await?;
        Ok(body.message)
    }

    pub async fn duplicate_outline(&self, id: Uuid) -> Result<Outline, ClientError> {
        self.send(Method::POST, &format!("api/outlines/{}/duplicate", id), None).await
    }

    // Plumbing

    fn require_token(&self) -> Result<&str, ClientError> {
        self.token.as_deref().ok_or(ClientError::NotSignedIn)
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path)?)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.header(header::COOKIE, format!("{}={}", self.cookie_name, token)),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T, ClientError> {
        let url = self.url(path)?;
        let mut builder = self.request(method, url);
        if let Some(body) = body {
            builder = builder.json(&body);
        }
        self.execute(builder).await
    }

    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = builder.send().await?;
        let response = check_status(response).await?;
        Ok(response.json::<T>().await?)
    }
}

async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let (message, code, details) = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => (body.error, body.code, body.details),
        Err(_) if text.is_empty() => (status.to_string(), None, Vec::new()),
        Err(_) => (text, None, Vec::new()),
    };
    tracing::debug!("HTTP {} from server: {}", status.as_u16(), message);

    Err(ClientError::Api {
        status: status.as_u16(),
        code,
        message,
        details,
    })
}
