#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use workspace_api::config::AppConfig;
use workspace_api::database::MemoryStore;
use workspace_api::state::AppState;

pub const COOKIE_NAME: &str = "workspace.session_token";

/// The real router over a fresh in-memory store. Each test builds its own.
pub struct TestApp {
    router: Router,
    pub store: Arc<MemoryStore>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// A signed-up user and their session token
pub struct TestUser {
    pub id: String,
    pub email: String,
    pub token: String,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(AppConfig::development())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone(), config);
        Self {
            router: workspace_api::app(state),
            store,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Result<TestResponse> {
        let response = self.router.clone().oneshot(request).await.context("router failed")?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).context("response body is not JSON")?
        };
        Ok(TestResponse { status, headers, body })
    }

    pub async fn request(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Result<TestResponse> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::COOKIE, format!("{}={}", COOKIE_NAME, token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Result<TestResponse> {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> Result<TestResponse> {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn sign_up(&self, name: &str, email: &str) -> Result<TestUser> {
        let res = self
            .post(
                "/api/auth/sign-up/email",
                None,
                json!({ "name": name, "email": email, "password": "password123" }),
            )
            .await?;
        anyhow::ensure!(res.status == StatusCode::OK, "sign-up failed: {} {}", res.status, res.body);
        Ok(TestUser {
            id: res.body["user"]["id"].as_str().context("user id")?.to_string(),
            email: email.to_string(),
            token: res.body["token"].as_str().context("token")?.to_string(),
        })
    }

    /// Create an organization as `user` and return its id
    pub async fn create_organization(&self, user: &TestUser, name: &str, slug: &str) -> Result<String> {
        let res = self
            .post(
                "/api/auth/organization/create",
                Some(&user.token),
                json!({ "name": name, "slug": slug }),
            )
            .await?;
        anyhow::ensure!(res.status == StatusCode::OK, "create org failed: {} {}", res.status, res.body);
        Ok(res.body["id"].as_str().context("organization id")?.to_string())
    }

    /// Invite `invitee` into `org` as `owner` and accept as `invitee`
    pub async fn add_member(&self, owner: &TestUser, org: &str, invitee: &TestUser) -> Result<Value> {
        let res = self
            .post(
                "/api/auth/organization/invite-member",
                Some(&owner.token),
                json!({ "email": invitee.email, "role": "member", "organizationId": org }),
            )
            .await?;
        anyhow::ensure!(res.status == StatusCode::OK, "invite failed: {} {}", res.status, res.body);
        let invitation_id = res.body["id"].as_str().context("invitation id")?.to_string();

        let res = self
            .post(
                "/api/auth/organization/accept-invitation",
                Some(&invitee.token),
                json!({ "invitationId": invitation_id }),
            )
            .await?;
        anyhow::ensure!(res.status == StatusCode::OK, "accept failed: {} {}", res.status, res.body);
        Ok(res.body["member"].clone())
    }

    pub async fn create_outline(&self, user: &TestUser, org: &str, header: &str) -> Result<TestResponse> {
        self.post("/api/outlines", Some(&user.token), outline_payload(org, header)).await
    }
}

pub fn outline_payload(org: &str, header: &str) -> Value {
    json!({
        "organizationId": org,
        "header": header,
        "sectionType": "EXECUTIVE_SUMMARY",
        "status": "PENDING",
        "target": 10,
        "limit": 20,
        "reviewer": "ASSIM"
    })
}
