pub mod password;
pub mod session;

use axum::http::{header, HeaderMap, HeaderValue};
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::SecurityConfig;

pub use password::{hash_password, verify_password};
pub use session::{CurrentSession, OptionalSession};

/// Signed payload of the session cookie. It only references a server-side
/// session row; the row is re-read on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sid: Uuid,
    pub sub: Uuid,
    pub exp: i64,
    pub iat: i64,
}

impl SessionClaims {
    pub fn new(session_id: Uuid, user_id: Uuid, expires_at: DateTime<Utc>) -> Self {
        Self {
            sid: session_id,
            sub: user_id,
            exp: expires_at.timestamp(),
            iat: Utc::now().timestamp(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Session secret not configured")]
    InvalidSecret,
    #[error("Token generation error: {0}")]
    Generation(String),
    #[error("Invalid session token: {0}")]
    Invalid(String),
}

pub fn issue_session_token(claims: &SessionClaims, secret: &str) -> Result<String, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| TokenError::Generation(e.to_string()))
}

/// Verify signature and expiry, returning the claims
pub fn verify_session_token(token: &str, secret: &str) -> Result<SessionClaims, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::default();
    validation.leeway = 0;

    decode::<SessionClaims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| TokenError::Invalid(e.to_string()))
}

/// Session token from the session cookie, falling back to `Authorization: Bearer`
pub fn extract_session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    extract_cookie(headers, cookie_name).or_else(|| extract_bearer(headers))
}

fn extract_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// `Set-Cookie` value carrying a freshly issued session token
pub fn session_cookie(token: &str, security: &SecurityConfig) -> Option<HeaderValue> {
    build_cookie(
        &security.session_cookie_name,
        token,
        security.session_max_age_secs(),
        security.secure_cookies,
    )
}

/// `Set-Cookie` value that expires the session cookie immediately
pub fn clear_session_cookie(security: &SecurityConfig) -> Option<HeaderValue> {
    build_cookie(&security.session_cookie_name, "", 0, security.secure_cookies)
}

fn build_cookie(name: &str, value: &str, max_age: u64, secure: bool) -> Option<HeaderValue> {
    let mut cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}", name, value, max_age);
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).ok()
}
