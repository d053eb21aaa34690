use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::env;

/// Fallback signing secret for local development only
const DEVELOPMENT_SESSION_SECRET: &str = "workspace-development-session-secret";

/// Upper bound for session and invitation lifetimes (ten years)
pub const MAX_TTL_HOURS: u64 = 87_600;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub organization: OrganizationConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres connection string. `None` selects the in-memory store.
    #[serde(skip_serializing)]
    pub url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub session_secret: String,
    pub session_cookie_name: String,
    pub session_ttl_hours: u64,
    pub secure_cookies: bool,
    pub cors_allowed_methods: Vec<String>,
    pub cors_allowed_headers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationConfig {
    /// Maximum number of organizations a single user may belong to
    pub limit_per_user: usize,
    pub invitation_ttl_hours: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("{name} must be between 1 and {max}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: u64,
        max: u64,
    },
}

fn check_ttl(name: &'static str, value: u64) -> Result<(), ConfigError> {
    if (1..=MAX_TTL_HOURS).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value,
            max: MAX_TTL_HOURS,
        })
    }
}

/// `now + hours`, or `None` when the sum leaves chrono's range
fn expiry_after(now: DateTime<Utc>, hours: u64) -> Option<DateTime<Utc>> {
    let hours = i64::try_from(hours).ok()?;
    now.checked_add_signed(Duration::try_hours(hours)?)
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        let config = match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides();

        config.validate()
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.security.session_secret.is_empty() {
            return Err(ConfigError::Missing("SESSION_SECRET"));
        }
        if self.database.url.is_none() && !self.is_development() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }
        check_ttl("SESSION_TTL_HOURS", self.security.session_ttl_hours)?;
        check_ttl("ORGANIZATION_INVITATION_TTL_HOURS", self.organization.invitation_ttl_hours)?;
        Ok(self)
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("HOST") {
            self.server.host = v;
        }
        if let Some(port) = env::var("WORKSPACE_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            if !v.trim().is_empty() {
                self.database.url = Some(v);
            }
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_ACQUIRE_TIMEOUT_SECS") {
            self.database.acquire_timeout_secs = v.parse().unwrap_or(self.database.acquire_timeout_secs);
        }
        if let Ok(v) = env::var("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        // Security overrides
        if let Ok(v) = env::var("SESSION_SECRET") {
            self.security.session_secret = v;
        }
        if let Ok(v) = env::var("SESSION_COOKIE_NAME") {
            if !v.trim().is_empty() {
                self.security.session_cookie_name = v;
            }
        }
        if let Ok(v) = env::var("SESSION_TTL_HOURS") {
            self.security.session_ttl_hours = v.parse().unwrap_or(self.security.session_ttl_hours);
        }
        if let Ok(v) = env::var("SECURITY_SECURE_COOKIES") {
            self.security.secure_cookies = v.parse().unwrap_or(self.security.secure_cookies);
        }

        // Organization overrides
        if let Ok(v) = env::var("ORGANIZATION_LIMIT_PER_USER") {
            self.organization.limit_per_user = v.parse().unwrap_or(self.organization.limit_per_user);
        }
        if let Ok(v) = env::var("ORGANIZATION_INVITATION_TTL_HOURS") {
            self.organization.invitation_ttl_hours =
                v.parse().unwrap_or(self.organization.invitation_ttl_hours);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig::default(),
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                acquire_timeout_secs: 30,
                run_migrations: true,
            },
            security: SecurityConfig {
                session_secret: DEVELOPMENT_SESSION_SECRET.to_string(),
                secure_cookies: false,
                ..SecurityConfig::default()
            },
            organization: OrganizationConfig::default(),
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig::default(),
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                acquire_timeout_secs: 10,
                run_migrations: true,
            },
            security: SecurityConfig {
                secure_cookies: true,
                ..SecurityConfig::default()
            },
            organization: OrganizationConfig::default(),
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig::default(),
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                acquire_timeout_secs: 5,
                run_migrations: false,
            },
            security: SecurityConfig {
                secure_cookies: true,
                ..SecurityConfig::default()
            },
            organization: OrganizationConfig::default(),
        }
    }
}

impl SecurityConfig {
    pub fn session_expiry(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        expiry_after(now, self.session_ttl_hours)
    }

    /// Cookie `Max-Age` in seconds
    pub fn session_max_age_secs(&self) -> u64 {
        self.session_ttl_hours.saturating_mul(3600)
    }
}

impl OrganizationConfig {
    pub fn invitation_expiry(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        expiry_after(now, self.invitation_ttl_hours)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            session_secret: String::new(),
            session_cookie_name: "workspace.session_token".to_string(),
            session_ttl_hours: 24 * 7, // 1 week
            secure_cookies: true,
            cors_allowed_methods: ["GET", "POST", "PUT", "DELETE", "OPTIONS"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            cors_allowed_headers: vec!["Content-Type".to_string(), "Authorization".to_string()],
        }
    }
}

impl Default for OrganizationConfig {
    fn default() -> Self {
        Self {
            limit_per_user: 10,
            invitation_ttl_hours: 48,
        }
    }
}
