use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::client::ApiClient;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";

/// Persisted CLI state, stored as `env.json` in the config directory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub server_url: Option<String>,
    pub session_token: Option<String>,
    pub active_organization: Option<Uuid>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl EnvironmentConfig {
    pub fn server_url(&self) -> &str {
        self.server_url.as_deref().unwrap_or(DEFAULT_SERVER_URL)
    }

    /// Client for the configured server carrying the saved session token
    pub fn client(&self) -> anyhow::Result<ApiClient> {
        Ok(ApiClient::new(self.server_url())?.with_token(self.session_token.clone()))
    }

    /// Organization given on the command line, else the saved active one
    pub fn organization(&self, provided: Option<Uuid>) -> anyhow::Result<Uuid> {
        provided
            .or(self.active_organization)
            .ok_or_else(|| anyhow::anyhow!("No active organization. Run `workspace org use <id|slug>` first"))
    }

    pub fn clear_session(&mut self) {
        self.session_token = None;
        self.active_organization = None;
    }
}

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("WORKSPACE_CLI_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("workspace").join("cli")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

pub fn load_environment_config() -> anyhow::Result<EnvironmentConfig> {
    let env_file = get_config_dir()?.join("env.json");

    if !env_file.exists() {
        return Ok(EnvironmentConfig::default());
    }

    let content = fs::read_to_string(env_file)?;
    let config: EnvironmentConfig = serde_json::from_str(&content)?;
    Ok(config)
}

pub fn save_environment_config(config: &EnvironmentConfig) -> anyhow::Result<()> {
    let env_file = get_config_dir()?.join("env.json");

    let mut config = config.clone();
    config.updated_at = Some(Utc::now());

    let content = serde_json::to_string_pretty(&config)?;
    fs::write(env_file, content)?;
    Ok(())
}
