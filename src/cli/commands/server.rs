use clap::Subcommand;
use serde_json::json;
use url::Url;

use crate::cli::config::*;
use crate::cli::utils::*;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Point the CLI at a server")]
    Set {
        #[arg(help = "Server URL, e.g. http://localhost:3000")]
        url: String,
    },

    #[command(about = "Show the configured server")]
    Show,

    #[command(about = "Check server health from the /health endpoint")]
    Health,
}

pub async fn handle(cmd: ServerCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ServerCommands::Set { url } => {
            let parsed = Url::parse(&url).map_err(|e| anyhow::anyhow!("Invalid server URL '{}': {}", url, e))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(anyhow::anyhow!("Server URL must use http or https"));
            }

            let mut env_config = load_environment_config()?;
            // Sessions belong to one server
            if env_config.server_url.as_deref() != Some(url.as_str()) {
                env_config.clear_session();
            }
            env_config.server_url = Some(url.clone());
            save_environment_config(&env_config)?;

            output_success(
                &output_format,
                &format!("Server set to {}", url),
                Some(json!({ "server_url": url })),
            )
        }
        ServerCommands::Show => {
            let env_config = load_environment_config()?;
            let details = json!({
                "server_url": env_config.server_url(),
                "signed_in": env_config.session_token.is_some(),
                "active_organization": env_config.active_organization,
            });
            output_value(&output_format, &details, || {
                println!("Server: {}", env_config.server_url());
                println!(
                    "Session: {}",
                    if env_config.session_token.is_some() { "signed in" } else { "signed out" }
                );
                if let Some(org) = env_config.active_organization {
                    println!("Active organization: {}", org);
                }
            })
        }
        ServerCommands::Health => {
            let env_config = load_environment_config()?;
            let client = env_config.client()?;
            match client.health().await {
                Ok(health) => output_value(&output_format, &health, || {
                    println!("✓ {} is healthy", env_config.server_url());
                }),
                Err(e) => {
                    output_error(&output_format, &format!("{} is unavailable: {}", env_config.server_url(), e), None)?;
                    Err(anyhow::anyhow!("health check failed"))
                }
            }
        }
    }
}
