use clap::Subcommand;
use serde_json::json;

use crate::cli::config::*;
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::client::ClientState;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Create an account and sign in")]
    SignUp {
        #[arg(help = "Display name")]
        name: String,
        #[arg(help = "Email")]
        email: String,
        #[arg(long, help = "Password (reads WORKSPACE_PASSWORD or prompts if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Sign in with email and password")]
    SignIn {
        #[arg(help = "Email")]
        email: String,
        #[arg(long, help = "Password (reads WORKSPACE_PASSWORD or prompts if not provided)")]
        password: Option<String>,
    },

    #[command(about = "End the current session")]
    SignOut,

    #[command(about = "Show the signed-in user and active organization")]
    Whoami,
}

pub async fn handle(cmd: AuthCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let mut env_config = load_environment_config()?;
    let mut client = env_config.client()?;

    match cmd {
        AuthCommands::SignUp { name, email, password } => {
            let password = resolve_password(password)?;
            let payload = client.sign_up(&name, &email, &password).await?;

            env_config.session_token = Some(payload.token.clone());
            env_config.active_organization = None;
            save_environment_config(&env_config)?;

            output_success(
                &output_format,
                &format!("Signed up as {}", payload.user.email),
                Some(json!({ "user": payload.user })),
            )
        }
        AuthCommands::SignIn { email, password } => {
            let password = resolve_password(password)?;
            let payload = client.sign_in(&email, &password).await?;

            env_config.session_token = Some(payload.token.clone());
            env_config.active_organization = payload.session.active_organization_id;
            save_environment_config(&env_config)?;

            output_success(
                &output_format,
                &format!("Signed in as {}", payload.user.email),
                Some(json!({ "user": payload.user })),
            )
        }
        AuthCommands::SignOut => {
            if env_config.session_token.is_none() {
                return output_success(&output_format, "Already signed out", None);
            }
            // A stale token still gets cleared locally
            if let Err(e) = client.sign_out().await {
                tracing::debug!("Server sign-out failed: {}", e);
            }
            env_config.clear_session();
            save_environment_config(&env_config)?;
            output_success(&output_format, "Signed out", None)
        }
        AuthCommands::Whoami => {
            let mut state = ClientState::new();
            state.refresh(&client).await?;

            let Some(user) = state.user() else {
                return output_error(&output_format, "Not signed in", Some("UNAUTHORIZED"));
            };

            let details = json!({
                "user": user,
                "session": state.session(),
                "active_organization": state.active_organization(),
            });
            output_value(&output_format, &details, || {
                println!("{} <{}>", user.name, user.email);
                match state.active_organization() {
                    Some(org) => println!("Active organization: {} ({})", org.name, org.slug),
                    None => println!("No active organization"),
                }
            })
        }
    }
}
