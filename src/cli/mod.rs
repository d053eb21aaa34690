pub mod commands;
pub mod config;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "workspace")]
#[command(about = "Workspace CLI - organizations, members and proposal outlines from the terminal")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Server selection and health")]
    Server {
        #[command(subcommand)]
        cmd: commands::server::ServerCommands,
    },

    #[command(about = "Sign up, sign in and session status")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Organizations, members and invitations")]
    Org {
        #[command(subcommand)]
        cmd: commands::org::OrgCommands,
    },

    #[command(about = "Outline sections of the active organization")]
    Outline {
        #[command(subcommand)]
        cmd: commands::outline::OutlineCommands,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Server { cmd } => commands::server::handle(cmd, output_format).await,
        Commands::Auth { cmd } => commands::auth::handle(cmd, output_format).await,
        Commands::Org { cmd } => commands::org::handle(cmd, output_format).await,
        Commands::Outline { cmd } => commands::outline::handle(cmd, output_format).await,
    }
}
