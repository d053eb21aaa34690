use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::cli::config::*;
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::client::{ApiClient, ClientState};
use crate::validation::slugify;

#[derive(Subcommand)]
pub enum OrgCommands {
    #[command(about = "Create an organization and make it active")]
    Create {
        #[arg(help = "Organization name")]
        name: String,
        #[arg(long, help = "URL slug (derived from the name if omitted)")]
        slug: Option<String>,
    },

    #[command(about = "List organizations you belong to")]
    List,

    #[command(about = "Switch the active organization")]
    Use {
        #[arg(help = "Organization id or slug")]
        organization: String,
    },

    #[command(about = "Show an organization with its members and invitations")]
    Show {
        #[arg(help = "Organization id (defaults to the active organization)")]
        organization: Option<Uuid>,
    },

    #[command(about = "Invite someone to the active organization")]
    Invite {
        #[arg(help = "Email address to invite")]
        email: String,
    },

    #[command(about = "Accept an invitation and join its organization")]
    Join {
        #[arg(help = "Invitation id")]
        invitation: Uuid,
    },

    #[command(about = "Remove a member from the active organization")]
    RemoveMember {
        #[arg(help = "Membership id, as shown by `org show`")]
        member: Uuid,
        #[arg(long, help = "Skip the confirmation prompt")]
        yes: bool,
    },
}

pub async fn handle(cmd: OrgCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let mut env_config = load_environment_config()?;
    let client = env_config.client()?;

    match cmd {
        OrgCommands::Create { name, slug } => {
            let slug = slug.unwrap_or_else(|| slugify(&name));
            let organization = client.create_organization(&name, &slug).await?;

            sync_active_organization(&client, &mut env_config).await?;

            output_success(
                &output_format,
                &format!("Created organization '{}' ({})", organization.name, organization.slug),
                Some(json!({ "organization": organization })),
            )
        }
        OrgCommands::List => {
            let organizations = client.list_organizations().await?;
            if organizations.is_empty() {
                return output_empty_collection(&output_format, "organizations", "No organizations yet");
            }

            output_value(&output_format, &organizations, || {
                let rows: Vec<Vec<String>> = organizations
                    .iter()
                    .map(|org| {
                        let marker = if env_config.active_organization == Some(org.id) { "*" } else { "" };
                        vec![marker.to_string(), org.name.clone(), org.slug.clone(), org.id.to_string()]
                    })
                    .collect();
                print_table(&["", "NAME", "SLUG", "ID"], &rows);
            })
        }
        OrgCommands::Use { organization } => {
            let organizations = client.list_organizations().await?;
            let target = organizations
                .iter()
                .find(|org| org.slug == organization || org.id.to_string() == organization)
                .ok_or_else(|| anyhow::anyhow!("Organization '{}' not found", organization))?;

            client.set_active_organization(Some(target.id)).await?;
            sync_active_organization(&client, &mut env_config).await?;

            output_success(
                &output_format,
                &format!("Switched to organization '{}'", target.name),
                Some(json!({ "active_organization": target.id })),
            )
        }
        OrgCommands::Show { organization } => {
            let full = client.full_organization(organization).await?;
            output_value(&output_format, &full, || {
                println!("{} ({})", full.organization.name, full.organization.slug);
                println!("ID: {}", full.organization.id);
                println!();
                println!("Members:");
                let rows: Vec<Vec<String>> = full
                    .members
                    .iter()
                    .map(|m| {
                        vec![
                            m.member.id.to_string(),
                            m.user.name.clone(),
                            m.user.email.clone(),
                            format!("{:?}", m.member.role).to_lowercase(),
                        ]
                    })
                    .collect();
                print_table(&["MEMBER ID", "NAME", "EMAIL", "ROLE"], &rows);

                if !full.invitations.is_empty() {
                    println!();
                    println!("Invitations:");
                    let rows: Vec<Vec<String>> = full
                        .invitations
                        .iter()
                        .map(|i| {
                            vec![
                                i.id.to_string(),
                                i.email.clone(),
                                format!("{:?}", i.status).to_lowercase(),
                                i.expires_at.to_rfc3339(),
                            ]
                        })
                        .collect();
                    print_table(&["INVITATION ID", "EMAIL", "STATUS", "EXPIRES"], &rows);
                }
            })
        }
        OrgCommands::Invite { email } => {
            let organization = env_config.organization(None)?;
            let invitation = client.invite_member(&email, Some(organization)).await?;
            output_success(
                &output_format,
                &format!("Invited {} (invitation id {})", invitation.email, invitation.id),
                Some(json!({ "invitation": invitation })),
            )
        }
        OrgCommands::Join { invitation } => {
            let accepted = client.accept_invitation(invitation).await?;
            sync_active_organization(&client, &mut env_config).await?;
            output_success(
                &output_format,
                &format!("Joined organization {}", accepted.invitation.organization_id),
                Some(json!({ "member": accepted.member })),
            )
        }
        OrgCommands::RemoveMember { member, yes } => {
            let organization = env_config.organization(None)?;
            if !confirm("Are you sure you want to remove this member?", yes)? {
                return output_success(&output_format, "Cancelled", None);
            }
            let removed = client.remove_member(member, Some(organization)).await?;
            output_success(
                &output_format,
                &format!("Removed member {}", removed.member.id),
                Some(json!({ "member": removed.member })),
            )
        }
    }
}

/// Server-side active organization is the source of truth; mirror it locally
async fn sync_active_organization(client: &ApiClient, env_config: &mut EnvironmentConfig) -> anyhow::Result<()> {
    let mut state = ClientState::new();
    state.refresh(client).await?;
    env_config.active_organization = state.active_organization_id();
    save_environment_config(env_config)
}
