use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::cli::config::*;
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::client::{Column, CommitOutcome, EditField, OutlineTable};
use crate::database::models::{OutlineFields, OutlineStatus, Reviewer, SectionType, WireEnum};

#[derive(Subcommand)]
pub enum OutlineCommands {
    #[command(about = "List outlines of the active organization, newest first")]
    List {
        #[arg(long, value_delimiter = ',', help = "Columns to show, e.g. header,status,reviewer")]
        columns: Option<Vec<String>>,
        #[arg(long, help = "Organization id (defaults to the active organization)")]
        org: Option<Uuid>,
    },

    #[command(about = "Add a section")]
    Create {
        #[arg(long)]
        header: String,
        #[arg(long, help = "TABLE_OF_CONTENTS, EXECUTIVE_SUMMARY, TECHNICAL_APPROACH, DESIGN, CAPABILITIES, FOCUS_DOCUMENT or NARRATIVE")]
        section_type: String,
        #[arg(long, default_value = "PENDING", help = "PENDING, IN_PROGRESS or COMPLETED")]
        status: String,
        #[arg(long, default_value_t = 0)]
        target: i32,
        #[arg(long, default_value_t = 0)]
        limit: i32,
        #[arg(long, help = "ASSIM, BINI or MAMI")]
        reviewer: String,
        #[arg(long, help = "Organization id (defaults to the active organization)")]
        org: Option<Uuid>,
    },

    #[command(about = "Change a single field of an outline")]
    Set {
        #[arg(help = "Outline id")]
        id: Uuid,
        #[arg(help = "header, sectionType, status, target, limit or reviewer")]
        field: String,
        #[arg(help = "New value")]
        value: String,
    },

    #[command(about = "Delete an outline")]
    Delete {
        #[arg(help = "Outline id")]
        id: Uuid,
        #[arg(long, help = "Skip the confirmation prompt")]
        yes: bool,
    },

    #[command(about = "Duplicate an outline")]
    Duplicate {
        #[arg(help = "Outline id")]
        id: Uuid,
    },
}

pub async fn handle(cmd: OutlineCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let env_config = load_environment_config()?;
    let client = env_config.client()?;

    match cmd {
        OutlineCommands::List { columns, org } => {
            let organization = env_config.organization(org)?;
            let mut table = OutlineTable::new();
            table.load(client.list_outlines(organization).await?);

            if let Some(columns) = columns {
                let wanted = parse_columns(&columns)?;
                for column in Column::ALL {
                    if !wanted.contains(&column) {
                        table.toggle_column(column);
                    }
                }
            }

            if table.rows().is_empty() {
                return output_empty_collection(&output_format, "outlines", "No sections yet");
            }

            output_value(&output_format, &table.rows(), || {
                let columns = table.visible_columns();
                let mut headers = vec!["ID"];
                headers.extend(columns.iter().map(|c| c.label()));
                let rows: Vec<Vec<String>> = table
                    .rows()
                    .iter()
                    .map(|outline| {
                        let mut row = vec![outline.id.to_string()];
                        row.extend(columns.iter().map(|c| c.cell(outline)));
                        row
                    })
                    .collect();
                print_table(&headers, &rows);
            })
        }
        OutlineCommands::Create {
            header,
            section_type,
            status,
            target,
            limit,
            reviewer,
            org,
        } => {
            let organization = env_config.organization(org)?;
            let fields = OutlineFields {
                header,
                section_type: parse_choice::<SectionType>("section type", &section_type)?,
                status: parse_choice::<OutlineStatus>("status", &status)?,
                target,
                limit,
                reviewer: parse_choice::<Reviewer>("reviewer", &reviewer)?,
            };
            let outline = client.create_outline(organization, &fields).await?;
            output_success(
                &output_format,
                &format!("Created outline '{}' ({})", outline.header, outline.id),
                Some(json!({ "outline": outline })),
            )
        }
        OutlineCommands::Set { id, field, value } => {
            let field = EditField::parse(&field).ok_or_else(|| anyhow::anyhow!("Unknown field '{}'", field))?;
            // Validate locally first so bad input gets a useful message
            field.patch(&value).map_err(|e| anyhow::anyhow!("Invalid {}: {}", field.key(), e))?;

            let organization = env_config.organization(None)?;
            let mut table = OutlineTable::new();
            table.load(client.list_outlines(organization).await?);

            if !table.begin_edit(id, field) {
                return Err(anyhow::anyhow!("Outline {} not found in the active organization", id));
            }
            table.set_draft(value);

            match table.commit_edit(&client).await {
                CommitOutcome::Saved => {
                    let outline = table.row(id).cloned();
                    output_success(
                        &output_format,
                        &format!("Updated {} of outline {}", field.key(), id),
                        Some(json!({ "outline": outline })),
                    )
                }
                CommitOutcome::Unchanged | CommitOutcome::Idle => {
                    output_success(&output_format, "No change", None)
                }
                CommitOutcome::Reverted => {
                    output_error(&output_format, "Update failed; the previous value was kept", None)?;
                    Err(anyhow::anyhow!("update failed"))
                }
            }
        }
        OutlineCommands::Delete { id, yes } => {
            if !confirm("Are you sure you want to delete this section?", yes)? {
                return output_success(&output_format, "Cancelled", None);
            }
            let message = client.delete_outline(id).await?;
            output_success(&output_format, &message, Some(json!({ "id": id })))
        }
        OutlineCommands::Duplicate { id } => {
            let outline = client.duplicate_outline(id).await?;
            output_success(
                &output_format,
                &format!("Created '{}' ({})", outline.header, outline.id),
                Some(json!({ "outline": outline })),
            )
        }
    }
}

fn parse_columns(raw: &[String]) -> anyhow::Result<Vec<Column>> {
    raw.iter()
        .map(|key| Column::parse(key.trim()).ok_or_else(|| anyhow::anyhow!("Unknown column '{}'", key)))
        .collect()
}

fn parse_choice<T: WireEnum>(label: &str, raw: &str) -> anyhow::Result<T> {
    T::parse(&raw.trim().to_uppercase())
        .ok_or_else(|| anyhow::anyhow!("Invalid {} '{}'. Expected one of: {}", label, raw, T::allowed()))
}
