use std::io::{self, BufRead, Write};

use serde::Serialize;
use serde_json::{json, Value};

use crate::cli::OutputFormat;

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(Value::Object(extra)), Some(object)) = (data, response.as_object_mut()) {
                object.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(output_format: &OutputFormat, message: &str, error_code: Option<&str>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": false,
                "error": message
            });

            if let Some(code) = error_code {
                response["error_code"] = json!(code);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

/// Output an empty collection in the appropriate format
pub fn output_empty_collection(output_format: &OutputFormat, collection_name: &str, message: &str) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    collection_name: []
                }))?
            );
        }
        OutputFormat::Text => {
            println!("{}", message);
        }
    }
    Ok(())
}

/// JSON mode prints the value; text mode runs `text`
pub fn output_value<T: Serialize>(output_format: &OutputFormat, value: &T, text: impl FnOnce()) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => text(),
    }
    Ok(())
}

/// Plain aligned text table
pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let line = |cells: Vec<&str>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join("  ")
    };

    println!("{}", line(headers.to_vec()).trim_end());
    println!("{}", widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  "));
    for row in rows {
        println!("{}", line(row.iter().map(String::as_str).collect()).trim_end());
    }
}

/// Read one line from stdin after printing `label`
pub fn prompt(label: &str) -> anyhow::Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(|c| c == '\r' || c == '\n').to_string())
}

/// Blocking yes/no confirmation before destructive actions. `--yes` skips it.
pub fn confirm(question: &str, assume_yes: bool) -> anyhow::Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    let answer = prompt(&format!("{} [y/N] ", question))?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Password from the flag, `WORKSPACE_PASSWORD`, or an interactive prompt
pub fn resolve_password(provided: Option<String>) -> anyhow::Result<String> {
    if let Some(password) = provided {
        return Ok(password);
    }
    if let Ok(password) = std::env::var("WORKSPACE_PASSWORD") {
        return Ok(password);
    }
    prompt("Password: ")
}
