//! Result rendering.
//!
//! Formats a [`ResultRecord`] or a [`LookupError`] as plain text, JSON or
//! Markdown. Only this module decides what the user sees.

use crate::errors::LookupError;
use crate::models::{Provenance, ResultRecord};
use serde::{Deserialize, Serialize};

/// Output format for lookup results.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text (default)
    #[default]
    Text,
    /// JSON, one object per lookup
    Json,
    /// Markdown, for pasting into issues or docs
    Markdown,
}

#[derive(Serialize)]
struct JsonResult<'a> {
    input: &'a str,
    #[serde(flatten)]
    record: &'a ResultRecord,
}

#[derive(Serialize)]
struct JsonError<'a> {
    input: &'a str,
    error: &'a str,
    message: String,
}

/// Render a successful lookup.
pub fn render_result(input: &str, record: &ResultRecord, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => render_text(record),
        OutputFormat::Json => serde_json::to_string(&JsonResult {
            input: input.trim(),
            record,
        })
        .unwrap_or_default(),
        OutputFormat::Markdown => render_markdown(record),
    }
}

/// Render a failed lookup.
pub fn render_error(input: &str, error: &LookupError, format: OutputFormat) -> String {
    let message = error.user_message();
    match format {
        OutputFormat::Text => format!("❌ {}", message),
        OutputFormat::Json => serde_json::to_string(&JsonError {
            input: input.trim(),
            error: error_kind(error),
            message,
        })
        .unwrap_or_default(),
        OutputFormat::Markdown => format!("> **Error:** {}", escape_markdown(&message)),
    }
}

fn error_kind(error: &LookupError) -> &'static str {
    match error {
        LookupError::Validation(_) => "validation",
        LookupError::NotFound { .. } => "not_found",
        LookupError::RateLimited { .. } => "rate_limited",
        LookupError::Transport { .. } => "transport",
    }
}

fn provenance_note(provenance: Provenance) -> &'static str {
    match provenance {
        Provenance::FoundInCommits => "Found in public commit history.",
        Provenance::FoundInProfile => "Taken from the public profile.",
        Provenance::SyntheticNoreply => {
            "No public email found; this is the GitHub-generated noreply address."
        }
    }
}

fn render_text(record: &ResultRecord) -> String {
    let record = ResultRecord {
        display_name: strip_control(&record.display_name),
        emails: record.emails.iter().map(|e| strip_control(e)).collect(),
        provenance: record.provenance,
    };
    let mut output = String::new();

    output.push_str(&format!("Name:   {}\n", record.display_name));
    for (i, email) in record.emails.iter().enumerate() {
        let label = if i == 0 { "Email:" } else { "" };
        output.push_str(&format!("{:<7} {}\n", label, email));
    }
    output.push_str(&format!("Source: {}\n", record.provenance));
    if let Some(author) = record.author_line() {
        output.push_str(&format!("Author: {}\n", author));
    }

    output
}

/// Replace control characters, ESC included, with spaces.
fn strip_control(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

fn render_markdown(record: &ResultRecord) -> String {
    let mut output = String::new();

    output.push_str(&format!("### {}\n\n", escape_markdown(&record.display_name)));
    for email in &record.emails {
        output.push_str(&format!("- `{}`\n", email.replace('`', "")));
    }
    output.push('\n');
    output.push_str(&format!("_{}_\n", provenance_note(record.provenance)));

    output
}

/// Escape characters that Markdown or embedded HTML would interpret.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '\\' | '`' | '*' | '_' | '[' | ']' | '#' | '|' | '!' => {
                escaped.push('\\');
                escaped.push(c);
            }
            c if c.is_control() => escaped.push(' '),
            c => escaped.push(c),
        }
    }
    escaped
}
