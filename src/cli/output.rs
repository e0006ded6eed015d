//! Output formatting for CLI commands.
//!
//! This module renders provider responses either as JSON for the host or as
//! colored text for people.

use std::io::{self, Write};

use colored::Colorize;
use serde::Serialize;
use tabled::{Table, Tabled};

use crate::diff::{DiffChanges, DiffKind, DiffResponse};
use crate::error::ProviderError;
use crate::property::wire::{to_json_map, to_plain_json};
use crate::property::{PropertyMap, PropertyValue};
use crate::resources::{CheckFailure, CheckResponse, CreateResponse, InvokeResponse, ReadResponse, UpdateResponse};

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Writes a rendered response and a trailing newline, then flushes.
///
/// # Errors
///
/// Returns the writer's error, e.g. a closed pipe.
pub fn write_response<W: Write>(out: &mut W, text: &str) -> io::Result<()> {
    writeln!(out, "{}", text.trim_end())?;
    out.flush()
}

/// Property change row for table display.
#[derive(Tabled)]
struct DiffRow {
    #[tabled(rename = "Change")]
    change: String,
    #[tabled(rename = "Property")]
    property: String,
    #[tabled(rename = "Input")]
    input: String,
}

/// Check failure row for table display.
#[derive(Tabled)]
struct FailureRow {
    #[tabled(rename = "Property")]
    property: String,
    #[tabled(rename = "Reason")]
    reason: String,
}

/// Property row for table display.
#[derive(Tabled)]
struct PropertyRow {
    #[tabled(rename = "Property")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Returns true when printing JSON.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    fn json<T: Serialize>(value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_default()
    }

    /// Formats a check response.
    #[must_use]
    pub fn format_check(&self, response: &CheckResponse) -> String {
        match self.format {
            OutputFormat::Json => Self::json(response),
            OutputFormat::Text if response.failures.is_empty() => {
                format!("{} Inputs are valid.\n", "✓".green())
            }
            OutputFormat::Text => Self::format_failures(&response.failures),
        }
    }

    /// Formats a diff response.
    #[must_use]
    pub fn format_diff(&self, response: &DiffResponse) -> String {
        match self.format {
            OutputFormat::Json => Self::json(response),
            OutputFormat::Text => Self::format_diff_text(response),
        }
    }

    fn format_diff_text(response: &DiffResponse) -> String {
        if response.changes == DiffChanges::None {
            return format!("{} No changes.\n", "✓".green());
        }

        let rows: Vec<DiffRow> = response
            .detailed_diff
            .iter()
            .map(|(path, diff)| DiffRow {
                change: Self::format_kind(diff.kind),
                property: path.clone(),
                input: if diff.input_diff { "yes" } else { "no" }.to_string(),
            })
            .collect();

        let mut output = String::new();
        if !rows.is_empty() {
            output.push_str(&Table::new(rows).to_string());
            output.push('\n');
        }

        output.push_str(&format!(
            "\nDiff: {} changed, {} forcing replacement",
            response.diffs.len().to_string().yellow(),
            response.replaces.len().to_string().red()
        ));
        if !response.replaces.is_empty() && response.delete_before_replace {
            output.push_str(" (delete before replace)");
        }
        output.push('\n');
        output
    }

    /// Formats a create response.
    #[must_use]
    pub fn format_create(&self, response: &CreateResponse) -> String {
        match self.format {
            OutputFormat::Json => Self::json(response),
            OutputFormat::Text => {
                let mut output = format!("{} Created {}\n\n", "✓".green(), response.id.bold());
                output.push_str(&Self::format_properties(&response.properties));
                output
            }
        }
    }

    /// Formats a read response.
    #[must_use]
    pub fn format_read(&self, response: &ReadResponse) -> String {
        match self.format {
            OutputFormat::Json => Self::json(response),
            OutputFormat::Text if response.is_gone() => {
                format!("{} Resource no longer exists.\n", "⚠".yellow())
            }
            OutputFormat::Text => {
                let mut output = format!("Resource {}\n\n", response.id.bold());
                output.push_str(&Self::format_properties(&response.properties));
                output
            }
        }
    }

    /// Formats an update response.
    #[must_use]
    pub fn format_update(&self, response: &UpdateResponse) -> String {
        match self.format {
            OutputFormat::Json => Self::json(response),
            OutputFormat::Text => {
                let mut output = format!("{} Updated\n\n", "✓".green());
                output.push_str(&Self::format_properties(&response.properties));
                output
            }
        }
    }

    /// Formats the result of a delete.
    #[must_use]
    pub fn format_delete(&self) -> String {
        match self.format {
            OutputFormat::Json => String::from("{}"),
            OutputFormat::Text => format!("{} Deleted\n", "✓".green()),
        }
    }

    /// Formats an invoke response.
    #[must_use]
    pub fn format_invoke(&self, response: &InvokeResponse) -> String {
        match self.format {
            OutputFormat::Json => Self::json(response),
            OutputFormat::Text if response.failures.is_empty() => Self::format_properties(&response.properties),
            OutputFormat::Text => Self::format_failures(&response.failures),
        }
    }

    /// Formats an operation failure.
    ///
    /// In JSON, a failure that left a partially initialized object also
    /// carries its id and state so the caller can record it.
    #[must_use]
    pub fn format_error(&self, error: &ProviderError) -> String {
        match self.format {
            OutputFormat::Json => {
                let mut body = serde_json::json!({ "error": error.to_string() });
                if let ProviderError::InitFailed { id, properties, reasons } = error {
                    body["id"] = serde_json::Value::from(id.as_str());
                    body["properties"] = serde_json::Value::Object(to_json_map(properties));
                    body["reasons"] = serde_json::Value::from(reasons.clone());
                }
                Self::json(&body)
            }
            OutputFormat::Text => format!("{} {error}\n", "✗".red()),
        }
    }

    fn format_failures(failures: &[CheckFailure]) -> String {
        let rows: Vec<FailureRow> = failures
            .iter()
            .map(|f| FailureRow {
                property: f.property.clone(),
                reason: f.reason.clone(),
            })
            .collect();
        let mut output = format!("{} {} invalid input(s):\n\n", "✗".red(), failures.len());
        output.push_str(&Table::new(rows).to_string());
        output.push('\n');
        output
    }

    fn format_properties(properties: &PropertyMap) -> String {
        if properties.is_empty() {
            return String::from("   No properties.\n");
        }
        let rows: Vec<PropertyRow> = properties
            .iter()
            .map(|(name, value)| PropertyRow {
                name: name.clone(),
                value: Self::truncate(&Self::display_value(value), 60),
            })
            .collect();
        let mut output = Table::new(rows).to_string();
        output.push('\n');
        output
    }

    /// Renders a value with secrets masked.
    fn display_value(value: &PropertyValue) -> String {
        match value {
            PropertyValue::Secret(_) => "[secret]".dimmed().to_string(),
            PropertyValue::Unknown => "[unknown]".dimmed().to_string(),
            PropertyValue::String(s) | PropertyValue::Asset(s) => s.clone(),
            other => to_plain_json(&mask_secrets(other)).to_string(),
        }
    }

    /// Formats a diff kind with color.
    fn format_kind(kind: DiffKind) -> String {
        match kind {
            DiffKind::Add => "+add".green().to_string(),
            DiffKind::Update => "~update".yellow().to_string(),
            DiffKind::Delete => "-delete".red().to_string(),
            DiffKind::AddReplace | DiffKind::UpdateReplace | DiffKind::DeleteReplace => {
                "+-replace".magenta().to_string()
            }
            DiffKind::Stable => "stable".dimmed().to_string(),
        }
    }

    /// Truncates a string to a maximum number of characters.
    fn truncate(s: &str, max_len: usize) -> String {
        if s.chars().count() <= max_len {
            s.to_string()
        } else {
            let kept: String = s.chars().take(max_len - 3).collect();
            format!("{kept}...")
        }
    }
}

fn mask_secrets(value: &PropertyValue) -> PropertyValue {
    match value {
        PropertyValue::Secret(_) => PropertyValue::from("[secret]"),
        PropertyValue::Array(items) => PropertyValue::Array(items.iter().map(mask_secrets).collect()),
        PropertyValue::Object(map) => {
            PropertyValue::Object(map.iter().map(|(k, v)| (k.clone(), mask_secrets(v))).collect())
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::PropertyDiff;
    use std::collections::BTreeMap;

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_response_trims_and_terminates() {
        let mut out = Vec::new();
        write_response(&mut out, "{}\n\n").expect("write");
        assert_eq!(out, b"{}\n");
    }

    #[test]
    fn test_write_response_reports_closed_pipe() {
        let err = write_response(&mut ClosedPipe, "{}").expect_err("closed pipe");
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert!(matches!(ProviderError::from(err), ProviderError::Io(_)));
    }

    fn text() -> OutputFormatter {
        colored::control::set_override(false);
        OutputFormatter::new(OutputFormat::Text)
    }

    #[test]
    fn test_no_changes() {
        let response = DiffResponse {
            changes: DiffChanges::None,
            diffs: Vec::new(),
            replaces: Vec::new(),
            detailed_diff: BTreeMap::new(),
            delete_before_replace: false,
        };
        assert_eq!(text().format_diff(&response), "✓ No changes.\n");
    }

    #[test]
    fn test_diff_table_lists_paths() {
        let mut detailed_diff = BTreeMap::new();
        detailed_diff.insert(
            String::from("organizationName"),
            PropertyDiff {
                kind: DiffKind::UpdateReplace,
                input_diff: true,
            },
        );
        let response = DiffResponse {
            changes: DiffChanges::Some,
            diffs: vec![String::from("organizationName")],
            replaces: vec![String::from("organizationName")],
            detailed_diff,
            delete_before_replace: true,
        };

        let output = text().format_diff(&response);
        assert!(output.contains("organizationName"));
        assert!(output.contains("+-replace"));
        assert!(output.contains("1 changed, 1 forcing replacement (delete before replace)"));
    }

    #[test]
    fn test_secrets_are_masked() {
        let response = ReadResponse {
            id: String::from("acme/abc123"),
            properties: PropertyMap::new()
                .with("secret", PropertyValue::secret("hunter2"))
                .with("nested", PropertyMap::new().with("pw", PropertyValue::secret("hunter2"))),
            inputs: PropertyMap::new(),
        };
        let output = text().format_read(&response);
        assert!(output.contains("[secret]"));
        assert!(!output.contains("hunter2"));
    }

    #[test]
    fn test_init_failed_json_carries_state() {
        let error = ProviderError::InitFailed {
            id: String::from("acme/devs"),
            properties: PropertyMap::new().with("name", "devs"),
            reasons: vec![String::from("add bob to team acme/devs")],
        };
        let output = OutputFormatter::new(OutputFormat::Json).format_error(&error);
        let parsed: serde_json::Value = serde_json::from_str(&output).expect("json");
        assert_eq!(parsed["id"], "acme/devs");
        assert_eq!(parsed["properties"]["name"], "devs");
        assert_eq!(parsed["reasons"][0], "add bob to team acme/devs");
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(OutputFormatter::truncate("ééééé", 4), "é...");
        assert_eq!(OutputFormatter::truncate("short", 10), "short");
    }
}
