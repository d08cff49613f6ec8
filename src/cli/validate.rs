//! Validate command handler: structural checks on existing documents.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::config::AppConfig;
use crate::pipeline::{exit_codes, write_output, OutputTarget};
use crate::validate::{validate_document, Severity, ValidationResult};

/// Rendering for `validate`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ValidateFormat {
    /// One line per finding
    #[default]
    Text,
    /// Every result as a JSON array
    Json,
}

/// Run the validate command
///
/// Returns [`exit_codes::VALIDATION_FAILED`] when any document has errors,
/// or warnings while `fail_on_warning` is set.
pub fn run_validate(
    inputs: &[PathBuf],
    format: ValidateFormat,
    fail_on_warning: bool,
    config: &AppConfig,
) -> Result<i32> {
    let mut results = Vec::with_capacity(inputs.len());
    for input in inputs {
        let content = std::fs::read_to_string(input)
            .with_context(|| format!("reading {}", input.display()))?;
        let result = validate_document(&content);
        tracing::debug!(
            "{}: {} errors, {} warnings",
            input.display(),
            result.error_count,
            result.warning_count
        );
        results.push((input.display().to_string(), result));
    }

    let content = match format {
        ValidateFormat::Json => {
            let reports: Vec<serde_json::Value> = results
                .iter()
                .map(|(path, result)| serde_json::json!({ "file": path, "result": result }))
                .collect();
            serde_json::to_string_pretty(&reports).context("serializing validation results")?
        }
        ValidateFormat::Text => results
            .iter()
            .map(|(path, result)| format_text(path, result))
            .collect::<Vec<_>>()
            .join("\n"),
    };
    let target = OutputTarget::from_option(config.output.file.clone());
    write_output(&content, &target, config.behavior.quiet)?;

    let failed = results.iter().any(|(_, result)| {
        !result.is_valid || (fail_on_warning && result.warning_count > 0)
    });
    Ok(if failed {
        exit_codes::VALIDATION_FAILED
    } else {
        exit_codes::SUCCESS
    })
}

fn format_text(path: &str, result: &ValidationResult) -> String {
    let mut lines = Vec::new();
    let version = result
        .version
        .as_deref()
        .map(|v| format!(" {v}"))
        .unwrap_or_default();
    lines.push(format!("{path} ({}{version})", result.format));
    lines.push(format!(
        "Status: {} ({} errors, {} warnings)",
        if result.is_valid { "VALID" } else { "INVALID" },
        result.error_count,
        result.warning_count
    ));
    for finding in &result.findings {
        let severity = match finding.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN",
        };
        let element = finding.element.as_deref().unwrap_or("-");
        lines.push(format!("[{severity}] {element} | {}", finding.message));
    }
    lines.join("\n")
}
