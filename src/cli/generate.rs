//! Generate command handler.

use anyhow::{bail, Result};
use std::path::PathBuf;

use crate::config::{AppConfig, Validatable};
use crate::pipeline::{exit_codes, generate_document, write_output, OutputTarget};

/// Run the generate command
pub fn run_generate(inputs: &[PathBuf], config: &AppConfig) -> Result<i32> {
    let errors = config.validate();
    if !errors.is_empty() {
        for error in &errors {
            tracing::error!("{error}");
        }
        bail!("configuration has {} problem(s)", errors.len());
    }
    if inputs.is_empty() {
        bail!("no input files given");
    }

    let outcome = generate_document(inputs, config)?;
    if outcome.report.registered == 0 {
        bail!("none of the {} inputs could be extracted", outcome.report.failed.len());
    }

    let target = OutputTarget::from_option(config.output.file.clone());
    write_output(&outcome.document, &target, config.behavior.quiet)?;

    if outcome.report.is_partial() {
        tracing::warn!(
            "{} of {} inputs were skipped",
            outcome.report.failed.len(),
            outcome.report.failed.len() + outcome.report.registered
        );
        return Ok(exit_codes::PARTIAL);
    }
    Ok(exit_codes::SUCCESS)
}
