//! Diff command handler.

use anyhow::Result;
use std::path::Path;

use crate::config::AppConfig;
use crate::pipeline::{compute_diff, exit_codes, render_diff, write_output, OutputTarget};

/// Run the diff command
pub fn run_diff(old: &Path, new: &Path, config: &AppConfig) -> Result<i32> {
    let result = compute_diff(old, new, &config.diff)?;
    let content = render_diff(&result, config.diff.format)?;
    let target = OutputTarget::from_option(config.output.file.clone());
    write_output(&content, &target, config.behavior.quiet)?;

    if config.behavior.fail_on_change && result.has_changes() {
        return Ok(exit_codes::CHANGES_DETECTED);
    }
    Ok(exit_codes::SUCCESS)
}
