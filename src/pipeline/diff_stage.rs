//! Diff computation stage.

use std::path::Path;

use anyhow::{Context, Result};

use crate::config::{DiffConfig, DiffFormat};
use crate::diff::{DiffEngine, DiffResult};
use crate::parsers::parse_bom;

/// Read both documents and compare them.
pub fn compute_diff(old_path: &Path, new_path: &Path, config: &DiffConfig) -> Result<DiffResult> {
    let old = parse_bom(old_path).with_context(|| format!("reading {}", old_path.display()))?;
    let new = parse_bom(new_path).with_context(|| format!("reading {}", new_path.display()))?;
    tracing::info!(
        "comparing {} ({} components) with {} ({} components)",
        old_path.display(),
        old.components.len(),
        new_path.display(),
        new.components.len()
    );

    let engine = DiffEngine::new().with_ignored_fields(config.ignore_fields.clone());
    Ok(engine.diff(&old, &new)?)
}

/// Render a diff in the configured report format.
pub fn render_diff(result: &DiffResult, format: DiffFormat) -> Result<String> {
    Ok(match format {
        DiffFormat::Text => result.to_text(),
        DiffFormat::Csv => result.to_csv(),
        DiffFormat::Json => {
            serde_json::to_string_pretty(result).context("serializing diff result")?
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_formats() {
        let result = DiffResult::new();
        assert!(render_diff(&result, DiffFormat::Text)
            .unwrap()
            .contains("No changes."));
        assert!(render_diff(&result, DiffFormat::Csv)
            .unwrap()
            .starts_with("Section,Change"));
        let json: serde_json::Value =
            serde_json::from_str(&render_diff(&result, DiffFormat::Json).unwrap()).unwrap();
        assert_eq!(json["summary"]["total_changes"], 0);
    }
}
