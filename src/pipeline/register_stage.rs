//! Sequential registration of extraction results.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::ExtractionConfig;
use crate::error::BinsbomError;
use crate::extract::ExtractedArtifact;
use crate::model::{DebugInfoHints, MetadataDetector, MetadataOverrides, Registry};

/// What registration did with each input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationReport {
    /// Files that became (or merged into) components
    pub registered: usize,
    /// Files skipped, with the reason
    pub failed: Vec<(PathBuf, String)>,
    /// Translation units that matched a component
    pub hints_matched: usize,
    /// Components given a license found in a license file
    pub licenses_detected: usize,
    /// Components given a package manager inferred from their location
    pub package_managers_detected: usize,
    /// Components touched by metadata overrides
    pub overrides_applied: usize,
}

impl RegistrationReport {
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Register every successful result in input order.
///
/// Per-file failures are logged and recorded unless `strict` is set, in
/// which case the first one aborts the run. Once all files are registered,
/// license files and install locations are examined (unless
/// `skip_detection` is set), then the hints and overrides named in `config`
/// are applied, so overrides win over anything detected.
pub fn build_registry(
    results: Vec<(PathBuf, crate::error::Result<ExtractedArtifact>)>,
    config: &ExtractionConfig,
    strict: bool,
) -> Result<(Registry, RegistrationReport)> {
    let mut registry = Registry::new();
    let mut report = RegistrationReport::default();

    for (path, result) in results {
        let registered = result.and_then(|artifact| {
            for diagnostic in &artifact.diagnostics {
                tracing::debug!("{}: {diagnostic}", path.display());
            }
            registry.register_artifact(&artifact)
        });
        match registered {
            Ok(bom_ref) => {
                tracing::debug!("registered {} as {bom_ref}", path.display());
                report.registered += 1;
            }
            Err(e) => skip_or_abort(&path, e, strict, &mut report)?,
        }
    }

    if !config.skip_detection {
        let detected = MetadataDetector::new().apply(&mut registry);
        report.licenses_detected = detected.licenses;
        report.package_managers_detected = detected.package_managers;
    }
    if let Some(path) = &config.debug_hints {
        let hints = DebugInfoHints::load(path)
            .with_context(|| format!("loading debug hints from {}", path.display()))?;
        report.hints_matched = registry.merge_hints(&hints);
        tracing::info!(
            "matched {} of {} hinted translation units",
            report.hints_matched,
            hints.units.len()
        );
    }
    if let Some(path) = &config.overrides {
        let overrides = MetadataOverrides::load(path)
            .with_context(|| format!("loading overrides from {}", path.display()))?;
        report.overrides_applied = registry.apply_overrides(&overrides);
        tracing::info!("applied overrides to {} components", report.overrides_applied);
    }

    tracing::info!(
        "registered {} files as {} components",
        report.registered,
        registry.len()
    );
    Ok((registry, report))
}

fn skip_or_abort(
    path: &Path,
    error: BinsbomError,
    strict: bool,
    report: &mut RegistrationReport,
) -> Result<()> {
    if strict || !error.is_per_file() {
        return Err(error).with_context(|| format!("processing {}", path.display()));
    }
    tracing::warn!("skipping {}: {error}", path.display());
    report.failed.push((path.to_path_buf(), error.to_string()));
    Ok(())
}
