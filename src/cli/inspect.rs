//! Inspect command handler: dump what extraction sees in each binary.

use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::PathBuf;

use crate::config::AppConfig;
use crate::extract::{ExtractedArtifact, ExtractorDispatcher};
use crate::pipeline::{collect_inputs, exit_codes, extract_all, write_output, OutputTarget};

/// Rendering for `inspect`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum InspectFormat {
    /// One block of key facts per file
    #[default]
    Text,
    /// Full extraction results
    Json,
}

/// Run the inspect command
pub fn run_inspect(inputs: &[PathBuf], format: InspectFormat, config: &AppConfig) -> Result<i32> {
    let dispatcher = ExtractorDispatcher::standard();
    let files = collect_inputs(inputs, &dispatcher, &config.extraction)?;
    let results = extract_all(&files, &dispatcher, &config.extraction)?;

    let mut artifacts = Vec::new();
    let mut failed = 0usize;
    for (path, result) in results {
        match result {
            Ok(artifact) => artifacts.push(artifact),
            Err(e) => {
                tracing::warn!("skipping {}: {e}", path.display());
                failed += 1;
            }
        }
    }

    let content = match format {
        InspectFormat::Json => {
            serde_json::to_string_pretty(&artifacts).context("serializing extraction results")?
        }
        InspectFormat::Text => artifacts.iter().map(summarize).collect::<Vec<_>>().join("\n"),
    };
    let target = OutputTarget::from_option(config.output.file.clone());
    write_output(&content, &target, config.behavior.quiet)?;

    Ok(match (artifacts.is_empty(), failed) {
        (true, _) => exit_codes::ERROR,
        (false, 0) => exit_codes::SUCCESS,
        (false, _) => exit_codes::PARTIAL,
    })
}

fn summarize(artifact: &ExtractedArtifact) -> String {
    let mut out = String::new();
    let arches: Vec<String> = artifact
        .architectures
        .iter()
        .map(|a| format!("{} ({}-bit)", a.name, a.bits))
        .collect();
    // Writing to a String cannot fail.
    let _ = writeln!(out, "{}", artifact.path.display());
    let _ = writeln!(out, "  format:        {}", artifact.format);
    let _ = writeln!(out, "  kind:          {}", artifact.build_info.file_kind.as_str());
    let _ = writeln!(out, "  architectures: {}", arches.join(", "));
    let _ = writeln!(out, "  sha256:        {}", artifact.checksum);
    if let Some(version) = &artifact.version {
        let _ = writeln!(out, "  version:       {version}");
    }
    if let Some(build_id) = &artifact.build_info.build_id {
        let _ = writeln!(out, "  build id:      {build_id}");
    }
    let _ = writeln!(
        out,
        "  symbols:       {} ({} defined)",
        artifact.symbols.len(),
        artifact.defined_symbol_count()
    );
    let _ = writeln!(out, "  sections:      {}", artifact.sections.len());
    for dep in &artifact.dependencies {
        let _ = writeln!(out, "  needs:         {}", dep.name);
    }
    for member in &artifact.members {
        let _ = writeln!(out, "  member:        {}", member.file_name());
    }
    out
}
