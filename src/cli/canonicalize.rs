//! Canonicalize command handler: the byte form a signer should hash.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::generate::canonicalize;
use crate::pipeline::exit_codes;

/// Run the canonicalize command
pub fn run_canonicalize(input: &Path, output: Option<&PathBuf>) -> Result<i32> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("reading {}", input.display()))?;
    let bytes = canonicalize(&content)
        .with_context(|| format!("canonicalizing {}", input.display()))?;

    match output {
        Some(path) => std::fs::write(path, &bytes)
            .with_context(|| format!("writing {}", path.display()))?,
        None => std::io::stdout()
            .lock()
            .write_all(&bytes)
            .context("writing to stdout")?,
    }
    Ok(exit_codes::SUCCESS)
}
