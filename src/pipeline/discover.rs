//! Input discovery: expand directory arguments into binary files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::config::ExtractionConfig;
use crate::extract::ExtractorDispatcher;
use crate::utils::absolute_path;

/// Expand `inputs` into the files to extract, in a stable order.
///
/// Files named explicitly are always kept, so a non-binary argument is
/// reported as a failure rather than silently dropped. Files found by walking
/// a directory are kept only when some extractor claims their magic bytes.
/// A file reached through several spellings (`bin/app`, `./bin/app`, a
/// symlink) is kept once, under the first spelling seen.
pub fn collect_inputs(
    inputs: &[PathBuf],
    dispatcher: &ExtractorDispatcher,
    config: &ExtractionConfig,
) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        let metadata = std::fs::metadata(input)
            .with_context(|| format!("cannot read input {}", input.display()))?;
        if metadata.is_dir() {
            files.extend(walk_directory(input, dispatcher, config));
        } else {
            files.push(input.clone());
        }
    }

    let mut seen = std::collections::HashSet::new();
    files.retain(|f| seen.insert(absolute_path(f)));
    tracing::info!("found {} input files", files.len());
    Ok(files)
}

fn walk_directory(
    dir: &Path,
    dispatcher: &ExtractorDispatcher,
    config: &ExtractionConfig,
) -> Vec<PathBuf> {
    let max_depth = if config.recursive { usize::MAX } else { 1 };
    WalkDir::new(dir)
        .max_depth(max_depth)
        .follow_links(config.follow_symlinks)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("skipping unreadable entry under {}: {e}", dir.display());
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| match dispatcher.select_path(entry.path()) {
            Ok(Some(_)) => true,
            Ok(None) => {
                tracing::debug!("no extractor for {}", entry.path().display());
                false
            }
            Err(e) => {
                tracing::debug!("cannot read header of {}: {e}", entry.path().display());
                false
            }
        })
        .map(walkdir::DirEntry::into_path)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_walk_keeps_only_binaries() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("b.a"), b"!<arch>\n").unwrap();
        std::fs::write(tmp.path().join("a.txt"), b"hello").unwrap();
        std::fs::write(tmp.path().join("empty"), b"").unwrap();
        std::fs::create_dir(tmp.path().join("sub")).unwrap();
        std::fs::write(tmp.path().join("sub/c.a"), b"!<arch>\n").unwrap();

        let dispatcher = ExtractorDispatcher::standard();
        let flat = collect_inputs(
            &[tmp.path().to_path_buf()],
            &dispatcher,
            &ExtractionConfig::default(),
        )
        .unwrap();
        assert_eq!(flat, vec![tmp.path().join("b.a")]);

        let recursive = ExtractionConfig {
            recursive: true,
            ..ExtractionConfig::default()
        };
        let deep = collect_inputs(&[tmp.path().to_path_buf()], &dispatcher, &recursive).unwrap();
        assert_eq!(deep.len(), 2);
    }

    #[test]
    fn test_explicit_files_are_kept_and_deduplicated() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("notes.txt");
        std::fs::write(&file, b"hello").unwrap();

        let files = collect_inputs(
            &[file.clone(), file.clone()],
            &ExtractorDispatcher::standard(),
            &ExtractionConfig::default(),
        )
        .unwrap();
        assert_eq!(files, vec![file]);
    }

    #[test]
    fn test_spellings_of_one_file_are_kept_once() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("bin")).unwrap();
        let file = tmp.path().join("bin/libx.a");
        std::fs::write(&file, b"!<arch>\n").unwrap();

        let files = collect_inputs(
            &[
                file.clone(),
                tmp.path().join("bin/./libx.a"),
                tmp.path().join("bin/../bin/libx.a"),
                tmp.path().join("bin"),
            ],
            &ExtractorDispatcher::standard(),
            &ExtractionConfig::default(),
        )
        .unwrap();
        assert_eq!(files, vec![file]);
    }

    #[test]
    fn test_missing_input_is_an_error() {
        let result = collect_inputs(
            &[PathBuf::from("/nonexistent/binsbom-input")],
            &ExtractorDispatcher::standard(),
            &ExtractionConfig::default(),
        );
        assert!(result.is_err());
    }
}
