//! Parallel extraction over many files.

use std::path::PathBuf;

use rayon::prelude::*;

use crate::config::ExtractionConfig;
use crate::error::{BinsbomError, Result};
use crate::extract::{ExtractedArtifact, ExtractorDispatcher};

/// Extract every path on the rayon pool, returning results in input order.
///
/// `config.threads == 0` uses the global pool; any other value runs on a
/// dedicated pool of that size.
pub fn extract_all(
    paths: &[PathBuf],
    dispatcher: &ExtractorDispatcher,
    config: &ExtractionConfig,
) -> Result<Vec<(PathBuf, Result<ExtractedArtifact>)>> {
    let dispatcher = dispatcher.clone().with_max_file_size(config.max_file_size);
    let run = || {
        paths
            .par_iter()
            .map(|path| {
                let result = dispatcher.extract_path(path).map_err(BinsbomError::from);
                (path.clone(), result)
            })
            .collect::<Vec<_>>()
    };

    let results = if config.threads == 0 {
        run()
    } else {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .build()
            .map_err(|e| BinsbomError::config(format!("building thread pool: {e}")))?
            .install(run)
    };

    let failed = results.iter().filter(|(_, r)| r.is_err()).count();
    tracing::info!(
        "extracted {} of {} files",
        results.len() - failed,
        results.len()
    );
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_order_preserved_and_failures_isolated() {
        let tmp = TempDir::new().unwrap();
        let mut paths = Vec::new();
        for i in 0..6 {
            let path = tmp.path().join(format!("f{i}"));
            std::fs::write(&path, format!("not a binary {i}")).unwrap();
            paths.push(path);
        }

        let config = ExtractionConfig {
            threads: 2,
            ..ExtractionConfig::default()
        };
        let results = extract_all(&paths, &ExtractorDispatcher::standard(), &config).unwrap();
        let order: Vec<&PathBuf> = results.iter().map(|(p, _)| p).collect();
        assert_eq!(order, paths.iter().collect::<Vec<_>>());
        assert!(results.iter().all(|(_, r)| r.is_err()));
    }
}
