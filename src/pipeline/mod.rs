//! Pipeline orchestration: discover → extract → register → generate, and
//! read → diff → report.
//!
//! Extraction is the only parallel stage. Registration consumes its results
//! in input order, so the registry has a single writer.

mod diff_stage;
mod discover;
mod extract_stage;
mod generate_stage;
mod output;
mod register_stage;

pub use diff_stage::{compute_diff, render_diff};
pub use discover::collect_inputs;
pub use extract_stage::extract_all;
pub use generate_stage::{
    build_registry_from_paths, generate_document, render_registry, GenerateOutcome,
};
pub use output::{write_output, OutputTarget};
pub use register_stage::{build_registry, RegistrationReport};

/// Structured pipeline error types for better diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to find or read inputs
    #[error("Input discovery failed: {source}")]
    DiscoveryFailed {
        #[source]
        source: anyhow::Error,
    },

    /// Registration or generation failed
    #[error("Generation failed: {source}")]
    GenerationFailed {
        #[source]
        source: anyhow::Error,
    },

    /// Failed to read or parse a document for comparison
    #[error("Parse failed for {path}: {source}")]
    ParseFailed {
        path: String,
        source: anyhow::Error,
    },

    /// Diff computation failed
    #[error("Diff failed: {source}")]
    DiffFailed {
        #[source]
        source: anyhow::Error,
    },
}

/// Exit codes for CI/CD integration
pub mod exit_codes {
    /// Success - no changes detected, every input processed
    pub const SUCCESS: i32 = 0;
    /// A diff found changes and fail-on-change is set
    pub const CHANGES_DETECTED: i32 = 1;
    /// A validated document has errors, or warnings under fail-on-warning
    pub const VALIDATION_FAILED: i32 = 1;
    /// A document was written but some inputs were skipped
    pub const PARTIAL: i32 = 2;
    /// An error occurred
    pub const ERROR: i32 = 3;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_values() {
        assert_eq!(exit_codes::SUCCESS, 0);
        assert_eq!(exit_codes::CHANGES_DETECTED, 1);
        assert_eq!(exit_codes::VALIDATION_FAILED, 1);
        assert_eq!(exit_codes::PARTIAL, 2);
        assert_eq!(exit_codes::ERROR, 3);
    }

    #[test]
    fn test_pipeline_error_display() {
        let err = PipelineError::ParseFailed {
            path: "old.cdx.json".to_string(),
            source: anyhow::anyhow!("unknown format"),
        };
        assert_eq!(err.to_string(), "Parse failed for old.cdx.json: unknown format");
    }
}
