//! Configuration validation.

use super::types::{
    AppConfig, BehaviorConfig, DiffConfig, ExtractionConfig, GenerationConfig, OutputConfig,
};
use crate::generate::OutputFormat;
use crate::model::PurlType;

/// Component fields the comparator knows about.
const DIFF_FIELDS: &[&str] = &["version", "type", "purl", "license", "checksum"];

// ============================================================================
// Configuration Error
// ============================================================================

/// Error type for configuration validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ConfigError {
    /// The field that failed validation
    pub field: String,
    /// Description of the validation error
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

// ============================================================================
// Validation Trait
// ============================================================================

/// Trait for validatable configuration types.
pub trait Validatable {
    /// Validate the configuration, returning any errors found.
    fn validate(&self) -> Vec<ConfigError>;

    /// Check if the configuration is valid.
    fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

// ============================================================================
// Validation Implementations
// ============================================================================

impl Validatable for AppConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        errors.extend(self.extraction.validate());
        errors.extend(self.generation.validate());
        errors.extend(self.output.validate());
        errors.extend(self.diff.validate());
        errors.extend(self.behavior.validate());
        errors
    }
}

impl Validatable for ExtractionConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if self.max_file_size == 0 {
            errors.push(ConfigError::new(
                "extraction.max_file_size",
                "must be greater than zero",
            ));
        }
        if self.threads > 1024 {
            errors.push(ConfigError::new(
                "extraction.threads",
                format!("{} threads is more than the limit of 1024", self.threads),
            ));
        }
        for (field, path) in [
            ("extraction.debug_hints", &self.debug_hints),
            ("extraction.overrides", &self.overrides),
        ] {
            if let Some(path) = path {
                if !path.exists() {
                    errors.push(ConfigError::new(
                        field,
                        format!("file not found: {}", path.display()),
                    ));
                }
            }
        }
        errors
    }
}

impl Validatable for GenerationConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if self.format.parse::<OutputFormat>().is_err() {
            let valid: Vec<String> = OutputFormat::all().iter().map(ToString::to_string).collect();
            errors.push(ConfigError::new(
                "generation.format",
                format!(
                    "Invalid format '{}'. Valid options: {}",
                    self.format,
                    valid.join(", ")
                ),
            ));
        }
        if PurlType::from_hint(&self.purl_type).is_none() {
            errors.push(ConfigError::new(
                "generation.purl_type",
                format!(
                    "Invalid purl type '{}'. Valid options: generic, deb, rpm, conan, vcpkg",
                    self.purl_type
                ),
            ));
        }
        if let Err(e) = self.parsed_timestamp() {
            errors.push(ConfigError::new("generation.timestamp", e.to_string()));
        }
        if !(self.namespace_base.starts_with("http://") || self.namespace_base.starts_with("https://"))
        {
            errors.push(ConfigError::new(
                "generation.namespace_base",
                "must be an http(s) URI",
            ));
        }
        errors
    }
}

impl Validatable for OutputConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if let Some(parent) = self.file.as_deref().and_then(std::path::Path::parent) {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                errors.push(ConfigError::new(
                    "output.file",
                    format!("Parent directory does not exist: {}", parent.display()),
                ));
            }
        }
        errors
    }
}

impl Validatable for DiffConfig {
    fn validate(&self) -> Vec<ConfigError> {
        self.ignore_fields
            .iter()
            .filter(|f| !DIFF_FIELDS.contains(&f.as_str()))
            .map(|f| {
                ConfigError::new(
                    "diff.ignore_fields",
                    format!(
                        "Unknown field '{f}'. Valid options: {}",
                        DIFF_FIELDS.join(", ")
                    ),
                )
            })
            .collect()
    }
}

impl Validatable for BehaviorConfig {
    fn validate(&self) -> Vec<ConfigError> {
        Vec::new()
    }
}
