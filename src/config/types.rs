//! Configuration types for binsbom operations.
//!
//! Provides structured configuration for extraction, generation and diff runs.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{BinsbomError, Result};
use crate::extract::DEFAULT_MAX_FILE_SIZE;
use crate::generate::{GeneratorConfig, OutputFormat};
use crate::model::PurlType;

// ============================================================================
// Unified Application Configuration
// ============================================================================

/// Unified application configuration that can be loaded from CLI args or config files.
///
/// CLI arguments are layered over file settings with [`AppConfig::merge`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AppConfig {
    /// Which files to read and how
    pub extraction: ExtractionConfig,
    /// Document identity and format
    pub generation: GenerationConfig,
    /// Where and how documents are written
    pub output: OutputConfig,
    /// Comparison settings
    pub diff: DiffConfig,
    /// Behavior flags
    pub behavior: BehaviorConfig,
}

impl AppConfig {
    /// Create a new `AppConfig` with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an `AppConfig` builder.
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }
}

// ============================================================================
// Builder for AppConfig
// ============================================================================

/// Builder for constructing `AppConfig` with fluent API.
#[derive(Debug, Default)]
#[must_use]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    /// Worker threads for extraction; 0 uses one per core.
    pub const fn threads(mut self, threads: usize) -> Self {
        self.config.extraction.threads = threads;
        self
    }

    /// Descend into subdirectories of directory inputs.
    pub const fn recursive(mut self, recursive: bool) -> Self {
        self.config.extraction.recursive = recursive;
        self
    }

    pub const fn max_file_size(mut self, bytes: u64) -> Self {
        self.config.extraction.max_file_size = bytes;
        self
    }

    pub fn debug_hints(mut self, path: Option<PathBuf>) -> Self {
        self.config.extraction.debug_hints = path;
        self
    }

    pub fn overrides(mut self, path: Option<PathBuf>) -> Self {
        self.config.extraction.overrides = path;
        self
    }

    /// Output format name, e.g. `cyclonedx-1.6` or `spdx-3.0.1`.
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.config.generation.format = format.into();
        self
    }

    pub fn document_name(mut self, name: Option<String>) -> Self {
        self.config.generation.document_name = name;
        self
    }

    /// Fixed RFC 3339 creation time.
    pub fn timestamp(mut self, timestamp: Option<String>) -> Self {
        self.config.generation.timestamp = timestamp;
        self
    }

    pub fn organization(mut self, organization: Option<String>) -> Self {
        self.config.generation.organization = organization;
        self
    }

    /// Set the output file.
    pub fn output_file(mut self, file: Option<PathBuf>) -> Self {
        self.config.output.file = file;
        self
    }

    pub const fn pretty(mut self, pretty: bool) -> Self {
        self.config.output.pretty = pretty;
        self
    }

    pub const fn diff_format(mut self, format: DiffFormat) -> Self {
        self.config.diff.format = format;
        self
    }

    pub fn ignore_fields(mut self, fields: Vec<String>) -> Self {
        self.config.diff.ignore_fields = fields;
        self
    }

    /// Enable fail-on-change mode.
    pub const fn fail_on_change(mut self, fail: bool) -> Self {
        self.config.behavior.fail_on_change = fail;
        self
    }

    pub const fn skip_detection(mut self, skip: bool) -> Self {
        self.config.extraction.skip_detection = skip;
        self
    }

    /// Abort on the first file that fails to extract.
    pub const fn strict(mut self, strict: bool) -> Self {
        self.config.behavior.strict = strict;
        self
    }

    /// Enable quiet mode.
    pub const fn quiet(mut self, quiet: bool) -> Self {
        self.config.behavior.quiet = quiet;
        self
    }

    /// Build the `AppConfig`.
    #[must_use]
    pub fn build(self) -> AppConfig {
        self.config
    }
}

// ============================================================================
// Sections
// ============================================================================

/// Input discovery and extraction limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Worker threads; 0 means one per core
    pub threads: usize,
    /// Walk directory inputs recursively
    pub recursive: bool,
    /// Follow symbolic links while walking
    pub follow_symlinks: bool,
    /// Files larger than this many bytes are refused
    pub max_file_size: u64,
    /// Compiler-plugin debug hints (JSON)
    pub debug_hints: Option<PathBuf>,
    /// Per-component metadata overrides (YAML)
    pub overrides: Option<PathBuf>,
    /// Do not look for license files or infer the package manager from install paths
    pub skip_detection: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            recursive: false,
            follow_symlinks: false,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            debug_hints: None,
            overrides: None,
            skip_detection: false,
        }
    }
}

/// Document settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct GenerationConfig {
    /// spdx-2.3, spdx-3.0, spdx-3.0.1, cyclonedx-1.4, cyclonedx-1.5 or cyclonedx-1.6
    pub format: String,
    pub document_name: Option<String>,
    /// Base URI for SPDX document namespaces
    pub namespace_base: String,
    /// RFC 3339 creation time; unset means now
    pub timestamp: Option<String>,
    pub organization: Option<String>,
    /// PURL type for components without a package-manager hint
    pub purl_type: String,
    pub purl_namespace: Option<String>,
    /// Emit function and source-file lists as properties
    pub include_debug_details: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        let defaults = GeneratorConfig::default();
        Self {
            format: OutputFormat::default().to_string(),
            document_name: None,
            namespace_base: defaults.namespace_base,
            timestamp: None,
            organization: None,
            purl_type: defaults.purl_type.as_str().to_string(),
            purl_namespace: None,
            include_debug_details: defaults.include_debug_details,
        }
    }
}

impl GenerationConfig {
    pub fn output_format(&self) -> Result<OutputFormat> {
        self.format.parse()
    }

    pub fn parsed_timestamp(&self) -> Result<Option<DateTime<Utc>>> {
        self.timestamp
            .as_deref()
            .map(|ts| {
                DateTime::parse_from_rfc3339(ts)
                    .map(|t| t.with_timezone(&Utc))
                    .map_err(|e| BinsbomError::config(format!("timestamp '{ts}': {e}")))
            })
            .transpose()
    }

    /// Settings for [`crate::generate::SbomGenerator`].
    pub fn to_generator_config(&self, pretty: bool) -> Result<GeneratorConfig> {
        let purl_type = PurlType::from_hint(&self.purl_type).ok_or_else(|| {
            BinsbomError::config(format!("unknown purl type '{}'", self.purl_type))
        })?;
        Ok(GeneratorConfig {
            document_name: self.document_name.clone(),
            namespace_base: self.namespace_base.clone(),
            timestamp: self.parsed_timestamp()?,
            organization: self.organization.clone(),
            purl_type,
            purl_namespace: self.purl_namespace.clone(),
            include_debug_details: self.include_debug_details,
            pretty,
        })
    }
}

/// Output destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct OutputConfig {
    /// Output file path (stdout if not specified)
    pub file: Option<PathBuf>,
    /// Indent JSON documents
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file: None,
            pretty: true,
        }
    }
}

/// Report format for diff results.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum DiffFormat {
    #[default]
    Text,
    Json,
    Csv,
}

/// Comparison settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DiffConfig {
    pub format: DiffFormat,
    /// Component fields not reported as modifications
    pub ignore_fields: Vec<String>,
}

/// Behavior flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Exit with code 1 when a diff finds changes
    pub fail_on_change: bool,
    /// Stop at the first file that fails to extract
    pub strict: bool,
    /// Suppress non-essential output
    pub quiet: bool,
}
