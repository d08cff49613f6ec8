//! Configuration for binsbom runs.
//!
//! - typed sections with `#[serde(default)]`, so partial files are fine
//! - named presets
//! - validation returning every problem at once
//! - YAML file discovery and CLI merging
//!
//! ```yaml
//! extraction:
//!   recursive: true
//!   threads: 4
//! generation:
//!   format: spdx-3.0.1
//!   timestamp: "2024-01-01T00:00:00Z"
//! behavior:
//!   fail_on_change: true
//! ```

mod defaults;
pub mod file;
mod types;
mod validation;

pub use defaults::{ConfigPreset, REPRODUCIBLE_TIMESTAMP};
pub use file::{
    discover_config_file, generate_example_config, load_config_file, load_or_default,
    ConfigFileError,
};
pub use types::{
    AppConfig, AppConfigBuilder, BehaviorConfig, DiffConfig, DiffFormat, ExtractionConfig,
    GenerationConfig, OutputConfig,
};
pub use validation::{ConfigError, Validatable};

/// JSON Schema for `.binsbom.yaml`, for editor completion and validation.
#[must_use]
pub fn generate_json_schema() -> String {
    let schema = schemars::schema_for!(AppConfig);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_schema_lists_sections() {
        let schema: serde_json::Value = serde_json::from_str(&generate_json_schema()).unwrap();
        let properties = schema["properties"].as_object().unwrap();
        for section in ["extraction", "generation", "output", "diff", "behavior"] {
            assert!(properties.contains_key(section), "missing {section}");
        }
    }
}
