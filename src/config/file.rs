//! Configuration file loading and discovery.

use super::types::{AppConfig, DiffFormat};
use crate::extract::DEFAULT_MAX_FILE_SIZE;
use crate::generate::GeneratorConfig;
use std::path::{Path, PathBuf};

// ============================================================================
// Configuration File Discovery
// ============================================================================

/// Standard config file names to search for.
const CONFIG_FILE_NAMES: &[&str] = &[".binsbom.yaml", ".binsbom.yml", "binsbom.yaml"];

/// Discover a config file by searching standard locations.
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Current directory
/// 3. Git repository root (if in a repo)
/// 4. User config directory (~/.config/binsbom/)
/// 5. Home directory
#[must_use]
pub fn discover_config_file(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path.filter(|p| p.exists()) {
        return Some(path.to_path_buf());
    }

    let candidates = [
        std::env::current_dir().ok(),
        find_git_root(),
        dirs::config_dir().map(|d| d.join("binsbom")),
        dirs::home_dir(),
    ];
    candidates
        .into_iter()
        .flatten()
        .find_map(|dir| find_config_in_dir(&dir))
}

/// Find a config file in a specific directory.
fn find_config_in_dir(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}

/// Find the git repository root by walking up the directory tree.
fn find_git_root() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    cwd.ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

// ============================================================================
// Configuration File Loading
// ============================================================================

/// Error type for config file operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Load an `AppConfig` from a YAML file.
pub fn load_config_file(path: &Path) -> Result<AppConfig, ConfigFileError> {
    if !path.exists() {
        return Err(ConfigFileError::NotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
}

/// Load config from discovered file, or return default.
#[must_use]
pub fn load_or_default(explicit_path: Option<&Path>) -> (AppConfig, Option<PathBuf>) {
    discover_config_file(explicit_path).map_or_else(
        || (AppConfig::default(), None),
        |path| match load_config_file(&path) {
            Ok(config) => {
                tracing::debug!("loaded config from {}", path.display());
                (config, Some(path))
            }
            Err(e) => {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                (AppConfig::default(), None)
            }
        },
    )
}

// ============================================================================
// Configuration Merging
// ============================================================================

impl AppConfig {
    /// Merge another config into this one, with `other` taking precedence
    /// wherever it differs from the default.
    pub fn merge(&mut self, other: &Self) {
        let defaults = Self::default();

        // Extraction
        if other.extraction.threads != 0 {
            self.extraction.threads = other.extraction.threads;
        }
        if other.extraction.recursive {
            self.extraction.recursive = true;
        }
        if other.extraction.follow_symlinks {
            self.extraction.follow_symlinks = true;
        }
        if other.extraction.skip_detection {
            self.extraction.skip_detection = true;
        }
        if other.extraction.max_file_size != DEFAULT_MAX_FILE_SIZE {
            self.extraction.max_file_size = other.extraction.max_file_size;
        }
        if other.extraction.debug_hints.is_some() {
            self.extraction.debug_hints.clone_from(&other.extraction.debug_hints);
        }
        if other.extraction.overrides.is_some() {
            self.extraction.overrides.clone_from(&other.extraction.overrides);
        }

        // Generation
        let generation = &other.generation;
        if generation.format != defaults.generation.format {
            self.generation.format.clone_from(&generation.format);
        }
        if generation.document_name.is_some() {
            self.generation.document_name.clone_from(&generation.document_name);
        }
        if generation.namespace_base != GeneratorConfig::default().namespace_base {
            self.generation.namespace_base.clone_from(&generation.namespace_base);
        }
        if generation.timestamp.is_some() {
            self.generation.timestamp.clone_from(&generation.timestamp);
        }
        if generation.organization.is_some() {
            self.generation.organization.clone_from(&generation.organization);
        }
        if generation.purl_type != defaults.generation.purl_type {
            self.generation.purl_type.clone_from(&generation.purl_type);
        }
        if generation.purl_namespace.is_some() {
            self.generation.purl_namespace.clone_from(&generation.purl_namespace);
        }
        if !generation.include_debug_details {
            self.generation.include_debug_details = false;
        }

        // Output
        if other.output.file.is_some() {
            self.output.file.clone_from(&other.output.file);
        }
        if !other.output.pretty {
            self.output.pretty = false;
        }

        // Diff
        if other.diff.format != DiffFormat::default() {
            self.diff.format = other.diff.format;
        }
        if !other.diff.ignore_fields.is_empty() {
            self.diff.ignore_fields.clone_from(&other.diff.ignore_fields);
        }

        // Behavior (booleans - if set to true, override)
        if other.behavior.fail_on_change {
            self.behavior.fail_on_change = true;
        }
        if other.behavior.strict {
            self.behavior.strict = true;
        }
        if other.behavior.quiet {
            self.behavior.quiet = true;
        }
    }

    /// Load from file and merge with CLI overrides.
    #[must_use]
    pub fn from_file_with_overrides(
        config_path: Option<&Path>,
        cli_overrides: &Self,
    ) -> (Self, Option<PathBuf>) {
        let (mut config, loaded_from) = load_or_default(config_path);
        config.merge(cli_overrides);
        (config, loaded_from)
    }
}

// ============================================================================
// Example Config Generation
// ============================================================================

/// Generate an example config file content.
#[must_use]
pub fn generate_example_config() -> String {
    format!(
        "# binsbom configuration\n\
         # Place this file at .binsbom.yaml in your project root or ~/.config/binsbom/\n\n{}",
        serde_yaml::to_string(&AppConfig::default()).unwrap_or_default()
    )
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_in_dir() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join(".binsbom.yaml");
        std::fs::write(&config_path, "extraction:\n  recursive: true\n").unwrap();

        assert_eq!(find_config_in_dir(tmp.path()), Some(config_path));
    }

    #[test]
    fn test_find_config_in_dir_not_found() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(find_config_in_dir(tmp.path()), None);
    }

    #[test]
    fn test_load_config_file() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.yaml");
        let yaml = r#"
extraction:
  threads: 2
generation:
  format: spdx-3.0.1
  timestamp: "2024-01-01T00:00:00Z"
behavior:
  fail_on_change: true
"#;
        std::fs::write(&config_path, yaml).unwrap();

        let config = load_config_file(&config_path).unwrap();
        assert_eq!(config.extraction.threads, 2);
        assert_eq!(config.generation.format, "spdx-3.0.1");
        assert!(config.behavior.fail_on_change);
        assert!(config.output.pretty);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config_file(Path::new("/nonexistent/config.yaml"));
        assert!(matches!(result, Err(ConfigFileError::NotFound(_))));
    }

    #[test]
    fn test_load_config_file_bad_yaml() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("bad.yaml");
        std::fs::write(&config_path, "extraction: [unclosed").unwrap();
        assert!(matches!(
            load_config_file(&config_path),
            Err(ConfigFileError::Parse(_))
        ));
    }

    #[test]
    fn test_config_merge() {
        let mut base = AppConfig::builder().threads(8).format("spdx-2.3").build();
        let overrides = AppConfig::builder()
            .format("cyclonedx-1.5")
            .fail_on_change(true)
            .build();

        base.merge(&overrides);

        assert_eq!(base.extraction.threads, 8);
        assert_eq!(base.generation.format, "cyclonedx-1.5");
        assert!(base.behavior.fail_on_change);
    }

    #[test]
    fn test_generate_example_config() {
        let example = generate_example_config();
        assert!(example.contains("extraction:"));
        assert!(example.contains("max_file_size"));
        let parsed: AppConfig = serde_yaml::from_str(&example).unwrap();
        assert_eq!(parsed, AppConfig::default());
    }

    #[test]
    fn test_discover_explicit_path() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("custom-config.yaml");
        std::fs::write(&config_path, "behavior:\n  quiet: true\n").unwrap();

        assert_eq!(discover_config_file(Some(&config_path)), Some(config_path));
    }
}
