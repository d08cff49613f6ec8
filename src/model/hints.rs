//! Externally supplied metadata: compiler-plugin debug hints and per-component
//! overrides.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{BinsbomError, Result};

/// Source and function lists keyed by translation-unit path, as written by
/// compiler plugins:
///
/// ```json
/// {"units": {"src/main.c": {"source_files": ["src/util.h"], "functions": ["main"]}}}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugInfoHints {
    #[serde(default)]
    pub units: IndexMap<String, UnitHints>,
}

/// Hints for a single translation unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitHints {
    #[serde(default)]
    pub source_files: Vec<String>,
    #[serde(default)]
    pub functions: Vec<String>,
}

impl DebugInfoHints {
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| BinsbomError::io(path, e))?;
        Self::from_json(&content)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Metadata that binaries do not carry (license, supplier, packaging),
/// supplied per component name in YAML:
///
/// ```yaml
/// components:
///   libz.so.1:
///     license: Zlib
///     supplier: zlib project
///     package_manager: deb
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataOverrides {
    #[serde(default)]
    pub components: IndexMap<String, ComponentOverride>,
}

/// Overrides for one component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentOverride {
    pub license: Option<String>,
    pub supplier: Option<String>,
    pub manufacturer: Option<String>,
    pub publisher: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub package_manager: Option<String>,
    pub purl: Option<String>,
}

impl MetadataOverrides {
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| BinsbomError::config(format!("invalid metadata overrides: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| BinsbomError::io(path, e))?;
        Self::from_yaml(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hints_from_json() {
        let hints = DebugInfoHints::from_json(
            r#"{"units": {"src/main.c": {"source_files": ["src/a.h"], "functions": ["main"]}}}"#,
        )
        .unwrap();
        assert_eq!(hints.units.len(), 1);
        assert_eq!(hints.units["src/main.c"].functions, vec!["main"]);
    }

    #[test]
    fn test_hints_missing_lists_default() {
        let hints = DebugInfoHints::from_json(r#"{"units": {"a.c": {}}}"#).unwrap();
        assert!(hints.units["a.c"].source_files.is_empty());
        assert!(DebugInfoHints::from_json("{}").unwrap().is_empty());
    }

    #[test]
    fn test_overrides_from_yaml() {
        let overrides = MetadataOverrides::from_yaml(
            "components:\n  libz.so.1:\n    license: Zlib\n    package_manager: deb\n",
        )
        .unwrap();
        let entry = &overrides.components["libz.so.1"];
        assert_eq!(entry.license.as_deref(), Some("Zlib"));
        assert_eq!(entry.package_manager.as_deref(), Some("deb"));
        assert_eq!(entry.supplier, None);
    }
}
