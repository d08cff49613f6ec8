//! Diff result structures and their text and CSV renderings.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use crate::model::EdgeKind;
use crate::utils::VersionDirection;

/// Complete result of comparing two documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[must_use]
pub struct DiffResult {
    pub summary: DiffSummary,
    pub components: ChangeSet<ComponentChange>,
    pub dependencies: ChangeSet<DependencyChange>,
}

impl DiffResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recount the summary from the change sets.
    pub fn calculate_summary(&mut self) {
        self.summary = DiffSummary {
            components_added: self.components.added.len(),
            components_removed: self.components.removed.len(),
            components_modified: self.components.modified.len(),
            dependencies_added: self.dependencies.added.len(),
            dependencies_removed: self.dependencies.removed.len(),
            total_changes: self.components.total() + self.dependencies.total(),
        };
    }

    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.summary.total_changes > 0
    }

    /// Human-readable report for terminals.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = self.write_text(&mut out);
        out
    }

    fn write_text(&self, out: &mut String) -> std::fmt::Result {
        let s = &self.summary;
        writeln!(out, "SBOM Diff Summary")?;
        writeln!(out, "{}", "-".repeat(40))?;
        writeln!(
            out,
            "Components:   +{} -{} ~{}",
            s.components_added, s.components_removed, s.components_modified
        )?;
        writeln!(
            out,
            "Dependencies: +{} -{}",
            s.dependencies_added, s.dependencies_removed
        )?;
        if !self.has_changes() {
            writeln!(out, "No changes.")?;
            return Ok(());
        }

        for change in &self.components.added {
            writeln!(out, "  + {}", change.display_name())?;
        }
        for change in &self.components.removed {
            writeln!(out, "  - {}", change.display_name())?;
        }
        for change in &self.components.modified {
            writeln!(out, "  ~ {}", change.name)?;
            for field in &change.field_changes {
                writeln!(
                    out,
                    "      {}: {} -> {}",
                    field.field,
                    field.old_value.as_deref().unwrap_or("-"),
                    field.new_value.as_deref().unwrap_or("-")
                )?;
            }
        }
        for dep in &self.dependencies.added {
            writeln!(out, "  + {} {} {}", dep.from, dep.kind, dep.to)?;
        }
        for dep in &self.dependencies.removed {
            writeln!(out, "  - {} {} {}", dep.from, dep.kind, dep.to)?;
        }
        Ok(())
    }

    /// One row per change, with a header line.
    #[must_use]
    pub fn to_csv(&self) -> String {
        let mut content = String::from("Section,Change,Name,Old Version,New Version,Details\n");
        let rows = self
            .components
            .added
            .iter()
            .chain(&self.components.removed)
            .chain(&self.components.modified);
        for comp in rows {
            let details: Vec<String> = comp
                .field_changes
                .iter()
                .map(|f| f.field.clone())
                .collect();
            content.push_str(&format!(
                "component,{},\"{}\",\"{}\",\"{}\",\"{}\"\n",
                comp.change_type.as_str(),
                escape_csv(&comp.name),
                escape_csv(comp.old_version.as_deref().unwrap_or("-")),
                escape_csv(comp.new_version.as_deref().unwrap_or("-")),
                escape_csv(&details.join(";"))
            ));
        }
        for dep in self.dependencies.added.iter().chain(&self.dependencies.removed) {
            content.push_str(&format!(
                "dependency,{},\"{}\",\"-\",\"-\",\"{} {}\"\n",
                dep.change_type.as_str(),
                escape_csv(&dep.from),
                dep.kind,
                escape_csv(&dep.to)
            ));
        }
        content
    }
}

/// Double-quote escaping per RFC 4180, plus newline flattening since fields
/// are already wrapped in double quotes.
fn escape_csv(s: &str) -> String {
    s.replace('"', "\"\"").replace('\n', " ")
}

/// Counts over a [`DiffResult`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    pub components_added: usize,
    pub components_removed: usize,
    pub components_modified: usize,
    pub dependencies_added: usize,
    pub dependencies_removed: usize,
    pub total_changes: usize,
}

/// Added, removed and modified entries of one kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ChangeSet<T> {
    pub added: Vec<T>,
    pub removed: Vec<T>,
    #[serde(default)]
    pub modified: Vec<T>,
}

impl<T> Default for ChangeSet<T> {
    fn default() -> Self {
        Self {
            added: Vec::new(),
            removed: Vec::new(),
            modified: Vec::new(),
        }
    }
}

impl<T> ChangeSet<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.added.len() + self.removed.len() + self.modified.len()
    }
}

/// Type of change
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Added,
    Removed,
    Modified,
}

impl ChangeType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Modified => "modified",
        }
    }
}

/// A component present on one side only, or changed between sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentChange {
    /// Reference in the newer document, or the older one for removals
    pub id: String,
    pub name: String,
    pub change_type: ChangeType,
    pub old_version: Option<String>,
    pub new_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_direction: Option<VersionDirection>,
    #[serde(default)]
    pub field_changes: Vec<FieldChange>,
}

impl ComponentChange {
    #[must_use]
    pub fn added(id: &str, name: &str, version: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            change_type: ChangeType::Added,
            old_version: None,
            new_version: version.map(str::to_string),
            version_direction: None,
            field_changes: Vec::new(),
        }
    }

    #[must_use]
    pub fn removed(id: &str, name: &str, version: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            change_type: ChangeType::Removed,
            old_version: version.map(str::to_string),
            new_version: None,
            version_direction: None,
            field_changes: Vec::new(),
        }
    }

    #[must_use]
    pub fn modified(
        id: &str,
        name: &str,
        old_version: Option<&str>,
        new_version: Option<&str>,
        field_changes: Vec<FieldChange>,
    ) -> Self {
        let version_direction = match (old_version, new_version) {
            (Some(old), Some(new)) if old != new => Some(VersionDirection::classify(old, new)),
            _ => None,
        };
        Self {
            id: id.to_string(),
            name: name.to_string(),
            change_type: ChangeType::Modified,
            old_version: old_version.map(str::to_string),
            new_version: new_version.map(str::to_string),
            version_direction,
            field_changes,
        }
    }

    /// `name@version` of whichever side exists.
    #[must_use]
    pub fn display_name(&self) -> String {
        match self.new_version.as_deref().or(self.old_version.as_deref()) {
            Some(v) => format!("{}@{v}", self.name),
            None => self.name.clone(),
        }
    }
}

/// Individual field change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

/// An edge present on one side only, by component name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DependencyChange {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
    pub change_type: ChangeType,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DiffResult {
        let mut result = DiffResult::new();
        result
            .components
            .added
            .push(ComponentChange::added("libnew", "libnew", Some("1.0")));
        result.components.modified.push(ComponentChange::modified(
            "libz",
            "libz",
            Some("1.2.11"),
            Some("1.2.13"),
            vec![FieldChange {
                field: "version".to_string(),
                old_value: Some("1.2.11".to_string()),
                new_value: Some("1.2.13".to_string()),
            }],
        ));
        result.dependencies.removed.push(DependencyChange {
            from: "app".to_string(),
            to: "libold.so".to_string(),
            kind: EdgeKind::DependsOn,
            change_type: ChangeType::Removed,
        });
        result.calculate_summary();
        result
    }

    #[test]
    fn test_summary() {
        let result = sample();
        assert_eq!(result.summary.total_changes, 3);
        assert!(result.has_changes());
        assert_eq!(
            result.components.modified[0].version_direction,
            Some(VersionDirection::Upgrade)
        );
        assert!(!DiffResult::new().has_changes());
    }

    #[test]
    fn test_text_report() {
        let text = sample().to_text();
        assert!(text.contains("Components:   +1 -0 ~1"));
        assert!(text.contains("  + libnew@1.0"));
        assert!(text.contains("      version: 1.2.11 -> 1.2.13"));
        assert!(text.contains("  - app depends-on libold.so"));
        assert!(DiffResult::new().to_text().contains("No changes."));
    }

    #[test]
    fn test_csv_report() {
        let csv = sample().to_csv();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "component,added,\"libnew\",\"-\",\"1.0\",\"\"");
        assert_eq!(
            lines[3],
            "dependency,removed,\"app\",\"-\",\"-\",\"depends-on libold.so\""
        );
    }

    #[test]
    fn test_json_roundtrip_shape() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["summary"]["total_changes"], 3);
        assert_eq!(json["components"]["modified"][0]["version_direction"], "upgrade");
    }
}
