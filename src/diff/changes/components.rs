//! Component change computer implementation.

use std::collections::HashSet;

use crate::diff::traits::{ChangeComputer, ComponentMatches};
use crate::diff::{ChangeSet, ComponentChange, FieldChange};
use crate::parsers::{ParsedBom, ParsedComponent};

/// Computes component-level changes between documents.
#[derive(Debug, Clone, Default)]
pub struct ComponentChangeComputer {
    ignored_fields: Vec<String>,
}

impl ComponentChangeComputer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ignored_fields: Vec::new(),
        }
    }

    /// Skip the named fields (`version`, `type`, `purl`, `license`,
    /// `checksum`) when comparing.
    #[must_use]
    pub fn with_ignored_fields(mut self, fields: Vec<String>) -> Self {
        self.ignored_fields = fields;
        self
    }

    /// Compute individual field changes between two components.
    fn compute_field_changes(&self, old: &ParsedComponent, new: &ParsedComponent) -> Vec<FieldChange> {
        let mut changes = Vec::new();
        let mut push = |field: &str, old_value: Option<&str>, new_value: Option<&str>| {
            if old_value != new_value && !self.ignored_fields.iter().any(|f| f == field) {
                changes.push(FieldChange {
                    field: field.to_string(),
                    old_value: old_value.map(str::to_string),
                    new_value: new_value.map(str::to_string),
                });
            }
        };

        push("version", old.version.as_deref(), new.version.as_deref());
        push(
            "type",
            Some(old.component_type.as_str()),
            Some(new.component_type.as_str()),
        );
        push("purl", old.purl.as_deref(), new.purl.as_deref());
        push("license", Some(old.license.as_str()), Some(new.license.as_str()));
        push("checksum", old.checksum.as_deref(), new.checksum.as_deref());
        changes
    }
}

impl ChangeComputer for ComponentChangeComputer {
    type ChangeSet = ChangeSet<ComponentChange>;

    fn compute(
        &self,
        old: &ParsedBom,
        new: &ParsedBom,
        matches: &ComponentMatches,
    ) -> ChangeSet<ComponentChange> {
        let mut result = ChangeSet::new();
        let mut matched_new: HashSet<&str> = HashSet::new();

        for (old_ref, new_ref) in matches {
            let Some(old_comp) = old.components.get(old_ref) else {
                continue;
            };
            let Some(new_comp) = new_ref.as_deref().and_then(|r| {
                matched_new.insert(r);
                new.components.get(r)
            }) else {
                result.removed.push(ComponentChange::removed(
                    old_ref,
                    &old_comp.name,
                    old_comp.version.as_deref(),
                ));
                continue;
            };

            let field_changes = self.compute_field_changes(old_comp, new_comp);
            if !field_changes.is_empty() {
                result.modified.push(ComponentChange::modified(
                    new_ref.as_deref().unwrap_or(old_ref),
                    &new_comp.name,
                    old_comp.version.as_deref(),
                    new_comp.version.as_deref(),
                    field_changes,
                ));
            }
        }

        for (new_ref, new_comp) in &new.components {
            if !matched_new.contains(new_ref.as_str()) {
                result.added.push(ComponentChange::added(
                    new_ref,
                    &new_comp.name,
                    new_comp.version.as_deref(),
                ));
            }
        }

        let by_identity = |a: &ComponentChange, b: &ComponentChange| {
            (&a.name, &a.old_version, &a.new_version, &a.id)
                .cmp(&(&b.name, &b.old_version, &b.new_version, &b.id))
        };
        result.added.sort_by(by_identity);
        result.removed.sort_by(by_identity);
        result.modified.sort_by(by_identity);
        result
    }

    fn name(&self) -> &str {
        "ComponentChanges"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::matching::match_components;
    use crate::diff::ChangeType;

    fn component(name: &str, version: &str) -> ParsedComponent {
        let mut c = ParsedComponent::new(name);
        c.version = Some(version.to_string());
        c
    }

    #[test]
    fn test_field_changes() {
        let old = component("libz", "1.2.11");
        let mut new = component("libz", "1.2.13");
        new.license = "Zlib".to_string();
        let changes = ComponentChangeComputer::new().compute_field_changes(&old, &new);
        let fields: Vec<&str> = changes.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(fields, ["version", "license"]);
        assert_eq!(changes[1].old_value.as_deref(), Some("NOASSERTION"));

        let ignoring = ComponentChangeComputer::new().with_ignored_fields(vec!["license".into()]);
        assert_eq!(ignoring.compute_field_changes(&old, &new).len(), 1);
    }

    #[test]
    fn test_compute_added_removed_modified() {
        let mut old = ParsedBom::default();
        old.components.insert("a".into(), component("a", "1"));
        old.components.insert("gone".into(), component("gone", "1"));
        let mut new = ParsedBom::default();
        new.components.insert("a".into(), component("a", "2"));
        new.components.insert("fresh".into(), component("fresh", "1"));

        let matches = match_components(&old, &new);
        let changes = ComponentChangeComputer::new().compute(&old, &new, &matches);
        assert_eq!(changes.added.len(), 1);
        assert_eq!(changes.added[0].name, "fresh");
        assert_eq!(changes.removed[0].change_type, ChangeType::Removed);
        assert_eq!(changes.modified[0].field_changes[0].field, "version");
    }

    #[test]
    fn test_identical_components_produce_nothing() {
        let mut bom = ParsedBom::default();
        bom.components.insert("a".into(), component("a", "1"));
        let matches = match_components(&bom, &bom);
        assert!(ComponentChangeComputer::new()
            .compute(&bom, &bom, &matches)
            .is_empty());
    }
}
