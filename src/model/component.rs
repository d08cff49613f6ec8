//! Format-neutral component records.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::path::PathBuf;

use super::bom_ref::BomRef;
use super::license::LicenseExpression;
use crate::extract::{Architecture, BuildInfo, ExtractedArtifact, FileKind};
use crate::utils::version_specificity;

/// What kind of thing a component is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType {
    #[default]
    Library,
    Application,
    File,
    Framework,
    Source,
}

impl ComponentType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Library => "library",
            Self::Application => "application",
            Self::File => "file",
            Self::Framework => "framework",
            Self::Source => "source",
        }
    }

    /// Parse a CycloneDX `type` or SPDX `primaryPurpose` value.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "application" | "executable" => Self::Application,
            "file" | "archive" => Self::File,
            "framework" => Self::Framework,
            "source" => Self::Source,
            _ => Self::Library,
        }
    }

    /// Type implied by a binary's header.
    #[must_use]
    pub const fn from_file_kind(kind: FileKind) -> Self {
        match kind {
            FileKind::Executable => Self::Application,
            FileKind::SharedLibrary | FileKind::StaticLibrary => Self::Library,
            FileKind::Object | FileKind::Unknown => Self::File,
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a component is needed at runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Required,
    Optional,
    Excluded,
}

impl Scope {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Optional => "optional",
            Self::Excluded => "excluded",
        }
    }
}

/// Two registration passes disagreed on a field and neither value was more specific.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MergeConflict {
    pub field: String,
    pub kept: String,
    pub discarded: String,
}

/// A component in the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Component {
    bom_ref: BomRef,
    pub name: String,
    pub version: Option<String>,
    pub component_type: ComponentType,
    pub purl: Option<String>,
    pub license: LicenseExpression,
    pub file_path: Option<PathBuf>,
    /// Lowercase hex SHA-256
    pub checksum: Option<String>,
    pub description: Option<String>,
    pub scope: Scope,
    pub supplier: Option<String>,
    pub manufacturer: Option<String>,
    pub publisher: Option<String>,
    /// Packaging system hint (`deb`, `rpm`, ...) used for the PURL type
    pub package_manager: Option<String>,
    pub architectures: Vec<Architecture>,
    pub build_info: BuildInfo,
    pub symbols_count: usize,
    pub sections: Vec<String>,
    pub functions: Vec<String>,
    pub compile_units: Vec<String>,
    pub source_files: Vec<String>,
    /// Resolved dependency targets, mirrored from the registry edges
    pub dependencies: Vec<BomRef>,
    /// Containing archive, for archive members
    pub container: Option<BomRef>,
    pub properties: IndexMap<String, String>,
    pub merge_conflicts: Vec<MergeConflict>,
}

impl Component {
    /// A candidate component. Its reference is assigned at registration.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            bom_ref: BomRef::default(),
            name: name.into(),
            version: None,
            component_type: ComponentType::Library,
            purl: None,
            license: LicenseExpression::noassertion(),
            file_path: None,
            checksum: None,
            description: None,
            scope: Scope::Required,
            supplier: None,
            manufacturer: None,
            publisher: None,
            package_manager: None,
            architectures: Vec::new(),
            build_info: BuildInfo::default(),
            symbols_count: 0,
            sections: Vec::new(),
            functions: Vec::new(),
            compile_units: Vec::new(),
            source_files: Vec::new(),
            dependencies: Vec::new(),
            container: None,
            properties: IndexMap::new(),
            merge_conflicts: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    #[must_use]
    pub fn with_type(mut self, component_type: ComponentType) -> Self {
        self.component_type = component_type;
        self
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_checksum(mut self, checksum: impl Into<String>) -> Self {
        self.checksum = Some(checksum.into());
        self
    }

    #[must_use]
    pub fn with_license(mut self, license: LicenseExpression) -> Self {
        self.license = license;
        self
    }

    /// Build a candidate from one extracted file. Archive members are not
    /// included; the registry registers them separately.
    #[must_use]
    pub fn from_artifact(artifact: &ExtractedArtifact) -> Self {
        let mut component = Self::new(artifact.file_name())
            .with_type(ComponentType::from_file_kind(artifact.build_info.file_kind))
            .with_path(artifact.path.clone())
            .with_checksum(artifact.checksum.clone());
        component.version = artifact
            .version
            .clone()
            .or_else(|| artifact.vendor.product_version.clone());
        component.description = artifact.vendor.description.clone();
        component.supplier = artifact.vendor.supplier.clone();
        component.package_manager = artifact.vendor.package_manager.clone();
        component.architectures = artifact.architectures.clone();
        component.build_info = artifact.build_info.clone();
        component.symbols_count = artifact.defined_symbol_count();
        component.sections = artifact.sections.iter().map(|s| s.name.clone()).collect();
        component.functions = artifact.functions.clone();
        component.compile_units = artifact.compile_units.clone();
        component.source_files = artifact.source_files.clone();

        component
            .properties
            .insert("binsbom:format".to_string(), artifact.format.clone());
        component.properties.insert(
            "binsbom:file-kind".to_string(),
            artifact.build_info.file_kind.as_str().to_string(),
        );
        if let Some(build_id) = &artifact.build_info.build_id {
            component
                .properties
                .insert("binsbom:build-id".to_string(), build_id.clone());
        }
        if artifact.build_info.is_signed {
            component
                .properties
                .insert("binsbom:signed".to_string(), "true".to_string());
        }
        component
    }

    #[must_use]
    pub fn bom_ref(&self) -> &BomRef {
        &self.bom_ref
    }

    pub(crate) fn assign_ref(&mut self, bom_ref: BomRef) {
        debug_assert!(self.bom_ref.is_empty(), "bom-ref is assigned once");
        self.bom_ref = bom_ref;
    }

    /// Restore a reference read back from an existing document.
    #[must_use]
    pub fn with_existing_ref(mut self, bom_ref: BomRef) -> Self {
        self.bom_ref = bom_ref;
        self
    }

    /// `name@version`, or the bare name.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.version
            .as_ref()
            .map_or_else(|| self.name.clone(), |v| format!("{}@{}", self.name, v))
    }

    /// First architecture name, used as the PURL `arch` qualifier.
    #[must_use]
    pub fn primary_arch(&self) -> Option<&str> {
        self.architectures.first().map(|a| a.name.as_str())
    }

    /// Fold `other` into `self` following the merge policy: the more specific
    /// non-empty value wins; equal specificity keeps the existing value and
    /// records a conflict. List fields are unioned in order.
    pub fn merge(&mut self, other: Self) {
        let mut conflicts = Vec::new();

        merge_version(&mut self.version, other.version, &mut conflicts);
        merge_text("description", &mut self.description, other.description, &mut conflicts);
        merge_text("supplier", &mut self.supplier, other.supplier, &mut conflicts);
        merge_text("manufacturer", &mut self.manufacturer, other.manufacturer, &mut conflicts);
        merge_text("publisher", &mut self.publisher, other.publisher, &mut conflicts);
        merge_text(
            "package_manager",
            &mut self.package_manager,
            other.package_manager,
            &mut conflicts,
        );
        merge_text("purl", &mut self.purl, other.purl, &mut conflicts);

        if self.license.is_noassertion() && !other.license.is_noassertion() {
            self.license = other.license;
        } else if !other.license.is_noassertion() && self.license != other.license {
            conflicts.push(MergeConflict {
                field: "license".to_string(),
                kept: self.license.expression.clone(),
                discarded: other.license.expression,
            });
        }

        if self.build_info.build_id.is_none() {
            self.build_info.build_id = other.build_info.build_id;
        }
        if self.build_info.soname.is_none() {
            self.build_info.soname = other.build_info.soname;
        }
        self.build_info.contains_debug_info |= other.build_info.contains_debug_info;
        self.build_info.is_signed |= other.build_info.is_signed;
        self.symbols_count = self.symbols_count.max(other.symbols_count);

        union_into(&mut self.architectures, other.architectures);
        union_into(&mut self.sections, other.sections);
        union_into(&mut self.functions, other.functions);
        union_into(&mut self.compile_units, other.compile_units);
        union_into(&mut self.source_files, other.source_files);
        union_into(&mut self.dependencies, other.dependencies);
        for (key, value) in other.properties {
            self.properties.entry(key).or_insert(value);
        }

        for conflict in &conflicts {
            tracing::debug!(
                "merge conflict on {} for {}: kept '{}', discarded '{}'",
                conflict.field,
                self.name,
                conflict.kept,
                conflict.discarded
            );
        }
        union_into(&mut self.merge_conflicts, conflicts);
    }
}

/// Append the items of `items` not already in `target`, keeping order.
fn union_into<T: Hash + Eq>(target: &mut Vec<T>, items: Vec<T>) {
    if items.is_empty() {
        return;
    }
    let mut merged: IndexSet<T> = std::mem::take(target).into_iter().collect();
    merged.extend(items);
    *target = merged.into_iter().collect();
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn merge_text(
    field: &str,
    current: &mut Option<String>,
    incoming: Option<String>,
    conflicts: &mut Vec<MergeConflict>,
) {
    let Some(incoming) = non_empty(incoming) else {
        return;
    };
    let existing = non_empty(current.clone());
    match existing {
        None => *current = Some(incoming),
        Some(existing) if existing == incoming => {}
        Some(existing) if incoming.len() > existing.len() => *current = Some(incoming),
        Some(existing) if incoming.len() < existing.len() => {}
        Some(existing) => conflicts.push(MergeConflict {
            field: field.to_string(),
            kept: existing,
            discarded: incoming,
        }),
    }
}

fn merge_version(
    current: &mut Option<String>,
    incoming: Option<String>,
    conflicts: &mut Vec<MergeConflict>,
) {
    let Some(incoming) = non_empty(incoming) else {
        return;
    };
    let Some(existing) = non_empty(current.clone()) else {
        *current = Some(incoming);
        return;
    };
    if existing == incoming {
        return;
    }
    match version_specificity(&incoming).cmp(&version_specificity(&existing)) {
        std::cmp::Ordering::Greater => *current = Some(incoming),
        std::cmp::Ordering::Less => {}
        std::cmp::Ordering::Equal => conflicts.push(MergeConflict {
            field: "version".to_string(),
            kept: existing,
            discarded: incoming,
        }),
    }
}
