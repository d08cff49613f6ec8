//! Component registry.
//!
//! The single owner of every component discovered during a run. It
//! deduplicates by path and checksum, assigns BOM references once, and keeps
//! dependency edges whose targets may not be known until every file has been
//! registered.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;

use super::bom_ref::BomRef;
use super::component::Component;
use super::hints::{DebugInfoHints, MetadataOverrides};
use super::license::LicenseExpression;
use crate::error::{BinsbomError, RegistryErrorKind, Result};
use crate::extract::normalize::library_stem;
use crate::utils::absolute_path;
use crate::extract::ExtractedArtifact;

// ============================================================================
// Edges
// ============================================================================

/// Relationship carried by an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeKind {
    /// Dynamic-link dependency
    DependsOn,
    /// Archive membership
    Contains,
}

impl EdgeKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DependsOn => "depends-on",
            Self::Contains => "contains",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an edge points.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "state", content = "target")]
pub enum EdgeTarget {
    /// A registered component
    Resolved(BomRef),
    /// Not yet looked up; a BOM ref or a library name
    Pending(String),
    /// Nothing in this run provides it
    External(String),
}

impl EdgeTarget {
    /// The ref or name this edge points at.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Resolved(r) => r.as_str(),
            Self::Pending(name) | Self::External(name) => name,
        }
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }
}

/// A directed edge between a registered component and a target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub from: BomRef,
    pub to: EdgeTarget,
    pub kind: EdgeKind,
}

/// Outcome of [`Registry::resolve_edges`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeResolution {
    pub resolved: usize,
    pub external: usize,
}

/// A broken registry invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryViolation {
    UnknownSource { from: BomRef },
    UnknownTarget { from: BomRef, to: BomRef },
    PendingEdge { from: BomRef, target: String },
    DuplicateSpdxId { id: String },
    RefMismatch { key: BomRef, stored: BomRef },
}

impl fmt::Display for RegistryViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSource { from } => write!(f, "edge source '{from}' is not registered"),
            Self::UnknownTarget { from, to } => {
                write!(f, "edge {from} -> {to} points at an unregistered component")
            }
            Self::PendingEdge { from, target } => {
                write!(f, "edge {from} -> {target} was never resolved")
            }
            Self::DuplicateSpdxId { id } => write!(f, "SPDX id '{id}' is not unique"),
            Self::RefMismatch { key, stored } => {
                write!(f, "component stored under '{key}' carries ref '{stored}'")
            }
        }
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Insertion-ordered set of components and the edges between them.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    components: IndexMap<BomRef, Component>,
    by_identity: HashMap<(PathBuf, String), BomRef>,
    spdx_ids: HashSet<String>,
    edges: IndexSet<DependencyEdge>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a candidate, or merge it into the component with the same path
    /// and checksum. Returns the component's reference either way.
    pub fn register_component(&mut self, mut candidate: Component) -> Result<BomRef> {
        if candidate.name.trim().is_empty() {
            return Err(BinsbomError::registry(
                "registering component",
                RegistryErrorKind::EmptyName,
            ));
        }

        // Identity is the absolute path, whatever spelling the caller used
        let identity = candidate
            .file_path
            .as_deref()
            .map(absolute_path)
            .zip(candidate.checksum.clone());
        if let Some(existing) = identity.as_ref().and_then(|id| self.by_identity.get(id)) {
            let existing = existing.clone();
            if let Some(component) = self.components.get_mut(&existing) {
                tracing::debug!("merging repeated registration of {}", existing);
                component.merge(candidate);
            }
            return Ok(existing);
        }

        let bom_ref = self.fresh_ref(&candidate);
        candidate.assign_ref(bom_ref.clone());
        self.spdx_ids.insert(bom_ref.spdx_id());
        if let Some(identity) = identity {
            self.by_identity.insert(identity, bom_ref.clone());
        }
        self.components.insert(bom_ref.clone(), candidate);
        Ok(bom_ref)
    }

    /// `name@version`, suffixed `-2`, `-3`, ... until both the ref and its
    /// SPDX id are unused.
    fn fresh_ref(&self, candidate: &Component) -> BomRef {
        let base = BomRef::from_name_version(&candidate.name, candidate.version.as_deref());
        let taken = |r: &BomRef| self.components.contains_key(r) || self.spdx_ids.contains(&r.spdx_id());
        if !taken(&base) {
            return base;
        }
        let mut n = 2;
        loop {
            let candidate = base.with_suffix(n);
            if !taken(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Register an extracted file, its archive members, and its dependencies
    /// as pending by-name edges.
    pub fn register_artifact(&mut self, artifact: &ExtractedArtifact) -> Result<BomRef> {
        let bom_ref = self.register_component(Component::from_artifact(artifact))?;
        for dep in &artifact.dependencies {
            self.add_dependency_by_name(&bom_ref, &dep.name)?;
        }

        for member in &artifact.members {
            let mut candidate = Component::from_artifact(member);
            candidate.container = Some(bom_ref.clone());
            let member_ref = self.register_component(candidate)?;
            self.insert_edge(DependencyEdge {
                from: bom_ref.clone(),
                to: EdgeTarget::Resolved(member_ref.clone()),
                kind: EdgeKind::Contains,
            });
            for dep in &member.dependencies {
                self.add_dependency_by_name(&member_ref, &dep.name)?;
            }
        }
        Ok(bom_ref)
    }

    /// Record `from` depends on `to`. `to` may be a registered ref; anything
    /// else is kept pending until [`Self::resolve_edges`].
    pub fn add_dependency(&mut self, from: &BomRef, to: &str) -> Result<()> {
        self.ensure_source(from)?;
        let target = BomRef::new(to);
        let to = if self.components.contains_key(&target) {
            self.mirror_dependency(from, &target);
            EdgeTarget::Resolved(target)
        } else {
            EdgeTarget::Pending(to.to_string())
        };
        self.insert_edge(DependencyEdge {
            from: from.clone(),
            to,
            kind: EdgeKind::DependsOn,
        });
        Ok(())
    }

    /// Record a dependency on a library name (`DT_NEEDED`, `LC_LOAD_DYLIB`,
    /// import DLL), resolved later against component names.
    pub fn add_dependency_by_name(&mut self, from: &BomRef, name: &str) -> Result<()> {
        self.ensure_source(from)?;
        self.insert_edge(DependencyEdge {
            from: from.clone(),
            to: EdgeTarget::Pending(name.to_string()),
            kind: EdgeKind::DependsOn,
        });
        Ok(())
    }

    fn ensure_source(&self, from: &BomRef) -> Result<()> {
        if self.components.contains_key(from) {
            Ok(())
        } else {
            Err(BinsbomError::registry(
                "adding dependency",
                RegistryErrorKind::UnknownSource(from.to_string()),
            ))
        }
    }

    fn insert_edge(&mut self, edge: DependencyEdge) {
        self.edges.insert(edge);
    }

    fn mirror_dependency(&mut self, from: &BomRef, to: &BomRef) {
        if let Some(component) = self.components.get_mut(from) {
            if !component.dependencies.contains(to) {
                component.dependencies.push(to.clone());
            }
        }
    }

    /// Find the component a pending target names: an exact ref, then an exact
    /// component name, then a matching library stem (`libA.so.1` ~ `libA`).
    fn lookup_target(&self, from: &BomRef, target: &str) -> Option<BomRef> {
        let as_ref = BomRef::new(target);
        if self.components.contains_key(&as_ref) && &as_ref != from {
            return Some(as_ref);
        }
        let candidates = || self.components.values().filter(|c| c.bom_ref() != from);
        if let Some(c) = candidates().find(|c| c.name == target) {
            return Some(c.bom_ref().clone());
        }
        let stem = library_stem(target);
        candidates()
            .find(|c| {
                c.name == stem
                    || library_stem(&c.name) == stem
                    || c.build_info.soname.as_deref() == Some(target)
            })
            .map(|c| c.bom_ref().clone())
    }

    /// Turn every pending edge into a resolved or external one.
    pub fn resolve_edges(&mut self) -> EdgeResolution {
        let mut outcome = EdgeResolution::default();
        let edges = std::mem::take(&mut self.edges);
        let mut resolved_edges = IndexSet::with_capacity(edges.len());
        let mut mirrors = Vec::new();

        for edge in edges {
            let target = match &edge.to {
                EdgeTarget::Pending(target) => target.clone(),
                _ => {
                    resolved_edges.insert(edge);
                    continue;
                }
            };
            let to = match self.lookup_target(&edge.from, &target) {
                Some(found) => {
                    outcome.resolved += 1;
                    mirrors.push((edge.from.clone(), found.clone()));
                    EdgeTarget::Resolved(found)
                }
                None => {
                    tracing::debug!("dependency {} -> {} is external", edge.from, target);
                    outcome.external += 1;
                    EdgeTarget::External(target)
                }
            };
            resolved_edges.insert(DependencyEdge {
                from: edge.from,
                to,
                kind: edge.kind,
            });
        }

        self.edges = resolved_edges;
        for (from, to) in mirrors {
            self.mirror_dependency(&from, &to);
        }
        outcome
    }

    /// Check the registry invariants. An empty result means the registry is
    /// consistent.
    #[must_use]
    pub fn validate(&self) -> Vec<RegistryViolation> {
        let mut violations = Vec::new();
        let mut seen_spdx = HashSet::new();
        for (key, component) in &self.components {
            if key != component.bom_ref() {
                violations.push(RegistryViolation::RefMismatch {
                    key: key.clone(),
                    stored: component.bom_ref().clone(),
                });
            }
            let id = key.spdx_id();
            if !seen_spdx.insert(id.clone()) {
                violations.push(RegistryViolation::DuplicateSpdxId { id });
            }
        }
        for edge in &self.edges {
            if !self.components.contains_key(&edge.from) {
                violations.push(RegistryViolation::UnknownSource {
                    from: edge.from.clone(),
                });
            }
            match &edge.to {
                EdgeTarget::Pending(target) => violations.push(RegistryViolation::PendingEdge {
                    from: edge.from.clone(),
                    target: target.clone(),
                }),
                EdgeTarget::Resolved(to) if !self.components.contains_key(to) => {
                    violations.push(RegistryViolation::UnknownTarget {
                        from: edge.from.clone(),
                        to: to.clone(),
                    });
                }
                _ => {}
            }
        }
        violations
    }

    /// Attach compiler-plugin hints to the component whose compile units or
    /// source files mention each translation unit. Returns the number of
    /// units that found a component.
    pub fn merge_hints(&mut self, hints: &DebugInfoHints) -> usize {
        let mut matched = 0;
        for (unit, unit_hints) in &hints.units {
            let target = self.components.values_mut().find(|c| {
                c.compile_units.iter().any(|cu| same_path(cu, unit))
                    || c.source_files.iter().any(|sf| same_path(sf, unit))
            });
            let Some(component) = target else {
                tracing::debug!("no component for translation unit {unit}");
                continue;
            };
            matched += 1;
            for file in &unit_hints.source_files {
                if !component.source_files.contains(file) {
                    component.source_files.push(file.clone());
                }
            }
            for function in &unit_hints.functions {
                if !component.functions.contains(function) {
                    component.functions.push(function.clone());
                }
            }
        }
        matched
    }

    /// Apply per-name metadata overrides. Returns the number of components touched.
    pub fn apply_overrides(&mut self, overrides: &MetadataOverrides) -> usize {
        let mut touched = 0;
        for component in self.components.values_mut() {
            let entry = overrides.components.get(&component.name).or_else(|| {
                overrides
                    .components
                    .get(library_stem(&component.name))
            });
            let Some(entry) = entry else {
                continue;
            };
            touched += 1;
            if let Some(license) = &entry.license {
                component.license = LicenseExpression::new(license.clone());
            }
            let fields = [
                (&mut component.supplier, &entry.supplier),
                (&mut component.manufacturer, &entry.manufacturer),
                (&mut component.publisher, &entry.publisher),
                (&mut component.version, &entry.version),
                (&mut component.description, &entry.description),
                (&mut component.package_manager, &entry.package_manager),
                (&mut component.purl, &entry.purl),
            ];
            for (field, value) in fields {
                if value.is_some() {
                    field.clone_from(value);
                }
            }
        }
        touched
    }

    // ------------------------------------------------------------------------
    // Traversal
    // ------------------------------------------------------------------------

    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }

    pub fn components_mut(&mut self) -> impl Iterator<Item = &mut Component> {
        self.components.values_mut()
    }

    pub fn edges(&self) -> impl Iterator<Item = &DependencyEdge> {
        self.edges.iter()
    }

    #[must_use]
    pub fn get(&self, bom_ref: &BomRef) -> Option<&Component> {
        self.components.get(bom_ref)
    }

    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&Component> {
        self.components.values().find(|c| c.name == name)
    }

    /// Targets of `bom_ref`'s dependency edges, in insertion order.
    pub fn dependencies_of<'a>(&'a self, bom_ref: &'a BomRef) -> impl Iterator<Item = &'a EdgeTarget> {
        self.edges
            .iter()
            .filter(move |e| &e.from == bom_ref && e.kind == EdgeKind::DependsOn)
            .map(|e| &e.to)
    }

    /// Top-level components (not contained in an archive).
    pub fn roots(&self) -> impl Iterator<Item = &Component> {
        self.components.values().filter(|c| c.container.is_none())
    }

    /// Names of external dependency targets, deduplicated in first-seen order.
    #[must_use]
    pub fn external_targets(&self) -> Vec<&str> {
        let mut out: IndexSet<&str> = IndexSet::new();
        for edge in &self.edges {
            if let EdgeTarget::External(name) = &edge.to {
                out.insert(name.as_str());
            }
        }
        out.into_iter().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

fn same_path(a: &str, b: &str) -> bool {
    a == b || a.ends_with(&format!("/{b}")) || b.ends_with(&format!("/{a}"))
}
