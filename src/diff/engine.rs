//! Diff engine over read-back documents.

use super::changes::{ComponentChangeComputer, DependencyChangeComputer};
use super::matching::match_components;
use super::traits::ChangeComputer;
use super::DiffResult;
use crate::error::Result;
use crate::model::Registry;
use crate::parsers::ParsedBom;

/// Compares two documents component by component and edge by edge.
#[derive(Debug, Clone, Default)]
pub struct DiffEngine {
    components: ComponentChangeComputer,
    dependencies: DependencyChangeComputer,
}

impl DiffEngine {
    /// Create a new diff engine with default settings
    #[must_use]
    pub const fn new() -> Self {
        Self {
            components: ComponentChangeComputer::new(),
            dependencies: DependencyChangeComputer::new(),
        }
    }

    /// Skip the named component fields when looking for modifications.
    #[must_use]
    pub fn with_ignored_fields(mut self, fields: Vec<String>) -> Self {
        self.components = self.components.with_ignored_fields(fields);
        self
    }

    /// Compare two documents and return the diff result
    pub fn diff(&self, old: &ParsedBom, new: &ParsedBom) -> Result<DiffResult> {
        let matches = match_components(old, new);
        tracing::debug!(
            "matched {} of {} components",
            matches.values().filter(|m| m.is_some()).count(),
            old.components.len()
        );

        let mut result = DiffResult::new();
        result.components = self.components.compute(old, new, &matches);
        result.dependencies = self.dependencies.compute(old, new, &matches);
        result.calculate_summary();

        tracing::debug!(
            "{} and {} produced {} changes",
            self.components.name(),
            self.dependencies.name(),
            result.summary.total_changes
        );
        Ok(result)
    }

    /// Compare two in-memory registries.
    pub fn diff_registries(&self, old: &Registry, new: &Registry) -> Result<DiffResult> {
        self.diff(&ParsedBom::from_registry(old), &ParsedBom::from_registry(new))
    }
}
