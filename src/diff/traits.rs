//! Trait definitions for diff computation strategies.

use indexmap::IndexMap;

use crate::parsers::ParsedBom;

/// Old-document reference mapped to its counterpart in the new document,
/// or `None` when the component was removed.
pub type ComponentMatches = IndexMap<String, Option<String>>;

/// Computes one category of change between two documents.
pub trait ChangeComputer: Send + Sync {
    /// The type of changes this computer produces.
    type ChangeSet;

    /// Compute changes between old and new documents given component matches.
    fn compute(&self, old: &ParsedBom, new: &ParsedBom, matches: &ComponentMatches)
        -> Self::ChangeSet;

    /// Get the name of this change computer for logging/debugging.
    fn name(&self) -> &str;
}
