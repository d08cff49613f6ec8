//! Dependency change computer implementation.

use std::collections::BTreeSet;

use crate::diff::traits::{ChangeComputer, ComponentMatches};
use crate::diff::{ChangeSet, ChangeType, DependencyChange};
use crate::model::EdgeKind;
use crate::parsers::ParsedBom;

/// Computes edge-level changes between documents.
///
/// Edges are compared by the names at both ends, so references that differ
/// between the two documents do not show up as churn.
#[derive(Debug, Clone, Copy, Default)]
pub struct DependencyChangeComputer;

impl DependencyChangeComputer {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn edge_keys(bom: &ParsedBom) -> BTreeSet<(String, String, EdgeKind)> {
        bom.edges
            .iter()
            .map(|e| {
                (
                    bom.name_of(&e.from).to_string(),
                    bom.name_of(&e.to).to_string(),
                    e.kind,
                )
            })
            .collect()
    }
}

impl ChangeComputer for DependencyChangeComputer {
    type ChangeSet = ChangeSet<DependencyChange>;

    fn compute(
        &self,
        old: &ParsedBom,
        new: &ParsedBom,
        _matches: &ComponentMatches,
    ) -> ChangeSet<DependencyChange> {
        let old_edges = Self::edge_keys(old);
        let new_edges = Self::edge_keys(new);

        let change = |(from, to, kind): &(String, String, EdgeKind), change_type| DependencyChange {
            from: from.clone(),
            to: to.clone(),
            kind: *kind,
            change_type,
        };

        // BTreeSet differences come out sorted.
        ChangeSet {
            added: new_edges
                .difference(&old_edges)
                .map(|e| change(e, ChangeType::Added))
                .collect(),
            removed: old_edges
                .difference(&new_edges)
                .map(|e| change(e, ChangeType::Removed))
                .collect(),
            modified: Vec::new(),
        }
    }

    fn name(&self) -> &str {
        "DependencyChanges"
    }
}
