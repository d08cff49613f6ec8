//! Pairing components across two documents.
//!
//! Three passes, each only over what earlier passes left unpaired:
//! identical reference, then identical `(name, version, type)`, then a
//! `(name, type)` that is unique on both sides. The last pass is what lets a
//! version bump show up as a modification rather than a removal plus an
//! addition.

use std::collections::{HashMap, HashSet};

use super::traits::ComponentMatches;
use crate::parsers::{ParsedBom, ParsedComponent};

/// Pair every component of `old` with at most one component of `new`.
#[must_use]
pub fn match_components(old: &ParsedBom, new: &ParsedBom) -> ComponentMatches {
    let mut matches: ComponentMatches = old.components.keys().map(|k| (k.clone(), None)).collect();
    let mut claimed: HashSet<&str> = HashSet::new();

    for (reference, _) in &old.components {
        if new.components.contains_key(reference) {
            matches.insert(reference.clone(), Some(reference.clone()));
            claimed.insert(reference.as_str());
        }
    }

    let exact = |c: &ParsedComponent| (c.name.clone(), c.version.clone(), c.component_type);
    pair_unique(old, new, &mut matches, &mut claimed, exact);

    let loose = |c: &ParsedComponent| (c.name.clone(), c.component_type);
    pair_unique(old, new, &mut matches, &mut claimed, loose);

    matches
}

/// Pair unmatched components whose key occurs exactly once on each side.
fn pair_unique<'n, K, F>(
    old: &ParsedBom,
    new: &'n ParsedBom,
    matches: &mut ComponentMatches,
    claimed: &mut HashSet<&'n str>,
    key: F,
) where
    K: std::hash::Hash + Eq,
    F: Fn(&ParsedComponent) -> K,
{
    let mut old_keys: HashMap<K, Vec<&str>> = HashMap::new();
    for (reference, component) in &old.components {
        if matches.get(reference).is_some_and(Option::is_none) {
            old_keys.entry(key(component)).or_default().push(reference);
        }
    }
    let mut new_keys: HashMap<K, Vec<&'n str>> = HashMap::new();
    for (reference, component) in &new.components {
        if !claimed.contains(reference.as_str()) {
            new_keys.entry(key(component)).or_default().push(reference);
        }
    }

    for (k, old_refs) in old_keys {
        let Some(new_refs) = new_keys.get(&k) else {
            continue;
        };
        if let ([old_ref], [new_ref]) = (old_refs.as_slice(), new_refs.as_slice()) {
            matches.insert((*old_ref).to_string(), Some((*new_ref).to_string()));
            claimed.insert(*new_ref);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bom(entries: &[(&str, &str, Option<&str>)]) -> ParsedBom {
        let mut bom = ParsedBom::default();
        for (reference, name, version) in entries {
            let mut component = ParsedComponent::new(*name);
            component.version = version.map(str::to_string);
            bom.components.insert((*reference).to_string(), component);
        }
        bom
    }

    #[test]
    fn test_match_by_reference() {
        let old = bom(&[("a", "libA", Some("1"))]);
        let new = bom(&[("a", "libA", Some("2"))]);
        let matches = match_components(&old, &new);
        assert_eq!(matches["a"].as_deref(), Some("a"));
    }

    #[test]
    fn test_match_by_identity_when_refs_differ() {
        let old = bom(&[("SPDXRef-1", "libA", Some("1"))]);
        let new = bom(&[("libA-1", "libA", Some("1"))]);
        let matches = match_components(&old, &new);
        assert_eq!(matches["SPDXRef-1"].as_deref(), Some("libA-1"));
    }

    #[test]
    fn test_version_bump_pairs_unique_name() {
        let old = bom(&[("libz-1.2.11", "libz", Some("1.2.11"))]);
        let new = bom(&[("libz-1.2.13", "libz", Some("1.2.13"))]);
        let matches = match_components(&old, &new);
        assert_eq!(matches["libz-1.2.11"].as_deref(), Some("libz-1.2.13"));
    }

    #[test]
    fn test_ambiguous_name_left_unpaired() {
        let old = bom(&[("x1", "dup", Some("1"))]);
        let new = bom(&[("y2", "dup", Some("2")), ("y3", "dup", Some("3"))]);
        let matches = match_components(&old, &new);
        assert_eq!(matches["x1"], None);
    }

    #[test]
    fn test_removed_component() {
        let old = bom(&[("a", "libA", None), ("b", "libB", None)]);
        let new = bom(&[("a", "libA", None)]);
        let matches = match_components(&old, &new);
        assert_eq!(matches["b"], None);
    }
}
