//! Property-based tests for the registry and the extractors.
//!
//! Random component sets must always yield unique references and SPDX ids
//! and leave no edge pending after resolution. Random bytes must never make
//! an extractor panic.

use binsbom::extract::{probe_magic, Artifact, BinaryExtractor, ExtractorDispatcher};
use binsbom::model::{Component, Registry};
use proptest::prelude::*;
use std::collections::HashSet;

fn component_strategy() -> impl Strategy<Value = (String, Option<String>)> {
    (
        "[a-zA-Z][a-zA-Z0-9_.@/ -]{0,15}",
        proptest::option::of("[0-9]{1,2}(\\.[0-9]{1,2}){0,2}"),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn refs_and_spdx_ids_are_unique(components in proptest::collection::vec(component_strategy(), 1..40)) {
        let mut registry = Registry::new();
        let mut refs = Vec::new();
        for (name, version) in &components {
            let mut candidate = Component::new(name.clone());
            candidate.version = version.clone();
            refs.push(registry.register_component(candidate).unwrap());
        }

        prop_assert_eq!(registry.len(), components.len());
        let unique: HashSet<_> = refs.iter().collect();
        prop_assert_eq!(unique.len(), refs.len());
        let spdx: HashSet<String> = refs.iter().map(binsbom::BomRef::spdx_id).collect();
        prop_assert_eq!(spdx.len(), refs.len());
        prop_assert!(registry.validate().is_empty());
    }

    #[test]
    fn resolution_leaves_nothing_pending(
        names in proptest::collection::vec("[a-z]{1,8}(\\.so(\\.[0-9])?)?", 1..20),
        deps in proptest::collection::vec((0usize..20, "[a-z]{1,8}(\\.so\\.[0-9])?"), 0..40),
    ) {
        let mut registry = Registry::new();
        let refs: Vec<_> = names
            .iter()
            .map(|n| registry.register_component(Component::new(n.clone())).unwrap())
            .collect();
        for (from, target) in &deps {
            let from = &refs[from % refs.len()];
            registry.add_dependency_by_name(from, target).unwrap();
        }

        let outcome = registry.resolve_edges();
        // Two pending names can resolve to the same edge
        prop_assert!(outcome.resolved + outcome.external >= registry.edge_count());
        prop_assert!(registry.edges().all(|e| !e.to.is_pending()));
        prop_assert!(registry.validate().is_empty());
    }

    #[test]
    fn probing_random_bytes_never_panics(data in proptest::collection::vec(any::<u8>(), 0..512)) {
        let _ = probe_magic(&data);
        let dispatcher = ExtractorDispatcher::standard();
        if let Some(extractor) = dispatcher.select(&data) {
            let artifact = Artifact::from_bytes("fuzz.bin", data.clone());
            let _ = extractor.extract(&artifact);
        }
    }

    #[test]
    fn magic_prefixed_garbage_never_panics(
        magic in prop_oneof![
            Just(b"\x7fELF".to_vec()),
            Just(vec![0xcf, 0xfa, 0xed, 0xfe]),
            Just(vec![0xca, 0xfe, 0xba, 0xbe, 0, 0, 0, 2]),
            Just(b"!<arch>\n".to_vec()),
            Just(b"MZ".to_vec()),
        ],
        tail in proptest::collection::vec(any::<u8>(), 0..1024),
    ) {
        let mut data = magic;
        data.extend(tail);
        let dispatcher = ExtractorDispatcher::standard();
        if let Some(extractor) = dispatcher.select(&data) {
            let artifact = Artifact::from_bytes("fuzz.bin", data.clone());
            let _ = extractor.extract(&artifact);
        }
    }
}
