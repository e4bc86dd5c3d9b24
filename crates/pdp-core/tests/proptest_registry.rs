// crates/pdp-core/tests/proptest_registry.rs
// ============================================================================
// Module: Registry Property-Based Tests
// Description: Randomized merges over arbitrary identifier sets.
// Purpose: Ensure merges never lose entries and never admit conflicts.
// ============================================================================

//! Registry property-based tests.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::collections::BTreeSet;
use std::sync::Arc;

use pdp_core::CombinableKind;
use pdp_core::CombiningAlg;
use pdp_core::Registry;
use pdp_core::RegistryBuilder;
use pdp_core::merge_registry;
use proptest::prelude::*;

fn builtins(ids: &BTreeSet<String>) -> Arc<Registry<CombiningAlg>> {
    let mut builder = RegistryBuilder::new();
    for id in ids {
        builder.register(Arc::new(CombiningAlg::new(id.as_str(), CombinableKind::Rule))).unwrap();
    }
    Arc::new(builder.build())
}

proptest! {
    #[test]
    fn merge_is_union_of_identifiers(
        standard in proptest::collection::btree_set("[a-z]{1,6}", 0..8),
        extra in proptest::collection::vec("[a-z]{1,6}", 0..8),
        use_builtins in any::<bool>(),
    ) {
        let registry = builtins(&standard);
        let extensions: Vec<Arc<CombiningAlg>> = extra
            .iter()
            .map(|id| Arc::new(CombiningAlg::new(id.as_str(), CombinableKind::Rule)))
            .collect();
        let merged = merge_registry(use_builtins, &registry, &extensions).unwrap();

        let mut expected: BTreeSet<String> = extra.iter().cloned().collect();
        if use_builtins {
            expected.extend(standard.iter().cloned());
        }
        let actual: BTreeSet<String> = merged.registry.ids().map(str::to_string).collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn conflicting_instance_is_always_rejected(
        standard in proptest::collection::btree_set("[a-z]{1,6}", 1..8),
        pick in any::<prop::sample::Index>(),
    ) {
        let registry = builtins(&standard);
        let ids: Vec<&String> = standard.iter().collect();
        let id = ids[pick.index(ids.len())];
        let conflicting = Arc::new(CombiningAlg::new(id.as_str(), CombinableKind::Policy));
        prop_assert!(merge_registry(true, &registry, &[conflicting]).is_err());
    }
}
