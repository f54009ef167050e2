//! Property-based tests for the operation value types.
//!
//! These laws are what the transformer leans on: diff composition must
//! equal sequential application, exclusion must remove exactly the named
//! keys, and builder normalization must never change an operation's span.

use proptest::prelude::*;
use std::collections::BTreeSet;
use weft_docop::{Attributes, AttributesUpdate, DocOpBuilder};

const KEYS: &[&str] = &["style", "size", "weight", "color"];
const VALUES: &[&str] = &["1", "2", "3"];

fn attributes_strategy() -> impl Strategy<Value = Attributes> {
    prop::collection::btree_map(
        prop::sample::select(KEYS).prop_map(str::to_string),
        prop::sample::select(VALUES).prop_map(str::to_string),
        0..4,
    )
    .prop_map(Attributes::from_pairs)
}

fn update_strategy() -> impl Strategy<Value = AttributesUpdate> {
    prop::collection::btree_map(
        prop::sample::select(KEYS).prop_map(str::to_string),
        (
            prop::option::of(prop::sample::select(VALUES).prop_map(str::to_string)),
            prop::option::of(prop::sample::select(VALUES).prop_map(str::to_string)),
        ),
        0..4,
    )
    .prop_map(|changes| {
        AttributesUpdate::from_triples(changes.into_iter().map(|(k, (old, new))| (k, old, new)))
    })
}

// ============================================================================
// AttributesUpdate Laws
// ============================================================================

proptest! {
    #[test]
    fn composition_equals_sequential_application(
        attrs in attributes_strategy(),
        first in update_strategy(),
        second in update_strategy()
    ) {
        let sequential = attrs.updated_with(&first).updated_with(&second);
        let composed = attrs.updated_with(&first.compose_with(&second));
        prop_assert_eq!(sequential, composed);
    }

    #[test]
    fn exclusion_removes_exactly_the_named_keys(
        update in update_strategy(),
        excluded in prop::collection::btree_set(
            prop::sample::select(KEYS).prop_map(str::to_string), 0..3)
    ) {
        let remaining = update.exclude(&excluded);
        let remaining_keys: BTreeSet<String> = remaining.keys();
        for key in &excluded {
            prop_assert!(!remaining_keys.contains(key));
        }
        let expected: BTreeSet<String> =
            update.keys().difference(&excluded).cloned().collect();
        prop_assert_eq!(remaining_keys, expected);
    }

    #[test]
    fn update_application_is_key_local(
        attrs in attributes_strategy(),
        update in update_strategy()
    ) {
        let updated = attrs.updated_with(&update);
        let touched = update.keys();
        for (key, value) in attrs.iter() {
            if !touched.contains(key) {
                prop_assert_eq!(updated.get(key), Some(value));
            }
        }
    }
}

// ============================================================================
// Builder Normalization Laws
// ============================================================================

proptest! {
    #[test]
    fn normalized_retains_preserve_span(runs in prop::collection::vec(0usize..5, 1..8)) {
        let mut builder = DocOpBuilder::new();
        for run in &runs {
            builder.retain(*run);
        }
        let op = builder.finish();
        prop_assert_eq!(op.span(), runs.iter().sum::<usize>());
        // Fully coalesced: at most a single retain component remains.
        prop_assert!(op.len() <= 1);
    }
}
