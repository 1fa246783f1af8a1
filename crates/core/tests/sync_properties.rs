//! Property-based tests for the role synchronizer using proptest.
//!
//! Properties verified:
//! - Idempotence: a pass applied to its own output changes nothing
//! - Symmetry: after any pass, every surviving role label has its mirror
//! - Bootstrap coverage: an empty state seeds every visible role
//! - Unrelated labels pass through untouched

use proptest::prelude::*;
use rolemirror_core::{LabelMap, PrefixConfig, RoleState, synchronize};

/// Which side(s) of a role carry a label in the generated input.
#[derive(Debug, Clone)]
enum Side {
    Custom,
    Official,
    Both,
}

fn side_strategy() -> impl Strategy<Value = Side> {
    prop_oneof![Just(Side::Custom), Just(Side::Official), Just(Side::Both)]
}

/// Arbitrary label map (role labels on random sides plus unrelated keys)
/// and an arbitrary, possibly disagreeing sync state.
fn scenario() -> impl Strategy<Value = (LabelMap, RoleState)> {
    let roles = proptest::collection::btree_map(
        "[a-z]{1,6}",
        ("[a-z0-9]{0,4}", side_strategy()),
        0..6,
    );
    let unrelated = proptest::collection::btree_map(
        "[a-z]{1,8}\\.example\\.com/[a-z]{1,6}",
        "[a-z0-9]{0,4}",
        0..4,
    );
    let state = proptest::collection::btree_map("[a-z]{1,6}", "[a-z0-9]{0,4}", 0..6);

    (roles, unrelated, state).prop_map(|(roles, unrelated, state)| {
        let prefixes = PrefixConfig::default();
        let mut labels = LabelMap::new();
        for (role, (value, side)) in roles {
            match side {
                Side::Custom => {
                    labels.insert(prefixes.custom_key(&role), value);
                }
                Side::Official => {
                    labels.insert(prefixes.official_key(&role), value);
                }
                Side::Both => {
                    labels.insert(prefixes.custom_key(&role), value.clone());
                    labels.insert(prefixes.official_key(&role), value);
                }
            }
        }
        labels.extend(unrelated);
        (labels, state)
    })
}

proptest! {
    /// A second pass over a pass's own output emits no events and leaves
    /// both maps identical.
    #[test]
    fn prop_synchronize_is_idempotent((labels, state) in scenario()) {
        let prefixes = PrefixConfig::default();
        let first = synchronize(&labels, &prefixes, &state);
        let second = synchronize(&first.labels, &prefixes, &first.state);

        prop_assert!(second.events.is_empty());
        prop_assert_eq!(&second.labels, &first.labels);
        prop_assert_eq!(&second.state, &first.state);
    }

    /// Every role-prefixed label surviving a pass has its counterpart
    /// present and its role recorded in the state.
    #[test]
    fn prop_pass_output_is_symmetric((labels, state) in scenario()) {
        let prefixes = PrefixConfig::default();
        let outcome = synchronize(&labels, &prefixes, &state);

        for key in outcome.labels.keys() {
            if let Some(role) = prefixes.role_of(key) {
                prop_assert!(outcome.labels.contains_key(&prefixes.custom_key(role)));
                prop_assert!(outcome.labels.contains_key(&prefixes.official_key(role)));
                prop_assert!(outcome.state.contains_key(role));
            }
        }
    }

    /// With no prior state, one pass mirrors every role visible in the
    /// input onto both sides and records it.
    #[test]
    fn prop_bootstrap_covers_all_roles((labels, _state) in scenario()) {
        let prefixes = PrefixConfig::default();
        let outcome = synchronize(&labels, &prefixes, &RoleState::new());

        for key in labels.keys() {
            if let Some(role) = prefixes.role_of(key) {
                prop_assert!(outcome.labels.contains_key(&prefixes.custom_key(role)));
                prop_assert!(outcome.labels.contains_key(&prefixes.official_key(role)));
                prop_assert!(outcome.state.contains_key(role));
            }
        }
    }

    /// Labels outside both prefixes are never created, deleted, or rewritten.
    #[test]
    fn prop_unrelated_labels_preserved((labels, state) in scenario()) {
        let prefixes = PrefixConfig::default();
        let outcome = synchronize(&labels, &prefixes, &state);

        for (key, value) in &labels {
            if prefixes.role_of(key).is_none() {
                prop_assert_eq!(outcome.labels.get(key), Some(value));
            }
        }
        for key in outcome.labels.keys() {
            if prefixes.role_of(key).is_none() {
                prop_assert!(labels.contains_key(key));
            }
        }
    }
}
