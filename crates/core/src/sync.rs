//! Role label synchronization.
//!
//! [`synchronize`] is a pure function from (labels, prefixes, sync state) to
//! (labels, sync state, change events). The driving layer owns all I/O; this
//! module only computes the converged snapshot.
//!
//! The sync state carries the one bit of history the algorithm needs: a role
//! present in the state was seen converged on both sides at some earlier
//! pass. That is what distinguishes "someone just added this label on one
//! side" (mirror it) from "someone just removed it from the other side"
//! (follow the removal).

use crate::config::PrefixConfig;
use crate::node::LabelMap;
use crate::state::RoleState;

/// A change produced by one synchronization pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// The sync state was seeded from pre-existing role labels.
    StateInitialized {
        /// Number of roles seeded.
        roles: usize,
    },
    /// A missing counterpart label was created.
    LabelAdded {
        /// The label key that was added.
        key: String,
        /// The mirrored value.
        value: String,
    },
    /// A label was dropped because its counterpart had been removed.
    LabelDeleted {
        /// The label key that was deleted.
        key: String,
        /// The value it carried.
        value: String,
    },
}

/// Result of one synchronization pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Final label map.
    pub labels: LabelMap,
    /// Final sync state.
    pub state: RoleState,
    /// Changes made, in sorted key order.
    pub events: Vec<SyncEvent>,
}

impl SyncOutcome {
    /// Whether the pass changed neither labels nor state.
    pub fn is_noop(&self, labels: &LabelMap, state: &RoleState) -> bool {
        self.events.is_empty() && self.labels == *labels && self.state == *state
    }
}

/// Compute the converged label set for one node.
///
/// When the incoming state is empty the pass first bootstraps: every role
/// label already on the node, on either side, is forced onto both sides and
/// recorded in the state. Bootstrapping establishes symmetry without
/// emitting add/delete events; it reports a single [`SyncEvent::StateInitialized`]
/// when it seeded anything.
///
/// The main step then walks every role-prefixed label and applies the
/// mirror/follow decision per role, using the state as the tie-breaker.
///
/// Applying `synchronize` to its own output is a no-op for every input.
pub fn synchronize(labels: &LabelMap, prefixes: &PrefixConfig, state: &RoleState) -> SyncOutcome {
    let mut labels = labels.clone();
    let mut state = state.clone();
    let mut events = Vec::new();

    if state.is_empty() {
        bootstrap(&mut labels, prefixes, &mut state);
        if !state.is_empty() {
            events.push(SyncEvent::StateInitialized { roles: state.len() });
        }
    }

    // Snapshot the keys: the loop body inserts mirrored counterparts and
    // deletes abandoned sides while walking.
    let keys: Vec<String> = labels.keys().cloned().collect();
    for key in keys {
        let Some(role) = prefixes.role_of(&key).map(str::to_owned) else {
            continue;
        };
        let Some(value) = labels.get(&key).cloned() else {
            // Removed by an earlier iteration of this pass.
            continue;
        };

        let (own_key, counterpart_key) = if prefixes.is_custom(&key) {
            (prefixes.custom_key(&role), prefixes.official_key(&role))
        } else {
            (prefixes.official_key(&role), prefixes.custom_key(&role))
        };

        if labels.contains_key(&counterpart_key) {
            // Both sides present. Remember the pair; nothing to mirror.
            state.entry(role).or_insert(value);
        } else if state.remove(&role).is_some() {
            // The pair was converged before and the counterpart is gone:
            // someone removed it. Follow the removal.
            labels.remove(&own_key);
            events.push(SyncEvent::LabelDeleted {
                key: own_key,
                value,
            });
        } else {
            // Never seen converged: this side is newly created. Mirror it.
            labels.insert(counterpart_key.clone(), value.clone());
            state.insert(role, value.clone());
            events.push(SyncEvent::LabelAdded {
                key: counterpart_key,
                value,
            });
        }
    }

    SyncOutcome {
        labels,
        state,
        events,
    }
}

/// Seed the empty state from whatever role labels already exist, forcing
/// both sides of every observed role to the observed value.
fn bootstrap(labels: &mut LabelMap, prefixes: &PrefixConfig, state: &mut RoleState) {
    let keys: Vec<String> = labels.keys().cloned().collect();
    for key in keys {
        let Some(role) = prefixes.role_of(&key).map(str::to_owned) else {
            continue;
        };
        let Some(value) = labels.get(&key).cloned() else {
            continue;
        };
        labels.insert(prefixes.custom_key(&role), value.clone());
        labels.insert(prefixes.official_key(&role), value.clone());
        state.insert(role, value);
    }
}
