//! Codec for the persisted sync state.
//!
//! The sync state is a flat role-to-value mapping serialized as JSON into a
//! single node annotation. It is the only memory the synchronizer has across
//! passes, so decode failures are recoverable by design: a caller that cannot
//! read the record starts over from an empty one.

use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// Annotation key holding the serialized sync state.
pub const STATE_ANNOTATION: &str = "rolemirror.io/state";

/// Mapping from role to the value both label sides last agreed on.
pub type RoleState = BTreeMap<String, String>;

/// Decode the sync state from its annotation form.
///
/// An empty or absent annotation is an empty state, not an error.
///
/// # Errors
///
/// Returns [`Error::StateDecodeFailed`] on malformed input. Callers must
/// treat this as recoverable and continue with an empty state.
pub fn decode(raw: &str) -> Result<RoleState> {
    if raw.trim().is_empty() {
        return Ok(RoleState::new());
    }
    serde_json::from_str(raw).map_err(|e| Error::state_decode_failed(e.to_string()))
}

/// Encode the sync state for persistence.
///
/// Roles serialize in sorted order, so equal states always encode to the
/// same string.
///
/// # Errors
///
/// Returns [`Error::StateEncodeFailed`] when serialization fails. This is
/// fatal for the pass; nothing may be written.
pub fn encode(state: &RoleState) -> Result<String> {
    serde_json::to_string(state).map_err(|e| Error::state_encode_failed(e.to_string()))
}
