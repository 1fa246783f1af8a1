//! Role label mirroring for cluster nodes.
//!
//! Keeps two role label namespaces on a node in sync: an official prefix
//! (`node-role.kubernetes.io/`) and a configurable custom prefix. A role
//! label added on either side is mirrored to the other; a role label removed
//! from either side takes its mirror with it.
//!
//! # Key Concepts
//!
//! ## Sync state
//!
//! The only memory across passes is a role-to-value mapping persisted in a
//! single node annotation ([`STATE_ANNOTATION`]). A role recorded there was
//! observed converged on both sides; that record is what tells a fresh
//! one-sided label ("mirror me") apart from a half-deleted pair ("finish the
//! removal").
//!
//! ## Synchronizer
//!
//! [`synchronize`] is pure and idempotent: it recomputes the full converged
//! snapshot from current labels plus the sync state on every pass, so
//! duplicated or reordered triggers cannot corrupt the outcome.
//!
//! This crate holds no I/O; the controller crate drives it against a store.

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod config;
pub mod error;
pub mod node;
pub mod state;
pub mod sync;

// Re-export main types
pub use config::{
    CUSTOM_PREFIX_ENV, DEFAULT_CUSTOM_ROLE_PREFIX, OFFICIAL_ROLE_PREFIX, PrefixConfig,
};
pub use error::{Error, Result};
pub use node::{LabelMap, Node, NodeName, NodeUid, ResourceVersion};
pub use state::{RoleState, STATE_ANNOTATION, decode, encode};
pub use sync::{SyncEvent, SyncOutcome, synchronize};
