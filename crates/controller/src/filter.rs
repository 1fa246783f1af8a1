//! Admission filtering for watch notifications.
//!
//! The watch layer is at-least-once and unordered: it replays notifications,
//! delivers cache resyncs whose version tokens did not move, and sometimes
//! loses track of a deleted object. Filters decide which notifications are
//! worth a reconciliation pass at all; everything that gets through is
//! handled by recomputing full state, so over-admission is merely wasted
//! work while under-admission would lose convergence.

use moka::sync::Cache;

use rolemirror_core::{Node, NodeUid, ResourceVersion};

/// An update delivered by the watch layer.
#[derive(Debug, Clone)]
pub struct UpdateNotification {
    /// Object state before the update.
    pub old: Node,
    /// Object state after the update.
    pub new: Node,
}

/// A delete delivered by the watch layer.
#[derive(Debug, Clone)]
pub struct DeleteNotification {
    /// Last known object state.
    pub node: Node,
    /// True when the watch layer lost track of the object and the delete is
    /// a "final state unknown" placeholder.
    pub state_unknown: bool,
}

/// Decides whether a watch notification triggers a pass.
pub trait AdmissionFilter: Send + Sync {
    /// Admit an update notification. Defaults to admitting everything.
    fn admit_update(&self, update: &UpdateNotification) -> bool {
        let _ = update;
        true
    }

    /// Admit a delete notification. Defaults to admitting everything.
    fn admit_delete(&self, delete: &DeleteNotification) -> bool {
        let _ = delete;
        true
    }
}

/// Conjunction of filters; a notification must pass every one.
#[derive(Default)]
pub struct FilterChain {
    filters: Vec<Box<dyn AdmissionFilter>>,
}

impl FilterChain {
    /// Create an empty chain (admits everything).
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter to the chain.
    pub fn with(mut self, filter: impl AdmissionFilter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }
}

impl AdmissionFilter for FilterChain {
    fn admit_update(&self, update: &UpdateNotification) -> bool {
        self.filters.iter().all(|f| f.admit_update(update))
    }

    fn admit_delete(&self, delete: &DeleteNotification) -> bool {
        self.filters.iter().all(|f| f.admit_delete(delete))
    }
}

/// Drops update deliveries that cannot represent a real change: cache
/// resyncs whose old and new version tokens are identical, and replays of a
/// token already seen for that object.
///
/// The UID-to-token map is shared by every worker for the lifetime of the
/// process. It is a cache, not a source of truth: evicting an entry only
/// costs one redundant pass, so growth is bounded with an LRU capacity
/// instead of tracking node deletions.
pub struct StaleUpdateFilter {
    seen: Cache<NodeUid, ResourceVersion>,
}

impl StaleUpdateFilter {
    /// Default capacity of the last-seen-token cache.
    pub const DEFAULT_CAPACITY: u64 = 8192;

    /// Create a filter with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Create a filter remembering at most `capacity` objects.
    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            seen: Cache::builder().max_capacity(capacity).build(),
        }
    }
}

impl Default for StaleUpdateFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl AdmissionFilter for StaleUpdateFilter {
    fn admit_update(&self, update: &UpdateNotification) -> bool {
        if update.old.resource_version == update.new.resource_version {
            return false;
        }
        let uid = update.new.uid.clone();
        let already_seen = self
            .seen
            .get(&uid)
            .is_some_and(|seen| seen == update.new.resource_version);
        if already_seen {
            return false;
        }
        self.seen.insert(uid, update.new.resource_version.clone());
        true
    }
}

/// Drops delete notifications whose final state the watch layer lost track
/// of; no reliable diff can be computed for an object that may still exist.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfirmedDeleteFilter;

impl AdmissionFilter for ConfirmedDeleteFilter {
    fn admit_delete(&self, delete: &DeleteNotification) -> bool {
        !delete.state_unknown
    }
}

/// Admits updates only when the spec generation moved, skipping status-only
/// churn. Not part of the default chain; available for callers that want it.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerationChangeFilter;

impl AdmissionFilter for GenerationChangeFilter {
    fn admit_update(&self, update: &UpdateNotification) -> bool {
        update.old.generation != update.new.generation
    }
}

/// The chain the controller runs by default.
pub fn default_chain() -> FilterChain {
    FilterChain::new()
        .with(StaleUpdateFilter::new())
        .with(ConfirmedDeleteFilter)
}
