//! Node event recording.
//!
//! Every pass reports what it did (or failed to do) as discrete named events
//! attached to the node, the operator's only feedback channel besides logs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};
use ulid::Ulid;

use rolemirror_core::NodeName;

/// Unique identifier for a recorded event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(Ulid);

impl EventId {
    /// Create a new random event ID.
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Get the inner ULID.
    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Severity of a recorded event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Routine, expected activity.
    Normal,
    /// Something an operator should look at.
    Warning,
}

/// Well-known reasons attached to node events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventReason {
    /// A mirrored label was created.
    LabelAdded,
    /// A label was removed to follow its counterpart.
    LabelDeleted,
    /// The sync state annotation was seeded.
    Initialization,
    /// The prefix configuration is invalid.
    OperatorMisconfigured,
    /// Fetching the node failed.
    GetNodeFailed,
    /// The persisted sync state could not be parsed.
    StateUnmarshalFailed,
    /// The sync state could not be serialized.
    StateMarshalFailed,
    /// Persisting labels and annotations failed.
    NodeUpdateFailed,
    /// The independent status write failed.
    NodeStatusUpdateFailed,
}

impl EventReason {
    /// Stable string form, as surfaced to operators.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LabelAdded => "LabelAdded",
            Self::LabelDeleted => "LabelDeleted",
            Self::Initialization => "Initialization",
            Self::OperatorMisconfigured => "OperatorMisconfigured",
            Self::GetNodeFailed => "GetNodeFailed",
            Self::StateUnmarshalFailed => "StateUnmarshalFailed",
            Self::StateMarshalFailed => "StateMarshalFailed",
            Self::NodeUpdateFailed => "NodeUpdateFailed",
            Self::NodeStatusUpdateFailed => "NodeStatusUpdateFailed",
        }
    }
}

impl std::fmt::Display for EventReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A discrete observability event attached to a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeEvent {
    /// Event identifier.
    pub event_id: EventId,
    /// Node the event belongs to.
    pub node: NodeName,
    /// Severity.
    pub kind: EventKind,
    /// Well-known reason.
    pub reason: EventReason,
    /// Human-readable detail.
    pub message: String,
    /// When the event was produced.
    pub timestamp: DateTime<Utc>,
}

impl NodeEvent {
    /// Create a `Normal` event.
    pub fn normal(node: NodeName, reason: EventReason, message: impl Into<String>) -> Self {
        Self::new(node, EventKind::Normal, reason, message)
    }

    /// Create a `Warning` event.
    pub fn warning(node: NodeName, reason: EventReason, message: impl Into<String>) -> Self {
        Self::new(node, EventKind::Warning, reason, message)
    }

    fn new(
        node: NodeName,
        kind: EventKind,
        reason: EventReason,
        message: impl Into<String>,
    ) -> Self {
        Self {
            event_id: EventId::new(),
            node,
            kind,
            reason,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Trait for event sinks.
#[async_trait]
pub trait EventRecorder: Send + Sync {
    /// Record one event. Recording is best-effort and must never fail the
    /// pass that produced the event.
    async fn record(&self, event: NodeEvent);
}

/// Recorder that keeps events in memory for inspection.
#[derive(Default)]
pub struct MemoryRecorder {
    events: RwLock<Vec<NodeEvent>>,
}

impl MemoryRecorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded events, oldest first.
    pub async fn events(&self) -> Vec<NodeEvent> {
        self.events.read().await.clone()
    }

    /// Recorded reasons, oldest first.
    pub async fn reasons(&self) -> Vec<EventReason> {
        self.events.read().await.iter().map(|e| e.reason).collect_vec()
    }

    /// Number of events recorded with `reason`.
    pub async fn count(&self, reason: EventReason) -> usize {
        self.events
            .read()
            .await
            .iter()
            .filter(|e| e.reason == reason)
            .count()
    }
}

#[async_trait]
impl EventRecorder for MemoryRecorder {
    async fn record(&self, event: NodeEvent) {
        self.events.write().await.push(event);
    }
}

/// Recorder that mirrors every event into the process log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingRecorder;

impl TracingRecorder {
    /// Create a tracing recorder.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventRecorder for TracingRecorder {
    async fn record(&self, event: NodeEvent) {
        match event.kind {
            EventKind::Normal => {
                info!(node = %event.node, reason = %event.reason, "{}", event.message);
            }
            EventKind::Warning => {
                warn!(node = %event.node, reason = %event.reason, "{}", event.message);
            }
        }
    }
}
