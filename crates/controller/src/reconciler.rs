//! One reconciliation pass per admitted notification.
//!
//! The driver owns all I/O around the pure synchronizer: fetch the node,
//! decode the sync state, compute the converged snapshot, persist it, and
//! report every change and failure as a recorded node event.

use std::sync::Arc;

use tracing::{debug, info, warn};

use rolemirror_core::{
    Node, NodeName, PrefixConfig, RoleState, STATE_ANNOTATION, SyncEvent, state, synchronize,
};

use crate::client::NodeClient;
use crate::error::{ReconcileError, Result};
use crate::recorder::{EventReason, EventRecorder, NodeEvent};

/// Terminal outcome of a pass that did not error.
///
/// Errors are retryable; these outcomes are not. The distinction is the
/// whole point of the type: the driving loop re-queues on `Err` and stops
/// on `Ok`, whatever the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// Labels and sync state were recomputed and persisted.
    Synced,
    /// The node no longer exists; a normal end, not a failure.
    Gone,
    /// The prefix configuration is invalid; retrying cannot fix it. The
    /// next notification will re-hit the same cheap check.
    Misconfigured,
}

/// Reconciles one node per call against the cluster store.
pub struct NodeReconciler {
    client: Arc<dyn NodeClient>,
    recorder: Arc<dyn EventRecorder>,
    prefixes: PrefixConfig,
}

impl NodeReconciler {
    /// Create a reconciler.
    pub fn new(
        client: Arc<dyn NodeClient>,
        recorder: Arc<dyn EventRecorder>,
        prefixes: PrefixConfig,
    ) -> Self {
        Self {
            client,
            recorder,
            prefixes,
        }
    }

    /// Get the prefix configuration.
    pub fn prefixes(&self) -> &PrefixConfig {
        &self.prefixes
    }

    /// Run one pass for `name`.
    ///
    /// # Errors
    ///
    /// Every error is retryable and carries the failed step; terminal
    /// non-retryable outcomes come back as [`PassOutcome`] variants.
    pub async fn reconcile(&self, name: &NodeName) -> Result<PassOutcome> {
        let node = match self.client.get(name).await {
            Ok(Some(node)) => node,
            Ok(None) => {
                debug!(node = %name, "Node is gone");
                return Ok(PassOutcome::Gone);
            }
            Err(source) => {
                warn!(node = %name, error = %source, "Cannot get the node");
                self.warn(name, EventReason::GetNodeFailed, format!("cannot get the node: {source}"))
                    .await;
                return Err(ReconcileError::Get {
                    name: name.clone(),
                    source,
                });
            }
        };

        if let Err(err) = self.prefixes.validate() {
            warn!(node = %name, error = %err, "Operator is misconfigured");
            self.warn(name, EventReason::OperatorMisconfigured, "check operator logs")
                .await;
            return Ok(PassOutcome::Misconfigured);
        }

        let state = self.decode_state(&node).await;
        let outcome = synchronize(&node.labels, &self.prefixes, &state);

        let encoded = match state::encode(&outcome.state) {
            Ok(encoded) => encoded,
            Err(source) => {
                warn!(node = %name, error = %source, "Cannot encode sync state");
                self.warn(name, EventReason::StateMarshalFailed, source.to_string())
                    .await;
                return Err(ReconcileError::Encode {
                    name: name.clone(),
                    source,
                });
            }
        };

        let mut next = node;
        next.labels = outcome.labels;
        next.annotations.insert(STATE_ANNOTATION.to_string(), encoded);

        let stored = match self.client.update(&next).await {
            Ok(stored) => stored,
            Err(source) => {
                warn!(node = %name, error = %source, "Failed to update the node");
                self.warn(name, EventReason::NodeUpdateFailed, source.to_string())
                    .await;
                return Err(ReconcileError::Update {
                    name: name.clone(),
                    source,
                });
            }
        };

        if let Err(source) = self.client.update_status(&stored).await {
            warn!(node = %name, error = %source, "Failed to update the node status");
            self.warn(name, EventReason::NodeStatusUpdateFailed, source.to_string())
                .await;
            return Err(ReconcileError::StatusUpdate {
                name: name.clone(),
                source,
            });
        }

        for event in &outcome.events {
            let (reason, message) = describe(event);
            info!(node = %name, reason = %reason, "{message}");
            self.recorder
                .record(NodeEvent::normal(name.clone(), reason, message))
                .await;
        }
        debug!(node = %name, changes = outcome.events.len(), "Pass complete");

        Ok(PassOutcome::Synced)
    }

    /// Decode the persisted sync state, falling back to an empty record on
    /// malformed input. Starting over only costs a re-bootstrap; aborting
    /// the pass would leave the labels frozen.
    async fn decode_state(&self, node: &Node) -> RoleState {
        let raw = node
            .annotations
            .get(STATE_ANNOTATION)
            .map(String::as_str)
            .unwrap_or_default();
        match state::decode(raw) {
            Ok(state) => state,
            Err(err) => {
                warn!(node = %node.name, error = %err, "Discarding undecodable sync state");
                self.warn(&node.name, EventReason::StateUnmarshalFailed, err.to_string())
                    .await;
                RoleState::new()
            }
        }
    }

    async fn warn(&self, name: &NodeName, reason: EventReason, message: impl Into<String>) {
        self.recorder
            .record(NodeEvent::warning(name.clone(), reason, message))
            .await;
    }
}

fn describe(event: &SyncEvent) -> (EventReason, String) {
    match event {
        SyncEvent::StateInitialized { roles } => (
            EventReason::Initialization,
            format!("created {STATE_ANNOTATION} annotation covering {roles} role(s)"),
        ),
        SyncEvent::LabelAdded { key, value } => {
            (EventReason::LabelAdded, format!("added label {key}={value}"))
        }
        SyncEvent::LabelDeleted { key, value } => (
            EventReason::LabelDeleted,
            format!("deleted label {key}={value}"),
        ),
    }
}
