//! Cluster store collaborator.
//!
//! The store owning node objects sits behind [`NodeClient`]; the controller
//! only ever issues get/update/update-status calls through it. The in-memory
//! implementation backs the test suite with real optimistic-concurrency
//! semantics.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use rolemirror_core::{Node, NodeName, ResourceVersion};

use crate::error::ClientError;

/// Trait for cluster store backends.
#[async_trait]
pub trait NodeClient: Send + Sync {
    /// Fetch a node by name. A missing node is `None`, not an error.
    async fn get(&self, name: &NodeName) -> Result<Option<Node>, ClientError>;

    /// Persist the node's labels and annotations in one write. Returns the
    /// stored object carrying its fresh resource version.
    async fn update(&self, node: &Node) -> Result<Node, ClientError>;

    /// Persist the status subresource as an independent write.
    async fn update_status(&self, node: &Node) -> Result<Node, ClientError>;
}

/// In-memory node store for tests.
///
/// Updates are rejected with a conflict when the caller's resource version
/// is stale, mirroring the optimistic concurrency of a real store. One-shot
/// failure injection covers the driver's error paths.
#[derive(Default)]
pub struct InMemoryNodeClient {
    nodes: RwLock<HashMap<NodeName, Node>>,
    version: AtomicU64,
    update_calls: AtomicUsize,
    status_calls: AtomicUsize,
    fail_get: Mutex<Option<ClientError>>,
    fail_update: Mutex<Option<ClientError>>,
    fail_update_status: Mutex<Option<ClientError>>,
}

impl InMemoryNodeClient {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a node, assigning it a fresh resource version.
    pub async fn insert(&self, mut node: Node) {
        node.resource_version = self.next_version();
        self.nodes.write().await.insert(node.name.clone(), node);
    }

    /// Fetch a clone of a stored node for assertions.
    pub async fn node(&self, name: &NodeName) -> Option<Node> {
        self.nodes.read().await.get(name).cloned()
    }

    /// Remove a node, as the cluster would on node deletion.
    pub async fn remove(&self, name: &NodeName) -> Option<Node> {
        self.nodes.write().await.remove(name)
    }

    /// Number of `update` calls issued so far.
    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::Relaxed)
    }

    /// Number of `update_status` calls issued so far.
    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::Relaxed)
    }

    /// Fail the next `get` call with `err`.
    pub async fn fail_next_get(&self, err: ClientError) {
        *self.fail_get.lock().await = Some(err);
    }

    /// Fail the next `update` call with `err`.
    pub async fn fail_next_update(&self, err: ClientError) {
        *self.fail_update.lock().await = Some(err);
    }

    /// Fail the next `update_status` call with `err`.
    pub async fn fail_next_update_status(&self, err: ClientError) {
        *self.fail_update_status.lock().await = Some(err);
    }

    fn next_version(&self) -> ResourceVersion {
        let v = self.version.fetch_add(1, Ordering::Relaxed) + 1;
        ResourceVersion::new(v.to_string())
    }

    async fn take_failure(slot: &Mutex<Option<ClientError>>) -> Option<ClientError> {
        slot.lock().await.take()
    }
}

#[async_trait]
impl NodeClient for InMemoryNodeClient {
    async fn get(&self, name: &NodeName) -> Result<Option<Node>, ClientError> {
        if let Some(err) = Self::take_failure(&self.fail_get).await {
            return Err(err);
        }
        Ok(self.nodes.read().await.get(name).cloned())
    }

    async fn update(&self, node: &Node) -> Result<Node, ClientError> {
        self.update_calls.fetch_add(1, Ordering::Relaxed);
        if let Some(err) = Self::take_failure(&self.fail_update).await {
            return Err(err);
        }
        self.write(node).await
    }

    async fn update_status(&self, node: &Node) -> Result<Node, ClientError> {
        self.status_calls.fetch_add(1, Ordering::Relaxed);
        if let Some(err) = Self::take_failure(&self.fail_update_status).await {
            return Err(err);
        }
        self.write(node).await
    }
}

impl InMemoryNodeClient {
    async fn write(&self, node: &Node) -> Result<Node, ClientError> {
        let mut nodes = self.nodes.write().await;
        let stored = nodes
            .get(&node.name)
            .ok_or_else(|| ClientError::request(format!("node '{}' not found", node.name)))?;
        if stored.resource_version != node.resource_version {
            return Err(ClientError::conflict(format!(
                "stale resource version {} for node '{}'",
                node.resource_version, node.name
            )));
        }
        let mut next = node.clone();
        next.resource_version = self.next_version();
        nodes.insert(next.name.clone(), next.clone());
        Ok(next)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_update_bumps_resource_version() {
        let client = InMemoryNodeClient::new();
        client.insert(Node::new("n1", "u1")).await;

        let node = client.get(&NodeName::new("n1")).await.unwrap().unwrap();
        let updated = client.update(&node).await.unwrap();
        assert_ne!(updated.resource_version, node.resource_version);
    }

    #[tokio::test]
    async fn test_stale_update_conflicts() {
        let client = InMemoryNodeClient::new();
        client.insert(Node::new("n1", "u1")).await;

        let stale = client.get(&NodeName::new("n1")).await.unwrap().unwrap();
        client.update(&stale).await.unwrap();

        let err = client.update(&stale).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_missing_node_is_none() {
        let client = InMemoryNodeClient::new();
        assert!(client.get(&NodeName::new("ghost")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_injected_failure_fires_once() {
        let client = InMemoryNodeClient::new();
        client.insert(Node::new("n1", "u1")).await;
        client.fail_next_update(ClientError::request("boom")).await;

        let node = client.get(&NodeName::new("n1")).await.unwrap().unwrap();
        assert!(client.update(&node).await.is_err());
        assert!(client.update(&node).await.is_ok());
        assert_eq!(client.update_calls(), 2);
    }
}
