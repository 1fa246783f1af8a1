//! End-to-end label mirroring through the controller loop.
//!
//! Drives a node through its lifecycle with watch notifications only:
//! bootstrap from pre-existing labels, mirror a new label, follow a
//! removal. The in-memory store plays the cluster.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use rolemirror_controller::{
    ControllerConfig, EventReason, InMemoryNodeClient, MemoryRecorder, NodeController,
    NodeReconciler, UpdateNotification, WatchNotification,
};
use rolemirror_core::{
    Node, NodeName, PrefixConfig, ResourceVersion, STATE_ANNOTATION, decode,
};

const CUSTOM_WORKER: &str = "node-role.cluster.local/worker";
const OFFICIAL_WORKER: &str = "node-role.kubernetes.io/worker";
const CUSTOM_GPU: &str = "node-role.cluster.local/gpu";
const OFFICIAL_GPU: &str = "node-role.kubernetes.io/gpu";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}

/// Poll until `check` passes or the deadline expires.
async fn wait_for<F, Fut>(what: &str, mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        if check().await {
            return;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {what}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

fn notification(stored: &Node, old_rv: &str) -> WatchNotification {
    let mut old = stored.clone();
    old.resource_version = ResourceVersion::new(old_rv);
    WatchNotification::Updated(UpdateNotification {
        old,
        new: stored.clone(),
    })
}

#[tokio::test]
async fn test_node_lifecycle_converges_through_notifications() {
    init_tracing();

    let client = Arc::new(InMemoryNodeClient::new());
    let recorder = Arc::new(MemoryRecorder::new());
    let reconciler = Arc::new(NodeReconciler::new(
        client.clone(),
        recorder.clone(),
        PrefixConfig::default(),
    ));
    let controller = Arc::new(NodeController::new(
        reconciler,
        ControllerConfig {
            workers: 2,
            ..Default::default()
        },
    ));

    let name = NodeName::new("worker-1");
    client
        .insert(Node::new("worker-1", "uid-1").with_label(CUSTOM_WORKER, "true"))
        .await;

    let (tx, rx) = mpsc::channel(16);
    let run = tokio::spawn(Arc::clone(&controller).run(rx));

    // Bootstrap: one notification mirrors the pre-existing custom label.
    // The Initialization event is recorded last, so it doubles as the
    // pass-complete barrier.
    let stored = client.node(&name).await.unwrap();
    tx.send(notification(&stored, "0")).await.unwrap();
    wait_for("bootstrap to mirror the worker role", || {
        let recorder = recorder.clone();
        async move { recorder.count(EventReason::Initialization).await == 1 }
    })
    .await;

    let node = client.node(&name).await.unwrap();
    assert!(node.labels.contains_key(OFFICIAL_WORKER));
    let state = decode(node.annotations.get(STATE_ANNOTATION).unwrap()).unwrap();
    assert_eq!(state.get("worker").map(String::as_str), Some("true"));

    // Someone adds an official gpu label out of band.
    let mut edited = client.node(&name).await.unwrap();
    edited.labels.insert(OFFICIAL_GPU.to_string(), "a100".to_string());
    client.insert(edited).await;

    let stored = client.node(&name).await.unwrap();
    tx.send(notification(&stored, "1")).await.unwrap();
    wait_for("the gpu role to gain its custom mirror", || {
        let recorder = recorder.clone();
        async move { recorder.count(EventReason::LabelAdded).await == 1 }
    })
    .await;
    assert_eq!(
        client
            .node(&name)
            .await
            .unwrap()
            .labels
            .get(CUSTOM_GPU)
            .map(String::as_str),
        Some("a100")
    );

    // Someone removes the official worker label: the custom side follows.
    let mut edited = client.node(&name).await.unwrap();
    edited.labels.remove(OFFICIAL_WORKER);
    client.insert(edited).await;

    let stored = client.node(&name).await.unwrap();
    tx.send(notification(&stored, "2")).await.unwrap();
    wait_for("the worker role to disappear from both sides", || {
        let recorder = recorder.clone();
        async move { recorder.count(EventReason::LabelDeleted).await == 1 }
    })
    .await;
    let node = client.node(&name).await.unwrap();
    assert!(!node.labels.contains_key(CUSTOM_WORKER));
    assert!(!node.labels.contains_key(OFFICIAL_WORKER));

    drop(tx);
    run.await.unwrap();

    // Final state: only the gpu role survives, fully mirrored and recorded.
    let node = client.node(&name).await.unwrap();
    assert_eq!(node.labels.get(CUSTOM_GPU).map(String::as_str), Some("a100"));
    assert_eq!(node.labels.get(OFFICIAL_GPU).map(String::as_str), Some("a100"));
    let state = decode(node.annotations.get(STATE_ANNOTATION).unwrap()).unwrap();
    assert_eq!(state.get("gpu").map(String::as_str), Some("a100"));
    assert!(!state.contains_key("worker"));

    assert_eq!(recorder.count(EventReason::Initialization).await, 1);
    assert_eq!(recorder.count(EventReason::LabelAdded).await, 1);
    assert_eq!(recorder.count(EventReason::LabelDeleted).await, 1);
}
