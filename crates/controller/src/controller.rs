//! Controller loop: filtered notifications in, bounded reconcile workers out.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tracing::{debug, error, warn};

use rolemirror_core::NodeName;

use crate::error::ReconcileError;
use crate::filter::{
    self, AdmissionFilter, DeleteNotification, FilterChain, UpdateNotification,
};
use crate::queue::WorkQueue;
use crate::reconciler::NodeReconciler;

/// A notification from the node watch stream.
#[derive(Debug, Clone)]
pub enum WatchNotification {
    /// An object changed.
    Updated(UpdateNotification),
    /// An object was deleted.
    Deleted(DeleteNotification),
}

impl WatchNotification {
    /// Name of the node the notification is about.
    pub fn node_name(&self) -> &NodeName {
        match self {
            Self::Updated(update) => &update.new.name,
            Self::Deleted(delete) => &delete.node.name,
        }
    }
}

/// Tuning for the controller loop.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Number of concurrent reconcile workers.
    pub workers: usize,
    /// Whether retryable pass failures are re-queued.
    pub auto_retry: bool,
    /// Retry attempts before a node is dropped until its next notification.
    pub max_retries: u32,
    /// Base delay for exponential retry backoff.
    pub base_backoff: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            workers: 10,
            auto_retry: true,
            max_retries: 5,
            base_backoff: Duration::from_millis(50),
        }
    }
}

/// Drives reconciliation passes from a stream of watch notifications.
///
/// Notifications pass the admission chain, collapse in the keyed queue, and
/// are handed to a fixed pool of workers. The queue guarantees at most one
/// in-flight pass per node; passes for different nodes run in parallel.
pub struct NodeController {
    reconciler: Arc<NodeReconciler>,
    filters: FilterChain,
    queue: Arc<WorkQueue<NodeName>>,
    retries: Mutex<HashMap<NodeName, u32>>,
    config: ControllerConfig,
}

impl NodeController {
    /// Create a controller with the default admission chain.
    pub fn new(reconciler: Arc<NodeReconciler>, config: ControllerConfig) -> Self {
        Self {
            reconciler,
            filters: filter::default_chain(),
            queue: Arc::new(WorkQueue::new()),
            retries: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Replace the admission chain.
    pub fn with_filters(mut self, filters: FilterChain) -> Self {
        self.filters = filters;
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Run until the notification channel closes and the queue drains.
    pub async fn run(self: Arc<Self>, mut notifications: mpsc::Receiver<WatchNotification>) {
        let mut workers = Vec::new();
        for worker_id in 0..self.config.workers.max(1) {
            let controller = Arc::clone(&self);
            workers.push(tokio::spawn(async move {
                controller.worker(worker_id).await;
            }));
        }

        while let Some(notification) = notifications.recv().await {
            self.dispatch(notification).await;
        }

        self.queue.close().await;
        for worker in workers {
            let _ = worker.await;
        }
    }

    /// Apply admission filtering and enqueue the node.
    pub async fn dispatch(&self, notification: WatchNotification) {
        let admitted = match &notification {
            WatchNotification::Updated(update) => self.filters.admit_update(update),
            WatchNotification::Deleted(delete) => self.filters.admit_delete(delete),
        };
        let name = notification.node_name();
        if !admitted {
            debug!(node = %name, "Notification dropped by admission filters");
            return;
        }
        self.queue.add(name.clone()).await;
    }

    async fn worker(&self, worker_id: usize) {
        while let Some(name) = self.queue.next().await {
            match self.reconciler.reconcile(&name).await {
                Ok(outcome) => {
                    self.retries.lock().await.remove(&name);
                    debug!(worker = worker_id, node = %name, outcome = ?outcome, "Pass finished");
                }
                Err(err) if self.config.auto_retry && err.is_retryable() => {
                    self.schedule_retry(name.clone(), &err).await;
                }
                Err(err) => {
                    error!(worker = worker_id, node = %name, error = %err, "Pass failed");
                }
            }
            self.queue.done(&name).await;
        }
    }

    async fn schedule_retry(&self, name: NodeName, err: &ReconcileError) {
        let attempt = {
            let mut retries = self.retries.lock().await;
            let entry = retries.entry(name.clone()).or_insert(0);
            *entry += 1;
            *entry
        };

        if attempt > self.config.max_retries {
            self.retries.lock().await.remove(&name);
            error!(
                node = %name,
                attempts = attempt,
                error = %err,
                "Giving up until the next notification"
            );
            return;
        }

        let exponent = attempt.saturating_sub(1).min(10);
        let delay = self.config.base_backoff.saturating_mul(1 << exponent);
        warn!(node = %name, attempt, delay = ?delay, error = %err, "Pass failed, re-queueing");

        let queue = Arc::clone(&self.queue);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            queue.add(name).await;
        });
    }
}
