//! Keyed work queue with duplicate collapse and per-key exclusivity.
//!
//! The queue is the controller's sole concurrency guarantee: at most one
//! pass per key is in flight at a time. Duplicate pending keys collapse into
//! one; a key re-added while its pass runs is parked and redelivered once
//! the pass finishes, so no admitted notification is ever lost.

use std::collections::{HashSet, VecDeque};
use std::hash::Hash;

use tokio::sync::{Mutex, Notify};

struct QueueState<K> {
    pending: VecDeque<K>,
    queued: HashSet<K>,
    active: HashSet<K>,
    parked: HashSet<K>,
    closed: bool,
}

impl<K> Default for QueueState<K> {
    fn default() -> Self {
        Self {
            pending: VecDeque::new(),
            queued: HashSet::new(),
            active: HashSet::new(),
            parked: HashSet::new(),
            closed: false,
        }
    }
}

/// Work queue keyed by item identity.
pub struct WorkQueue<K> {
    state: Mutex<QueueState<K>>,
    wake: Notify,
}

impl<K> Default for WorkQueue<K> {
    fn default() -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            wake: Notify::new(),
        }
    }
}

impl<K: Clone + Eq + Hash> WorkQueue<K> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a key.
    ///
    /// A key already pending is collapsed; a key currently being processed
    /// is parked for redelivery after [`WorkQueue::done`]. Adds to a closed
    /// queue are dropped.
    pub async fn add(&self, key: K) {
        let mut state = self.state.lock().await;
        if state.closed || state.queued.contains(&key) {
            return;
        }
        if state.active.contains(&key) {
            state.parked.insert(key);
            return;
        }
        state.queued.insert(key.clone());
        state.pending.push_back(key);
        drop(state);
        self.wake.notify_one();
    }

    /// Take the next key, waiting until one is available.
    ///
    /// Returns `None` once the queue is closed and drained. The key stays
    /// marked active until `done` is called for it.
    pub async fn next(&self) -> Option<K> {
        loop {
            {
                let mut state = self.state.lock().await;
                if let Some(key) = state.pending.pop_front() {
                    state.queued.remove(&key);
                    state.active.insert(key.clone());
                    return Some(key);
                }
                if state.closed {
                    return None;
                }
            }
            self.wake.notified().await;
        }
    }

    /// Mark a key's pass finished, releasing any parked redelivery.
    pub async fn done(&self, key: &K) {
        let mut state = self.state.lock().await;
        state.active.remove(key);
        if state.parked.remove(key) && !state.closed {
            state.queued.insert(key.clone());
            state.pending.push_back(key.clone());
            drop(state);
            self.wake.notify_one();
        }
    }

    /// Close the queue. Pending keys still drain; new adds are dropped.
    pub async fn close(&self) {
        self.state.lock().await.closed = true;
        self.wake.notify_waiters();
    }

    /// Number of keys waiting to be taken.
    pub async fn len(&self) -> usize {
        self.state.lock().await.pending.len()
    }

    /// Whether no keys are waiting.
    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.pending.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_duplicate_pending_keys_collapse() {
        let queue = WorkQueue::new();
        queue.add("a").await;
        queue.add("a").await;
        queue.add("b").await;

        assert_eq!(queue.len().await, 2);
        assert_eq!(queue.next().await, Some("a"));
        assert_eq!(queue.next().await, Some("b"));
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn test_active_key_is_parked_and_redelivered() {
        let queue = WorkQueue::new();
        queue.add("a").await;

        let key = queue.next().await.unwrap();
        // Re-added mid-pass: not pending yet.
        queue.add("a").await;
        assert!(queue.is_empty().await);

        queue.done(&key).await;
        assert_eq!(queue.next().await, Some("a"));
    }

    #[tokio::test]
    async fn test_close_drains_then_ends() {
        let queue = WorkQueue::new();
        queue.add("a").await;
        queue.close().await;
        queue.add("b").await;

        assert_eq!(queue.next().await, Some("a"));
        assert_eq!(queue.next().await, None);
    }

    #[tokio::test]
    async fn test_waiting_consumer_wakes_on_add() {
        let queue = Arc::new(WorkQueue::new());
        let waiter = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.next().await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        queue.add("a").await;

        let got = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got, Some("a"));
    }

    #[tokio::test]
    async fn test_waiting_consumers_wake_on_close() {
        let queue: Arc<WorkQueue<&str>> = Arc::new(WorkQueue::new());
        let waiter = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.next().await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        queue.close().await;

        let got = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got, None);
    }
}
