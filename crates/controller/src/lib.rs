//! Controller for role label mirroring on cluster nodes.
//!
//! This crate drives the pure synchronizer from `rolemirror-core` against a
//! cluster store:
//!
//! - **Admission filters**: drop replayed, no-op, and unconfirmed watch
//!   notifications before they cost a pass
//! - **Work queue**: collapse duplicate triggers and guarantee one in-flight
//!   pass per node
//! - **Reconciler**: fetch, synchronize, persist, record events
//! - **Controller**: wire it all to a notification stream with a bounded
//!   worker pool
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use rolemirror_controller::{
//!     ControllerConfig, NodeController, NodeReconciler, TracingRecorder, WatchNotification,
//! };
//! use rolemirror_core::PrefixConfig;
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = Arc::new(build_store_client());
//!     let reconciler = Arc::new(NodeReconciler::new(
//!         client,
//!         Arc::new(TracingRecorder::new()),
//!         PrefixConfig::from_env(),
//!     ));
//!     let controller = Arc::new(NodeController::new(reconciler, ControllerConfig::default()));
//!
//!     let (tx, rx) = mpsc::channel::<WatchNotification>(64);
//!     // Feed tx from the store's watch stream, then:
//!     controller.run(rx).await;
//! }
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod client;
pub mod controller;
pub mod error;
pub mod filter;
pub mod queue;
pub mod reconciler;
pub mod recorder;

// Re-export main types
pub use client::{InMemoryNodeClient, NodeClient};
pub use controller::{ControllerConfig, NodeController, WatchNotification};
pub use error::{ClientError, ReconcileError, Result};
pub use filter::{
    AdmissionFilter, ConfirmedDeleteFilter, DeleteNotification, FilterChain,
    GenerationChangeFilter, StaleUpdateFilter, UpdateNotification, default_chain,
};
pub use queue::WorkQueue;
pub use reconciler::{NodeReconciler, PassOutcome};
pub use recorder::{
    EventId, EventKind, EventReason, EventRecorder, MemoryRecorder, NodeEvent, TracingRecorder,
};
