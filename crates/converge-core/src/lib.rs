//! # converge-core
//!
//! Reconciliation engine for provisioning external cloud resources through
//! an asynchronous create/read/update/delete lifecycle against a remote
//! control-plane API.
//!
//! The engine is deliberately ignorant of transport and attribute layout.
//! Per-resource-type glue implements [`ResourceOps`] over its SDK client;
//! this crate supplies everything above that:
//!
//! - [`Reconciler`] — one public operation per lifecycle phase, each running
//!   to completion on the calling task
//! - [`wait_for_state`] — the bounded poll loop that waits for a resource to
//!   reach a caller-declared target state
//! - [`IdentityResolver`] — swaps work-request tickets for durable resource
//!   identities once the backend finishes an asynchronous operation
//! - [`BackendError`] classification — missing-resource, transient-conflict,
//!   or fatal, preserved substring-for-substring from the control plane's
//!   error texts
//!
//! # Example
//!
//! ```rust,ignore
//! use converge_core::{Reconciler, ReconcileConfig, ResourceHandle};
//!
//! let reconciler = Reconciler::with_config(ReconcileConfig::default());
//! let mut handle = ResourceHandle::new();
//! reconciler.create_resource(&mut handle, &mut instance_ops).await?;
//! println!("created {}", handle.identity().unwrap());
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod handle;
pub mod identity;
pub mod poll;
pub mod progress;
pub mod reconcile;

pub use backend::{Lifecycle, ResourceOps, ResourceShape, StatePlan, WorkRequest, WorkRequestState};
pub use config::ReconcileConfig;
pub use error::{BackendError, EngineError, ErrorClass, Result};
pub use handle::{ResourceHandle, WORK_REQUEST_PREFIX, is_work_request_id};
pub use identity::{IdentityResolver, Resolution};
pub use poll::{PollOutcome, PollPolicy, wait_for_state};
pub use progress::{ProgressCallback, ProgressEvent};
pub use reconcile::Reconciler;
