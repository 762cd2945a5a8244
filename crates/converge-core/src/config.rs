//! Engine timing configuration
//!
//! Every delay and budget the engine uses lives here and is threaded into
//! [`Reconciler`](crate::reconcile::Reconciler) explicitly. The struct is
//! serde-compatible so the surrounding system can persist it alongside its
//! connection profiles.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing configuration for the reconciliation driver and poll engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Delay in seconds before the first poll of a freshly created resource.
    #[serde(default = "default_create_initial_delay_secs")]
    pub create_initial_delay_secs: u64,

    /// Backoff in seconds between create attempts after a transient conflict.
    #[serde(default = "default_conflict_backoff_secs")]
    pub conflict_backoff_secs: u64,

    /// Maximum number of create retries after transient conflicts.
    #[serde(default = "default_max_conflict_retries")]
    pub max_conflict_retries: u32,

    /// Seconds between poll iterations.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Overall wait budget in seconds for a stateful create or delete,
    /// unless the resource's state plan overrides it.
    #[serde(default = "default_operation_timeout_secs")]
    pub operation_timeout_secs: u64,

    /// The backend's terminal hard-failure state label.
    #[serde(default = "default_failed_state")]
    pub failed_state: String,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            create_initial_delay_secs: 15,
            conflict_backoff_secs: 10,
            max_conflict_retries: 3,
            poll_interval_secs: 10,
            operation_timeout_secs: 1200,
            failed_state: "FAILED".to_string(),
        }
    }
}

impl ReconcileConfig {
    pub fn create_initial_delay(&self) -> Duration {
        Duration::from_secs(self.create_initial_delay_secs)
    }

    pub fn conflict_backoff(&self) -> Duration {
        Duration::from_secs(self.conflict_backoff_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }
}

// Default value functions for serde
fn default_create_initial_delay_secs() -> u64 {
    15
}

fn default_conflict_backoff_secs() -> u64 {
    10
}

fn default_max_conflict_retries() -> u32 {
    3
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_operation_timeout_secs() -> u64 {
    1200
}

fn default_failed_state() -> String {
    "FAILED".to_string()
}
