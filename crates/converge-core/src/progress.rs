//! Progress reporting for long-running waits
//!
//! The poll loop can run for many minutes. Callers that front a UI attach a
//! callback here to drive spinners or log lines; headless callers pass
//! nothing.

use std::time::Duration;

/// Events emitted while waiting for a resource to reach a target state.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// The wait has begun for the given identity (possibly a ticket id).
    Started { identity: String },
    /// One poll iteration observed the given state.
    Polling {
        identity: String,
        state: String,
        elapsed: Duration,
    },
    /// The resource reached a target state.
    Reached { identity: String, state: String },
    /// The backend reports the resource gone.
    Absent { identity: String },
}

/// Callback type for progress updates.
///
/// A CLI uses this to update spinners; automation typically does not need it.
pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;

/// Invoke the callback if one is attached.
pub(crate) fn emit(callback: Option<&ProgressCallback>, event: ProgressEvent) {
    if let Some(cb) = callback {
        cb(event);
    }
}
