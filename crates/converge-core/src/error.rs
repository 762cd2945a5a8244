//! Unified error handling for the reconciliation engine
//!
//! Backend capabilities report raw control-plane failures as [`BackendError`].
//! The engine classifies those into missing-resource, transient-conflict, and
//! fatal outcomes, and wraps everything a caller can observe in
//! [`EngineError`].
//!
//! Classification is textual and heuristic. The control plane does not return
//! structured error codes for these conditions, so the exact substrings below
//! are load-bearing and must not be reworded.
//!
//! # Example
//!
//! ```rust
//! use converge_core::{BackendError, ErrorClass};
//!
//! let err = BackendError::api("instance i-123 does not exist");
//! assert_eq!(err.classify(), ErrorClass::MissingResource);
//! assert!(err.is_missing_resource());
//! ```

use std::time::Duration;
use thiserror::Error;

/// Substrings marking a missing/already-gone resource.
const MISSING_MARKERS: [&str; 3] = ["does not exist", " not present in ", "resource not found"];

/// The load balancer family reports missing children with a split phrase,
/// e.g. "Load balancer lb-7 has no backend set bes-1".
const MISSING_LB_MARKERS: (&str, &str) = ("Load balancer", " has no ");

/// Conflict marker (matched case-insensitively) for create races the backend
/// asks us to retry.
const RETRY_LATER_MARKER: &str = "try again later";

/// Three-way classification of a raw backend error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The resource no longer exists (or never did) on the backend.
    MissingResource,
    /// A create-time race the backend asks the caller to retry.
    TransientConflict,
    /// Everything else.
    Fatal,
}

/// Raw failure reported by a backend capability.
#[derive(Error, Debug, Clone)]
pub enum BackendError {
    /// The control plane rejected or failed the call.
    #[error("{message}")]
    Api { message: String },

    /// The capability does not implement an optional surface.
    #[error("operation not supported: {0}")]
    Unsupported(String),
}

impl BackendError {
    /// Build an API error from the control plane's message text.
    pub fn api(message: impl Into<String>) -> Self {
        BackendError::Api {
            message: message.into(),
        }
    }

    /// Classify this error for lifecycle handling.
    ///
    /// Missing-resource wins over transient-conflict; a backend will not
    /// report both conditions in one message.
    #[must_use]
    pub fn classify(&self) -> ErrorClass {
        let text = self.to_string();
        if MISSING_MARKERS.iter().any(|m| text.contains(m))
            || (text.contains(MISSING_LB_MARKERS.0) && text.contains(MISSING_LB_MARKERS.1))
        {
            ErrorClass::MissingResource
        } else if text.to_lowercase().contains(RETRY_LATER_MARKER) {
            ErrorClass::TransientConflict
        } else {
            ErrorClass::Fatal
        }
    }

    /// Broad missing-resource check used by read and by the poll loop.
    #[must_use]
    pub fn is_missing_resource(&self) -> bool {
        self.classify() == ErrorClass::MissingResource
    }

    /// Narrow legacy variant matching only "does not exist".
    ///
    /// The delete direct-call path has always used this tighter predicate.
    /// The divergence from [`is_missing_resource`](Self::is_missing_resource)
    /// is deliberate and kept; see DESIGN.md before widening it.
    #[must_use]
    pub fn is_missing_resource_strict(&self) -> bool {
        self.to_string().contains(MISSING_MARKERS[0])
    }

    /// Create-time conflict the backend asks us to retry later.
    #[must_use]
    pub fn is_retryable_conflict(&self) -> bool {
        self.classify() == ErrorClass::TransientConflict
    }
}

/// Caller-visible error type for reconciliation operations.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Fatal error from the backend.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// The poll loop ran out its wait budget without a terminal outcome.
    #[error("timed out after {0:?} waiting for resource to reach a target state")]
    PollTimeout(Duration),

    /// The resource reached the backend's terminal failure state.
    #[error("resource entered failed state {state:?}")]
    FailedState { state: String },

    /// The backend reported a state in neither the pending nor target set.
    #[error("resource entered unexpected state {state:?}")]
    UnexpectedState { state: String },

    /// An asynchronous work request finished unsuccessfully.
    #[error("work request {id} failed: {message}")]
    WorkRequestFailed { id: String, message: String },

    /// A work request succeeded but exposed no identity-bearing resource.
    #[error("work request {id} succeeded but yielded no resource identity")]
    IdentityUnresolved { id: String },

    /// The backend accepted a create but handed back no identity at all.
    #[error("backend returned no identity for the created resource")]
    IdentityMissing,

    /// The resource disappeared while we were waiting for it to become ready.
    #[error("resource no longer exists on the backend")]
    ResourceVanished,
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    /// Returns true if the underlying failure means the resource is gone.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            EngineError::Backend(e) => e.is_missing_resource(),
            EngineError::ResourceVanished => true,
            _ => false,
        }
    }

    /// Returns true if this is the poll engine's timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, EngineError::PollTimeout(_))
    }

    /// Returns true if the operation might succeed if reissued.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::Backend(e) => e.is_retryable_conflict(),
            // A timed-out resource may still converge on a later attempt.
            EngineError::PollTimeout(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_does_not_exist() {
        let err = BackendError::api("instance ocid1.instance.oc1..xyz does not exist");
        assert_eq!(err.classify(), ErrorClass::MissingResource);
    }

    #[test]
    fn classify_not_present_in() {
        let err = BackendError::api("subnet sn-4 not present in vcn vcn-1");
        // Marker requires surrounding spaces.
        assert_eq!(err.classify(), ErrorClass::MissingResource);
    }

    #[test]
    fn classify_resource_not_found() {
        let err = BackendError::api("resource not found");
        assert_eq!(err.classify(), ErrorClass::MissingResource);
    }

    #[test]
    fn classify_load_balancer_has_no() {
        let err = BackendError::api("Load balancer lb-7 has no backend set bes-1");
        assert_eq!(err.classify(), ErrorClass::MissingResource);
    }

    #[test]
    fn load_balancer_marker_needs_both_halves() {
        let err = BackendError::api("Load balancer lb-7 is busy");
        assert_eq!(err.classify(), ErrorClass::Fatal);

        let err = BackendError::api("cluster c-1 has no spare capacity");
        assert_eq!(err.classify(), ErrorClass::Fatal);
    }

    #[test]
    fn classify_try_again_later_case_insensitive() {
        let err = BackendError::api("conflicting operation in progress, Try Again Later");
        assert_eq!(err.classify(), ErrorClass::TransientConflict);
        assert!(err.is_retryable_conflict());
    }

    #[test]
    fn classify_anything_else_is_fatal() {
        let err = BackendError::api("internal server error");
        assert_eq!(err.classify(), ErrorClass::Fatal);
        assert!(!err.is_missing_resource());
        assert!(!err.is_retryable_conflict());
    }

    #[test]
    fn strict_variant_only_matches_does_not_exist() {
        assert!(BackendError::api("vnic v-1 does not exist").is_missing_resource_strict());
        assert!(!BackendError::api("resource not found").is_missing_resource_strict());
        assert!(
            !BackendError::api("Load balancer lb-7 has no listener l-1")
                .is_missing_resource_strict()
        );
    }

    #[test]
    fn broad_variant_covers_strict() {
        let err = BackendError::api("vnic v-1 does not exist");
        assert!(err.is_missing_resource());
        assert!(err.is_missing_resource_strict());
    }

    #[test]
    fn engine_error_helpers() {
        let err = EngineError::Backend(BackendError::api("db-9 does not exist"));
        assert!(err.is_not_found());
        assert!(!err.is_timeout());

        let err = EngineError::PollTimeout(Duration::from_secs(1200));
        assert!(err.is_timeout());
        assert!(err.is_retryable());
        assert!(!err.is_not_found());

        let err = EngineError::UnexpectedState {
            state: "MIGRATING".into(),
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn engine_error_display() {
        let err = EngineError::WorkRequestFailed {
            id: "wr-1".into(),
            message: "quota exceeded".into(),
        };
        assert!(err.to_string().contains("wr-1"));
        assert!(err.to_string().contains("quota exceeded"));

        let err = EngineError::PollTimeout(Duration::from_secs(60));
        assert!(err.to_string().contains("timed out"));
    }
}
