//! Resource handles
//!
//! A [`ResourceHandle`] is the engine's in-memory representative of one
//! backend resource. Its identity is usually the resource's durable id, but
//! immediately after an asynchronous create it may alias the id of the work
//! request that is still producing the resource. Ticket ids carry a fixed
//! namespace prefix so the two are always distinguishable.

/// Prefix marking an identity as a work-request ticket rather than a durable
/// resource id.
pub const WORK_REQUEST_PREFIX: &str = "wr-";

/// Returns true if `id` names a work request instead of a resource.
pub fn is_work_request_id(id: &str) -> bool {
    id.starts_with(WORK_REQUEST_PREFIX)
}

/// In-memory representative of one backend resource under reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceHandle {
    identity: Option<String>,
    observed_state: Option<String>,
    partial_update: bool,
}

impl ResourceHandle {
    /// A handle with no identity yet (resource not created).
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle re-attached to an existing backend resource.
    pub fn with_identity(id: impl Into<String>) -> Self {
        Self {
            identity: Some(id.into()),
            observed_state: None,
            partial_update: false,
        }
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    pub fn set_identity(&mut self, id: impl Into<String>) {
        self.identity = Some(id.into());
    }

    /// True while the identity is still a work-request ticket.
    pub fn identity_is_ticket(&self) -> bool {
        self.identity().is_some_and(is_work_request_id)
    }

    /// Clear the handle; the backend resource is gone.
    pub fn void(&mut self) {
        self.identity = None;
        self.observed_state = None;
    }

    pub fn is_voided(&self) -> bool {
        self.identity.is_none()
    }

    /// State label from the most recent get. Stale outside of that window.
    pub fn observed_state(&self) -> Option<&str> {
        self.observed_state.as_deref()
    }

    pub fn set_observed_state(&mut self, state: impl Into<String>) {
        self.observed_state = Some(state.into());
    }

    /// Mark the external representation as mid-update, so a failure partway
    /// does not report unrelated attributes as already converged.
    pub fn begin_partial_update(&mut self) {
        self.partial_update = true;
    }

    pub fn end_partial_update(&mut self) {
        self.partial_update = false;
    }

    pub fn in_partial_update(&self) -> bool {
        self.partial_update
    }
}
