//! Backend capability surface
//!
//! Per-resource-type glue code implements [`ResourceOps`] against its SDK
//! client; the engine drives those capabilities through the lifecycle without
//! knowing anything about transport or attribute layout. A capability holds
//! its own (typically `Arc`-shared) API client.
//!
//! Optional behavior is declared up front in [`Lifecycle`] instead of being
//! probed per call, so a misconfigured resource type fails at construction
//! review time, not mid-reconcile.

use crate::error::BackendError;
use async_trait::async_trait;
use std::time::Duration;

/// Pending/target lifecycle labels for one phase of a resource's life.
///
/// Create and delete get separate plans; a database's create plan might be
/// `PROVISIONING -> ACTIVE` while its delete plan is
/// `TERMINATING -> TERMINATED`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatePlan {
    /// States the poll loop keeps waiting through.
    pub pending: Vec<String>,
    /// States that complete the wait successfully.
    pub target: Vec<String>,
    /// Per-resource override of the engine's overall wait budget.
    pub timeout: Option<Duration>,
}

impl StatePlan {
    pub fn new<P, T>(pending: P, target: T) -> Self
    where
        P: IntoIterator<Item = &'static str>,
        T: IntoIterator<Item = &'static str>,
    {
        Self {
            pending: pending.into_iter().map(String::from).collect(),
            target: target.into_iter().map(String::from).collect(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Declared lifecycle behavior of one resource type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lifecycle {
    /// Present when creation is asynchronous and must be polled to readiness.
    pub create: Option<StatePlan>,
    /// Present when deletion is asynchronous and must be polled to the grave.
    pub delete: Option<StatePlan>,
    /// Fixed settle time after a successful create or delete, for backends
    /// that acknowledge before the change is visible to subsequent reads.
    pub settle_after: Option<Duration>,
}

/// Lifecycle state of an asynchronous work request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkRequestState {
    Accepted,
    InProgress,
    Succeeded,
    Failed,
}

impl WorkRequestState {
    /// The backend's wire label for this state, as seen by poll state sets.
    pub fn label(&self) -> &'static str {
        match self {
            WorkRequestState::Accepted => "ACCEPTED",
            WorkRequestState::InProgress => "IN_PROGRESS",
            WorkRequestState::Succeeded => "SUCCEEDED",
            WorkRequestState::Failed => "FAILED",
        }
    }
}

/// Identity-bearing shape of a fetched resource.
///
/// Backends differ in how their resources are keyed; the glue layer maps
/// whatever the SDK returned into one of these variants so the resolver never
/// has to introspect SDK types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceShape {
    /// A primary generated identifier.
    WithId(String),
    /// Backends that key child resources by name.
    WithName(String),
    /// No single key; identity is synthesized from an address pair.
    WithAddressPair { address: String, port: u16 },
    /// Nothing identity-bearing on the object.
    Opaque,
}

/// Snapshot of an in-flight asynchronous backend operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkRequest {
    pub id: String,
    pub state: WorkRequestState,
    /// The resource the request produced, available once it has succeeded.
    pub resource: Option<ResourceShape>,
    /// Failure detail from the control plane, when the request failed.
    pub error: Option<String>,
}

/// The per-resource-type capability set the engine drives.
///
/// Implementations mutate their own fetched representation; the engine reads
/// back `id()` and `state()` after each call and owns all waiting, retrying,
/// and error classification.
#[async_trait]
pub trait ResourceOps: Send {
    /// Issue the mutating create call.
    async fn create(&mut self) -> Result<(), BackendError>;

    /// Current identity as known to the capability. May be a work-request id
    /// immediately after an asynchronous create.
    fn id(&self) -> Option<String>;

    /// Push a resolved durable identity back into the capability.
    fn set_id(&mut self, id: &str);

    /// Fetch the current backend representation of the resource.
    async fn get(&mut self) -> Result<(), BackendError>;

    /// Issue the mutating update call.
    async fn update(&mut self) -> Result<(), BackendError>;

    /// Issue the mutating delete call.
    async fn delete(&mut self) -> Result<(), BackendError>;

    /// Lifecycle state label from the most recent `get`.
    fn state(&self) -> Option<String>;

    /// Materialize fetched attributes into the caller-visible representation.
    fn set_data(&mut self);

    /// Declared lifecycle behavior for this resource type.
    fn lifecycle(&self) -> Lifecycle {
        Lifecycle::default()
    }

    /// Fetch the work request backing `id`. Only backends whose mutating
    /// calls return tickets override this.
    async fn work_request(&mut self, id: &str) -> Result<WorkRequest, BackendError> {
        Err(BackendError::Unsupported(format!("work request {id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_plan_builder() {
        let plan = StatePlan::new(["PROVISIONING"], ["ACTIVE", "RUNNING"])
            .with_timeout(Duration::from_secs(600));
        assert_eq!(plan.pending, vec!["PROVISIONING"]);
        assert_eq!(plan.target, vec!["ACTIVE", "RUNNING"]);
        assert_eq!(plan.timeout, Some(Duration::from_secs(600)));
    }

    #[test]
    fn work_request_state_labels() {
        assert_eq!(WorkRequestState::Accepted.label(), "ACCEPTED");
        assert_eq!(WorkRequestState::InProgress.label(), "IN_PROGRESS");
        assert_eq!(WorkRequestState::Succeeded.label(), "SUCCEEDED");
        assert_eq!(WorkRequestState::Failed.label(), "FAILED");
    }

    #[test]
    fn lifecycle_default_declares_nothing() {
        let lifecycle = Lifecycle::default();
        assert!(lifecycle.create.is_none());
        assert!(lifecycle.delete.is_none());
        assert!(lifecycle.settle_after.is_none());
    }
}
