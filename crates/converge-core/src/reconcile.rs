//! Lifecycle reconciliation driver
//!
//! One public operation per lifecycle phase. Each composes the backend
//! capability with the poll engine and the identity resolver, runs to
//! completion on the calling task, and reports classified errors. A handle
//! is driven by at most one operation at a time; the exclusive borrows make
//! a second concurrent poll against the same handle unrepresentable.

use crate::backend::{ResourceOps, StatePlan};
use crate::config::ReconcileConfig;
use crate::error::{EngineError, Result};
use crate::handle::{ResourceHandle, is_work_request_id};
use crate::identity::{IdentityResolver, Resolution};
use crate::poll::{PollOutcome, PollPolicy, wait_for_state};
use crate::progress::ProgressCallback;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

/// Drives resources through create/read/update/delete against their backend
/// capabilities.
pub struct Reconciler {
    config: ReconcileConfig,
    on_progress: Option<ProgressCallback>,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl Reconciler {
    /// A reconciler with the default timing configuration.
    pub fn new() -> Self {
        Self::with_config(ReconcileConfig::default())
    }

    /// A reconciler with explicit timing configuration.
    pub fn with_config(config: ReconcileConfig) -> Self {
        Self {
            config,
            on_progress: None,
        }
    }

    /// Attach a progress callback for long-running waits.
    pub fn on_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Create the resource and, when its lifecycle declares it, wait for it
    /// to become ready.
    ///
    /// Transient conflicts on the create call are retried a bounded number
    /// of times with a fixed backoff. After a stateful create the identity
    /// is re-read from the capability, since polling may have replaced a
    /// work-request ticket with the durable resource id.
    pub async fn create_resource(
        &self,
        handle: &mut ResourceHandle,
        ops: &mut dyn ResourceOps,
    ) -> Result<()> {
        let mut attempts: u32 = 0;
        loop {
            match ops.create().await {
                Ok(()) => break,
                Err(err)
                    if err.is_retryable_conflict()
                        && attempts < self.config.max_conflict_retries =>
                {
                    attempts += 1;
                    info!(attempts, "create hit a transient conflict, backing off");
                    sleep(self.config.conflict_backoff()).await;
                }
                Err(err) => return Err(err.into()),
            }
        }

        let id = ops
            .id()
            .filter(|id| !id.is_empty())
            .ok_or(EngineError::IdentityMissing)?;
        handle.set_identity(&id);
        debug!(identity = %id, "create accepted");

        let lifecycle = ops.lifecycle();
        if let Some(plan) = &lifecycle.create {
            let outcome = self
                .run_poll(ops, plan, self.config.create_initial_delay())
                .await?;
            match outcome {
                PollOutcome::Reached(state) => handle.set_observed_state(state),
                PollOutcome::Absent => return Err(EngineError::ResourceVanished),
            }
            // Polling may have swapped a ticket id for the durable id.
            if let Some(id) = ops.id() {
                handle.set_identity(id);
            }
        }

        ops.set_data();

        if let Some(settle) = lifecycle.settle_after {
            debug!(?settle, "settling after create");
            sleep(settle).await;
        }
        Ok(())
    }

    /// Fetch the resource's current backend representation.
    ///
    /// A missing resource is not an error here: the handle is voided and the
    /// read reports success, so the caller can converge on "gone".
    pub async fn read_resource(
        &self,
        handle: &mut ResourceHandle,
        ops: &mut dyn ResourceOps,
    ) -> Result<()> {
        match ops.get().await {
            Ok(()) => {
                if let Some(state) = ops.state() {
                    handle.set_observed_state(state);
                }
                ops.set_data();
                Ok(())
            }
            Err(err) if err.is_missing_resource() => {
                info!("resource gone on read, voiding handle");
                handle.void();
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Apply pending changes to the resource.
    ///
    /// The handle is flagged as mid-update for the duration of the call; if
    /// the backend fails partway the flag stays set, so unrelated attributes
    /// are not reported as already converged.
    pub async fn update_resource(
        &self,
        handle: &mut ResourceHandle,
        ops: &mut dyn ResourceOps,
    ) -> Result<()> {
        handle.begin_partial_update();
        ops.update().await?;
        handle.end_partial_update();
        ops.set_data();
        Ok(())
    }

    /// Delete the resource and, when its lifecycle declares it, wait for the
    /// backend to finish tearing it down.
    ///
    /// An already-gone resource counts as deleted, both on the direct call
    /// and at any point during the teardown wait.
    pub async fn delete_resource(
        &self,
        handle: &mut ResourceHandle,
        ops: &mut dyn ResourceOps,
    ) -> Result<()> {
        if let Err(err) = ops.delete().await {
            if err.is_missing_resource_strict() {
                info!("resource already gone, treating delete as complete");
                handle.void();
                return Ok(());
            }
            return Err(err.into());
        }

        let lifecycle = ops.lifecycle();
        if let Some(plan) = &lifecycle.delete {
            // Reached and Absent both mean the teardown finished.
            self.run_poll(ops, plan, Duration::ZERO).await?;
        }

        if let Some(settle) = lifecycle.settle_after {
            debug!(?settle, "settling after delete");
            sleep(settle).await;
        }
        handle.void();
        Ok(())
    }

    /// Run one bounded wait over the capability, resolving work-request
    /// tickets into durable identities along the way.
    async fn run_poll(
        &self,
        ops: &mut dyn ResourceOps,
        plan: &StatePlan,
        initial_delay: Duration,
    ) -> Result<PollOutcome> {
        let policy = PollPolicy {
            pending_states: plan.pending.clone(),
            target_states: plan.target.clone(),
            timeout: plan.timeout.unwrap_or_else(|| self.config.operation_timeout()),
            initial_delay,
            poll_interval: self.config.poll_interval(),
            failed_state: self.config.failed_state.clone(),
        };
        let identity = ops.id().unwrap_or_default();
        let mut resolver = IdentityResolver::new();

        wait_for_state(&policy, &identity, self.on_progress.as_ref(), async || {
            if let Some(ticket) = ops.id().filter(|id| is_work_request_id(id)) {
                match resolver.resolve(&mut *ops, &ticket).await? {
                    Resolution::Resolved(durable) => ops.set_id(&durable),
                    Resolution::Pending(state) => return Ok(state.label().to_string()),
                }
            }
            ops.get().await?;
            Ok(ops.state().unwrap_or_default())
        })
        .await
    }
}
