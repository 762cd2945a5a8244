//! Bounded state polling
//!
//! The engine's only open-ended wait: re-fetch a resource until it reaches a
//! target lifecycle state, fails, disappears, or exhausts its wait budget.
//! The loop never spins on a state it does not recognize.

use crate::error::{EngineError, Result};
use crate::progress::{ProgressCallback, ProgressEvent, emit};
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

/// One fully-assembled wait: the capability's state sets plus the engine's
/// timing defaults. Built fresh per create/delete call.
#[derive(Debug, Clone)]
pub struct PollPolicy {
    pub pending_states: Vec<String>,
    pub target_states: Vec<String>,
    pub timeout: Duration,
    pub initial_delay: Duration,
    pub poll_interval: Duration,
    /// The backend's terminal hard-failure label.
    pub failed_state: String,
}

/// How a completed wait ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The resource reached one of the target states.
    Reached(String),
    /// The backend reports the resource gone. Whether that is success or
    /// failure depends on the phase; the driver decides.
    Absent,
}

/// Poll `refresh` until the policy reaches a terminal outcome.
///
/// `refresh` abstracts "fetch the current state": the driver composes it
/// from the capability's get plus work-request identity resolution. The
/// `identity` is only used for progress reporting and logging; it may still
/// be a ticket id when the wait starts.
pub async fn wait_for_state(
    policy: &PollPolicy,
    identity: &str,
    on_progress: Option<&ProgressCallback>,
    mut refresh: impl AsyncFnMut() -> Result<String>,
) -> Result<PollOutcome> {
    let started = Instant::now();
    debug!(identity, timeout = ?policy.timeout, "waiting for resource state");
    emit(
        on_progress,
        ProgressEvent::Started {
            identity: identity.to_string(),
        },
    );

    sleep(policy.initial_delay).await;

    loop {
        let elapsed = started.elapsed();
        if elapsed > policy.timeout {
            warn!(identity, ?elapsed, "state wait exhausted its budget");
            return Err(EngineError::PollTimeout(policy.timeout));
        }

        let state = match refresh().await {
            Ok(state) => state,
            Err(err) if err.is_not_found() => {
                debug!(identity, "resource absent during wait");
                emit(
                    on_progress,
                    ProgressEvent::Absent {
                        identity: identity.to_string(),
                    },
                );
                return Ok(PollOutcome::Absent);
            }
            Err(err) => return Err(err),
        };

        emit(
            on_progress,
            ProgressEvent::Polling {
                identity: identity.to_string(),
                state: state.clone(),
                elapsed,
            },
        );

        if policy.target_states.iter().any(|t| *t == state) {
            debug!(identity, state = %state, "resource reached target state");
            emit(
                on_progress,
                ProgressEvent::Reached {
                    identity: identity.to_string(),
                    state: state.clone(),
                },
            );
            return Ok(PollOutcome::Reached(state));
        }

        if state == policy.failed_state {
            warn!(identity, state = %state, "resource reached failed state");
            return Err(EngineError::FailedState { state });
        }

        if policy.pending_states.iter().any(|p| *p == state) {
            sleep(policy.poll_interval).await;
            continue;
        }

        warn!(identity, state = %state, "resource reported a state outside the plan");
        return Err(EngineError::UnexpectedState { state });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendError;

    fn policy() -> PollPolicy {
        PollPolicy {
            pending_states: vec!["PROVISIONING".into()],
            target_states: vec!["ACTIVE".into()],
            timeout: Duration::from_secs(300),
            initial_delay: Duration::ZERO,
            poll_interval: Duration::from_secs(10),
            failed_state: "FAILED".into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn immediate_target_state_succeeds() {
        let outcome = wait_for_state(&policy(), "rsrc-1", None, async || Ok("ACTIVE".into()))
            .await
            .unwrap();
        assert_eq!(outcome, PollOutcome::Reached("ACTIVE".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn pending_then_target() {
        let mut polls = 0;
        let outcome = wait_for_state(&policy(), "rsrc-1", None, async || {
            polls += 1;
            if polls < 3 {
                Ok("PROVISIONING".into())
            } else {
                Ok("ACTIVE".into())
            }
        })
        .await
        .unwrap();
        assert_eq!(outcome, PollOutcome::Reached("ACTIVE".into()));
        assert_eq!(polls, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_state_fails_without_looping() {
        let mut polls = 0;
        let err = wait_for_state(&policy(), "rsrc-1", None, async || {
            polls += 1;
            Ok("MIGRATING".into())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, EngineError::UnexpectedState { state } if state == "MIGRATING"));
        assert_eq!(polls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_sentinel_is_fatal() {
        let err = wait_for_state(&policy(), "rsrc-1", None, async || Ok("FAILED".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::FailedState { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn forever_pending_times_out() {
        let err = wait_for_state(&policy(), "rsrc-1", None, async || {
            Ok("PROVISIONING".into())
        })
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            EngineError::PollTimeout(t) if t == Duration::from_secs(300)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn missing_resource_reports_absent() {
        let outcome = wait_for_state(&policy(), "rsrc-1", None, async || {
            Err(BackendError::api("instance rsrc-1 does not exist").into())
        })
        .await
        .unwrap();
        assert_eq!(outcome, PollOutcome::Absent);
    }

    #[tokio::test(start_paused = true)]
    async fn other_refresh_errors_are_fatal() {
        let err = wait_for_state(&policy(), "rsrc-1", None, async || {
            Err(BackendError::api("internal server error").into())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, EngineError::Backend(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn initial_delay_is_honored() {
        let started = Instant::now();
        let mut relaxed = policy();
        relaxed.initial_delay = Duration::from_secs(15);

        wait_for_state(&relaxed, "rsrc-1", None, async || Ok("ACTIVE".into()))
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_secs(15));
    }
}
