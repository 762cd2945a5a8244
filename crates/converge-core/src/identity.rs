//! Work-request identity resolution
//!
//! Some control planes answer a mutating call with an operation ticket
//! instead of the resource; the real resource and its identity exist only
//! once the ticket succeeds. While a handle's identity still carries the
//! ticket prefix, every poll cycle runs through the resolver to either swap
//! in the durable identity or keep waiting.

use crate::backend::{ResourceOps, ResourceShape, WorkRequest, WorkRequestState};
use crate::error::{EngineError, Result};
use std::collections::HashMap;
use tracing::debug;

/// Separator for identities synthesized from an address pair.
const COMPOSITE_SEPARATOR: char = ':';

/// Outcome of one resolution attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The work request finished and yielded a durable identity.
    Resolved(String),
    /// The work request is still running; the ticket id remains the
    /// stand-in identity and the poll loop keeps waiting.
    Pending(WorkRequestState),
}

/// Resolves work-request tickets to durable resource identities.
///
/// Resolutions are memoized, so a ticket that has resolved once keeps
/// answering with the same identity for the rest of the operation.
#[derive(Debug, Default)]
pub struct IdentityResolver {
    resolved: HashMap<String, String>,
}

impl IdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an identity obtained through an earlier direct fetch, so the
    /// resolver prefers it over re-deriving one from the ticket.
    pub fn record(&mut self, ticket_id: impl Into<String>, identity: impl Into<String>) {
        self.resolved.insert(ticket_id.into(), identity.into());
    }

    /// Resolve `ticket_id` against the backend.
    pub async fn resolve(
        &mut self,
        ops: &mut dyn ResourceOps,
        ticket_id: &str,
    ) -> Result<Resolution> {
        if let Some(identity) = self.resolved.get(ticket_id) {
            return Ok(Resolution::Resolved(identity.clone()));
        }

        let request = ops.work_request(ticket_id).await?;
        match request.state {
            WorkRequestState::Failed => Err(failure(request)),
            WorkRequestState::Accepted | WorkRequestState::InProgress => {
                Ok(Resolution::Pending(request.state))
            }
            WorkRequestState::Succeeded => {
                let identity = identity_from_shape(request.resource.as_ref()).ok_or_else(|| {
                    EngineError::IdentityUnresolved {
                        id: ticket_id.to_string(),
                    }
                })?;
                debug!(ticket_id, identity = %identity, "work request resolved");
                self.resolved.insert(ticket_id.to_string(), identity.clone());
                Ok(Resolution::Resolved(identity))
            }
        }
    }
}

fn failure(request: WorkRequest) -> EngineError {
    let message = request
        .error
        .unwrap_or_else(|| "no failure detail reported".to_string());
    EngineError::WorkRequestFailed {
        id: request.id,
        message,
    }
}

/// Pick the durable identity out of whatever shape the backend returned.
///
/// Priority: primary id, then name (backends that key children by name),
/// then a synthesized address composite.
fn identity_from_shape(shape: Option<&ResourceShape>) -> Option<String> {
    match shape? {
        ResourceShape::WithId(id) => Some(id.clone()),
        ResourceShape::WithName(name) => Some(name.clone()),
        ResourceShape::WithAddressPair { address, port } => {
            Some(format!("{address}{COMPOSITE_SEPARATOR}{port}"))
        }
        ResourceShape::Opaque => None,
    }
}
