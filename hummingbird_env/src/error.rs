//! Error types for the collaborator contracts.

use crate::types::{AgentId, ZoneId};
use thiserror::Error;

/// Errors a physics or render collaborator can report back to the core.
#[derive(Debug, Error)]
pub enum EnvError {
    /// The collaborator has no collider registered for this feeding zone
    #[error("Unknown feeding zone: {0}")]
    UnknownZone(ZoneId),

    /// The collaborator has no rigid body for this agent
    #[error("Unknown body: {0}")]
    UnknownBody(AgentId),
}
