//! Error types for the simulation core.

use hummingbird_env::{EnvError, ZoneId};
use thiserror::Error;

/// Content errors found while registering flowers from a scene.
///
/// These are authoring bugs, not runtime conditions: a scene that fails
/// here must be fixed, never retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SceneError {
    #[error("Duplicate feeding zone {zone}: registered by '{first}' and '{second}'")]
    DuplicateZone {
        zone: ZoneId,
        first: String,
        second: String,
    },

    #[error("Feeding zone {zone} on node '{node}' has no owning flower")]
    OrphanZone { zone: ZoneId, node: String },

    #[error("Scene root '{node}' must be a group")]
    RootNotGroup { node: String },

    #[error("Scene parse error: {0}")]
    Parse(String),
}

/// Errors raised by the core at runtime.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error("Feeding zone not registered: {0}")]
    UnregisteredZone(ZoneId),

    #[error("Freeze/unfreeze is not supported in training mode")]
    FreezeInTraining,

    #[error("Expected {expected} action components, got {got}")]
    ActionArity { expected: usize, got: usize },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Env(#[from] EnvError),
}

impl CoreError {
    /// Creates a config validation error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
