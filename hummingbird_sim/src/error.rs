//! Harness errors.

use hummingbird_core::{CoreError, SceneError};
use hummingbird_env::EnvError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Env(#[from] EnvError),

    #[error("No agent at index {0}")]
    NoSuchAgent(usize),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
