//! Hummingbird Core - Nectar-Foraging Agent Simulation
//!
//! The environment side of a reinforcement-learning setup in which flying
//! agents learn to feed on flowers:
//! 1. **Flowers**: depletable nectar, full/empty state, arena-wide resets
//! 2. **Targeting**: nearest flower that still has nectar, never stale
//! 3. **Episodes**: collision-free spawning, rewards, observations and
//!    kinematic steering for each agent
//!
//! Physics and rendering are collaborators reached through the traits in
//! `hummingbird_env`; this crate performs no I/O.

pub mod agent;
pub mod config;
pub mod error;
pub mod feeding;
pub mod flower;
pub mod flower_area;
pub mod geometry;
pub mod motion;
pub mod observation;
pub mod scene;
pub mod spawn;
pub mod tracker;

#[cfg(test)]
mod testing;

// Re-export key types for convenience
pub use agent::HummingbirdAgent;
pub use config::{AgentConfig, FeedingConfig, MotionConfig, SpawnConfig};
pub use error::{CoreError, SceneError};
pub use feeding::{ContactOutcome, FeedingController};
pub use flower::{Flower, NECTAR_CAPACITY};
pub use flower_area::{FlowerArea, FlowerIndex, AREA_DIAMETER};
pub use geometry::Pose;
pub use motion::{Action, MotionCommand, MotionController, ACTION_SIZE};
pub use observation::{Observation, ObservationEncoder, OBSERVATION_SIZE};
pub use scene::{NodeKind, SceneDescription, SceneNode};
pub use spawn::{SafeSpawnPlacer, SpawnOutcome};
pub use tracker::{NearestFlowerTracker, TrackerState};
