//! Hummingbird Environment Contracts
//!
//! This crate holds the interfaces between the hummingbird simulation core
//! and the things it deliberately does not implement:
//! - **Physics**: contact events, overlap and closest-point queries, forces
//! - **Rendering**: the full/empty visual state of each flower
//!
//! Keeping them here lets the same core run against a real engine bridge
//! or against the deterministic stand-in in `hummingbird_sim`.
//!
//! # Example
//!
//! ```ignore
//! use hummingbird_env::{ContactEvent, PhysicsBackend};
//!
//! fn drain<P: PhysicsBackend>(physics: &mut P, events: Vec<ContactEvent>) {
//!     for event in events {
//!         agent.handle_contact(event, &mut area, physics, tick)?;
//!     }
//! }
//! ```

mod error;
mod physics;
mod render;
mod types;

pub use error::EnvError;
pub use physics::PhysicsBackend;
pub use render::RenderSink;
pub use types::{AgentId, ContactEvent, FlowerVisual, SurfaceTag, ZoneId};
