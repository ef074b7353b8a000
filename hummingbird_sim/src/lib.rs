//! Hummingbird Deterministic Simulation Harness
//!
//! Drives the foraging core end to end without a game engine:
//! - **Physics**: `ArenaPhysics`, a point-mass stand-in behind `PhysicsBackend`
//! - **Policies**: scripted controllers in place of a trained model
//! - **Randomness**: every stream derived from a single 64-bit seed
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         SimWorld                            │
//! │  ┌──────────────────────────────────────────────────────┐   │
//! │  │ FlowerArea (flowers, nectar, plant resets)           │   │
//! │  └──────────────────────────────────────────────────────┘   │
//! │       │  &mut                  │  &mut                      │
//! │  ┌────▼─────────┐         ┌────▼─────────┐                  │
//! │  │ Hummingbird  │   ...   │ Hummingbird  │◄── Policy        │
//! │  │ Agent #0     │         │ Agent #n     │                  │
//! │  └──────────────┘         └──────────────┘                  │
//! │       ▲ contacts               ▲ contacts                   │
//! │  ┌────┴────────────────────────┴────┐                       │
//! │  │          ArenaPhysics            │                       │
//! │  └──────────────────────────────────┘                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use hummingbird_sim::{ScenarioRunner, scenarios::ScenarioId};
//!
//! let runner = ScenarioRunner::new(42, 4).with_duration(10.0);
//! let result = runner.run(ScenarioId::SharedMeadow);
//! assert!(result.passed);
//! ```

mod error;
mod exporter;
mod physics;
mod policy;
mod runner;
mod world;
pub mod scenarios;

pub use error::SimError;
pub use exporter::{AgentFrame, FlowerEventLog, FlowerFrame, SimEvent, SimExport, SimFrame};
pub use physics::{ArenaConfig, ArenaPhysics, Body};
pub use policy::{Policy, PolicyKind, RandomPolicy, SeekNearestPolicy};
pub use runner::{ScenarioMetrics, ScenarioResult, ScenarioRunner};
pub use world::{SimAgent, SimConfig, SimWorld, WorldStats};
