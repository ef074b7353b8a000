//! Physics collaborator contract consumed by the simulation core.

use crate::error::EnvError;
use crate::types::{AgentId, ZoneId};
use nalgebra::{Point3, UnitQuaternion, Vector3};

/// The subset of a physics engine the core talks to.
///
/// The core never integrates motion or detects contacts itself. It pushes
/// forces, teleports and kinematic rotations into the engine, and asks it
/// two geometric questions (overlap and closest point).
///
/// # Implementations
///
/// - **Engine bridge**: wraps a real rigid-body engine
/// - **Simulation**: `hummingbird_sim::ArenaPhysics`, a point-mass stand-in
///
/// # Tick Flow
///
/// ```text
/// Engine                         Core
///   |-- ContactEvent ------------->|  handle_contact()
///   |<----------- closest_point() -|
///   |<--------------- add_force() -|  on_action_received()
///   |<--------- set_rotation() ----|
///   |-- step(dt), new positions -->|  sync_position()
/// ```
pub trait PhysicsBackend {
    /// Counts solid colliders overlapping a sphere.
    ///
    /// Used by spawn placement; zero means the point is free.
    fn overlap_count(&self, center: &Point3<f32>, radius: f32) -> usize;

    /// Returns the point on a feeding zone's collider closest to `point`.
    ///
    /// # Returns
    /// * `Ok(p)` - The closest point (equal to `point` when inside the zone)
    /// * `Err(EnvError::UnknownZone)` - The engine has no such zone
    fn closest_point(&self, zone: ZoneId, point: &Point3<f32>) -> Result<Point3<f32>, EnvError>;

    /// Adds a force to the agent's body for the next integration step.
    fn add_force(&mut self, body: AgentId, force: Vector3<f32>);

    /// Zeroes the linear and angular velocity of the agent's body.
    fn zero_velocities(&mut self, body: AgentId);

    /// Teleports the agent's body to a pose.
    fn set_pose(&mut self, body: AgentId, position: Point3<f32>, rotation: UnitQuaternion<f32>);

    /// Sets the body's rotation directly (kinematic rotation control).
    fn set_rotation(&mut self, body: AgentId, rotation: UnitQuaternion<f32>);

    /// Puts the body to sleep or wakes it up.
    fn set_sleeping(&mut self, body: AgentId, sleeping: bool);

    /// Enables or disables a flower's feeding zone and its solid petals.
    fn set_flower_enabled(&mut self, zone: ZoneId, enabled: bool);
}
