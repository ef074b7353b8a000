//! Fixed-size observation vector for the policy.
//!
//! Layout (10 floats):
//!
//! | index | meaning                                          |
//! |-------|--------------------------------------------------|
//! | 0..4  | agent rotation quaternion (x, y, z, w)           |
//! | 4..7  | unit direction beak tip -> target center         |
//! | 7     | dot(direction, -target up)                       |
//! | 8     | dot(agent forward, -target up)                   |
//! | 9     | distance beak tip -> target / arena diameter     |
//!
//! Without a target every component is zero.

use crate::flower::Flower;
use crate::flower_area::AREA_DIAMETER;
use crate::geometry::forward;
use nalgebra::{Point3, UnitQuaternion, Vector3};

/// Number of observation components.
pub const OBSERVATION_SIZE: usize = 10;

pub type Observation = [f32; OBSERVATION_SIZE];

#[derive(Debug, Clone, Copy)]
pub struct ObservationEncoder {
    arena_diameter: f32,
}

impl Default for ObservationEncoder {
    fn default() -> Self {
        Self::new(AREA_DIAMETER)
    }
}

impl ObservationEncoder {
    pub fn new(arena_diameter: f32) -> Self {
        Self { arena_diameter }
    }

    /// Encodes the agent/target relationship.
    ///
    /// `rotation` is the agent's orientation relative to the arena frame.
    pub fn encode(&self, rotation: &UnitQuaternion<f32>, beak_tip: &Point3<f32>, target: Option<&Flower>) -> Observation {
        let mut obs = [0.0; OBSERVATION_SIZE];
        let Some(target) = target else {
            return obs;
        };

        let q = rotation.coords;
        obs[0] = q.x;
        obs[1] = q.y;
        obs[2] = q.z;
        obs[3] = q.w;

        let to_flower = target.center() - beak_tip;
        let distance = to_flower.norm();
        let direction = if distance > f32::EPSILON {
            to_flower / distance
        } else {
            Vector3::zeros()
        };
        obs[4] = direction.x;
        obs[5] = direction.y;
        obs[6] = direction.z;

        let against_up = -target.up().into_inner();
        obs[7] = direction.dot(&against_up).clamp(-1.0, 1.0);
        obs[8] = forward(rotation).dot(&against_up).clamp(-1.0, 1.0);
        obs[9] = distance / self.arena_diameter;

        obs
    }
}
