//! Scripted policies that stand in for a trained model.

use hummingbird_core::geometry::{forward, pitch_yaw_degrees, wrap_degrees};
use hummingbird_core::{Action, Observation, ACTION_SIZE, AREA_DIAMETER};
use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Maps an observation to an action.
pub trait Policy {
    fn act(&mut self, observation: &Observation) -> Action;

    fn name(&self) -> &'static str;
}

/// Which policy drives the agents of a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    #[default]
    SeekNearest,
    Random,
}

impl PolicyKind {
    pub fn build(self, seed: u64) -> Box<dyn Policy> {
        match self {
            PolicyKind::SeekNearest => Box::new(SeekNearestPolicy::default()),
            PolicyKind::Random => Box::new(RandomPolicy::new(seed)),
        }
    }
}

/// Flies the beak tip straight at the observed target.
///
/// Reads only the observation vector. Directions are taken as world
/// directions, which holds for an unrotated arena root.
#[derive(Debug, Clone)]
pub struct SeekNearestPolicy {
    /// Heading error (degrees) that maps to a full turn request
    pub turn_saturation_deg: f32,

    /// Distance (meters) under which the push starts to taper off
    pub slowdown_distance: f32,

    /// Yaw request while no target is visible
    pub search_yaw: f32,
}

impl Default for SeekNearestPolicy {
    fn default() -> Self {
        Self {
            turn_saturation_deg: 30.0,
            slowdown_distance: 0.5,
            search_yaw: 0.3,
        }
    }
}

impl Policy for SeekNearestPolicy {
    fn act(&mut self, observation: &Observation) -> Action {
        if observation.iter().all(|c| *c == 0.0) {
            return [0.0, 0.0, 0.0, 0.0, self.search_yaw];
        }

        let rotation = UnitQuaternion::from_quaternion(Quaternion::new(
            observation[3],
            observation[0],
            observation[1],
            observation[2],
        ));
        let direction = Vector3::new(observation[4], observation[5], observation[6]);
        let distance = observation[9] * AREA_DIAMETER;

        let throttle = (distance / self.slowdown_distance).clamp(0.2, 1.0);
        let push = direction * throttle;

        let (pitch, yaw) = pitch_yaw_degrees(&rotation);
        let (want_pitch, want_yaw) = if direction.norm_squared() > 0.0 {
            (
                (-direction.y).clamp(-1.0, 1.0).asin().to_degrees(),
                direction.x.atan2(direction.z).to_degrees(),
            )
        } else {
            // Tip already at the center; hold the current heading
            let f = forward(&rotation);
            ((-f.y).clamp(-1.0, 1.0).asin().to_degrees(), f.x.atan2(f.z).to_degrees())
        };

        let turn = |error: f32| (error / self.turn_saturation_deg).clamp(-1.0, 1.0);
        [
            push.x,
            push.y,
            push.z,
            turn(want_pitch - pitch),
            turn(wrap_degrees(want_yaw - yaw)),
        ]
    }

    fn name(&self) -> &'static str {
        "seek_nearest"
    }
}

/// Uniform random actions from a seeded stream.
pub struct RandomPolicy {
    rng: ChaCha8Rng,
}

impl RandomPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Policy for RandomPolicy {
    fn act(&mut self, _observation: &Observation) -> Action {
        let mut action = [0.0; ACTION_SIZE];
        for component in &mut action {
            *component = self.rng.gen_range(-1.0..=1.0);
        }
        action
    }

    fn name(&self) -> &'static str {
        "random"
    }
}
