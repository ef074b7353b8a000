//! Safe spawn placement by rejection sampling.
//!
//! Candidates are drawn either just in front of a random flower or freely
//! in the air above the arena, and accepted when the physics collaborator
//! reports no overlap around them. When the budget runs out the last
//! candidate is used anyway and the miss is reported, so broken scenes show
//! up in logs instead of failing episodes.

use crate::config::SpawnConfig;
use crate::flower::Flower;
use crate::flower_area::FlowerArea;
use crate::geometry::{euler_degrees, look_rotation, world_up, Pose};
use hummingbird_env::PhysicsBackend;
use nalgebra::{Point3, Vector3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

/// Result of one placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnOutcome {
    /// The chosen pose (possibly colliding if `safe` is false)
    pub pose: Pose,

    /// Number of candidates sampled
    pub attempts: u32,

    /// Whether the pose passed the overlap test
    pub safe: bool,
}

/// Samples collision-free start poses.
pub struct SafeSpawnPlacer {
    config: SpawnConfig,
    rng: ChaCha8Rng,
}

impl SafeSpawnPlacer {
    /// Creates a placer with an RNG seeded from `seed`.
    pub fn new(config: SpawnConfig, seed: u64) -> Self {
        Self::with_rng(config, ChaCha8Rng::seed_from_u64(seed))
    }

    /// Creates a placer with an injected RNG.
    pub fn with_rng(config: SpawnConfig, rng: ChaCha8Rng) -> Self {
        Self { config, rng }
    }

    pub fn config(&self) -> &SpawnConfig {
        &self.config
    }

    /// Fair coin used by training episodes to pick the spawn branch.
    pub fn sample_in_front_of_flower(&mut self) -> bool {
        self.rng.gen_bool(0.5)
    }

    /// Finds a start pose.
    ///
    /// With `in_front_of_flower` the agent faces a random flower from a short
    /// distance along its approach axis; otherwise it hovers somewhere in the
    /// arena with a random heading. An area without flowers always uses the
    /// free branch.
    pub fn place_pose<P>(&mut self, area: &FlowerArea, physics: &P, in_front_of_flower: bool) -> SpawnOutcome
    where
        P: PhysicsBackend + ?Sized,
    {
        let near_flower = in_front_of_flower && area.flower_count() > 0;
        if in_front_of_flower && !near_flower {
            debug!("No flowers in '{}', spawning in free flight", area.name());
        }

        let max_attempts = self.config.max_attempts.max(1);
        let mut attempts = 0;
        let mut pose = Pose::identity();
        let mut safe = false;

        while !safe && attempts < max_attempts {
            attempts += 1;
            pose = if near_flower {
                let index = self.rng.gen_range(0..area.flower_count());
                self.sample_near_flower(&area.flowers()[index])
            } else {
                self.sample_free(area.origin())
            };
            safe = physics.overlap_count(&pose.position, self.config.overlap_radius) == 0;
        }

        if !safe {
            warn!(
                "Could not find a safe position to spawn after {} attempts; using last candidate at {:?}",
                attempts, pose.position
            );
        }

        SpawnOutcome { pose, attempts, safe }
    }

    fn sample_near_flower(&mut self, flower: &Flower) -> Pose {
        let [lo, hi] = self.config.flower_distance;
        let distance = self.rng.gen_range(lo..=hi);
        let position = flower.center() + flower.up().into_inner() * distance;
        let rotation = look_rotation(&(flower.center() - position), &world_up());
        Pose::new(position, rotation)
    }

    fn sample_free(&mut self, origin: Point3<f32>) -> Pose {
        let [h_lo, h_hi] = self.config.height;
        let [r_lo, r_hi] = self.config.radius;
        let height = self.rng.gen_range(h_lo..=h_hi);
        let radius = self.rng.gen_range(r_lo..=r_hi);
        let heading = euler_degrees(0.0, self.rng.gen_range(-180.0f32..=180.0), 0.0);
        let position = origin + world_up() * height + heading * Vector3::z() * radius;

        let max_pitch = self.config.max_pitch;
        let pitch = self.rng.gen_range(-max_pitch..=max_pitch);
        let yaw = self.rng.gen_range(-180.0f32..=180.0);
        Pose::new(position, euler_degrees(pitch, yaw, 0.0))
    }
}
