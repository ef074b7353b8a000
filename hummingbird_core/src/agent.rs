//! Hummingbird agent runtime.
//!
//! Ties the per-agent components together and exposes the lifecycle the
//! driver calls into:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                     HummingbirdAgent                       │
//! │                                                            │
//! │  on_episode_begin ──► SafeSpawnPlacer ──► NearestTracker   │
//! │  handle_contact   ──► FeedingController ──► reward         │
//! │  collect_obs      ──► NearestTracker ──► ObservationEncoder│
//! │  on_action        ──► MotionController ──► PhysicsBackend  │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! The agent never owns the flower area or the physics world; both are
//! passed in by reference on every call.

use crate::config::AgentConfig;
use crate::error::CoreError;
use crate::feeding::{ContactOutcome, FeedingController};
use crate::flower::Flower;
use crate::flower_area::{FlowerArea, FlowerIndex};
use crate::geometry::Pose;
use crate::motion::{Action, MotionController, ACTION_SIZE};
use crate::observation::{Observation, ObservationEncoder};
use crate::spawn::{SafeSpawnPlacer, SpawnOutcome};
use crate::tracker::NearestFlowerTracker;
use hummingbird_env::{AgentId, ContactEvent, PhysicsBackend};
use nalgebra::Point3;
use tracing::debug;

/// One foraging agent.
pub struct HummingbirdAgent {
    id: AgentId,
    config: AgentConfig,

    /// Last known body pose (world frame)
    pose: Pose,

    tracker: NearestFlowerTracker,
    spawner: SafeSpawnPlacer,
    encoder: ObservationEncoder,
    feeding: FeedingController,
    motion: MotionController,

    /// Nectar collected this episode
    nectar_obtained: f32,

    /// Reward accumulated since the last `take_reward`
    pending_reward: f32,

    /// Reward accumulated this episode
    cumulative_reward: f32,

    frozen: bool,
    step_count: u64,

    /// Episode length limit (0 = unbounded)
    max_step: u64,

    episode: u64,

    /// Episodes that started from an unverified spawn pose
    spawn_fallbacks: u64,
}

impl HummingbirdAgent {
    /// Creates an agent. `seed` drives its spawn sampling.
    pub fn new(id: AgentId, config: AgentConfig, seed: u64) -> Result<Self, CoreError> {
        config.validate()?;

        Ok(Self {
            id,
            pose: Pose::identity(),
            tracker: NearestFlowerTracker::new(),
            spawner: SafeSpawnPlacer::new(config.spawn.clone(), seed),
            encoder: ObservationEncoder::new(config.arena_diameter),
            feeding: FeedingController::new(config.feeding.clone(), config.training_mode),
            motion: MotionController::new(config.motion.clone()),
            nectar_obtained: 0.0,
            pending_reward: 0.0,
            cumulative_reward: 0.0,
            frozen: false,
            step_count: 0,
            max_step: config.max_step,
            episode: 0,
            spawn_fallbacks: 0,
            config,
        })
    }

    /// One-time setup. Outside training episodes never time out.
    pub fn init(&mut self) {
        if !self.config.training_mode {
            self.max_step = 0;
        }
        debug!(
            "Agent '{}' ({}) initialised, training={}, max_step={}",
            self.config.name, self.id, self.config.training_mode, self.max_step
        );
    }

    /// Starts a new episode.
    ///
    /// In training mode the whole area is reset and the spawn branch is a
    /// coin flip; otherwise the agent always starts in front of a flower.
    pub fn on_episode_begin<P>(&mut self, area: &mut FlowerArea, physics: &mut P) -> SpawnOutcome
    where
        P: PhysicsBackend + ?Sized,
    {
        if self.config.training_mode {
            area.reset_area();
        }
        self.begin_episode(area, physics)
    }

    /// Starts a new episode in an area shared with other agents.
    ///
    /// The caller resets the area once for everyone and brings the physics
    /// world up to date before any agent is placed; resetting here would move
    /// flowers under agents that already spawned.
    pub fn on_episode_begin_in_shared_area<P>(&mut self, area: &FlowerArea, physics: &mut P) -> SpawnOutcome
    where
        P: PhysicsBackend + ?Sized,
    {
        self.begin_episode(area, physics)
    }

    fn begin_episode<P>(&mut self, area: &FlowerArea, physics: &mut P) -> SpawnOutcome
    where
        P: PhysicsBackend + ?Sized,
    {
        physics.zero_velocities(self.id);
        self.nectar_obtained = 0.0;
        self.pending_reward = 0.0;
        self.cumulative_reward = 0.0;
        self.step_count = 0;

        let in_front_of_flower = if self.config.training_mode {
            self.spawner.sample_in_front_of_flower()
        } else {
            true
        };
        let outcome = self.spawner.place_pose(area, &*physics, in_front_of_flower);
        if !outcome.safe {
            self.spawn_fallbacks += 1;
        }

        // Steep spawns (above a flower facing the sky) start at the pitch limit
        self.motion.reset_to(&outcome.pose.rotation);
        self.pose = Pose::new(outcome.pose.position, self.motion.rotation());
        physics.set_pose(self.id, self.pose.position, self.pose.rotation);

        let beak_tip = self.beak_tip();
        self.tracker.recompute(area, &beak_tip);

        self.episode += 1;
        debug!(
            "Agent '{}' episode {} begins at {:?} ({} attempts, in_front={})",
            self.config.name, self.episode, self.pose.position, outcome.attempts, in_front_of_flower
        );
        SpawnOutcome {
            pose: self.pose,
            ..outcome
        }
    }

    /// Builds this tick's observation, retargeting first if needed.
    pub fn collect_observations(&mut self, area: &FlowerArea) -> Observation {
        self.refresh_nearest(area);
        let beak_tip = self.beak_tip();
        let relative = area.rotation().inverse() * self.pose.rotation;
        self.encoder.encode(&relative, &beak_tip, self.tracker.target(area))
    }

    /// Applies an action for one step of `dt` seconds.
    ///
    /// Frozen agents ignore actions entirely.
    pub fn on_action_received<P>(&mut self, action: &[f32], dt: f32, physics: &mut P) -> Result<(), CoreError>
    where
        P: PhysicsBackend + ?Sized,
    {
        let action: &Action = action.try_into().map_err(|_| CoreError::ActionArity {
            expected: ACTION_SIZE,
            got: action.len(),
        })?;

        if self.frozen {
            return Ok(());
        }

        let command = self.motion.step(action, dt);
        physics.add_force(self.id, command.force);
        physics.set_rotation(self.id, command.rotation);
        self.pose.rotation = command.rotation;
        self.step_count += 1;
        Ok(())
    }

    /// Routes a physics contact to the feeding controller and books the result.
    pub fn handle_contact<P>(
        &mut self,
        event: ContactEvent,
        area: &mut FlowerArea,
        physics: &P,
        tick: u64,
    ) -> Result<ContactOutcome, CoreError>
    where
        P: PhysicsBackend + ?Sized,
    {
        let outcome = match event {
            ContactEvent::Proximity { zone } => {
                let beak_tip = self.beak_tip();
                let forward = self.pose.forward();
                self.feeding
                    .on_proximity(zone, &beak_tip, &forward, tick, area, physics, &mut self.tracker)?
            }
            ContactEvent::Collision { surface } => self.feeding.on_collision(surface),
        };

        self.nectar_obtained += outcome.nectar();
        self.add_reward(outcome.reward());
        Ok(outcome)
    }

    /// Retargets if the tracked flower was drained, possibly by someone else.
    pub fn refresh_nearest(&mut self, area: &FlowerArea) -> Option<FlowerIndex> {
        let beak_tip = self.beak_tip();
        self.tracker.refresh(area, &beak_tip)
    }

    /// Picks the nearest flower again, e.g. after the area was rearranged.
    pub fn retarget(&mut self, area: &FlowerArea) -> Option<FlowerIndex> {
        let beak_tip = self.beak_tip();
        self.tracker.recompute(area, &beak_tip)
    }

    /// Copies the body position back from the physics world.
    pub fn sync_position(&mut self, position: Point3<f32>) {
        self.pose.position = position;
    }

    /// Stops the agent and puts its body to sleep. Gameplay mode only.
    pub fn freeze<P>(&mut self, physics: &mut P) -> Result<(), CoreError>
    where
        P: PhysicsBackend + ?Sized,
    {
        if self.config.training_mode {
            return Err(CoreError::FreezeInTraining);
        }
        self.frozen = true;
        physics.set_sleeping(self.id, true);
        Ok(())
    }

    /// Resumes a frozen agent. Gameplay mode only.
    pub fn unfreeze<P>(&mut self, physics: &mut P) -> Result<(), CoreError>
    where
        P: PhysicsBackend + ?Sized,
    {
        if self.config.training_mode {
            return Err(CoreError::FreezeInTraining);
        }
        self.frozen = false;
        physics.set_sleeping(self.id, false);
        Ok(())
    }

    pub fn add_reward(&mut self, reward: f32) {
        self.pending_reward += reward;
        self.cumulative_reward += reward;
    }

    /// Returns and clears the reward earned since the last call.
    pub fn take_reward(&mut self) -> f32 {
        std::mem::take(&mut self.pending_reward)
    }

    pub fn cumulative_reward(&self) -> f32 {
        self.cumulative_reward
    }

    /// True once a bounded episode has used up its steps.
    pub fn is_episode_done(&self) -> bool {
        self.max_step > 0 && self.step_count >= self.max_step
    }

    /// Beak tip in world coordinates.
    pub fn beak_tip(&self) -> Point3<f32> {
        self.pose.transform_point(&self.config.beak_tip_offset)
    }

    pub fn nearest_flower<'a>(&self, area: &'a FlowerArea) -> Option<&'a Flower> {
        self.tracker.target(area)
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn nectar_obtained(&self) -> f32 {
        self.nectar_obtained
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn max_step(&self) -> u64 {
        self.max_step
    }

    pub fn episode(&self) -> u64 {
        self.episode
    }

    pub fn spawn_fallbacks(&self) -> u64 {
        self.spawn_fallbacks
    }
}
