//! SimWorld - one arena, its agents and the physics stand-in.

use crate::error::SimError;
use crate::exporter::{AgentFrame, FlowerEventLog, FlowerFrame, SimEvent, SimFrame};
use crate::physics::{ArenaConfig, ArenaPhysics};
use crate::policy::{Policy, PolicyKind};

use hummingbird_core::geometry::pitch_yaw_degrees;
use hummingbird_core::{AgentConfig, ContactOutcome, FlowerArea, HummingbirdAgent, SceneDescription};
use hummingbird_env::AgentId;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Tolerance for nectar bookkeeping across one tick.
const NECTAR_EPSILON: f32 = 1e-4;

/// Configuration for a simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Master seed for determinism
    pub seed: u64,

    /// Number of agents sharing the arena
    pub num_agents: usize,

    /// Tick rate in Hz
    pub tick_rate_hz: u32,

    /// Maximum simulation duration in seconds
    pub max_duration_secs: f64,

    /// Rewards, area resets and bounded episodes
    pub training_mode: bool,

    /// Steps per training episode
    pub max_step: u64,

    pub policy: PolicyKind,

    pub arena: ArenaConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            num_agents: 1,
            tick_rate_hz: 50,
            max_duration_secs: 60.0,
            training_mode: true,
            max_step: 5000,
            policy: PolicyKind::SeekNearest,
            arena: ArenaConfig::default(),
        }
    }
}

impl SimConfig {
    /// Agent configuration for the agent at `index`.
    pub fn agent_config(&self, index: usize) -> AgentConfig {
        let base = if self.training_mode {
            AgentConfig::default().with_max_step(self.max_step)
        } else {
            AgentConfig::gameplay()
        };
        let mut config = base.with_name(format!("bird-{index}"));
        config.beak_tip_offset = self.arena.beak_offset;
        config
    }
}

/// Counters and invariant checks gathered while stepping.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WorldStats {
    /// Contacts that moved nectar
    pub feeds: u64,

    pub nectar_collected: f64,
    pub total_reward: f64,
    pub boundary_hits: u64,

    /// Zone contacts turned down by the beak-tip gate
    pub out_of_reach: u64,

    /// Zone contacts that lost the race for an already fed flower
    pub contested_feeds: u64,

    pub depletions: u64,
    pub episodes: u64,
    pub spawn_fallbacks: u64,

    /// Broken invariants, in order of detection
    pub violations: Vec<String>,
}

impl WorldStats {
    fn record(&mut self, outcome: &ContactOutcome) {
        match outcome {
            ContactOutcome::Fed { nectar, depleted, .. } => {
                if *nectar > 0.0 {
                    self.feeds += 1;
                }
                self.nectar_collected += *nectar as f64;
                if *depleted {
                    self.depletions += 1;
                }
            }
            ContactOutcome::OutOfReach { .. } => self.out_of_reach += 1,
            ContactOutcome::AlreadyFed { .. } => self.contested_feeds += 1,
            ContactOutcome::BoundaryPenalty { .. } => self.boundary_hits += 1,
            ContactOutcome::Ignored => {}
        }
    }

    fn violation(&mut self, message: String) {
        warn!("Invariant violated: {}", message);
        self.violations.push(message);
    }
}

/// An agent together with the policy steering it.
pub struct SimAgent {
    pub agent: HummingbirdAgent,
    pub policy: Box<dyn Policy>,
}

/// The SimWorld - container for the entire simulation.
pub struct SimWorld {
    /// Configuration
    pub config: SimConfig,

    pub area: FlowerArea,

    pub physics: ArenaPhysics,

    agents: Vec<SimAgent>,

    /// Flower state sink
    events: FlowerEventLog,

    stats: WorldStats,

    /// Current tick count
    tick_count: u64,
}

impl SimWorld {
    /// Builds the arena, spawns every agent and starts their first episode.
    pub fn new(config: SimConfig, scene: &SceneDescription) -> Result<Self, SimError> {
        // Derive separate seeds for different subsystems
        let area_seed = config.seed;
        let spawn_seed = config.seed.wrapping_mul(0x9e3779b97f4a7c15);
        let policy_seed = config.seed.wrapping_mul(0x517cc1b727220a95);

        let area = FlowerArea::build(scene, area_seed)?;
        let mut physics = ArenaPhysics::new(config.arena.clone());
        physics.sync_flowers(&area);

        let mut agents = Vec::with_capacity(config.num_agents);
        for i in 0..config.num_agents {
            let id = AgentId::from_seed(i as u64);
            let mut agent = HummingbirdAgent::new(id, config.agent_config(i), spawn_seed.wrapping_add(i as u64))?;
            agent.init();
            physics.add_body(id, *agent.pose());
            let policy = config.policy.build(policy_seed.wrapping_add(i as u64));
            agents.push(SimAgent { agent, policy });
        }

        let mut world = Self {
            config,
            area,
            physics,
            agents,
            events: FlowerEventLog::default(),
            stats: WorldStats::default(),
            tick_count: 0,
        };
        let everyone: Vec<usize> = (0..world.agents.len()).collect();
        world.begin_episodes(&everyone);

        debug!(
            "SimWorld ready: {} agents, {} flowers, seed={}",
            world.agents.len(),
            world.area.flower_count(),
            world.config.seed
        );
        Ok(world)
    }

    /// Starts new episodes for the agents at `indices`.
    ///
    /// The shared area is reset (training only) and pushed to physics once,
    /// before any of them is placed, so every spawn is checked against the
    /// layout it will actually fly in.
    fn begin_episodes(&mut self, indices: &[usize]) {
        if indices.is_empty() {
            return;
        }

        if self.config.training_mode {
            self.area.reset_area();
            self.physics.sync_flowers(&self.area);
        }

        for &index in indices {
            let agent = &mut self.agents[index].agent;
            let outcome = agent.on_episode_begin_in_shared_area(&self.area, &mut self.physics);
            self.stats.episodes += 1;
            if !outcome.safe {
                self.stats.spawn_fallbacks += 1;
                self.events
                    .push(SimEvent::warn(format!("{} spawned without a safe position", agent.name())));
            }
        }

        if self.config.training_mode {
            // Agents mid-episode were targeting the old layout
            for (index, entry) in self.agents.iter_mut().enumerate() {
                if !indices.contains(&index) {
                    entry.agent.retarget(&self.area);
                }
            }
        }

        self.area.publish_state_changes(&mut self.physics, &mut self.events);
    }

    fn dt(&self) -> f32 {
        1.0 / self.config.tick_rate_hz.max(1) as f32
    }

    /// Advances the simulation by one tick.
    ///
    /// Order: contacts, observation, action, physics, position sync,
    /// flower state publication, episode turnover.
    pub fn tick(&mut self) -> Result<(), SimError> {
        let dt = self.dt();
        let tick = self.tick_count;

        // Contacts from the previous physics step
        let before = self.area.nectar_remaining();
        let mut credited = 0.0;
        for (id, event) in self.physics.drain_contacts() {
            let Some(entry) = self.agents.iter_mut().find(|a| a.agent.id() == id) else {
                continue;
            };
            let outcome = entry.agent.handle_contact(event, &mut self.area, &self.physics, tick)?;
            credited += outcome.nectar();
            self.stats.record(&outcome);
        }
        let drained = before - self.area.nectar_remaining();
        if (drained - credited).abs() > NECTAR_EPSILON {
            self.stats.violation(format!(
                "tick {tick}: flowers lost {drained:.5} nectar but agents got {credited:.5}"
            ));
        }

        // Observe and act
        for entry in &mut self.agents {
            let observation = entry.agent.collect_observations(&self.area);
            if !observation.iter().all(|c| c.is_finite()) {
                self.stats
                    .violation(format!("tick {tick}: non-finite observation for {}", entry.agent.name()));
            }
            if entry.agent.nearest_flower(&self.area).is_some_and(|f| !f.has_nectar()) {
                self.stats
                    .violation(format!("tick {tick}: {} targets an empty flower", entry.agent.name()));
            }

            let action = entry.policy.act(&observation);
            entry.agent.on_action_received(&action, dt, &mut self.physics)?;

            if !entry.agent.is_frozen() {
                let (pitch, _) = pitch_yaw_degrees(&entry.agent.pose().rotation);
                let limit = entry.agent.config().motion.max_pitch;
                if pitch.abs() > limit + 1e-2 {
                    self.stats
                        .violation(format!("tick {tick}: {} pitched to {pitch:.2}", entry.agent.name()));
                }
            }
            self.stats.total_reward += entry.agent.take_reward() as f64;
        }

        self.physics.step(dt);

        for entry in &mut self.agents {
            let body = self.physics.body(entry.agent.id())?;
            entry.agent.sync_position(body.position);
        }

        self.area.publish_state_changes(&mut self.physics, &mut self.events);
        for flower in self.area.flowers() {
            let nectar = flower.nectar();
            if !(0.0..=1.0).contains(&nectar) || flower.is_active() != (nectar > 0.0) {
                self.stats.violation(format!(
                    "tick {tick}: flower '{}' has nectar {nectar} with active={}",
                    flower.name(),
                    flower.is_active()
                ));
            }
        }

        let finished: Vec<usize> = (0..self.agents.len())
            .filter(|&index| self.agents[index].agent.is_episode_done())
            .collect();
        self.begin_episodes(&finished);

        self.tick_count += 1;
        Ok(())
    }

    /// Freezes an agent (gameplay only).
    pub fn freeze_agent(&mut self, index: usize) -> Result<(), SimError> {
        let entry = self.agents.get_mut(index).ok_or(SimError::NoSuchAgent(index))?;
        entry.agent.freeze(&mut self.physics)?;
        self.events.push(SimEvent::info(format!("{} frozen", entry.agent.name())));
        Ok(())
    }

    /// Unfreezes an agent (gameplay only).
    pub fn unfreeze_agent(&mut self, index: usize) -> Result<(), SimError> {
        let entry = self.agents.get_mut(index).ok_or(SimError::NoSuchAgent(index))?;
        entry.agent.unfreeze(&mut self.physics)?;
        self.events.push(SimEvent::info(format!("{} unfrozen", entry.agent.name())));
        Ok(())
    }

    /// Starts keeping flower and agent events for frame export.
    pub fn record_events(&mut self, recording: bool) {
        self.events.set_recording(recording);
    }

    /// Captures the current state as an export frame.
    pub fn snapshot(&mut self) -> SimFrame {
        let agents = self
            .agents
            .iter()
            .map(|entry| {
                let agent = &entry.agent;
                let (pitch, yaw) = pitch_yaw_degrees(&agent.pose().rotation);
                let position = agent.pose().position;
                AgentFrame {
                    name: agent.name().to_string(),
                    x: position.x,
                    y: position.y,
                    z: position.z,
                    pitch,
                    yaw,
                    nectar_obtained: agent.nectar_obtained(),
                    cumulative_reward: agent.cumulative_reward(),
                    target_zone: agent.nearest_flower(&self.area).map(|f| f.zone().0),
                    frozen: agent.is_frozen(),
                }
            })
            .collect();

        let flowers = self
            .area
            .flowers()
            .iter()
            .map(|flower| FlowerFrame {
                zone: flower.zone().0,
                x: flower.center().x,
                y: flower.center().y,
                z: flower.center().z,
                nectar: flower.nectar(),
                active: flower.is_active(),
            })
            .collect();

        SimFrame {
            time_sec: self.time(),
            tick: self.tick_count,
            agents,
            flowers,
            events: self.events.drain(),
        }
    }

    pub fn agent(&self, index: usize) -> Option<&HummingbirdAgent> {
        self.agents.get(index).map(|entry| &entry.agent)
    }

    pub fn agents(&self) -> impl Iterator<Item = &HummingbirdAgent> {
        self.agents.iter().map(|entry| &entry.agent)
    }

    pub fn stats(&self) -> &WorldStats {
        &self.stats
    }

    pub fn flower_events(&self) -> &FlowerEventLog {
        &self.events
    }

    /// Returns the current simulation time in seconds.
    pub fn time(&self) -> f64 {
        self.physics.time()
    }

    /// Returns the current tick count.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Returns the number of agents.
    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }
}
