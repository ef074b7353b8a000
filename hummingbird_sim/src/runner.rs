//! Scenario runner - executes foraging scenarios and checks their outcome.

use crate::error::SimError;
use crate::exporter::SimExport;
use crate::physics::ArenaConfig;
use crate::scenarios::ScenarioId;
use crate::world::{SimConfig, SimWorld, WorldStats};

use hummingbird_core::SceneDescription;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether scenario passed all assertions
    pub passed: bool,

    /// Total ticks executed
    pub total_ticks: u64,

    /// Final simulation time in seconds
    pub final_time_secs: f64,

    /// Flowers with nectar at the end
    pub final_flowers_with_nectar: usize,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// Metrics collected during run
    pub metrics: ScenarioMetrics,
}

/// Metrics collected during scenario execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScenarioMetrics {
    pub feeds: u64,
    pub nectar_collected: f64,
    pub total_reward: f64,
    pub boundary_hits: u64,
    pub out_of_reach: u64,
    pub contested_feeds: u64,
    pub depletions: u64,
    pub episodes: u64,
    pub spawn_fallbacks: u64,
}

impl From<&WorldStats> for ScenarioMetrics {
    fn from(stats: &WorldStats) -> Self {
        Self {
            feeds: stats.feeds,
            nectar_collected: stats.nectar_collected,
            total_reward: stats.total_reward,
            boundary_hits: stats.boundary_hits,
            out_of_reach: stats.out_of_reach,
            contested_feeds: stats.contested_feeds,
            depletions: stats.depletions,
            episodes: stats.episodes,
            spawn_fallbacks: stats.spawn_fallbacks,
        }
    }
}

/// Runs foraging scenarios.
pub struct ScenarioRunner {
    /// Configuration seed
    seed: u64,

    /// Number of agents
    num_agents: usize,

    /// Tick rate in Hz
    tick_rate_hz: u32,

    /// Maximum duration in seconds
    max_duration_secs: f64,

    /// Scene replacing the built-in meadow
    scene: Option<SceneDescription>,

    /// Ticks between exported frames
    export_interval: u64,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(seed: u64, num_agents: usize) -> Self {
        Self {
            seed,
            num_agents,
            tick_rate_hz: 50,
            max_duration_secs: 20.0,
            scene: None,
            export_interval: 10,
        }
    }

    /// Sets the tick rate.
    pub fn with_tick_rate(mut self, hz: u32) -> Self {
        self.tick_rate_hz = hz.max(1);
        self
    }

    /// Sets the maximum duration.
    pub fn with_duration(mut self, secs: f64) -> Self {
        self.max_duration_secs = secs;
        self
    }

    /// Uses a custom scene instead of the built-in meadow.
    pub fn with_scene(mut self, scene: SceneDescription) -> Self {
        self.scene = Some(scene);
        self
    }

    /// Sets how many ticks pass between exported frames.
    pub fn with_export_interval(mut self, ticks: u64) -> Self {
        self.export_interval = ticks.max(1);
        self
    }

    /// Runs a scenario and returns the result.
    pub fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        self.run_inner(scenario, None)
    }

    /// Runs a scenario and records frames into an export.
    pub fn run_with_export(&self, scenario: ScenarioId) -> (ScenarioResult, SimExport) {
        let mut export = SimExport::new(scenario.name(), self.seed);
        let result = self.run_inner(scenario, Some(&mut export));
        export.finalize(result.passed, Some(result.metrics.nectar_collected));
        (result, export)
    }

    fn run_inner(&self, scenario: ScenarioId, export: Option<&mut SimExport>) -> ScenarioResult {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);

        match self.execute(scenario, export) {
            Ok(result) => result,
            Err(e) => {
                warn!("Scenario {} aborted: {}", scenario.name(), e);
                ScenarioResult {
                    scenario,
                    seed: self.seed,
                    passed: false,
                    total_ticks: 0,
                    final_time_secs: 0.0,
                    final_flowers_with_nectar: 0,
                    failure_reason: Some(format!("aborted: {e}")),
                    metrics: ScenarioMetrics::default(),
                }
            }
        }
    }

    fn config_for(&self, scenario: ScenarioId) -> SimConfig {
        let base = SimConfig {
            seed: self.seed,
            num_agents: self.num_agents.max(scenario.min_agents()),
            tick_rate_hz: self.tick_rate_hz,
            max_duration_secs: self.max_duration_secs,
            ..SimConfig::default()
        };

        match scenario {
            ScenarioId::SoloForage => SimConfig { num_agents: 1, ..base },
            ScenarioId::SharedMeadow => base,
            ScenarioId::BlockedSpawn => SimConfig {
                num_agents: 1,
                arena: ArenaConfig {
                    boundary_radius: 1.0,
                    ..ArenaConfig::default()
                },
                ..base
            },
            ScenarioId::Gameplay => SimConfig {
                training_mode: false,
                max_step: 0,
                ..base
            },
        }
    }

    fn scene_for(&self, scenario: ScenarioId) -> SceneDescription {
        if let Some(scene) = &self.scene {
            return scene.clone();
        }
        match scenario {
            ScenarioId::SharedMeadow => SceneDescription::meadow(4, 3),
            _ => SceneDescription::meadow(3, 3),
        }
    }

    fn execute(&self, scenario: ScenarioId, mut export: Option<&mut SimExport>) -> Result<ScenarioResult, SimError> {
        let config = self.config_for(scenario);
        let mut world = SimWorld::new(config, &self.scene_for(scenario))?;
        world.record_events(export.is_some());

        let target_ticks = (self.max_duration_secs * self.tick_rate_hz as f64) as u64;
        let freeze_window = (target_ticks / 3, 2 * target_ticks / 3);
        let mut held_position = None;
        let mut failures: Vec<String> = Vec::new();

        for tick in 0..target_ticks {
            if scenario == ScenarioId::Gameplay {
                if tick == freeze_window.0 {
                    world.freeze_agent(0)?;
                    held_position = world.agent(0).map(|a| a.pose().position);
                }
                if tick == freeze_window.1 {
                    world.unfreeze_agent(0)?;
                    held_position = None;
                }
            }

            world.tick()?;

            if let (Some(held), Some(agent)) = (held_position, world.agent(0)) {
                if agent.pose().position != held {
                    failures.push(format!("tick {tick}: frozen agent moved"));
                    held_position = None;
                }
            }

            if let Some(export) = export.as_deref_mut() {
                if tick % self.export_interval == 0 {
                    export.add_frame(world.snapshot());
                }
            }

            if tick % self.tick_rate_hz as u64 == 0 {
                debug!(
                    "  t={:.1}s | feeds={} | nectar left={:.2}",
                    world.time(),
                    world.stats().feeds,
                    world.area.nectar_remaining()
                );
            }
        }

        failures.extend(world.stats().violations.iter().cloned());
        failures.extend(self.check_outcome(scenario, &world));

        let metrics = ScenarioMetrics::from(world.stats());
        let passed = failures.is_empty();
        if passed {
            info!(
                "Scenario {}: {} feeds, {:.2} nectar, reward {:.2}",
                scenario.name(),
                metrics.feeds,
                metrics.nectar_collected,
                metrics.total_reward
            );
        }

        Ok(ScenarioResult {
            scenario,
            seed: self.seed,
            passed,
            total_ticks: target_ticks,
            final_time_secs: world.time(),
            final_flowers_with_nectar: world.area.flowers_with_nectar(),
            failure_reason: failures.into_iter().next(),
            metrics,
        })
    }

    /// Scenario-specific assertions on the final world.
    fn check_outcome(&self, scenario: ScenarioId, world: &SimWorld) -> Vec<String> {
        let stats = world.stats();
        let mut failures = Vec::new();

        match scenario {
            ScenarioId::SoloForage | ScenarioId::SharedMeadow => {
                let expected = world.agent_count() as u64;
                if stats.episodes < expected {
                    failures.push(format!("only {} episodes for {} agents", stats.episodes, expected));
                }
                if scenario == ScenarioId::SoloForage && (stats.feeds == 0 || stats.nectar_collected <= 0.0) {
                    failures.push(format!(
                        "no nectar collected ({} feeds, {} contacts out of reach)",
                        stats.feeds, stats.out_of_reach
                    ));
                }
            }
            ScenarioId::BlockedSpawn => {
                if stats.spawn_fallbacks != stats.episodes {
                    failures.push(format!(
                        "{} of {} spawns found a free spot in a blocked arena",
                        stats.episodes - stats.spawn_fallbacks,
                        stats.episodes
                    ));
                }
                if world.tick_count() > 1 && stats.boundary_hits == 0 {
                    failures.push("agent spawned outside the wall without a boundary penalty".to_string());
                }
            }
            ScenarioId::Gameplay => {
                if stats.total_reward != 0.0 {
                    failures.push(format!("gameplay paid out reward {}", stats.total_reward));
                }
                if stats.episodes != world.agent_count() as u64 {
                    failures.push(format!("gameplay episodes restarted ({} episodes)", stats.episodes));
                }
                if world.agents().any(|a| a.is_frozen()) {
                    failures.push("agent still frozen at the end".to_string());
                }
            }
        }

        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solo_forage_scenario() {
        let runner = ScenarioRunner::new(42, 1);

        let result = runner.run(ScenarioId::SoloForage);

        assert!(result.passed, "{:?}", result.failure_reason);
        assert_eq!(result.total_ticks, 1000);
        assert_eq!(result.metrics.episodes, 1);
        assert!(result.metrics.feeds > 0);
        assert!(result.metrics.nectar_collected > 0.0);
        assert!(result.metrics.depletions > 0);
    }

    #[test]
    fn test_solo_forage_fails_without_feeding() {
        let runner = ScenarioRunner::new(42, 1).with_duration(0.02);

        let result = runner.run(ScenarioId::SoloForage);

        assert!(!result.passed);
        assert_eq!(result.metrics.feeds, 0);
        assert!(result.failure_reason.unwrap().contains("no nectar collected"));
    }

    #[test]
    fn test_shared_meadow_scenario() {
        let runner = ScenarioRunner::new(7, 4).with_duration(4.0);

        let result = runner.run(ScenarioId::SharedMeadow);

        assert!(result.passed, "{:?}", result.failure_reason);
        assert_eq!(result.metrics.episodes, 4);
    }

    #[test]
    fn test_blocked_spawn_scenario() {
        let runner = ScenarioRunner::new(42, 1).with_duration(1.0);

        let result = runner.run(ScenarioId::BlockedSpawn);

        assert!(result.passed, "{:?}", result.failure_reason);
        assert_eq!(result.metrics.spawn_fallbacks, 1);
        assert!(result.metrics.boundary_hits >= 1);
    }

    #[test]
    fn test_gameplay_scenario() {
        let runner = ScenarioRunner::new(42, 2).with_duration(3.0);

        let result = runner.run(ScenarioId::Gameplay);

        assert!(result.passed, "{:?}", result.failure_reason);
        assert_eq!(result.metrics.total_reward, 0.0);
        assert_eq!(result.metrics.episodes, 2);
    }

    #[test]
    fn test_runs_are_deterministic() {
        let runner1 = ScenarioRunner::new(42, 3).with_duration(2.0);
        let runner2 = ScenarioRunner::new(42, 3).with_duration(2.0);

        let result1 = runner1.run(ScenarioId::SharedMeadow);
        let result2 = runner2.run(ScenarioId::SharedMeadow);

        assert_eq!(result1.metrics, result2.metrics);
        assert_eq!(result1.final_flowers_with_nectar, result2.final_flowers_with_nectar);
    }

    #[test]
    fn test_export_collects_frames() {
        let runner = ScenarioRunner::new(42, 1).with_export_interval(100);

        let (result, export) = runner.run_with_export(ScenarioId::SoloForage);

        assert!(result.passed, "{:?}", result.failure_reason);
        assert_eq!(export.frames.len(), 10);
        assert_eq!(export.scenario, "solo_forage");
        assert_eq!(export.passed, result.passed);
    }

    #[test]
    fn test_custom_scene_is_used() {
        let runner = ScenarioRunner::new(42, 2)
            .with_duration(0.5)
            .with_scene(SceneDescription::meadow(1, 2));

        let result = runner.run(ScenarioId::Gameplay);

        assert!(result.passed, "{:?}", result.failure_reason);
        assert!(result.final_flowers_with_nectar <= 2);
    }
}
