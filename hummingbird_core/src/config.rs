//! Agent configuration.
//!
//! Defaults reproduce the stock hummingbird tuning. Every struct is
//! serde-serializable so runs can be configured from JSON.

use crate::error::CoreError;
use crate::flower_area::AREA_DIAMETER;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Translation force and kinematic rotation limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionConfig {
    /// Force applied per unit of movement action (default: 2.0)
    pub move_force: f32,

    /// Degrees per second at full pitch action (default: 100)
    pub pitch_speed: f32,

    /// Degrees per second at full yaw action (default: 100)
    pub yaw_speed: f32,

    /// Pitch clamp in degrees, both signs (default: 80)
    pub max_pitch: f32,

    /// Max change of the smoothed rotation rate per second (default: 2.0)
    pub smoothing_rate: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            move_force: 2.0,
            pitch_speed: 100.0,
            yaw_speed: 100.0,
            max_pitch: 80.0,
            smoothing_rate: 2.0,
        }
    }
}

/// Feeding gate, nectar transfer and reward shaping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedingConfig {
    /// Max distance from beak tip to zone surface for a contact to count (default: 0.008)
    pub beak_tip_radius: f32,

    /// Nectar requested per tick of contact (default: 0.01)
    pub feed_rate: f32,

    /// Reward per successful feed (default: 0.01)
    pub base_reward: f32,

    /// Extra reward scaled by head-on alignment (default: 0.02)
    pub orientation_bonus: f32,

    /// Reward for touching the arena boundary (default: -0.5)
    pub boundary_penalty: f32,
}

impl Default for FeedingConfig {
    fn default() -> Self {
        Self {
            beak_tip_radius: 0.008,
            feed_rate: 0.01,
            base_reward: 0.01,
            orientation_bonus: 0.02,
            boundary_penalty: -0.5,
        }
    }
}

/// Rejection sampling of episode start poses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnConfig {
    /// Sampling budget per placement (default: 100)
    pub max_attempts: u32,

    /// Radius of the overlap probe (default: 0.05)
    pub overlap_radius: f32,

    /// Distance in front of a flower [min, max] (default: [0.1, 0.2])
    pub flower_distance: [f32; 2],

    /// Height above the arena origin [min, max] (default: [1.2, 2.5])
    pub height: [f32; 2],

    /// Horizontal distance from the arena origin [min, max] (default: [2, 7])
    pub radius: [f32; 2],

    /// Pitch limit in degrees for free spawns (default: 60)
    pub max_pitch: f32,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            max_attempts: 100,
            overlap_radius: 0.05,
            flower_distance: [0.1, 0.2],
            height: [1.2, 2.5],
            radius: [2.0, 7.0],
            max_pitch: 60.0,
        }
    }
}

/// Configuration for a hummingbird agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Agent's logical name (for logging)
    pub name: String,

    /// Training mode enables rewards, area resets and random spawn branches
    pub training_mode: bool,

    /// Steps per episode in training mode (0 = unbounded; always unbounded outside training)
    pub max_step: u64,

    /// Beak tip position in the body frame
    pub beak_tip_offset: Vector3<f32>,

    /// Distance normaliser for observations (default: 20)
    pub arena_diameter: f32,

    pub motion: MotionConfig,
    pub feeding: FeedingConfig,
    pub spawn: SpawnConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: "hummingbird".to_string(),
            training_mode: true,
            max_step: 5000,
            beak_tip_offset: Vector3::new(0.0, 0.0, 0.15),
            arena_diameter: AREA_DIAMETER,
            motion: MotionConfig::default(),
            feeding: FeedingConfig::default(),
            spawn: SpawnConfig::default(),
        }
    }
}

impl AgentConfig {
    /// Gameplay (non-training) configuration.
    pub fn gameplay() -> Self {
        Self {
            training_mode: false,
            max_step: 0,
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_max_step(mut self, max_step: u64) -> Self {
        self.max_step = max_step;
        self
    }

    /// Checks ranges and signs. Called by the agent constructor.
    pub fn validate(&self) -> Result<(), CoreError> {
        fn positive(name: &str, value: f32) -> Result<(), CoreError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(CoreError::config(format!("{name} must be positive, got {value}")))
            }
        }
        fn range(name: &str, [lo, hi]: [f32; 2]) -> Result<(), CoreError> {
            if lo.is_finite() && hi.is_finite() && lo <= hi {
                Ok(())
            } else {
                Err(CoreError::config(format!("{name} must be an ordered range, got [{lo}, {hi}]")))
            }
        }

        positive("arena_diameter", self.arena_diameter)?;
        positive("motion.pitch_speed", self.motion.pitch_speed)?;
        positive("motion.yaw_speed", self.motion.yaw_speed)?;
        positive("motion.smoothing_rate", self.motion.smoothing_rate)?;
        if !(self.motion.max_pitch > 0.0 && self.motion.max_pitch < 90.0) {
            return Err(CoreError::config(format!(
                "motion.max_pitch must be in (0, 90), got {}",
                self.motion.max_pitch
            )));
        }
        if !self.motion.move_force.is_finite() {
            return Err(CoreError::config("motion.move_force must be finite"));
        }

        positive("feeding.beak_tip_radius", self.feeding.beak_tip_radius)?;
        if !(self.feeding.feed_rate.is_finite() && self.feeding.feed_rate >= 0.0) {
            return Err(CoreError::config("feeding.feed_rate must be non-negative"));
        }

        if self.spawn.max_attempts == 0 {
            return Err(CoreError::config("spawn.max_attempts must be at least 1"));
        }
        positive("spawn.overlap_radius", self.spawn.overlap_radius)?;
        range("spawn.flower_distance", self.spawn.flower_distance)?;
        range("spawn.height", self.spawn.height)?;
        range("spawn.radius", self.spawn.radius)?;

        if !self.beak_tip_offset.iter().all(|c| c.is_finite()) {
            return Err(CoreError::config("beak_tip_offset must be finite"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_config_default() {
        let config = AgentConfig::default();
        assert!(config.training_mode);
        assert_eq!(config.spawn.max_attempts, 100);
        assert_eq!(config.feeding.feed_rate, 0.01);
        assert_eq!(config.arena_diameter, 20.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_gameplay_is_unbounded() {
        let config = AgentConfig::gameplay();
        assert!(!config.training_mode);
        assert_eq!(config.max_step, 0);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AgentConfig::default();
        config.spawn.max_attempts = 0;
        assert!(matches!(config.validate(), Err(CoreError::InvalidConfig(_))));

        let mut config = AgentConfig::default();
        config.spawn.height = [3.0, 1.0];
        assert!(config.validate().is_err());

        let mut config = AgentConfig::default();
        config.motion.max_pitch = 95.0;
        assert!(config.validate().is_err());

        let mut config = AgentConfig::default();
        config.feeding.beak_tip_radius = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_json_roundtrip() {
        let config = AgentConfig::default().with_name("bird-7").with_max_step(250);
        let json = serde_json::to_string(&config).unwrap();
        let parsed: AgentConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.name, "bird-7");
        assert_eq!(parsed.max_step, 250);
        assert_eq!(parsed.spawn.max_attempts, 100);
    }
}
