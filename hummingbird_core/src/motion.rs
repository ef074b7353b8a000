//! Action interpretation: dynamic translation, kinematic rotation.

use crate::config::MotionConfig;
use crate::geometry::{euler_degrees, move_towards, pitch_yaw_degrees, wrap_degrees};
use nalgebra::{UnitQuaternion, Vector3};

/// Number of action components: `[move_x, move_y, move_z, pitch, yaw]`.
pub const ACTION_SIZE: usize = 5;

pub type Action = [f32; ACTION_SIZE];

/// What one motion step asks of the body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionCommand {
    /// World-space force to apply this tick
    pub force: Vector3<f32>,

    /// Orientation to set directly
    pub rotation: UnitQuaternion<f32>,
}

/// Pitch/yaw integrator with rate smoothing.
#[derive(Debug, Clone)]
pub struct MotionController {
    config: MotionConfig,
    pitch: f32,
    yaw: f32,
    smooth_pitch: f32,
    smooth_yaw: f32,
}

impl MotionController {
    pub fn new(config: MotionConfig) -> Self {
        Self {
            config,
            pitch: 0.0,
            yaw: 0.0,
            smooth_pitch: 0.0,
            smooth_yaw: 0.0,
        }
    }

    /// Adopts `rotation` as the current attitude and zeroes the smoothed rates.
    pub fn reset_to(&mut self, rotation: &UnitQuaternion<f32>) {
        let (pitch, yaw) = pitch_yaw_degrees(rotation);
        self.pitch = pitch.clamp(-self.config.max_pitch, self.config.max_pitch);
        self.yaw = yaw;
        self.smooth_pitch = 0.0;
        self.smooth_yaw = 0.0;
    }

    /// Pitch in degrees, always within `[-max_pitch, max_pitch]`.
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Yaw in degrees, unbounded.
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn smoothed_rates(&self) -> (f32, f32) {
        (self.smooth_pitch, self.smooth_yaw)
    }

    /// Roll-free attitude for the current pitch and yaw.
    pub fn rotation(&self) -> UnitQuaternion<f32> {
        euler_degrees(self.pitch, self.yaw, 0.0)
    }

    /// Integrates one action over `dt` seconds.
    ///
    /// Non-finite components count as zero and everything is clamped to
    /// `[-1, 1]`.
    pub fn step(&mut self, action: &Action, dt: f32) -> MotionCommand {
        let a = action.map(|c| if c.is_finite() { c.clamp(-1.0, 1.0) } else { 0.0 });
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        let force = Vector3::new(a[0], a[1], a[2]) * self.config.move_force;

        let max_delta = self.config.smoothing_rate * dt;
        self.smooth_pitch = move_towards(self.smooth_pitch, a[3], max_delta);
        self.smooth_yaw = move_towards(self.smooth_yaw, a[4], max_delta);

        let pitch = wrap_degrees(self.pitch + self.smooth_pitch * dt * self.config.pitch_speed);
        self.pitch = pitch.clamp(-self.config.max_pitch, self.config.max_pitch);
        self.yaw += self.smooth_yaw * dt * self.config.yaw_speed;

        MotionCommand {
            force,
            rotation: self.rotation(),
        }
    }
}
