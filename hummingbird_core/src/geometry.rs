//! Frame conventions and small angle helpers.
//!
//! The arena is Y-up with +Z as "forward". Euler angles are in degrees and
//! composed as yaw (Y) * pitch (X) * roll (Z), so positive pitch lowers the
//! nose and positive yaw turns toward +X.

use nalgebra::{Point3, Unit, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Position and orientation of a body in the arena frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Point3<f32>,
    pub rotation: UnitQuaternion<f32>,
}

impl Pose {
    pub fn new(position: Point3<f32>, rotation: UnitQuaternion<f32>) -> Self {
        Self { position, rotation }
    }

    /// Pose at the origin looking down +Z.
    pub fn identity() -> Self {
        Self::new(Point3::origin(), UnitQuaternion::identity())
    }

    /// Unit forward axis of this pose.
    pub fn forward(&self) -> Vector3<f32> {
        forward(&self.rotation)
    }

    /// Transforms a point given in the body frame into the arena frame.
    pub fn transform_point(&self, local: &Vector3<f32>) -> Point3<f32> {
        self.position + self.rotation * local
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

/// World up axis.
pub fn world_up() -> Vector3<f32> {
    Vector3::y()
}

/// Rotation from Euler angles in degrees (about X, Y, Z; applied Z, X, Y).
pub fn euler_degrees(x: f32, y: f32, z: f32) -> UnitQuaternion<f32> {
    let yaw = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), y.to_radians());
    let pitch = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), x.to_radians());
    let roll = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), z.to_radians());
    yaw * pitch * roll
}

/// Forward (+Z) axis of a rotation.
pub fn forward(rotation: &UnitQuaternion<f32>) -> Vector3<f32> {
    rotation * Vector3::z()
}

/// Up (+Y) axis of a rotation.
pub fn up(rotation: &UnitQuaternion<f32>) -> Unit<Vector3<f32>> {
    Unit::new_normalize(rotation * Vector3::y())
}

/// Pitch and yaw (degrees) of a roll-free rotation, read off its forward axis.
///
/// When the forward axis is vertical the heading is taken from the up axis,
/// which then lies in the horizontal plane.
pub fn pitch_yaw_degrees(rotation: &UnitQuaternion<f32>) -> (f32, f32) {
    let f = forward(rotation);
    let pitch = (-f.y).clamp(-1.0, 1.0).asin().to_degrees();
    let yaw = if f.x * f.x + f.z * f.z > 1e-10 {
        f.x.atan2(f.z)
    } else {
        // Nose down: up points along the heading; nose up: against it
        let u = up(rotation);
        let s = if f.y < 0.0 { 1.0 } else { -1.0 };
        (s * u.x).atan2(s * u.z)
    };
    (pitch, yaw.to_degrees())
}

/// Rotation whose forward axis points along `direction`, keeping `up` as
/// the secondary axis.
///
/// Degenerate inputs fall back instead of producing NaNs: a zero direction
/// gives the identity, and a direction parallel to `up` uses +Z as the
/// secondary axis.
pub fn look_rotation(direction: &Vector3<f32>, up: &Vector3<f32>) -> UnitQuaternion<f32> {
    if direction.norm_squared() < 1e-12 {
        return UnitQuaternion::identity();
    }
    let secondary = if direction.cross(up).norm_squared() < 1e-12 {
        Vector3::z()
    } else {
        *up
    };
    UnitQuaternion::face_towards(direction, &secondary)
}

/// Wraps an angle in degrees into [-180, 180].
pub fn wrap_degrees(angle: f32) -> f32 {
    let mut a = angle % 360.0;
    if a > 180.0 {
        a -= 360.0;
    } else if a < -180.0 {
        a += 360.0;
    }
    a
}

/// Moves `current` toward `target` by at most `max_delta`.
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    let diff = target - current;
    if diff.abs() <= max_delta {
        target
    } else {
        current + diff.signum() * max_delta
    }
}

/// Clamps to [0, 1]; NaN maps to 0.
pub fn clamp01(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
