//! In-crate physics double for unit tests.

use hummingbird_env::{AgentId, EnvError, PhysicsBackend, ZoneId};
use nalgebra::{Point3, UnitQuaternion, Vector3};
use std::cell::Cell;
use std::collections::{HashMap, HashSet};

/// Records everything the core pushes and answers queries from fixed data.
#[derive(Debug, Default)]
pub struct MockPhysics {
    /// Solid spheres (center, radius)
    pub obstacles: Vec<(Point3<f32>, f32)>,

    /// Every overlap query reports a hit
    pub blocked_everywhere: bool,

    /// Spherical feeding zones (center, radius)
    pub zones: HashMap<ZoneId, (Point3<f32>, f32)>,

    pub disabled_zones: HashSet<ZoneId>,
    pub overlap_queries: Cell<usize>,
    pub forces: Vec<(AgentId, Vector3<f32>)>,
    pub poses: Vec<(AgentId, Point3<f32>, UnitQuaternion<f32>)>,
    pub rotations: Vec<(AgentId, UnitQuaternion<f32>)>,
    pub velocity_resets: usize,
    pub sleeping: HashSet<AgentId>,
}

impl MockPhysics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blocked() -> Self {
        Self {
            blocked_everywhere: true,
            ..Self::default()
        }
    }

    pub fn with_zone(mut self, zone: ZoneId, center: Point3<f32>, radius: f32) -> Self {
        self.zones.insert(zone, (center, radius));
        self
    }
}

impl PhysicsBackend for MockPhysics {
    fn overlap_count(&self, center: &Point3<f32>, radius: f32) -> usize {
        self.overlap_queries.set(self.overlap_queries.get() + 1);
        if self.blocked_everywhere {
            return 1;
        }
        self.obstacles
            .iter()
            .filter(|(c, r)| (c - center).norm() < r + radius)
            .count()
    }

    fn closest_point(&self, zone: ZoneId, point: &Point3<f32>) -> Result<Point3<f32>, EnvError> {
        let (center, radius) = self.zones.get(&zone).ok_or(EnvError::UnknownZone(zone))?;
        let offset = point - center;
        let distance = offset.norm();
        if distance <= *radius {
            Ok(*point)
        } else {
            Ok(center + offset * (radius / distance))
        }
    }

    fn add_force(&mut self, body: AgentId, force: Vector3<f32>) {
        self.forces.push((body, force));
    }

    fn zero_velocities(&mut self, _body: AgentId) {
        self.velocity_resets += 1;
    }

    fn set_pose(&mut self, body: AgentId, position: Point3<f32>, rotation: UnitQuaternion<f32>) {
        self.poses.push((body, position, rotation));
    }

    fn set_rotation(&mut self, body: AgentId, rotation: UnitQuaternion<f32>) {
        self.rotations.push((body, rotation));
    }

    fn set_sleeping(&mut self, body: AgentId, sleeping: bool) {
        if sleeping {
            self.sleeping.insert(body);
        } else {
            self.sleeping.remove(&body);
        }
    }

    fn set_flower_enabled(&mut self, zone: ZoneId, enabled: bool) {
        if enabled {
            self.disabled_zones.remove(&zone);
        } else {
            self.disabled_zones.insert(zone);
        }
    }
}
