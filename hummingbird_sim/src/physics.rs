//! Stand-in physics world for the simulation harness.
//!
//! Just enough physics to drive the core end to end:
//! - Point-mass bodies with linear drag and kinematic rotation
//! - One petal sphere per flower (solid) and one nectar sphere (trigger)
//! - A cylindrical arena wall with floor and ceiling
//!
//! Bodies touch a nectar sphere through a capsule running from the body
//! center to the beak tip, so most touches come from the body and are
//! turned down by the core's beak-tip gate.

use hummingbird_core::{FlowerArea, Pose, AREA_DIAMETER};
use hummingbird_env::{AgentId, ContactEvent, EnvError, PhysicsBackend, SurfaceTag, ZoneId};
use nalgebra::{Point3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Physical constants of the arena.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArenaConfig {
    /// Wall radius around the arena origin (default: 10)
    pub boundary_radius: f32,

    /// Floor height (default: 0)
    pub floor: f32,

    /// Ceiling height (default: 8)
    pub ceiling: f32,

    /// Collision radius of a body (default: 0.05)
    pub body_radius: f32,

    /// Beak tip in the body frame; end of the contact capsule
    pub beak_offset: Vector3<f32>,

    /// Body mass in kg (default: 1)
    pub mass: f32,

    /// Linear drag per second (default: 4)
    pub drag: f32,

    /// Radius of a nectar trigger sphere (default: 0.02)
    pub nectar_radius: f32,

    /// Radius of a petal sphere (default: 0.05)
    pub petal_radius: f32,

    /// How far the petal sphere sits behind the nectar center (default: 0.06)
    pub petal_offset: f32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            boundary_radius: AREA_DIAMETER / 2.0,
            floor: 0.0,
            ceiling: 8.0,
            body_radius: 0.05,
            beak_offset: Vector3::new(0.0, 0.0, 0.15),
            mass: 1.0,
            drag: 4.0,
            nectar_radius: 0.02,
            petal_radius: 0.05,
            petal_offset: 0.06,
        }
    }
}

/// A simulated rigid body.
#[derive(Debug, Clone)]
pub struct Body {
    pub id: AgentId,
    pub position: Point3<f32>,
    pub velocity: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub sleeping: bool,

    /// Force accumulated since the last step
    force: Vector3<f32>,
}

impl Body {
    fn new(id: AgentId, pose: Pose) -> Self {
        Self {
            id,
            position: pose.position,
            velocity: Vector3::zeros(),
            rotation: pose.rotation,
            sleeping: false,
            force: Vector3::zeros(),
        }
    }

    fn beak_tip(&self, offset: &Vector3<f32>) -> Point3<f32> {
        self.position + self.rotation * offset
    }
}

#[derive(Debug, Clone)]
struct FlowerVolume {
    center: Point3<f32>,
    up: Vector3<f32>,
    enabled: bool,
}

/// The arena physics world.
pub struct ArenaPhysics {
    config: ArenaConfig,

    /// Center of the arena floor
    origin: Point3<f32>,

    /// Bodies in insertion order
    bodies: Vec<Body>,

    /// Flower volumes by feeding zone
    flowers: BTreeMap<ZoneId, FlowerVolume>,

    /// Contacts produced by the last steps, not yet drained
    contacts: Vec<(AgentId, ContactEvent)>,

    /// Simulated time in seconds
    current_time: f64,
}

impl ArenaPhysics {
    pub fn new(config: ArenaConfig) -> Self {
        Self {
            config,
            origin: Point3::origin(),
            bodies: Vec::new(),
            flowers: BTreeMap::new(),
            contacts: Vec::new(),
            current_time: 0.0,
        }
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Adds a body, or moves it if it already exists.
    pub fn add_body(&mut self, id: AgentId, pose: Pose) {
        match self.bodies.iter_mut().find(|b| b.id == id) {
            Some(body) => {
                body.position = pose.position;
                body.rotation = pose.rotation;
            }
            None => self.bodies.push(Body::new(id, pose)),
        }
    }

    pub fn body(&self, id: AgentId) -> Result<&Body, EnvError> {
        self.bodies.iter().find(|b| b.id == id).ok_or(EnvError::UnknownBody(id))
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    fn body_mut(&mut self, id: AgentId) -> Option<&mut Body> {
        let body = self.bodies.iter_mut().find(|b| b.id == id);
        if body.is_none() {
            warn!("Physics command for unknown body {}", id);
        }
        body
    }

    /// Mirrors flower geometry and enabled state from the area.
    ///
    /// Needed after every area reset, since plants are re-oriented.
    pub fn sync_flowers(&mut self, area: &FlowerArea) {
        self.origin = area.origin();
        for flower in area.flowers() {
            self.flowers.insert(
                flower.zone(),
                FlowerVolume {
                    center: flower.center(),
                    up: flower.up().into_inner(),
                    enabled: flower.is_active(),
                },
            );
        }
    }

    /// Whether the zone's colliders are enabled, if the zone exists.
    pub fn flower_enabled(&self, zone: ZoneId) -> Option<bool> {
        self.flowers.get(&zone).map(|f| f.enabled)
    }

    fn petal_center(&self, flower: &FlowerVolume) -> Point3<f32> {
        flower.center - flower.up * self.config.petal_offset
    }

    /// Advances the world by `dt` seconds and records new contacts.
    pub fn step(&mut self, dt: f32) {
        self.current_time += dt as f64;
        let config = &self.config;

        for body in &mut self.bodies {
            let force = body.force;
            body.force = Vector3::zeros();
            if body.sleeping {
                continue;
            }

            body.velocity += force / config.mass * dt;
            body.velocity *= (1.0 - config.drag * dt).max(0.0);
            body.position += body.velocity * dt;

            // Petals
            for flower in self.flowers.values().filter(|f| f.enabled) {
                let petal = flower.center - flower.up * config.petal_offset;
                let offset = body.position - petal;
                let distance = offset.norm();
                let min_distance = config.petal_radius + config.body_radius;
                if distance < min_distance {
                    let normal = if distance > f32::EPSILON { offset / distance } else { flower.up };
                    body.position = petal + normal * min_distance;
                    remove_inward_velocity(&mut body.velocity, &normal);
                    self.contacts.push((body.id, ContactEvent::Collision { surface: SurfaceTag::Other }));
                }
            }

            for surface in confine(config, &self.origin, body) {
                self.contacts.push((body.id, ContactEvent::Collision { surface }));
            }

            // Nectar triggers
            let tip = body.beak_tip(&config.beak_offset);
            for (zone, flower) in self.flowers.iter().filter(|(_, f)| f.enabled) {
                let reach = config.nectar_radius + config.body_radius;
                if distance_to_segment(&body.position, &tip, &flower.center) < reach {
                    self.contacts.push((body.id, ContactEvent::Proximity { zone: *zone }));
                }
            }
        }
    }

    /// Takes all pending contacts in the order they happened.
    pub fn drain_contacts(&mut self) -> Vec<(AgentId, ContactEvent)> {
        std::mem::take(&mut self.contacts)
    }

    /// Returns the simulated time.
    pub fn time(&self) -> f64 {
        self.current_time
    }
}

/// Keeps a body inside the arena walls. Returns the surfaces it hit.
fn confine(config: &ArenaConfig, origin: &Point3<f32>, body: &mut Body) -> Vec<SurfaceTag> {
    let mut hits = Vec::new();
    let r = config.body_radius;

    let horizontal = Vector3::new(body.position.x - origin.x, 0.0, body.position.z - origin.z);
    let limit = config.boundary_radius - r;
    let distance = horizontal.norm();
    if distance > limit {
        let normal = -horizontal / distance;
        body.position.x = origin.x + horizontal.x * (limit / distance);
        body.position.z = origin.z + horizontal.z * (limit / distance);
        remove_inward_velocity(&mut body.velocity, &normal);
        hits.push(SurfaceTag::Boundary);
    }

    let ceiling = origin.y + config.ceiling - r;
    if body.position.y > ceiling {
        body.position.y = ceiling;
        body.velocity.y = body.velocity.y.min(0.0);
        hits.push(SurfaceTag::Boundary);
    }

    let floor = origin.y + config.floor + r;
    if body.position.y < floor {
        body.position.y = floor;
        body.velocity.y = body.velocity.y.max(0.0);
        hits.push(SurfaceTag::Other);
    }

    hits
}

/// Cancels the velocity component going into a surface with outward `normal`.
fn remove_inward_velocity(velocity: &mut Vector3<f32>, normal: &Vector3<f32>) {
    let into = velocity.dot(normal);
    if into < 0.0 {
        *velocity -= normal * into;
    }
}

fn distance_to_segment(a: &Point3<f32>, b: &Point3<f32>, p: &Point3<f32>) -> f32 {
    let ab = b - a;
    let length_sq = ab.norm_squared();
    let t = if length_sq > f32::EPSILON {
        ((p - a).dot(&ab) / length_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (p - (a + ab * t)).norm()
}

impl PhysicsBackend for ArenaPhysics {
    fn overlap_count(&self, center: &Point3<f32>, radius: f32) -> usize {
        let petals = self
            .flowers
            .values()
            .filter(|f| f.enabled)
            .filter(|f| (self.petal_center(f) - center).norm() < self.config.petal_radius + radius)
            .count();

        let horizontal = ((center.x - self.origin.x).powi(2) + (center.z - self.origin.z).powi(2)).sqrt();
        let outside = horizontal > self.config.boundary_radius - radius
            || center.y < self.origin.y + self.config.floor + radius
            || center.y > self.origin.y + self.config.ceiling - radius;

        petals + usize::from(outside)
    }

    fn closest_point(&self, zone: ZoneId, point: &Point3<f32>) -> Result<Point3<f32>, EnvError> {
        let flower = self.flowers.get(&zone).ok_or(EnvError::UnknownZone(zone))?;
        let offset = point - flower.center;
        let distance = offset.norm();
        if distance <= self.config.nectar_radius {
            Ok(*point)
        } else {
            Ok(flower.center + offset * (self.config.nectar_radius / distance))
        }
    }

    fn add_force(&mut self, body: AgentId, force: Vector3<f32>) {
        if let Some(body) = self.body_mut(body) {
            body.force += force;
        }
    }

    fn zero_velocities(&mut self, body: AgentId) {
        if let Some(body) = self.body_mut(body) {
            body.velocity = Vector3::zeros();
        }
    }

    fn set_pose(&mut self, body: AgentId, position: Point3<f32>, rotation: UnitQuaternion<f32>) {
        self.add_body(body, Pose::new(position, rotation));
    }

    fn set_rotation(&mut self, body: AgentId, rotation: UnitQuaternion<f32>) {
        if let Some(body) = self.body_mut(body) {
            body.rotation = rotation;
        }
    }

    fn set_sleeping(&mut self, body: AgentId, sleeping: bool) {
        if let Some(body) = self.body_mut(body) {
            body.sleeping = sleeping;
            body.velocity = Vector3::zeros();
        }
    }

    fn set_flower_enabled(&mut self, zone: ZoneId, enabled: bool) {
        match self.flowers.get_mut(&zone) {
            Some(flower) => flower.enabled = enabled,
            None => warn!("Cannot toggle unknown flower {}", zone),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use hummingbird_core::{SceneDescription, SceneNode};
    use proptest::prelude::*;

    const DT: f32 = 0.02;

    fn hover_at(x: f32, y: f32, z: f32) -> Pose {
        Pose::new(Point3::new(x, y, z), UnitQuaternion::identity())
    }

    /// One flower at (0, 2, 1) facing -Z.
    fn single_flower_world() -> (ArenaPhysics, FlowerArea) {
        let root = SceneNode::group("area")
            .with_child(SceneNode::flower("f", ZoneId(3)).at(0.0, 2.0, 1.0).rotated(-90.0, 0.0, 0.0));
        let area = FlowerArea::build(&SceneDescription::new("one", root), 0).unwrap();
        let mut physics = ArenaPhysics::new(ArenaConfig::default());
        physics.sync_flowers(&area);
        (physics, area)
    }

    #[test]
    fn test_force_accelerates_body() {
        let mut physics = ArenaPhysics::new(ArenaConfig::default());
        let id = AgentId::from_seed(0);
        physics.add_body(id, hover_at(0.0, 2.0, 0.0));

        physics.add_force(id, Vector3::new(2.0, 0.0, 0.0));
        physics.step(DT);

        let body = physics.body(id).unwrap();
        assert!(body.position.x > 0.0);
        assert!(body.velocity.x > 0.0);
        assert_eq!(body.position.y, 2.0);
        assert!(physics.drain_contacts().is_empty());
    }

    #[test]
    fn test_force_is_consumed_per_step() {
        let mut physics = ArenaPhysics::new(ArenaConfig::default());
        let id = AgentId::from_seed(0);
        physics.add_body(id, hover_at(0.0, 2.0, 0.0));

        physics.add_force(id, Vector3::new(0.0, 0.0, 2.0));
        physics.step(DT);
        let after_push = physics.body(id).unwrap().velocity.z;
        for _ in 0..200 {
            physics.step(DT);
        }
        let coasting = physics.body(id).unwrap().velocity.z;
        assert!(coasting < after_push * 0.01);
    }

    #[test]
    fn test_wall_contact_is_boundary() {
        let mut physics = ArenaPhysics::new(ArenaConfig::default());
        let id = AgentId::from_seed(0);
        physics.add_body(id, hover_at(9.99, 2.0, 0.0));

        physics.add_force(id, Vector3::new(50.0, 0.0, 0.0));
        physics.step(DT);

        let body = physics.body(id).unwrap();
        assert_relative_eq!(body.position.x, 9.95, epsilon = 1e-4);
        assert!(body.velocity.x <= 0.0);
        assert_eq!(
            physics.drain_contacts(),
            vec![(id, ContactEvent::Collision { surface: SurfaceTag::Boundary })]
        );
    }

    #[test]
    fn test_floor_contact_is_not_boundary() {
        let mut physics = ArenaPhysics::new(ArenaConfig::default());
        let id = AgentId::from_seed(0);
        physics.add_body(id, hover_at(0.0, 0.0, 0.0));

        physics.step(DT);

        assert_relative_eq!(physics.body(id).unwrap().position.y, 0.05);
        assert_eq!(
            physics.drain_contacts(),
            vec![(id, ContactEvent::Collision { surface: SurfaceTag::Other })]
        );
    }

    #[test]
    fn test_beak_in_nectar_triggers_proximity() {
        let (mut physics, _area) = single_flower_world();
        let id = AgentId::from_seed(0);
        // Beak tip lands exactly on the nectar center
        physics.add_body(id, hover_at(0.0, 2.0, 0.85));

        physics.step(DT);

        let contacts = physics.drain_contacts();
        assert!(contacts.contains(&(id, ContactEvent::Proximity { zone: ZoneId(3) })));
    }

    #[test]
    fn test_disabled_flower_is_inert() {
        let (mut physics, _area) = single_flower_world();
        let id = AgentId::from_seed(0);
        physics.add_body(id, hover_at(0.0, 2.0, 0.85));
        physics.set_flower_enabled(ZoneId(3), false);

        physics.step(DT);

        assert!(physics.drain_contacts().is_empty());
        assert_eq!(physics.flower_enabled(ZoneId(3)), Some(false));
        assert_eq!(physics.overlap_count(&Point3::new(0.0, 2.0, 1.06), 0.05), 0);
    }

    #[test]
    fn test_petal_blocks_from_behind() {
        let (mut physics, _area) = single_flower_world();
        let id = AgentId::from_seed(0);
        // Petal sphere sits at z = 1.06, behind the nectar
        physics.add_body(id, hover_at(0.0, 2.0, 1.08));

        physics.step(DT);

        let body = physics.body(id).unwrap();
        assert!((body.position - Point3::new(0.0, 2.0, 1.06)).norm() >= 0.1 - 1e-5);
        assert!(physics
            .drain_contacts()
            .contains(&(id, ContactEvent::Collision { surface: SurfaceTag::Other })));
    }

    #[test]
    fn test_overlap_counts_petals_and_walls() {
        let (physics, _area) = single_flower_world();

        assert_eq!(physics.overlap_count(&Point3::new(0.0, 2.0, 1.06), 0.05), 1);
        assert_eq!(physics.overlap_count(&Point3::new(0.0, 2.0, 0.0), 0.05), 0);
        assert_eq!(physics.overlap_count(&Point3::new(9.98, 2.0, 0.0), 0.05), 1);
        assert_eq!(physics.overlap_count(&Point3::new(0.0, 7.99, 0.0), 0.05), 1);
    }

    #[test]
    fn test_closest_point_on_nectar_sphere() {
        let (physics, _area) = single_flower_world();

        let closest = physics.closest_point(ZoneId(3), &Point3::new(0.0, 2.0, 0.0)).unwrap();
        assert_relative_eq!(closest, Point3::new(0.0, 2.0, 0.98), epsilon = 1e-5);

        let inside = Point3::new(0.0, 2.0, 0.99);
        assert_eq!(physics.closest_point(ZoneId(3), &inside).unwrap(), inside);

        assert!(matches!(
            physics.closest_point(ZoneId(9), &inside),
            Err(EnvError::UnknownZone(ZoneId(9)))
        ));
    }

    #[test]
    fn test_sleeping_body_holds_still() {
        let mut physics = ArenaPhysics::new(ArenaConfig::default());
        let id = AgentId::from_seed(0);
        physics.add_body(id, hover_at(1.0, 2.0, 1.0));
        physics.add_force(id, Vector3::new(1.0, 1.0, 1.0));
        physics.step(DT);

        physics.set_sleeping(id, true);
        let frozen_at = physics.body(id).unwrap().position;
        for _ in 0..10 {
            physics.add_force(id, Vector3::new(2.0, 0.0, 0.0));
            physics.step(DT);
        }
        assert_eq!(physics.body(id).unwrap().position, frozen_at);
    }

    #[test]
    fn test_unknown_body_lookup_fails() {
        let physics = ArenaPhysics::new(ArenaConfig::default());
        let id = AgentId::from_seed(5);
        assert!(matches!(physics.body(id), Err(EnvError::UnknownBody(b)) if b == id));
    }

    proptest! {
        #[test]
        fn prop_bodies_stay_inside_arena(
            forces in proptest::collection::vec(proptest::array::uniform3(-20.0f32..20.0), 1..100),
        ) {
            let mut physics = ArenaPhysics::new(ArenaConfig::default());
            let id = AgentId::from_seed(1);
            physics.add_body(id, hover_at(0.0, 2.0, 0.0));

            for force in forces {
                physics.add_force(id, Vector3::from(force));
                physics.step(DT);
                let p = physics.body(id).unwrap().position;
                prop_assert!((p.x * p.x + p.z * p.z).sqrt() <= 9.95 + 1e-3);
                prop_assert!(p.y >= 0.05 - 1e-4 && p.y <= 7.95 + 1e-4);
            }
        }
    }
}
