//! The flower area: every flower in one arena, plus arena-wide resets.

use crate::error::{CoreError, SceneError};
use crate::flower::Flower;
use crate::geometry::{euler_degrees, up};
use crate::scene::{Descend, NodeKind, SceneDescription};
use hummingbird_env::{PhysicsBackend, RenderSink, ZoneId};
use nalgebra::{Isometry3, Point3, UnitQuaternion};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use tracing::debug;

/// Diameter of the region agents and flowers live in.
///
/// Used to normalise agent-to-flower distances in observations.
pub const AREA_DIAMETER: f32 = 20.0;

/// Index of a flower inside its area (scan order).
pub type FlowerIndex = usize;

/// Tilt range (degrees, both signs) applied to plants on reset.
const PLANT_TILT_DEG: f32 = 5.0;

#[derive(Debug, Clone)]
struct NodeRecord {
    parent: Option<usize>,
    local: Isometry3<f32>,
}

/// Owns the flowers of one arena.
///
/// Built once from a [`SceneDescription`]: plant groups are collected,
/// flowers are listed in depth-first order and their feeding zones are
/// indexed. The zone map is a bijection onto the flower list.
pub struct FlowerArea {
    name: String,

    /// Flattened scene, parents before children
    nodes: Vec<NodeRecord>,

    /// Node indices of plant groups
    plants: Vec<usize>,

    flowers: Vec<Flower>,

    zone_lookup: HashMap<ZoneId, FlowerIndex>,

    /// Tick of the last applied feed, per flower
    last_fed_tick: Vec<Option<u64>>,

    /// RNG for plant randomization
    rng: ChaCha8Rng,
}

impl FlowerArea {
    /// Builds an area from a scene, seeding its RNG from `seed`.
    pub fn build(scene: &SceneDescription, seed: u64) -> Result<Self, SceneError> {
        Self::with_rng(scene, ChaCha8Rng::seed_from_u64(seed))
    }

    /// Builds an area from a scene with an injected RNG.
    pub fn with_rng(scene: &SceneDescription, rng: ChaCha8Rng) -> Result<Self, SceneError> {
        let mut nodes = Vec::new();
        let mut plants = Vec::new();
        let mut flowers: Vec<Flower> = Vec::new();
        let mut zone_lookup: HashMap<ZoneId, FlowerIndex> = HashMap::new();

        scene.root.walk(&mut |index, parent, node| {
            nodes.push(NodeRecord {
                parent,
                local: node.local_transform(),
            });

            // The root is the arena frame itself, never a plant or flower
            if parent.is_none() {
                return match node.kind {
                    NodeKind::Group => Ok(Descend::Children),
                    _ => Err(SceneError::RootNotGroup {
                        node: node.name.clone(),
                    }),
                };
            }

            match &node.kind {
                NodeKind::Plant => {
                    plants.push(index);
                    Ok(Descend::Children)
                }
                NodeKind::Flower { zone } => {
                    if let Some(&existing) = zone_lookup.get(zone) {
                        return Err(SceneError::DuplicateZone {
                            zone: *zone,
                            first: flowers[existing].name().to_string(),
                            second: node.name.clone(),
                        });
                    }
                    zone_lookup.insert(*zone, flowers.len());
                    flowers.push(
                        Flower::new(node.name.clone(), *zone, Point3::origin(), nalgebra::Vector3::y())
                            .with_node(index),
                    );
                    Ok(Descend::Skip)
                }
                NodeKind::NectarZone { zone } => Err(SceneError::OrphanZone {
                    zone: *zone,
                    node: node.name.clone(),
                }),
                NodeKind::Group => Ok(Descend::Children),
            }
        })?;

        debug_assert_eq!(zone_lookup.len(), flowers.len());

        let last_fed_tick = vec![None; flowers.len()];
        let mut area = Self {
            name: scene.name.clone(),
            nodes,
            plants,
            flowers,
            zone_lookup,
            last_fed_tick,
            rng,
        };
        area.refresh_geometry();

        debug!(
            "Registered flower area '{}': {} plants, {} flowers",
            area.name,
            area.plants.len(),
            area.flowers.len()
        );

        Ok(area)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// All flowers in registration order.
    pub fn flowers(&self) -> &[Flower] {
        &self.flowers
    }

    pub fn flower(&self, index: FlowerIndex) -> Option<&Flower> {
        self.flowers.get(index)
    }

    pub fn flower_count(&self) -> usize {
        self.flowers.len()
    }

    pub fn plant_count(&self) -> usize {
        self.plants.len()
    }

    /// Resolves a feeding zone to its flower's index.
    pub fn index_of_zone(&self, zone: ZoneId) -> Result<FlowerIndex, CoreError> {
        self.zone_lookup
            .get(&zone)
            .copied()
            .ok_or(CoreError::UnregisteredZone(zone))
    }

    /// Resolves a feeding zone to its flower.
    pub fn flower_by_zone(&self, zone: ZoneId) -> Result<&Flower, CoreError> {
        let index = self.index_of_zone(zone)?;
        Ok(&self.flowers[index])
    }

    /// Origin of the arena frame.
    pub fn origin(&self) -> Point3<f32> {
        self.root_transform().translation.vector.into()
    }

    /// Orientation of the arena frame.
    pub fn rotation(&self) -> UnitQuaternion<f32> {
        self.root_transform().rotation
    }

    fn root_transform(&self) -> Isometry3<f32> {
        self.nodes.first().map(|n| n.local).unwrap_or_else(Isometry3::identity)
    }

    /// Feeds the flower behind `zone` at most once per tick.
    ///
    /// # Returns
    /// * `Ok(Some(taken))` - Feed applied, `taken` nectar may be credited
    /// * `Ok(None)` - The flower was already fed during `tick`
    /// * `Err(CoreError::UnregisteredZone)` - Unknown zone
    pub fn feed_zone(&mut self, zone: ZoneId, amount: f32, tick: u64) -> Result<Option<f32>, CoreError> {
        let index = self.index_of_zone(zone)?;
        if self.last_fed_tick[index] == Some(tick) {
            return Ok(None);
        }
        self.last_fed_tick[index] = Some(tick);
        Ok(Some(self.flowers[index].feed(amount)))
    }

    /// Re-orients every plant and refills every flower.
    ///
    /// Each plant gets a small random tilt on X and Z and a random yaw, set
    /// as its local rotation (its local position is kept).
    pub fn reset_area(&mut self) {
        for &plant in &self.plants {
            let x = self.rng.gen_range(-PLANT_TILT_DEG..=PLANT_TILT_DEG);
            let y = self.rng.gen_range(-180.0f32..=180.0);
            let z = self.rng.gen_range(-PLANT_TILT_DEG..=PLANT_TILT_DEG);
            self.nodes[plant].local.rotation = euler_degrees(x, y, z);
        }
        self.refresh_geometry();

        for flower in &mut self.flowers {
            flower.reset();
        }
        self.last_fed_tick.iter_mut().for_each(|t| *t = None);
    }

    /// Total nectar left across all flowers.
    pub fn nectar_remaining(&self) -> f32 {
        self.flowers.iter().map(Flower::nectar).sum()
    }

    /// Number of flowers that still have nectar.
    pub fn flowers_with_nectar(&self) -> usize {
        self.flowers.iter().filter(|f| f.has_nectar()).count()
    }

    /// Hands queued flower state changes to the physics and render
    /// collaborators. Returns how many were published.
    pub fn publish_state_changes<P, R>(&mut self, physics: &mut P, render: &mut R) -> usize
    where
        P: PhysicsBackend + ?Sized,
        R: RenderSink + ?Sized,
    {
        let mut published = 0;
        for flower in &mut self.flowers {
            if let Some(visual) = flower.take_pending_visual() {
                physics.set_flower_enabled(flower.zone(), flower.is_active());
                render.flower_visual_changed(flower.zone(), visual);
                published += 1;
            }
        }
        published
    }

    /// Recomputes world transforms and pushes flower centers and axes.
    fn refresh_geometry(&mut self) {
        let mut world: Vec<Isometry3<f32>> = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let transform = match node.parent {
                Some(parent) => world[parent] * node.local,
                None => node.local,
            };
            world.push(transform);
        }

        for flower in &mut self.flowers {
            let transform = world[flower.node()];
            let center: Point3<f32> = transform.translation.vector.into();
            flower.set_geometry(center, up(&transform.rotation));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneNode;
    use crate::testing::MockPhysics;
    use approx::assert_relative_eq;
    use hummingbird_env::FlowerVisual;
    use nalgebra::Vector3;

    fn two_plant_scene() -> SceneDescription {
        let root = SceneNode::group("area")
            .with_child(
                SceneNode::plant("plant_a")
                    .at(2.0, 0.0, 0.0)
                    .with_child(SceneNode::flower("a0", ZoneId(10)).at(0.0, 1.0, 0.0))
                    .with_child(SceneNode::flower("a1", ZoneId(11)).at(0.3, 0.8, 0.0)),
            )
            .with_child(
                SceneNode::group("decor").with_child(
                    SceneNode::plant("plant_b")
                        .at(-2.0, 0.0, 0.0)
                        .with_child(SceneNode::flower("b0", ZoneId(20)).at(0.0, 1.0, 0.0).rotated(90.0, 0.0, 0.0)),
                ),
            );
        SceneDescription::new("test", root)
    }

    #[test]
    fn test_registration_collects_plants_and_flowers() {
        let area = FlowerArea::build(&two_plant_scene(), 1).unwrap();

        assert_eq!(area.plant_count(), 2);
        assert_eq!(area.flower_count(), 3);
        let names: Vec<&str> = area.flowers().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["a0", "a1", "b0"]);
    }

    #[test]
    fn test_zone_lookup_is_bijective() {
        let area = FlowerArea::build(&two_plant_scene(), 1).unwrap();

        for (index, flower) in area.flowers().iter().enumerate() {
            assert_eq!(area.index_of_zone(flower.zone()).unwrap(), index);
        }
        assert!(matches!(
            area.flower_by_zone(ZoneId(99)),
            Err(CoreError::UnregisteredZone(ZoneId(99)))
        ));
    }

    #[test]
    fn test_flower_geometry_follows_parents() {
        let area = FlowerArea::build(&two_plant_scene(), 1).unwrap();

        let a0 = area.flower_by_zone(ZoneId(10)).unwrap();
        assert_relative_eq!(a0.center(), Point3::new(2.0, 1.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(a0.up().into_inner(), Vector3::y(), epsilon = 1e-5);

        // Pitched 90 degrees: local up now points along +Z
        let b0 = area.flower_by_zone(ZoneId(20)).unwrap();
        assert_relative_eq!(b0.up().into_inner(), Vector3::z(), epsilon = 1e-5);
    }

    #[test]
    fn test_duplicate_zone_fails_fast() {
        let root = SceneNode::group("area").with_child(
            SceneNode::plant("p")
                .with_child(SceneNode::flower("first", ZoneId(1)))
                .with_child(SceneNode::flower("second", ZoneId(1))),
        );
        let err = FlowerArea::build(&SceneDescription::new("dup", root), 1).err().unwrap();

        assert_eq!(
            err,
            SceneError::DuplicateZone {
                zone: ZoneId(1),
                first: "first".to_string(),
                second: "second".to_string(),
            }
        );
    }

    #[test]
    fn test_orphan_zone_fails_fast() {
        let root = SceneNode::group("area")
            .with_child(SceneNode::plant("p").with_child(SceneNode::nectar_zone("stray", ZoneId(3))));
        let err = FlowerArea::build(&SceneDescription::new("orphan", root), 1).err().unwrap();

        assert!(matches!(err, SceneError::OrphanZone { zone: ZoneId(3), .. }));
    }

    #[test]
    fn test_flower_children_are_not_scanned() {
        // A zone under a flower belongs to that flower's subtree; the scan stops there
        let root = SceneNode::group("area").with_child(
            SceneNode::flower("f", ZoneId(1)).with_child(SceneNode::nectar_zone("inner", ZoneId(2))),
        );
        let area = FlowerArea::build(&SceneDescription::new("nested", root), 1).unwrap();
        assert_eq!(area.flower_count(), 1);
    }

    #[test]
    fn test_reset_refills_and_rotates_plants() {
        let mut area = FlowerArea::build(&two_plant_scene(), 7).unwrap();
        let before = area.flower_by_zone(ZoneId(11)).unwrap().center();

        area.feed_zone(ZoneId(11), 2.0, 0).unwrap();
        assert!(!area.flower_by_zone(ZoneId(11)).unwrap().has_nectar());

        area.reset_area();

        let flower = area.flower_by_zone(ZoneId(11)).unwrap();
        assert!(flower.has_nectar());
        assert_eq!(flower.nectar(), 1.0);
        // Off-axis flower moves with the plant's yaw, but keeps its distance to the stem
        let after = flower.center();
        assert!((after - before).norm() > 1e-4);
        let stem = Point3::new(2.0, 0.0, 0.0);
        assert_relative_eq!((after - stem).norm(), (before - stem).norm(), epsilon = 1e-4);
    }

    #[test]
    fn test_reset_tilt_is_small() {
        let mut area = FlowerArea::build(&two_plant_scene(), 3).unwrap();
        for _ in 0..20 {
            area.reset_area();
            let a0 = area.flower_by_zone(ZoneId(10)).unwrap();
            // Upright flower on a plant tilted at most ~5 degrees per axis
            assert!(a0.up().y > (8.0f32).to_radians().cos());
        }
    }

    #[test]
    fn test_reset_is_reproducible() {
        let mut a = FlowerArea::build(&two_plant_scene(), 42).unwrap();
        let mut b = FlowerArea::build(&two_plant_scene(), 42).unwrap();
        a.reset_area();
        b.reset_area();
        for (fa, fb) in a.flowers().iter().zip(b.flowers()) {
            assert_eq!(fa.center(), fb.center());
        }
    }

    #[test]
    fn test_feed_zone_once_per_tick() {
        let mut area = FlowerArea::build(&two_plant_scene(), 1).unwrap();

        assert_eq!(area.feed_zone(ZoneId(10), 0.01, 5).unwrap(), Some(0.01));
        assert_eq!(area.feed_zone(ZoneId(10), 0.01, 5).unwrap(), None);
        assert_eq!(area.feed_zone(ZoneId(10), 0.01, 6).unwrap(), Some(0.01));
        assert_relative_eq!(area.flower_by_zone(ZoneId(10)).unwrap().nectar(), 0.98, epsilon = 1e-6);

        // Other flowers are independent within the same tick
        assert_eq!(area.feed_zone(ZoneId(11), 0.01, 6).unwrap(), Some(0.01));
    }

    #[test]
    fn test_publish_state_changes() {
        let mut area = FlowerArea::build(&two_plant_scene(), 1).unwrap();
        let mut physics = MockPhysics::new();
        let mut sink: Vec<(ZoneId, FlowerVisual)> = Vec::new();

        // Initial full state is published once
        assert_eq!(area.publish_state_changes(&mut physics, &mut sink), 3);
        assert_eq!(area.publish_state_changes(&mut physics, &mut sink), 0);

        area.feed_zone(ZoneId(20), 5.0, 0).unwrap();
        assert_eq!(area.publish_state_changes(&mut physics, &mut sink), 1);
        assert_eq!(sink.last(), Some(&(ZoneId(20), FlowerVisual::Empty)));
        assert!(physics.disabled_zones.contains(&ZoneId(20)));

        area.reset_area();
        area.publish_state_changes(&mut physics, &mut sink);
        assert!(physics.disabled_zones.is_empty());
    }

    #[test]
    fn test_nectar_totals() {
        let mut area = FlowerArea::build(&two_plant_scene(), 1).unwrap();
        assert_relative_eq!(area.nectar_remaining(), 3.0);
        area.feed_zone(ZoneId(10), 1.0, 0).unwrap();
        assert_relative_eq!(area.nectar_remaining(), 2.0);
        assert_eq!(area.flowers_with_nectar(), 2);
    }

    #[test]
    fn test_root_must_be_group() {
        let root = SceneNode::plant("p").with_child(SceneNode::flower("f", ZoneId(0)).at(0.0, 1.0, 0.0));
        let err = FlowerArea::build(&SceneDescription::new("plant_root", root), 1).err().unwrap();
        assert_eq!(err, SceneError::RootNotGroup { node: "p".to_string() });

        let json = r#"{ "name": "bad", "root": { "name": "f", "kind": "flower", "zone": 1 } }"#;
        let scene = SceneDescription::from_json(json).unwrap();
        assert!(matches!(FlowerArea::build(&scene, 1), Err(SceneError::RootNotGroup { .. })));
    }

    #[test]
    fn test_origin_is_root_position() {
        let root = SceneNode::group("area").at(1.0, 2.0, 3.0);
        let area = FlowerArea::build(&SceneDescription::new("empty", root), 1).unwrap();
        assert_eq!(area.origin(), Point3::new(1.0, 2.0, 3.0));
        assert_eq!(area.flower_count(), 0);
    }
}
