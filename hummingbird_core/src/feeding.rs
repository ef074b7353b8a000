//! Contact handling: nectar transfer, reward shaping and boundary penalties.

use crate::config::FeedingConfig;
use crate::error::CoreError;
use crate::flower_area::FlowerArea;
use crate::geometry::clamp01;
use crate::tracker::NearestFlowerTracker;
use hummingbird_env::{PhysicsBackend, SurfaceTag, ZoneId};
use nalgebra::{Point3, Vector3};
use tracing::debug;

/// What a single contact event amounted to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContactOutcome {
    /// The zone was touched by something other than the beak tip
    OutOfReach { zone: ZoneId, distance: f32 },

    /// The flower already gave nectar this tick
    AlreadyFed { zone: ZoneId },

    /// Feed applied; `depleted` is set by the feed that empties the flower
    Fed {
        zone: ZoneId,
        nectar: f32,
        reward: f32,
        depleted: bool,
    },

    /// Arena boundary touched in training mode
    BoundaryPenalty { reward: f32 },

    /// Nothing to do (non-boundary collision, or boundary outside training)
    Ignored,
}

impl ContactOutcome {
    pub fn reward(&self) -> f32 {
        match self {
            ContactOutcome::Fed { reward, .. } | ContactOutcome::BoundaryPenalty { reward } => *reward,
            _ => 0.0,
        }
    }

    pub fn nectar(&self) -> f32 {
        match self {
            ContactOutcome::Fed { nectar, .. } => *nectar,
            _ => 0.0,
        }
    }
}

/// Turns contact events into nectar and reward.
#[derive(Debug, Clone)]
pub struct FeedingController {
    config: FeedingConfig,
    training_mode: bool,
}

impl FeedingController {
    pub fn new(config: FeedingConfig, training_mode: bool) -> Self {
        Self { config, training_mode }
    }

    pub fn config(&self) -> &FeedingConfig {
        &self.config
    }

    /// Handles the agent entering or staying in a feeding zone.
    ///
    /// Only contacts whose closest zone point lies within the beak tip
    /// radius count. Each flower feeds at most once per `tick`. When the fed
    /// flower runs dry the tracker is invalidated.
    #[allow(clippy::too_many_arguments)]
    pub fn on_proximity<P>(
        &self,
        zone: ZoneId,
        beak_tip: &Point3<f32>,
        agent_forward: &Vector3<f32>,
        tick: u64,
        area: &mut FlowerArea,
        physics: &P,
        tracker: &mut NearestFlowerTracker,
    ) -> Result<ContactOutcome, CoreError>
    where
        P: PhysicsBackend + ?Sized,
    {
        let closest = physics.closest_point(zone, beak_tip)?;
        let distance = (closest - beak_tip).norm();
        if distance >= self.config.beak_tip_radius {
            return Ok(ContactOutcome::OutOfReach { zone, distance });
        }

        let had_nectar = area.flower_by_zone(zone)?.has_nectar();
        let Some(nectar) = area.feed_zone(zone, self.config.feed_rate, tick)? else {
            return Ok(ContactOutcome::AlreadyFed { zone });
        };

        let flower = area.flower_by_zone(zone)?;
        let depleted = had_nectar && !flower.has_nectar();

        let reward = if self.training_mode && nectar > 0.0 {
            let alignment = agent_forward.normalize().dot(&-flower.up().into_inner());
            self.config.base_reward + self.config.orientation_bonus * clamp01(alignment)
        } else {
            0.0
        };

        if depleted {
            debug!("Flower '{}' ({}) depleted", flower.name(), zone);
            tracker.invalidate();
        }

        Ok(ContactOutcome::Fed {
            zone,
            nectar,
            reward,
            depleted,
        })
    }

    /// Handles a solid collision.
    pub fn on_collision(&self, surface: SurfaceTag) -> ContactOutcome {
        match surface {
            SurfaceTag::Boundary if self.training_mode => {
                debug!("Boundary contact, penalty {}", self.config.boundary_penalty);
                ContactOutcome::BoundaryPenalty {
                    reward: self.config.boundary_penalty,
                }
            }
            _ => ContactOutcome::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{SceneDescription, SceneNode};
    use crate::testing::MockPhysics;
    use approx::assert_relative_eq;
    use hummingbird_env::EnvError;

    const ZONE: ZoneId = ZoneId(5);

    /// One flower at (0, 1, 0) facing -Z, with a 0.02 nectar sphere.
    fn fixture() -> (FlowerArea, MockPhysics) {
        let root = SceneNode::group("area").with_child(
            SceneNode::flower("f", ZONE).at(0.0, 1.0, 0.0).rotated(-90.0, 0.0, 0.0),
        );
        let area = FlowerArea::build(&SceneDescription::new("feed", root), 1).unwrap();
        let physics = MockPhysics::new().with_zone(ZONE, Point3::new(0.0, 1.0, 0.0), 0.02);
        (area, physics)
    }

    fn tip_in_zone() -> Point3<f32> {
        Point3::new(0.0, 1.0, -0.01)
    }

    #[test]
    fn test_head_on_feed_gets_full_bonus() {
        let (mut area, physics) = fixture();
        let mut tracker = NearestFlowerTracker::new();
        let controller = FeedingController::new(FeedingConfig::default(), true);

        let outcome = controller
            .on_proximity(ZONE, &tip_in_zone(), &Vector3::z(), 0, &mut area, &physics, &mut tracker)
            .unwrap();

        match outcome {
            ContactOutcome::Fed { nectar, reward, depleted, .. } => {
                assert_relative_eq!(nectar, 0.01);
                assert_relative_eq!(reward, 0.03, epsilon = 1e-6);
                assert!(!depleted);
            }
            other => panic!("expected feed, got {other:?}"),
        }
    }

    #[test]
    fn test_sideways_feed_gets_base_reward() {
        let (mut area, physics) = fixture();
        let mut tracker = NearestFlowerTracker::new();
        let controller = FeedingController::new(FeedingConfig::default(), true);

        let outcome = controller
            .on_proximity(ZONE, &tip_in_zone(), &Vector3::x(), 0, &mut area, &physics, &mut tracker)
            .unwrap();
        assert_relative_eq!(outcome.reward(), 0.01, epsilon = 1e-6);

        // Facing away never goes below the base reward
        let outcome = controller
            .on_proximity(ZONE, &tip_in_zone(), &-Vector3::z(), 1, &mut area, &physics, &mut tracker)
            .unwrap();
        assert_relative_eq!(outcome.reward(), 0.01, epsilon = 1e-6);
    }

    #[test]
    fn test_contact_away_from_tip_is_rejected() {
        let (mut area, physics) = fixture();
        let mut tracker = NearestFlowerTracker::new();
        let controller = FeedingController::new(FeedingConfig::default(), true);

        // Body touches the zone, but the beak tip is 0.05 away from its surface
        let tip = Point3::new(0.0, 1.0, -0.07);
        let outcome = controller
            .on_proximity(ZONE, &tip, &Vector3::z(), 0, &mut area, &physics, &mut tracker)
            .unwrap();

        assert!(matches!(outcome, ContactOutcome::OutOfReach { .. }));
        assert_eq!(area.flower_by_zone(ZONE).unwrap().nectar(), 1.0);
    }

    #[test]
    fn test_one_feed_per_tick() {
        let (mut area, physics) = fixture();
        let mut tracker = NearestFlowerTracker::new();
        let controller = FeedingController::new(FeedingConfig::default(), true);

        let first = controller
            .on_proximity(ZONE, &tip_in_zone(), &Vector3::z(), 3, &mut area, &physics, &mut tracker)
            .unwrap();
        let second = controller
            .on_proximity(ZONE, &tip_in_zone(), &Vector3::z(), 3, &mut area, &physics, &mut tracker)
            .unwrap();

        assert!(matches!(first, ContactOutcome::Fed { .. }));
        assert_eq!(second, ContactOutcome::AlreadyFed { zone: ZONE });
        assert_eq!(second.reward(), 0.0);
        assert_relative_eq!(area.flower_by_zone(ZONE).unwrap().nectar(), 0.99, epsilon = 1e-6);
    }

    #[test]
    fn test_depletion_invalidates_tracker() {
        let (mut area, physics) = fixture();
        let mut tracker = NearestFlowerTracker::new();
        tracker.refresh(&area, &tip_in_zone());
        assert_eq!(tracker.current(), Some(0));

        let config = FeedingConfig {
            feed_rate: 0.6,
            ..FeedingConfig::default()
        };
        let controller = FeedingController::new(config, true);

        controller
            .on_proximity(ZONE, &tip_in_zone(), &Vector3::z(), 0, &mut area, &physics, &mut tracker)
            .unwrap();
        assert_eq!(tracker.current(), Some(0));

        let outcome = controller
            .on_proximity(ZONE, &tip_in_zone(), &Vector3::z(), 1, &mut area, &physics, &mut tracker)
            .unwrap();

        assert_relative_eq!(outcome.nectar(), 0.4, epsilon = 1e-6);
        assert!(matches!(outcome, ContactOutcome::Fed { depleted: true, .. }));
        assert_eq!(tracker.current(), None);
    }

    #[test]
    fn test_drained_flower_gives_nothing() {
        let (mut area, physics) = fixture();
        let mut tracker = NearestFlowerTracker::new();
        area.feed_zone(ZONE, 1.0, 0).unwrap();
        let controller = FeedingController::new(FeedingConfig::default(), true);

        let outcome = controller
            .on_proximity(ZONE, &tip_in_zone(), &Vector3::z(), 1, &mut area, &physics, &mut tracker)
            .unwrap();

        assert_eq!(outcome.nectar(), 0.0);
        assert_eq!(outcome.reward(), 0.0);
        assert!(matches!(outcome, ContactOutcome::Fed { depleted: false, .. }));
    }

    #[test]
    fn test_no_reward_outside_training() {
        let (mut area, physics) = fixture();
        let mut tracker = NearestFlowerTracker::new();
        let controller = FeedingController::new(FeedingConfig::default(), false);

        let outcome = controller
            .on_proximity(ZONE, &tip_in_zone(), &Vector3::z(), 0, &mut area, &physics, &mut tracker)
            .unwrap();

        assert_relative_eq!(outcome.nectar(), 0.01);
        assert_eq!(outcome.reward(), 0.0);
        assert_eq!(controller.on_collision(SurfaceTag::Boundary), ContactOutcome::Ignored);
    }

    #[test]
    fn test_boundary_penalty() {
        let controller = FeedingController::new(FeedingConfig::default(), true);
        assert_eq!(
            controller.on_collision(SurfaceTag::Boundary),
            ContactOutcome::BoundaryPenalty { reward: -0.5 }
        );
        assert_eq!(controller.on_collision(SurfaceTag::Other), ContactOutcome::Ignored);
    }

    #[test]
    fn test_unregistered_zone_fails_fast() {
        let (mut area, physics) = fixture();
        let physics = physics.with_zone(ZoneId(77), Point3::new(0.0, 1.0, 0.0), 0.02);
        let mut tracker = NearestFlowerTracker::new();
        let controller = FeedingController::new(FeedingConfig::default(), true);

        let result = controller.on_proximity(ZoneId(77), &tip_in_zone(), &Vector3::z(), 0, &mut area, &physics, &mut tracker);
        assert!(matches!(result, Err(CoreError::UnregisteredZone(ZoneId(77)))));
    }

    #[test]
    fn test_unknown_physics_zone_propagates() {
        let (mut area, _) = fixture();
        let physics = MockPhysics::new();
        let mut tracker = NearestFlowerTracker::new();
        let controller = FeedingController::new(FeedingConfig::default(), true);

        let result = controller.on_proximity(ZONE, &tip_in_zone(), &Vector3::z(), 0, &mut area, &physics, &mut tracker);
        assert!(matches!(result, Err(CoreError::Env(EnvError::UnknownZone(ZONE)))));
    }
}
