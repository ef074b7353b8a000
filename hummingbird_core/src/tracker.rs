//! Nearest-flower tracking for one agent.
//!
//! The tracker caches the index of the closest flower that still has
//! nectar. It never follows a stale reference: a depleted or missing target
//! is replaced by a full rescan before anyone reads it.

use crate::flower::Flower;
use crate::flower_area::{FlowerArea, FlowerIndex};
use nalgebra::Point3;
use tracing::debug;

/// Cached target state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackerState {
    #[default]
    Unset,
    Tracking(FlowerIndex),
}

#[derive(Debug, Clone, Default)]
pub struct NearestFlowerTracker {
    state: TrackerState,
}

impl NearestFlowerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    /// Currently tracked flower index, without validation.
    pub fn current(&self) -> Option<FlowerIndex> {
        match self.state {
            TrackerState::Unset => None,
            TrackerState::Tracking(index) => Some(index),
        }
    }

    /// Drops the cached target; the next refresh rescans.
    pub fn invalidate(&mut self) {
        self.state = TrackerState::Unset;
    }

    /// True when the cache is unset or points at a flower without nectar.
    pub fn needs_recompute(&self, area: &FlowerArea) -> bool {
        match self.state {
            TrackerState::Unset => true,
            TrackerState::Tracking(index) => !area.flower(index).is_some_and(Flower::has_nectar),
        }
    }

    /// Rescans only if the cache is stale, then returns the target.
    pub fn refresh(&mut self, area: &FlowerArea, beak_tip: &Point3<f32>) -> Option<FlowerIndex> {
        if self.needs_recompute(area) {
            self.recompute(area, beak_tip)
        } else {
            self.current()
        }
    }

    /// Full rescan over the area.
    pub fn recompute(&mut self, area: &FlowerArea, beak_tip: &Point3<f32>) -> Option<FlowerIndex> {
        let previous = self.current();
        let nearest = nearest_with_nectar(area.flowers(), beak_tip);
        self.state = match nearest {
            Some(index) => TrackerState::Tracking(index),
            None => TrackerState::Unset,
        };

        if nearest != previous {
            debug!("Nearest flower changed: {:?} -> {:?}", previous, nearest);
        }
        nearest
    }

    /// The tracked flower, if any.
    pub fn target<'a>(&self, area: &'a FlowerArea) -> Option<&'a Flower> {
        self.current().and_then(|index| area.flower(index))
    }
}

/// Linear scan for the closest flower with nectar.
///
/// Ties keep the first flower in scan order.
pub fn nearest_with_nectar(flowers: &[Flower], from: &Point3<f32>) -> Option<FlowerIndex> {
    let mut best: Option<(FlowerIndex, f32)> = None;
    for (index, flower) in flowers.iter().enumerate() {
        if !flower.has_nectar() {
            continue;
        }
        let distance = (flower.center() - from).norm();
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((index, distance)),
        }
    }
    best.map(|(index, _)| index)
}
