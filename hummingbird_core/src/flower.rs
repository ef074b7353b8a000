//! A single feeding site with depletable nectar.

use hummingbird_env::{FlowerVisual, ZoneId};
use nalgebra::{Point3, Unit, Vector3};
use serde::{Deserialize, Serialize};

/// Nectar held by a freshly reset flower.
pub const NECTAR_CAPACITY: f32 = 1.0;

/// One flower: nectar bookkeeping plus the geometry of its feeding zone.
///
/// Invariants: `nectar` stays in [0, 1] and `active == (nectar > 0)`.
/// Once drained, a flower stays inactive until [`Flower::reset`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flower {
    name: String,
    zone: ZoneId,

    /// Scene node this flower was registered from
    node: usize,

    nectar: f32,

    /// Feeding zone and petal colliders enabled
    active: bool,

    /// Center of the feeding zone (arena frame)
    center: Point3<f32>,

    /// Direction pointing straight out of the flower
    up: Unit<Vector3<f32>>,

    /// Visual state not yet handed to the collaborators
    #[serde(skip)]
    pending_visual: Option<FlowerVisual>,
}

impl Flower {
    /// Creates a full, active flower.
    pub fn new(name: impl Into<String>, zone: ZoneId, center: Point3<f32>, up: Vector3<f32>) -> Self {
        Self {
            name: name.into(),
            zone,
            node: 0,
            nectar: NECTAR_CAPACITY,
            active: true,
            center,
            up: Unit::new_normalize(up),
            pending_visual: Some(FlowerVisual::Full),
        }
    }

    pub(crate) fn with_node(mut self, node: usize) -> Self {
        self.node = node;
        self
    }

    /// Removes up to `amount` nectar and returns what the caller may credit.
    ///
    /// The full `amount` is subtracted even when less remains, so one large
    /// call drains the flower while the returned credit stays bounded by
    /// what was actually there. Negative or NaN amounts feed nothing.
    pub fn feed(&mut self, amount: f32) -> f32 {
        let amount = amount.max(0.0);
        let taken = amount.clamp(0.0, self.nectar);

        self.nectar -= amount;

        if self.nectar <= 0.0 {
            self.nectar = 0.0;
            if self.active {
                self.active = false;
                self.pending_visual = Some(FlowerVisual::Empty);
            }
        }

        taken
    }

    /// Refills the nectar and re-enables the flower.
    pub fn reset(&mut self) {
        self.nectar = NECTAR_CAPACITY;
        self.active = true;
        self.pending_visual = Some(FlowerVisual::Full);
    }

    pub fn has_nectar(&self) -> bool {
        self.nectar > 0.0
    }

    pub fn nectar(&self) -> f32 {
        self.nectar
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn zone(&self) -> ZoneId {
        self.zone
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node(&self) -> usize {
        self.node
    }

    pub fn center(&self) -> Point3<f32> {
        self.center
    }

    /// Approach axis: the flower is fed "correctly" when approached along `-up`.
    pub fn up(&self) -> Unit<Vector3<f32>> {
        self.up
    }

    pub fn visual(&self) -> FlowerVisual {
        if self.active {
            FlowerVisual::Full
        } else {
            FlowerVisual::Empty
        }
    }

    pub(crate) fn set_geometry(&mut self, center: Point3<f32>, up: Unit<Vector3<f32>>) {
        self.center = center;
        self.up = up;
    }

    pub(crate) fn take_pending_visual(&mut self) -> Option<FlowerVisual> {
        self.pending_visual.take()
    }
}
