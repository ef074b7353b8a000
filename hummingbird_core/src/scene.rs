//! Scene description: the content tree flowers are registered from.
//!
//! A scene is a plain tree of nodes with local transforms, built in code or
//! loaded from JSON. It does not depend on any engine scene graph; the core
//! walks it once when a `FlowerArea` is built.
//!
//! ```json
//! {
//!   "name": "meadow",
//!   "root": {
//!     "name": "area", "kind": "group",
//!     "children": [
//!       { "name": "plant_0", "kind": "plant", "position": [3.0, 0.0, 0.0],
//!         "children": [
//!           { "name": "flower_0", "kind": "flower", "zone": 0,
//!             "position": [0.0, 0.8, 0.25], "rotation": [60.0, 0.0, 0.0] }
//!         ] }
//!     ]
//!   }
//! }
//! ```

use crate::error::SceneError;
use crate::geometry::euler_degrees;
use hummingbird_env::ZoneId;
use nalgebra::{Isometry3, Translation3};
use serde::{Deserialize, Serialize};

/// What a scene node represents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    /// Structural grouping only
    Group,

    /// A flower plant; re-oriented on every area reset
    Plant,

    /// A flower whose own transform is its nectar zone (center + up axis)
    Flower { zone: ZoneId },

    /// A feeding zone with no owning flower. Always a content error.
    NectarZone { zone: ZoneId },
}

/// Whether the walker should visit a node's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Descend {
    Children,
    Skip,
}

/// A node of the content tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    pub name: String,

    #[serde(flatten)]
    pub kind: NodeKind,

    /// Local position relative to the parent
    #[serde(default)]
    pub position: [f32; 3],

    /// Local Euler rotation in degrees [x, y, z]
    #[serde(default)]
    pub rotation: [f32; 3],

    #[serde(default)]
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            position: [0.0; 3],
            rotation: [0.0; 3],
            children: Vec::new(),
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Group)
    }

    pub fn plant(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Plant)
    }

    pub fn flower(name: impl Into<String>, zone: ZoneId) -> Self {
        Self::new(name, NodeKind::Flower { zone })
    }

    pub fn nectar_zone(name: impl Into<String>, zone: ZoneId) -> Self {
        Self::new(name, NodeKind::NectarZone { zone })
    }

    pub fn at(mut self, x: f32, y: f32, z: f32) -> Self {
        self.position = [x, y, z];
        self
    }

    pub fn rotated(mut self, x: f32, y: f32, z: f32) -> Self {
        self.rotation = [x, y, z];
        self
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    /// Local transform of this node relative to its parent.
    pub fn local_transform(&self) -> Isometry3<f32> {
        let [px, py, pz] = self.position;
        let [rx, ry, rz] = self.rotation;
        Isometry3::from_parts(Translation3::new(px, py, pz), euler_degrees(rx, ry, rz))
    }

    /// Depth-first pre-order walk.
    ///
    /// The visitor receives the node's pre-order index, its parent's index
    /// and the node, and decides whether to descend. Indices count visited
    /// nodes only, so parents always precede their children.
    ///
    /// Returns the number of visited nodes.
    pub fn walk<E, F>(&self, visit: &mut F) -> Result<usize, E>
    where
        F: FnMut(usize, Option<usize>, &SceneNode) -> Result<Descend, E>,
    {
        let mut next = 0;
        self.walk_from(None, &mut next, visit)?;
        Ok(next)
    }

    fn walk_from<E, F>(&self, parent: Option<usize>, next: &mut usize, visit: &mut F) -> Result<(), E>
    where
        F: FnMut(usize, Option<usize>, &SceneNode) -> Result<Descend, E>,
    {
        let index = *next;
        *next += 1;
        if visit(index, parent, self)? == Descend::Children {
            for child in &self.children {
                child.walk_from(Some(index), next, visit)?;
            }
        }
        Ok(())
    }
}

/// A complete arena description. The root node's transform is the arena frame.
///
/// The root must be a `Group`; plants and flowers below it are registered,
/// the root itself never is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    pub name: String,
    pub root: SceneNode,
}

impl SceneDescription {
    pub fn new(name: impl Into<String>, root: SceneNode) -> Self {
        Self {
            name: name.into(),
            root,
        }
    }

    /// Parses a scene from JSON.
    pub fn from_json(json: &str) -> Result<Self, SceneError> {
        serde_json::from_str(json).map_err(|e| SceneError::Parse(e.to_string()))
    }

    /// Serializes the scene to pretty JSON.
    pub fn to_json(&self) -> Result<String, SceneError> {
        serde_json::to_string_pretty(self).map_err(|e| SceneError::Parse(e.to_string()))
    }

    /// Procedural meadow: plants on a golden-angle spiral, each carrying a
    /// ring of flowers tilted outward. Zones are numbered in scan order.
    pub fn meadow(plant_count: usize, flowers_per_plant: usize) -> Self {
        const GOLDEN_ANGLE_DEG: f32 = 137.507_76;

        let mut root = SceneNode::group("flower_area");
        let mut zone = 0u32;

        for p in 0..plant_count {
            let angle = (p as f32 * GOLDEN_ANGLE_DEG).to_radians();
            let radius = 3.0 + 3.0 * (p as f32 + 0.5) / plant_count.max(1) as f32;
            let mut plant = SceneNode::plant(format!("flower_plant_{p}"))
                .at(radius * angle.sin(), 0.0, radius * angle.cos());

            for f in 0..flowers_per_plant {
                let heading = 360.0 * f as f32 / flowers_per_plant.max(1) as f32;
                let h = heading.to_radians();
                let height = 0.6 + 0.15 * (f % 4) as f32;
                plant = plant.with_child(
                    SceneNode::flower(format!("flower_{p}_{f}"), ZoneId(zone))
                        .at(0.25 * h.sin(), height, 0.25 * h.cos())
                        .rotated(60.0, heading, 0.0),
                );
                zone += 1;
            }
            root = root.with_child(plant);
        }

        Self::new("meadow", root)
    }
}
