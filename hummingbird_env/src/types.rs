//! Common types shared between the simulation core and its collaborators.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an agent (and the rigid body it drives).
///
/// Uses UUID v4 for uniqueness without coordination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(pub Uuid);

impl AgentId {
    /// Creates a new random AgentId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a deterministic AgentId from a seed (for simulation).
    pub fn from_seed(seed: u64) -> Self {
        let mut bytes = [0u8; 16];
        bytes[0..8].copy_from_slice(&seed.to_le_bytes());
        bytes[8..16].copy_from_slice(&seed.wrapping_mul(0x517cc1b727220a95).to_le_bytes());
        Self(Uuid::from_bytes(bytes))
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // First 8 chars are enough to tell agents apart in logs
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// Identifier of a feeding zone (the nectar trigger volume of one flower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ZoneId(pub u32);

impl std::fmt::Display for ZoneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "zone#{}", self.0)
    }
}

/// Classification of a solid surface the agent collided with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceTag {
    /// Arena walls, floor and ceiling
    Boundary,

    /// Anything else (petals, stems, other agents)
    Other,
}

/// A contact reported by the physics collaborator for one agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactEvent {
    /// Some collider of the agent entered or stayed inside a feeding zone.
    ///
    /// Carries no geometry: the core asks the collaborator for the
    /// authoritative closest point on the zone.
    Proximity { zone: ZoneId },

    /// The agent body hit a solid surface.
    Collision { surface: SurfaceTag },
}

/// Discrete visual state of a flower, consumed by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowerVisual {
    /// Flower has nectar (shown in the "full" colour)
    Full,

    /// Flower is drained (shown in the "empty" colour)
    Empty,
}

impl FlowerVisual {
    /// RGB colour used by the stock material for this state.
    pub fn color(&self) -> [f32; 3] {
        match self {
            FlowerVisual::Full => [1.0, 0.0, 0.3],
            FlowerVisual::Empty => [0.5, 0.0, 1.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_id_from_seed_is_deterministic() {
        assert_eq!(AgentId::from_seed(7), AgentId::from_seed(7));
        assert_ne!(AgentId::from_seed(7), AgentId::from_seed(8));
    }

    #[test]
    fn test_agent_id_display_is_short() {
        let id = AgentId::from_seed(1);
        assert_eq!(id.to_string().len(), 8);
    }

    #[test]
    fn test_contact_event_serde() {
        let event = ContactEvent::Proximity { zone: ZoneId(4) };
        let json = serde_json::to_string(&event).unwrap();
        let back: ContactEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }

    #[test]
    fn test_flower_visual_colors_differ() {
        assert_ne!(FlowerVisual::Full.color(), FlowerVisual::Empty.color());
    }
}
