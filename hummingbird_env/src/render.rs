//! Rendering collaborator contract produced by the simulation core.

use crate::types::{FlowerVisual, ZoneId};

/// Receives flower visual state updates.
///
/// The core only ever publishes the discrete full/empty signal; colours,
/// materials and meshes are the renderer's business.
pub trait RenderSink {
    /// Called when a flower is reset (full) or drained (empty).
    fn flower_visual_changed(&mut self, zone: ZoneId, visual: FlowerVisual);
}

/// Recording sink, handy for tests and exporters.
impl RenderSink for Vec<(ZoneId, FlowerVisual)> {
    fn flower_visual_changed(&mut self, zone: ZoneId, visual: FlowerVisual) {
        self.push((zone, visual));
    }
}
