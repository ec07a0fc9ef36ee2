//! Visual host effects.

use crate::errors::VisualError;
use crate::geometry::{Placement, Vec3};
use crate::identifiers::{Entity, TemplateId, VisualHandle};

/// Instantiates, shows, hides, places and destroys badge visuals.
///
/// A canvas is the per-entity root visual; role badges are attached beneath
/// it. Destroying a canvas destroys everything attached to it.
pub trait VisualEffects: Send + Sync {
    /// Create an (initially hidden) canvas for `entity` at `at`.
    fn spawn_canvas(&self, entity: &Entity, at: Vec3) -> Result<VisualHandle, VisualError>;

    /// Instantiate `template` under `canvas`.
    fn attach_badge(
        &self,
        canvas: VisualHandle,
        template: &TemplateId,
    ) -> Result<VisualHandle, VisualError>;

    fn set_visible(&self, visual: VisualHandle, visible: bool) -> Result<(), VisualError>;

    fn is_visible(&self, visual: VisualHandle) -> bool;

    /// False once the visual has been destroyed, by us or by the host.
    fn is_alive(&self, visual: VisualHandle) -> bool;

    fn destroy(&self, visual: VisualHandle);

    fn place(&self, visual: VisualHandle, placement: Placement) -> Result<(), VisualError>;

    /// Show or hide the whole badge layer, independent of per-visual state.
    fn set_layer_visible(&self, visible: bool);
}
