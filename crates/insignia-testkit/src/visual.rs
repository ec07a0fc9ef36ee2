//! Recording visual host
//!
//! Keeps every visual it has issued in a table so tests can ask what a
//! participant would actually see: which canvases exist, which badges hang
//! under them, and what is shown.

use insignia_core::{
    Entity, EntityId, Placement, TemplateId, Vec3, VisualEffects, VisualError, VisualHandle,
};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};

/// What a recorded visual is.
#[derive(Debug, Clone, PartialEq)]
pub enum VisualKind {
    /// Per-entity root
    Canvas { owner: EntityId },
    /// Role badge beneath a canvas
    Badge {
        canvas: VisualHandle,
        template: TemplateId,
    },
}

/// One live visual.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedVisual {
    /// Canvas or badge
    pub kind: VisualKind,
    /// Own active flag (not including parents)
    pub visible: bool,
    /// Last placement, if any
    pub placement: Option<Placement>,
}

#[derive(Debug)]
struct VisualTable {
    next: u64,
    live: BTreeMap<VisualHandle, RecordedVisual>,
    destroyed: BTreeSet<VisualHandle>,
    layer_visible: bool,
    unknown_templates: BTreeSet<TemplateId>,
}

/// In-memory `VisualEffects` implementation.
#[derive(Debug)]
pub struct RecordingVisuals {
    table: Mutex<VisualTable>,
}

impl RecordingVisuals {
    /// Empty table with the layer shown.
    pub fn new() -> Self {
        Self {
            table: Mutex::new(VisualTable {
                next: 1,
                live: BTreeMap::new(),
                destroyed: BTreeSet::new(),
                layer_visible: true,
                unknown_templates: BTreeSet::new(),
            }),
        }
    }

    /// Make `attach_badge` fail for `template`.
    pub fn reject_template(&self, template: impl Into<TemplateId>) {
        self.table.lock().unknown_templates.insert(template.into());
    }

    /// Snapshot of a live visual.
    pub fn get(&self, visual: VisualHandle) -> Option<RecordedVisual> {
        self.table.lock().live.get(&visual).cloned()
    }

    /// Live canvas owned by `entity`, if any.
    pub fn canvas_of(&self, entity: EntityId) -> Option<VisualHandle> {
        self.table
            .lock()
            .live
            .iter()
            .find(|(_, v)| v.kind == VisualKind::Canvas { owner: entity })
            .map(|(handle, _)| *handle)
    }

    /// Templates attached under `entity`'s canvas, in attach order.
    pub fn templates_of(&self, entity: EntityId) -> Vec<TemplateId> {
        let Some(canvas) = self.canvas_of(entity) else {
            return Vec::new();
        };
        self.badges_under(canvas)
            .into_iter()
            .filter_map(|(_, v)| match v.kind {
                VisualKind::Badge { template, .. } => Some(template),
                VisualKind::Canvas { .. } => None,
            })
            .collect()
    }

    /// Badge handle for `template` under `entity`'s canvas.
    pub fn badge_of(&self, entity: EntityId, template: &TemplateId) -> Option<VisualHandle> {
        let canvas = self.canvas_of(entity)?;
        self.badges_under(canvas)
            .into_iter()
            .find(|(_, v)| matches!(&v.kind, VisualKind::Badge { template: t, .. } if t == template))
            .map(|(handle, _)| handle)
    }

    fn badges_under(&self, canvas: VisualHandle) -> Vec<(VisualHandle, RecordedVisual)> {
        self.table
            .lock()
            .live
            .iter()
            .filter(|(_, v)| matches!(v.kind, VisualKind::Badge { canvas: c, .. } if c == canvas))
            .map(|(h, v)| (*h, v.clone()))
            .collect()
    }

    /// Whether `entity`'s canvas is shown, ignoring the layer flag.
    pub fn canvas_visible(&self, entity: EntityId) -> Option<bool> {
        let canvas = self.canvas_of(entity)?;
        self.get(canvas).map(|v| v.visible)
    }

    /// What the viewer would see: layer, canvas and badge all shown.
    pub fn badge_rendered(&self, entity: EntityId, template: &TemplateId) -> bool {
        let Some(canvas) = self.canvas_of(entity) else {
            return false;
        };
        let Some(badge) = self.badge_of(entity, template) else {
            return false;
        };
        let table = self.table.lock();
        table.layer_visible
            && table.live.get(&canvas).is_some_and(|v| v.visible)
            && table.live.get(&badge).is_some_and(|v| v.visible)
    }

    /// Whether the whole badge layer is shown.
    pub fn layer_visible(&self) -> bool {
        self.table.lock().layer_visible
    }

    /// Live visuals of any kind.
    pub fn live_count(&self) -> usize {
        self.table.lock().live.len()
    }

    /// Live canvases.
    pub fn canvas_count(&self) -> usize {
        self.table
            .lock()
            .live
            .values()
            .filter(|v| matches!(v.kind, VisualKind::Canvas { .. }))
            .count()
    }

    /// Destroy a visual behind the engine's back, as the host might.
    pub fn destroy_externally(&self, visual: VisualHandle) {
        self.destroy(visual);
    }
}

impl Default for RecordingVisuals {
    fn default() -> Self {
        Self::new()
    }
}

impl VisualEffects for RecordingVisuals {
    fn spawn_canvas(&self, entity: &Entity, at: Vec3) -> Result<VisualHandle, VisualError> {
        let mut table = self.table.lock();
        let handle = VisualHandle(table.next);
        table.next += 1;
        table.live.insert(
            handle,
            RecordedVisual {
                kind: VisualKind::Canvas { owner: entity.id },
                visible: false,
                placement: Some(Placement {
                    anchor: at,
                    look_at: at,
                }),
            },
        );
        Ok(handle)
    }

    fn attach_badge(
        &self,
        canvas: VisualHandle,
        template: &TemplateId,
    ) -> Result<VisualHandle, VisualError> {
        let mut table = self.table.lock();
        if table.unknown_templates.contains(template) {
            return Err(VisualError::UnknownTemplate(template.as_str().to_string()));
        }
        if !table.live.contains_key(&canvas) {
            return Err(VisualError::Gone(canvas));
        }
        let handle = VisualHandle(table.next);
        table.next += 1;
        table.live.insert(
            handle,
            RecordedVisual {
                kind: VisualKind::Badge {
                    canvas,
                    template: template.clone(),
                },
                visible: true,
                placement: None,
            },
        );
        Ok(handle)
    }

    fn set_visible(&self, visual: VisualHandle, visible: bool) -> Result<(), VisualError> {
        let mut table = self.table.lock();
        let entry = table.live.get_mut(&visual).ok_or(VisualError::Gone(visual))?;
        entry.visible = visible;
        Ok(())
    }

    fn is_visible(&self, visual: VisualHandle) -> bool {
        self.table
            .lock()
            .live
            .get(&visual)
            .is_some_and(|v| v.visible)
    }

    fn is_alive(&self, visual: VisualHandle) -> bool {
        self.table.lock().live.contains_key(&visual)
    }

    fn destroy(&self, visual: VisualHandle) {
        let mut table = self.table.lock();
        if table.live.remove(&visual).is_none() {
            return;
        }
        table.destroyed.insert(visual);

        // Children go with their canvas
        let children: Vec<VisualHandle> = table
            .live
            .iter()
            .filter(|(_, v)| matches!(v.kind, VisualKind::Badge { canvas, .. } if canvas == visual))
            .map(|(h, _)| *h)
            .collect();
        for child in children {
            table.live.remove(&child);
            table.destroyed.insert(child);
        }
    }

    fn place(&self, visual: VisualHandle, placement: Placement) -> Result<(), VisualError> {
        let mut table = self.table.lock();
        let entry = table.live.get_mut(&visual).ok_or(VisualError::Gone(visual))?;
        entry.placement = Some(placement);
        Ok(())
    }

    fn set_layer_visible(&self, visible: bool) {
        self.table.lock().layer_visible = visible;
    }
}
