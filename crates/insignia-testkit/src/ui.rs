//! Recording UI.

use insignia_core::{BadgeToggleKind, UiEffects};
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Debug, Default)]
struct UiState {
    shown: HashMap<BadgeToggleKind, bool>,
    interactable: HashMap<BadgeToggleKind, bool>,
    echoes: u64,
}

/// Remembers the last echoed state and interactability per toggle.
#[derive(Debug, Default)]
pub struct RecordingUi {
    state: Mutex<UiState>,
}

impl RecordingUi {
    /// UI with no echoes recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Last echoed "shown" state, or `None` if never echoed.
    pub fn shown(&self, kind: BadgeToggleKind) -> Option<bool> {
        self.state.lock().shown.get(&kind).copied()
    }

    /// Widgets are interactable until the session disables them.
    pub fn interactable(&self, kind: BadgeToggleKind) -> bool {
        self.state
            .lock()
            .interactable
            .get(&kind)
            .copied()
            .unwrap_or(true)
    }

    /// Total echoes received.
    pub fn echo_count(&self) -> u64 {
        self.state.lock().echoes
    }
}

impl UiEffects for RecordingUi {
    fn echo_toggle(&self, kind: BadgeToggleKind, shown: bool) {
        let mut state = self.state.lock();
        state.shown.insert(kind, shown);
        state.echoes += 1;
    }

    fn set_toggle_interactable(&self, kind: BadgeToggleKind, interactable: bool) {
        self.state
            .lock()
            .interactable
            .insert(kind, interactable);
    }
}
