//! UI effects
//!
//! Toggle widgets call into the session; the session echoes the resulting
//! state back so widgets never drift from actual visibility. The binding is
//! one-way: widgets do not write state directly.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which toggle a widget is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeToggleKind {
    /// Group show/hide for toggleable (info) badges
    ShowToggleableBadges,
    /// Replicated hide of the local participant's own badge
    ShowMyBadge,
    /// Local umbrella flag over the whole badge layer
    ShowAllBadges,
}

impl fmt::Display for BadgeToggleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BadgeToggleKind::ShowToggleableBadges => "show_toggleable_badges",
            BadgeToggleKind::ShowMyBadge => "show_my_badge",
            BadgeToggleKind::ShowAllBadges => "show_all_badges",
        };
        f.write_str(name)
    }
}

/// Widget-facing effects.
pub trait UiEffects: Send + Sync {
    /// Push the resulting "shown" state of a toggle back to its widget.
    fn echo_toggle(&self, kind: BadgeToggleKind, shown: bool);

    /// Enable or disable the widget bound to `kind`.
    fn set_toggle_interactable(&self, kind: BadgeToggleKind, interactable: bool);
}
