//! Join-time role resolution
//!
//! Decides which badges an entity gets from the roster. Exclusive tiers
//! model a strict rank hierarchy (highest matching tier only); additive and
//! toggleable roles stack with everything.

use insignia_core::{BadgeConfig, RoleBadge, RosterEffects};
use serde::{Deserialize, Serialize};

/// The badges one entity qualifies for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgePlan {
    /// First ranked tier the entity holds
    pub exclusive: Option<RoleBadge>,
    /// Every additive role held
    pub additive: Vec<RoleBadge>,
    /// Every toggleable role held
    pub toggleable: Vec<RoleBadge>,
}

impl BadgePlan {
    /// True for a member holding none of the configured roles.
    pub fn is_empty(&self) -> bool {
        self.exclusive.is_none() && self.additive.is_empty() && self.toggleable.is_empty()
    }

    /// Total badges to attach.
    pub fn badge_count(&self) -> usize {
        usize::from(self.exclusive.is_some()) + self.additive.len() + self.toggleable.len()
    }
}

/// Resolve the badges for `display_name`.
///
/// Returns `None` when the entity is not a roster member; no role queries
/// are made in that case.
pub fn resolve_badges<R>(config: &BadgeConfig, roster: &R, display_name: &str) -> Option<BadgePlan>
where
    R: RosterEffects + ?Sized,
{
    if !roster.is_roster_member(display_name) {
        tracing::debug!(display_name, "Not a roster member; no badge");
        return None;
    }

    let exclusive = config
        .exclusive_tiers
        .iter()
        .find(|tier| roster.has_role(display_name, &tier.role))
        .cloned();

    let matching = |roles: &[RoleBadge]| -> Vec<RoleBadge> {
        roles
            .iter()
            .filter(|badge| roster.has_role(display_name, &badge.role))
            .cloned()
            .collect()
    };

    let plan = BadgePlan {
        exclusive,
        additive: matching(&config.additive_roles),
        toggleable: matching(&config.toggleable_roles),
    };

    tracing::debug!(
        display_name,
        exclusive = plan.exclusive.as_ref().map(|b| b.role.as_str()),
        additive = plan.additive.len(),
        toggleable = plan.toggleable.len(),
        "Resolved badge plan"
    );
    Some(plan)
}
