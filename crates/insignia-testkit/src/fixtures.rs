//! Shared fixtures: a representative badge configuration and entity helpers.

use insignia_core::{BadgeConfig, Entity, EntityId, RoleBadge, TemplateId};

/// Top ranked tier.
pub const ROLE_CHIEF: &str = "Chief";
/// Second ranked tier.
pub const ROLE_OFFICER: &str = "Officer";
/// Lowest ranked tier.
pub const ROLE_CADET: &str = "Cadet";
/// Additive role.
pub const ROLE_EVENT_STAFF: &str = "Event Staff";
/// Additive role.
pub const ROLE_MODERATOR: &str = "Moderator";
/// Toggleable role.
pub const ROLE_INFO: &str = "Info";

/// Template name used for `role` in `standard_config`.
pub fn template_for(role: &str) -> TemplateId {
    TemplateId::new(format!("badge_{}", role.to_lowercase().replace(' ', "_")))
}

/// Three exclusive tiers, two additive roles and one toggleable role.
pub fn standard_config() -> BadgeConfig {
    let pair = |role: &str| RoleBadge::new(role, template_for(role));
    BadgeConfig {
        exclusive_tiers: vec![pair(ROLE_CHIEF), pair(ROLE_OFFICER), pair(ROLE_CADET)],
        additive_roles: vec![pair(ROLE_EVENT_STAFF), pair(ROLE_MODERATOR)],
        toggleable_roles: vec![pair(ROLE_INFO)],
        ..BadgeConfig::default()
    }
}

/// Entity with the given id and display name.
pub fn entity(id: u32, display_name: &str) -> Entity {
    Entity::new(EntityId(id), display_name)
}
