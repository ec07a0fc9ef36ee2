//! Badge engine configuration
//!
//! Role lists are ordered pairs of role name and badge template. The
//! exclusive tiers must be listed from highest rank to lowest: only the first
//! tier the roster confirms is shown.

use crate::geometry::Vec3;
use crate::identifiers::{RoleName, TemplateId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Environment override for the toggle rate-limit window, in milliseconds.
pub const ENV_TOGGLE_WINDOW_MS: &str = "INSIGNIA_TOGGLE_WINDOW_MS";
/// Environment override for the number of toggles allowed per window.
pub const ENV_TOGGLE_MAX: &str = "INSIGNIA_TOGGLE_MAX";

/// Errors from loading or validating configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config file: {0}")]
    Io(String),

    /// Malformed TOML
    #[error("invalid TOML: {0}")]
    Toml(String),

    /// Malformed JSON
    #[error("invalid JSON: {0}")]
    Json(String),

    /// Extension other than `.toml` or `.json`
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),

    /// A field failed validation
    #[error("invalid value for {key}: {reason}")]
    InvalidValue {
        /// Offending field or environment variable
        key: String,
        /// What was wrong with it
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// A role paired with the badge template shown for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleBadge {
    /// Role name as known to the roster
    pub role: RoleName,
    /// Template instantiated when the role matches
    pub template: TemplateId,
}

impl RoleBadge {
    /// Create a role/template pair.
    pub fn new(role: impl Into<RoleName>, template: impl Into<TemplateId>) -> Self {
        Self {
            role: role.into(),
            template: template.into(),
        }
    }
}

/// Sliding-window limit on own-badge toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToggleRateLimitConfig {
    /// Window length in milliseconds
    pub window_ms: u64,
    /// Toggles allowed inside one window
    pub max_toggles: u32,
}

impl ToggleRateLimitConfig {
    /// Window length as a `Duration`.
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

impl Default for ToggleRateLimitConfig {
    fn default() -> Self {
        Self {
            window_ms: 5_000,
            max_toggles: 3,
        }
    }
}

/// Configuration for one badge session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BadgeConfig {
    /// Offset from the entity's head to the badge anchor
    pub badge_offset: Vec3,
    /// Ranked roles, highest first; first match wins
    pub exclusive_tiers: Vec<RoleBadge>,
    /// Roles whose badges stack with everything else
    pub additive_roles: Vec<RoleBadge>,
    /// Roles whose badges also follow the group show/hide toggle
    pub toggleable_roles: Vec<RoleBadge>,
    /// Own-badge toggle limiter
    pub toggle_rate_limit: ToggleRateLimitConfig,
    /// Initial state of the toggleable badge group
    pub toggleable_shown_by_default: bool,
    /// Initial state of the umbrella "all badges" flag
    pub all_badges_shown_by_default: bool,
}

impl Default for BadgeConfig {
    fn default() -> Self {
        Self {
            badge_offset: Vec3::new(0.0, 0.5, 0.0),
            exclusive_tiers: Vec::new(),
            additive_roles: Vec::new(),
            toggleable_roles: Vec::new(),
            toggle_rate_limit: ToggleRateLimitConfig::default(),
            toggleable_shown_by_default: false,
            all_badges_shown_by_default: true,
        }
    }
}

impl BadgeConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Toml(e.to_string()))
    }

    /// Parse a JSON document.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|e| ConfigError::Json(e.to_string()))
    }

    /// Load configuration from a `.toml` or `.json` file and validate it.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;

        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&content)?,
            Some("json") => Self::from_json_str(&content)?,
            other => {
                return Err(ConfigError::UnsupportedFormat(
                    other.unwrap_or("<none>").to_string(),
                ))
            }
        };
        config.validate()?;

        tracing::debug!(
            path = %path.display(),
            exclusive = config.exclusive_tiers.len(),
            additive = config.additive_roles.len(),
            toggleable = config.toggleable_roles.len(),
            "Loaded badge configuration"
        );
        Ok(config)
    }

    /// Apply `INSIGNIA_*` environment overrides.
    pub fn merge_with_env(&mut self) -> Result<(), ConfigError> {
        self.merge_with_vars(std::env::vars())
    }

    /// Apply overrides from an explicit variable list.
    pub fn merge_with_vars(
        &mut self,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Result<(), ConfigError> {
        for (key, value) in vars {
            match key.as_str() {
                ENV_TOGGLE_WINDOW_MS => {
                    self.toggle_rate_limit.window_ms = value
                        .parse()
                        .map_err(|_| ConfigError::invalid(ENV_TOGGLE_WINDOW_MS, "not an integer"))?;
                }
                ENV_TOGGLE_MAX => {
                    self.toggle_rate_limit.max_toggles = value
                        .parse()
                        .map_err(|_| ConfigError::invalid(ENV_TOGGLE_MAX, "not an integer"))?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Validate role lists and limiter settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_roles("exclusive_tiers", &self.exclusive_tiers)?;
        validate_roles("additive_roles", &self.additive_roles)?;
        validate_roles("toggleable_roles", &self.toggleable_roles)?;

        if self.toggle_rate_limit.window_ms == 0 {
            return Err(ConfigError::invalid(
                "toggle_rate_limit.window_ms",
                "must be greater than zero",
            ));
        }
        if self.toggle_rate_limit.max_toggles == 0 {
            return Err(ConfigError::invalid(
                "toggle_rate_limit.max_toggles",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

fn validate_roles(key: &str, roles: &[RoleBadge]) -> Result<(), ConfigError> {
    let mut seen = BTreeSet::new();
    for entry in roles {
        if entry.role.is_blank() {
            return Err(ConfigError::invalid(key, "role name must not be empty"));
        }
        if entry.template.as_str().trim().is_empty() {
            return Err(ConfigError::invalid(
                key,
                format!("role {} has an empty template", entry.role),
            ));
        }
        if !seen.insert(entry.role.clone()) {
            return Err(ConfigError::invalid(
                key,
                format!("role {} listed more than once", entry.role),
            ));
        }
    }
    Ok(())
}
