//! Role prefix configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Official role prefix. Fixed by the platform, never configurable.
pub const OFFICIAL_ROLE_PREFIX: &str = "node-role.kubernetes.io/";

/// Default custom role prefix.
pub const DEFAULT_CUSTOM_ROLE_PREFIX: &str = "node-role.cluster.local/";

/// Environment variable overriding the custom role prefix.
pub const CUSTOM_PREFIX_ENV: &str = "NODE_ROLE_PREFIX";

/// The pair of label prefixes whose role suffixes are mirrored.
///
/// The official prefix is a constant; only the custom side can be changed.
/// Identical prefixes are a permanent misconfiguration: [`PrefixConfig::validate`]
/// rejects them and the caller must stop instead of retrying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixConfig {
    official: String,
    custom: String,
}

impl PrefixConfig {
    /// Create a config with the given custom prefix.
    pub fn new(custom: impl Into<String>) -> Self {
        Self {
            official: OFFICIAL_ROLE_PREFIX.to_string(),
            custom: custom.into(),
        }
    }

    /// Build the config from the process environment.
    ///
    /// An unset or empty `NODE_ROLE_PREFIX` keeps the default custom prefix.
    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var(CUSTOM_PREFIX_ENV).ok())
    }

    fn from_env_value(value: Option<String>) -> Self {
        match value {
            Some(v) if !v.is_empty() => Self::new(v),
            _ => Self::default(),
        }
    }

    /// Get the official prefix.
    pub fn official(&self) -> &str {
        &self.official
    }

    /// Get the custom prefix.
    pub fn custom(&self) -> &str {
        &self.custom
    }

    /// Key for `role` on the official side.
    pub fn official_key(&self, role: &str) -> String {
        format!("{}{role}", self.official)
    }

    /// Key for `role` on the custom side.
    pub fn custom_key(&self, role: &str) -> String {
        format!("{}{role}", self.custom)
    }

    /// Derive the role suffix of a label key, stripping whichever prefix
    /// matches. Keys outside both prefixes are not roles.
    pub fn role_of<'a>(&self, key: &'a str) -> Option<&'a str> {
        key.strip_prefix(self.custom.as_str())
            .or_else(|| key.strip_prefix(self.official.as_str()))
    }

    /// Whether the key sits on the custom side.
    pub fn is_custom(&self, key: &str) -> bool {
        key.starts_with(self.custom.as_str())
    }

    /// Reject identical prefixes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PrefixConflict`] when the custom prefix equals the
    /// official one.
    pub fn validate(&self) -> Result<()> {
        if self.custom == self.official {
            return Err(Error::prefix_conflict(&self.custom));
        }
        Ok(())
    }
}

impl Default for PrefixConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CUSTOM_ROLE_PREFIX)
    }
}
