//! Publishing configuration
//!
//! Defaults match a stock deployment; a TOML file and a handful of
//! environment variables can override them.

use serde::{Deserialize, Serialize};

use crate::errors::{QuireError, Result};

pub const ENV_ADMIN_PREFIX: &str = "QUIRE_ADMIN_PREFIX";
pub const ENV_REVIEWER_GROUP: &str = "QUIRE_REVIEWER_GROUP";
pub const ENV_EDIT_PARAM: &str = "QUIRE_EDIT_PARAM";

/// Settings for the request gate and the draft URL signer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishingConfig {
    /// Requests under this path prefix always see drafts
    pub admin_prefix: String,
    /// Members of this group always see drafts
    pub reviewer_group: String,
    /// Query parameter carrying the preview token
    pub edit_param: String,
    /// Random salt length for preview tokens
    pub salt_length: usize,
    /// Length of a generated secret key
    pub secret_key_length: usize,
    /// Settings row the secret key is stored under
    pub secret_key_name: String,
}

impl Default for PublishingConfig {
    fn default() -> Self {
        Self {
            admin_prefix: "/admin/".to_string(),
            reviewer_group: "Content Reviewers".to_string(),
            edit_param: "edit".to_string(),
            salt_length: 5,
            secret_key_length: 50,
            secret_key_name: "DRAFT_SECRET_KEY".to_string(),
        }
    }
}

impl PublishingConfig {
    /// Parse a TOML document; missing keys take their defaults
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` on malformed TOML or invalid values.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source).map_err(|e| QuireError::InvalidConfig {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Override values from `QUIRE_*` environment variables
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if an overridden value is invalid.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Defaults overridden from the environment
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if an overridden value is invalid.
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides()
    }

    fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(prefix) = lookup(ENV_ADMIN_PREFIX) {
            self.admin_prefix = prefix;
        }
        if let Some(group) = lookup(ENV_REVIEWER_GROUP) {
            self.reviewer_group = group;
        }
        if let Some(param) = lookup(ENV_EDIT_PARAM) {
            self.edit_param = param;
        }
        self.validate()?;
        Ok(self)
    }

    /// # Errors
    ///
    /// Returns `InvalidConfig` describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| {
            Err(QuireError::InvalidConfig {
                reason: reason.to_string(),
            })
        };
        if !self.admin_prefix.starts_with('/') {
            return invalid("admin_prefix must start with '/'");
        }
        if self.edit_param.is_empty() {
            return invalid("edit_param must not be empty");
        }
        if self.salt_length == 0 {
            return invalid("salt_length must be positive");
        }
        if self.secret_key_length < 16 {
            return invalid("secret_key_length must be at least 16");
        }
        if self.secret_key_name.is_empty() {
            return invalid("secret_key_name must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PublishingConfig::default();
        assert_eq!(config.admin_prefix, "/admin/");
        assert_eq!(config.reviewer_group, "Content Reviewers");
        assert_eq!(config.edit_param, "edit");
        assert_eq!(config.salt_length, 5);
        assert_eq!(config.secret_key_length, 50);
        assert_eq!(config.secret_key_name, "DRAFT_SECRET_KEY");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = PublishingConfig::from_toml_str("admin_prefix = \"/cms/\"").unwrap();
        assert_eq!(config.admin_prefix, "/cms/");
        assert_eq!(config.edit_param, "edit");
    }

    #[test]
    fn test_invalid_toml_value_rejected() {
        let result = PublishingConfig::from_toml_str("salt_length = 0");
        assert!(matches!(result, Err(QuireError::InvalidConfig { .. })));
    }

    #[test]
    fn test_overrides_apply() {
        let config = PublishingConfig::default()
            .with_overrides(|key| (key == ENV_EDIT_PARAM).then(|| "preview".to_string()))
            .unwrap();
        assert_eq!(config.edit_param, "preview");
        assert_eq!(config.admin_prefix, "/admin/");
    }
}
