//! Session configuration
//!
//! ```toml
//! clear_primary = "empty_spec"
//!
//! [catalog]
//! max_capacity = 500
//! ttl_secs = 300
//!
//! [connectors]
//! account_identifier = "acc"
//! org_identifier = "default"
//! project_identifier = "web"
//! page_size = 25
//! ```

use pax_artifact::ClearPrimaryPolicy;
use pax_connector::{ConnectorCatalog, ConnectorQuery};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot encode configuration: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Editing session configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// What clearing the primary leaves in the document
    pub clear_primary: ClearPrimaryPolicy,
    /// Connector catalog sizing
    pub catalog: CatalogConfig,
    /// Scope of connector listing calls
    pub connectors: ConnectorScopeConfig,
}

impl SessionConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate TOML
    ///
    /// # Errors
    /// Malformed TOML or out-of-range values.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// Unreadable file, malformed TOML or out-of-range values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Encode as TOML
    ///
    /// # Errors
    /// Encoding failure.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.catalog.max_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "catalog.max_capacity",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.connectors.page_size == 0 {
            return Err(ConfigError::Invalid {
                field: "connectors.page_size",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.connectors.project_identifier.is_some() && self.connectors.org_identifier.is_none() {
            return Err(ConfigError::Invalid {
                field: "connectors.project_identifier",
                reason: "a project scope needs org_identifier".to_string(),
            });
        }
        Ok(())
    }

    /// With clear-primary policy
    #[inline]
    #[must_use]
    pub fn with_clear_primary(mut self, policy: ClearPrimaryPolicy) -> Self {
        self.clear_primary = policy;
        self
    }

    /// With catalog capacity
    #[inline]
    #[must_use]
    pub fn with_catalog_capacity(mut self, max_capacity: u64) -> Self {
        self.catalog.max_capacity = max_capacity;
        self
    }

    /// With catalog entry lifetime
    #[inline]
    #[must_use]
    pub fn with_catalog_ttl(mut self, ttl: Duration) -> Self {
        self.catalog.ttl_secs = Some(ttl.as_secs());
        self
    }

    /// With connector listing scope
    #[inline]
    #[must_use]
    pub fn with_scope(mut self, account: impl Into<String>, org: Option<String>, project: Option<String>) -> Self {
        self.connectors.account_identifier = account.into();
        self.connectors.org_identifier = org;
        self.connectors.project_identifier = project;
        self
    }

    /// Catalog sized by this configuration
    #[must_use]
    pub fn build_catalog(&self) -> ConnectorCatalog {
        match self.catalog.ttl_secs {
            Some(secs) => ConnectorCatalog::with_ttl(self.catalog.max_capacity, Duration::from_secs(secs)),
            None => ConnectorCatalog::new(self.catalog.max_capacity),
        }
    }

    /// First-page listing query at the configured scope
    #[must_use]
    pub fn query(&self) -> ConnectorQuery {
        ConnectorQuery::new(
            self.connectors.account_identifier.clone(),
            self.connectors.org_identifier.clone(),
            self.connectors.project_identifier.clone(),
            self.connectors.page_size,
        )
    }
}

/// Connector catalog sizing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Maximum cached connectors
    pub max_capacity: u64,
    /// Entry lifetime; unset keeps entries for the whole session
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_secs: Option<u64>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            max_capacity: 1_000,
            ttl_secs: None,
        }
    }
}

/// Account / org / project the session lists connectors at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorScopeConfig {
    pub account_identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_identifier: Option<String>,
    pub page_size: u32,
}

impl Default for ConnectorScopeConfig {
    fn default() -> Self {
        Self {
            account_identifier: String::new(),
            org_identifier: None,
            project_identifier: None,
            page_size: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.clear_primary, ClearPrimaryPolicy::Null);
        assert_eq!(config.catalog.max_capacity, 1_000);
        assert_eq!(config.connectors.page_size, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_full() {
        let config = SessionConfig::from_toml_str(
            r#"
            clear_primary = "empty_spec"

            [catalog]
            max_capacity = 500
            ttl_secs = 300

            [connectors]
            account_identifier = "acc"
            org_identifier = "default"
            project_identifier = "web"
            page_size = 25
            "#,
        )
        .unwrap();

        assert_eq!(config.clear_primary, ClearPrimaryPolicy::EmptySpec);
        assert_eq!(config.catalog.ttl_secs, Some(300));
        let query = config.query();
        assert_eq!(query.account_identifier, "acc");
        assert_eq!(query.project_identifier.as_deref(), Some("web"));
        assert_eq!(query.page_size, 25);
    }

    #[test]
    fn policy_names() {
        for (name, policy) in [
            ("null", ClearPrimaryPolicy::Null),
            ("empty_spec", ClearPrimaryPolicy::EmptySpec),
            ("remove", ClearPrimaryPolicy::Remove),
        ] {
            let config = SessionConfig::from_toml_str(&format!("clear_primary = \"{name}\"")).unwrap();
            assert_eq!(config.clear_primary, policy);
        }
        assert!(matches!(
            SessionConfig::from_toml_str("clear_primary = \"delete\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn rejects_zero_page_size() {
        let err = SessionConfig::from_toml_str("[connectors]\npage_size = 0").unwrap_err();
        assert!(err.to_string().contains("connectors.page_size"));
    }

    #[test]
    fn rejects_project_without_org() {
        let config = SessionConfig::new().with_scope("acc", None, Some("web".into()));
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn toml_round_trip() {
        let config = SessionConfig::new()
            .with_clear_primary(ClearPrimaryPolicy::Remove)
            .with_catalog_capacity(42)
            .with_catalog_ttl(Duration::from_secs(60))
            .with_scope("acc", Some("default".into()), None);
        let encoded = config.to_toml_string().unwrap();
        assert_eq!(SessionConfig::from_toml_str(&encoded).unwrap(), config);
    }
}
