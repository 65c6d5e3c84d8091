//! Scoped connector references
//!
//! A `connectorRef` string carries its scope as a prefix:
//!
//! ```text
//! account.docker   -> Account / docker
//! acct.docker      -> Account / docker
//! org.aws          -> Org     / aws
//! registry         -> Project / registry
//! ```

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Level of the hierarchy a connector is defined at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorScope {
    Account,
    Org,
    Project,
}

impl ConnectorScope {
    /// Prefix used when rendering a reference at this scope
    #[inline]
    #[must_use]
    pub fn prefix(self) -> Option<&'static str> {
        match self {
            Self::Account => Some("account"),
            Self::Org => Some("org"),
            Self::Project => None,
        }
    }
}

impl Display for ConnectorScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Account => f.write_str("account"),
            Self::Org => f.write_str("org"),
            Self::Project => f.write_str("project"),
        }
    }
}

/// A connector an artifact depends on
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectorReference {
    pub scope: ConnectorScope,
    pub identifier: String,
}

impl ConnectorReference {
    #[inline]
    #[must_use]
    pub fn new(scope: ConnectorScope, identifier: impl Into<String>) -> Self {
        Self {
            scope,
            identifier: identifier.into(),
        }
    }

    /// Parse a `connectorRef` value
    ///
    /// Returns `None` for empty values, runtime expressions (`<+input>`) and
    /// a scope prefix with nothing after it.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() || raw.starts_with("<+") {
            return None;
        }

        let (scope, identifier) = match raw.split_once('.') {
            Some(("account" | "acct", rest)) => (ConnectorScope::Account, rest),
            Some(("org", rest)) => (ConnectorScope::Org, rest),
            _ => (ConnectorScope::Project, raw),
        };

        (!identifier.is_empty()).then(|| Self::new(scope, identifier))
    }
}

impl Display for ConnectorReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.scope.prefix() {
            Some(prefix) => write!(f, "{prefix}.{}", self.identifier),
            None => f.write_str(&self.identifier),
        }
    }
}
