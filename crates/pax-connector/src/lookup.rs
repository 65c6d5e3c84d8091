//! Connector listing service contract
//!
//! The listing endpoint takes scope and paging as query parameters and a
//! filter body naming the connectors to fetch:
//!
//! ```text
//! POST /connectors/listV2?accountIdentifier=..&orgIdentifier=..&projectIdentifier=..
//!      &pageIndex=0&pageSize=10&includeAllConnectorsAvailableAtScope=true
//! { "filterType": "Connector", "connectorIdentifiers": ["docker1", "proj-conn"] }
//! ```

use crate::catalog::{ConnectorCatalogEntry, ConnectorStatus};
use crate::scope::{ConnectorReference, ConnectorScope};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Query parameters of a listing call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorQuery {
    pub account_identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_identifier: Option<String>,
    pub page_index: u32,
    pub page_size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_term: Option<String>,
    pub include_all_connectors_available_at_scope: bool,
}

impl ConnectorQuery {
    /// First page at the given scope, including connectors inherited from
    /// parent scopes
    #[must_use]
    pub fn new(account: impl Into<String>, org: Option<String>, project: Option<String>, page_size: u32) -> Self {
        Self {
            account_identifier: account.into(),
            org_identifier: org,
            project_identifier: project,
            page_index: 0,
            page_size,
            search_term: None,
            include_all_connectors_available_at_scope: true,
        }
    }
}

/// Filter body of a listing call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorListRequest {
    pub filter_type: String,
    pub connector_identifiers: Vec<String>,
}

impl ConnectorListRequest {
    pub const FILTER_TYPE: &'static str = "Connector";

    /// Batch request for identifiers, deduplicated in first-seen order
    #[must_use]
    pub fn for_identifiers<I, S>(identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut connector_identifiers: Vec<String> = Vec::new();
        for id in identifiers {
            let id = id.into();
            if !connector_identifiers.contains(&id) {
                connector_identifiers.push(id);
            }
        }
        Self {
            filter_type: Self::FILTER_TYPE.to_string(),
            connector_identifiers,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connector_identifiers.is_empty()
    }
}

/// One page of connector summaries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorPage {
    #[serde(default)]
    pub content: Vec<ConnectorSummary>,
    #[serde(default)]
    pub page_index: u32,
    #[serde(default)]
    pub page_size: u32,
    #[serde(default)]
    pub total_items: u64,
}

/// Listing entry: connector info plus connectivity status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorSummary {
    pub connector: ConnectorInfo,
    #[serde(default)]
    pub status: Option<ConnectorStatusBody>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorInfo {
    pub identifier: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub connector_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_identifier: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorStatusBody {
    pub status: ConnectorStatus,
}

impl ConnectorSummary {
    /// Scope the connector is defined at
    #[must_use]
    pub fn scope(&self) -> ConnectorScope {
        let set = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        if set(&self.connector.project_identifier) {
            ConnectorScope::Project
        } else if set(&self.connector.org_identifier) {
            ConnectorScope::Org
        } else {
            ConnectorScope::Account
        }
    }

    /// Catalog entry for this summary
    #[must_use]
    pub fn to_entry(&self) -> ConnectorCatalogEntry {
        ConnectorCatalogEntry {
            reference: ConnectorReference::new(self.scope(), self.connector.identifier.clone()),
            name: self.connector.name.clone(),
            connector_type: self.connector.connector_type.clone(),
            status: self
                .status
                .as_ref()
                .map_or(ConnectorStatus::Unknown, |s| s.status),
        }
    }
}

/// Listing failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    /// Service answered with an error status
    #[error("connector service returned {status}: {message}")]
    Http { status: u16, message: String },

    /// Request never completed
    #[error("connector service unreachable: {0}")]
    Transport(String),

    /// Response body did not decode
    #[error("invalid connector listing: {0}")]
    Decode(String),
}

impl LookupError {
    /// Worth offering the user a retry
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { status, .. } => *status >= 500 || *status == 429,
            Self::Transport(_) => true,
            Self::Decode(_) => false,
        }
    }
}

impl From<serde_json::Error> for LookupError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// External connector listing service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConnectorLookup: Send + Sync {
    /// Fetch one page of connectors matching `request`
    async fn list_connectors(
        &self,
        query: &ConnectorQuery,
        request: &ConnectorListRequest,
    ) -> Result<ConnectorPage, LookupError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn request_wire_shape() {
        let request = ConnectorListRequest::for_identifiers(["docker1", "proj-conn", "docker1"]);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"filterType": "Connector", "connectorIdentifiers": ["docker1", "proj-conn"]})
        );
    }

    #[test]
    fn query_wire_shape() {
        let query = ConnectorQuery::new("acc", Some("default".into()), None, 10);
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            json!({
                "accountIdentifier": "acc",
                "orgIdentifier": "default",
                "pageIndex": 0,
                "pageSize": 10,
                "includeAllConnectorsAvailableAtScope": true
            })
        );
    }

    #[test]
    fn page_decodes_and_derives_scope() {
        let page: ConnectorPage = serde_json::from_value(json!({
            "content": [
                {"connector": {"identifier": "docker1", "name": "Docker", "type": "DockerRegistry"},
                 "status": {"status": "SUCCESS"}},
                {"connector": {"identifier": "aws", "name": "AWS", "type": "Aws", "orgIdentifier": "default"},
                 "status": {"status": "FAILURE"}},
                {"connector": {"identifier": "proj-conn", "name": "P", "type": "Gcp",
                               "orgIdentifier": "default", "projectIdentifier": "web"}}
            ],
            "pageIndex": 0,
            "pageSize": 10,
            "totalItems": 3
        }))
        .unwrap();

        let entries: Vec<_> = page.content.iter().map(ConnectorSummary::to_entry).collect();
        assert_eq!(entries[0].reference, ConnectorReference::new(ConnectorScope::Account, "docker1"));
        assert_eq!(entries[0].status, ConnectorStatus::Success);
        assert_eq!(entries[1].reference.scope, ConnectorScope::Org);
        assert_eq!(entries[1].status, ConnectorStatus::Failure);
        assert_eq!(entries[2].reference.scope, ConnectorScope::Project);
        assert_eq!(entries[2].status, ConnectorStatus::Unknown);
    }

    #[test]
    fn retry_classification() {
        assert!(LookupError::Transport("timeout".into()).is_retryable());
        assert!(LookupError::Http { status: 503, message: "busy".into() }.is_retryable());
        assert!(!LookupError::Http { status: 404, message: "gone".into() }.is_retryable());
        assert!(!LookupError::Decode("bad".into()).is_retryable());
    }

    #[tokio::test]
    async fn mocked_lookup() {
        let mut lookup = MockConnectorLookup::new();
        lookup
            .expect_list_connectors()
            .withf(|_, request| request.connector_identifiers == vec!["docker1".to_string()])
            .times(1)
            .returning(|_, _| Ok(ConnectorPage::default()));

        let page = lookup
            .list_connectors(
                &ConnectorQuery::new("acc", None, None, 10),
                &ConnectorListRequest::for_identifiers(["docker1"]),
            )
            .await
            .unwrap();
        assert!(page.content.is_empty());
    }
}
