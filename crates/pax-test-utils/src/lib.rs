//! Testing utilities for PAX workspace
//!
//! Shared fixtures, artifact builders, and in-memory stand-ins for the
//! connector listing service and the document store.

#![allow(missing_docs)]

use async_trait::async_trait;
use dashmap::DashMap;
use pax_artifact::ArtifactEntry;
use pax_connector::{
    ConnectorInfo, ConnectorListRequest, ConnectorLookup, ConnectorPage, ConnectorQuery, ConnectorScope,
    ConnectorStatus, ConnectorStatusBody, ConnectorSummary, LookupError,
};
use pax_document::{node, Document};
use pax_session::{DocumentStore, StoreError};
use parking_lot::Mutex;

/// Pipeline with a plain stage (primary + sidecar + two override sets, one
/// wrapped and one bare), a parallel group, and a stage propagating from
/// `build`
pub const PIPELINE_YAML: &str = r#"pipeline:
  identifier: release
  name: Release
  stages:
    - stage:
        identifier: build
        name: Build
        type: Deployment
        spec:
          serviceConfig:
            serviceRef: web
            serviceDefinition:
              type: Kubernetes
              spec:
                manifests: []
                artifacts:
                  primary:
                    type: DockerRegistry
                    spec:
                      connectorRef: account.docker
                      imagePath: library/nginx
                      tag: "1.25"
                  sidecars:
                    - sidecar:
                        identifier: log-agent
                        type: Ecr
                        spec:
                          connectorRef: org.aws
                          region: us-east-1
                          imagePath: agents/log
                          tag: "2.1"
                artifactOverrideSets:
                  - overrideSet:
                      identifier: prod
                      artifacts:
                        primary:
                          type: Gcr
                          spec:
                            connectorRef: gcp
                            registryHostname: gcr.io
                            imagePath: web/app
                            tag: stable
                  - identifier: set1
                    artifacts: {}
          execution:
            steps: []
    - parallel:
        - stage:
            identifier: qa
            name: QA
            type: Deployment
            spec:
              serviceConfig:
                serviceDefinition:
                  type: Kubernetes
                  spec: {}
        - stage:
            identifier: prod_deploy
            name: Prod Deploy
            type: Deployment
            spec:
              serviceConfig:
                useFromStage:
                  stage: build
                stageOverrides:
                  manifests: []
"#;

/// Parsed [`PIPELINE_YAML`]
#[must_use]
pub fn pipeline() -> Document {
    Document::from_yaml(PIPELINE_YAML).unwrap()
}

/// Pipeline with one `deploy` stage and no artifacts anywhere
#[must_use]
pub fn empty_pipeline() -> Document {
    Document::new(node!({
        "pipeline": {
            "identifier": "empty",
            "stages": [
                {"stage": {
                    "identifier": "deploy",
                    "name": "Deploy",
                    "spec": {"serviceConfig": {"serviceDefinition": {"type": "Kubernetes", "spec": {}}}}
                }}
            ]
        }
    }))
}

/// Primary Docker artifact using `connector`
#[must_use]
pub fn docker_primary(connector: &str) -> ArtifactEntry {
    ArtifactEntry::primary(
        "DockerRegistry",
        node!({"connectorRef": connector, "imagePath": "library/nginx", "tag": "latest"}),
    )
}

/// ECR sidecar `identifier` using `connector`
#[must_use]
pub fn ecr_sidecar(identifier: &str, connector: &str) -> ArtifactEntry {
    ArtifactEntry::sidecar(
        identifier,
        "Ecr",
        node!({"connectorRef": connector, "region": "us-east-1", "imagePath": identifier}),
    )
}

/// Listing entry for a connector at `scope`
#[must_use]
pub fn connector_summary(identifier: &str, scope: ConnectorScope, status: ConnectorStatus) -> ConnectorSummary {
    let (org, project) = match scope {
        ConnectorScope::Account => (None, None),
        ConnectorScope::Org => (Some("default".to_string()), None),
        ConnectorScope::Project => (Some("default".to_string()), Some("web".to_string())),
    };
    ConnectorSummary {
        connector: ConnectorInfo {
            identifier: identifier.to_string(),
            name: identifier.to_string(),
            connector_type: "DockerRegistry".to_string(),
            org_identifier: org,
            project_identifier: project,
        },
        status: Some(ConnectorStatusBody { status }),
    }
}

/// In-memory connector listing service
///
/// Answers with the known connectors named in the request, paged by the
/// query's `page_index` / `page_size`, and records every call.
#[derive(Debug, Default)]
pub struct FakeLookup {
    connectors: Mutex<Vec<ConnectorSummary>>,
    calls: Mutex<Vec<(ConnectorQuery, ConnectorListRequest)>>,
    failure: Mutex<Option<LookupError>>,
}

impl FakeLookup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_connector(self, summary: ConnectorSummary) -> Self {
        self.add(summary);
        self
    }

    pub fn add(&self, summary: ConnectorSummary) {
        self.connectors.lock().push(summary);
    }

    /// Fail every call with `err` until cleared
    pub fn fail_with(&self, err: Option<LookupError>) {
        *self.failure.lock() = err;
    }

    /// Requests received so far
    #[must_use]
    pub fn requests(&self) -> Vec<ConnectorListRequest> {
        self.calls.lock().iter().map(|(_, request)| request.clone()).collect()
    }

    /// Queries received so far
    #[must_use]
    pub fn queries(&self) -> Vec<ConnectorQuery> {
        self.calls.lock().iter().map(|(query, _)| query.clone()).collect()
    }
}

#[async_trait]
impl ConnectorLookup for FakeLookup {
    async fn list_connectors(
        &self,
        query: &ConnectorQuery,
        request: &ConnectorListRequest,
    ) -> Result<ConnectorPage, LookupError> {
        self.calls.lock().push((query.clone(), request.clone()));
        if let Some(err) = self.failure.lock().clone() {
            return Err(err);
        }

        let matching: Vec<ConnectorSummary> = self
            .connectors
            .lock()
            .iter()
            .filter(|s| request.connector_identifiers.contains(&s.connector.identifier))
            .cloned()
            .collect();
        let page_size = query.page_size.max(1) as usize;
        let start = query.page_index as usize * page_size;
        Ok(ConnectorPage {
            total_items: matching.len() as u64,
            content: matching.into_iter().skip(start).take(page_size).collect(),
            page_index: query.page_index,
            page_size: query.page_size,
        })
    }
}

/// In-memory document store
#[derive(Debug, Default)]
pub struct InMemoryStore {
    documents: DashMap<String, String>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_document(self, id: &str, yaml: &str) -> Self {
        self.documents.insert(id.to_string(), yaml.to_string());
        self
    }

    /// Stored YAML of `id`
    #[must_use]
    pub fn get(&self, id: &str) -> Option<String> {
        self.documents.get(id).map(|entry| entry.value().clone())
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn load(&self, id: &str) -> Result<String, StoreError> {
        self.get(id).ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn save(&self, id: &str, yaml: &str) -> Result<(), StoreError> {
        self.documents.insert(id.to_string(), yaml.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures_parse() {
        let doc = pipeline();
        assert!(doc.root().get("pipeline").is_some());
        assert_eq!(docker_primary("acct.docker1").connector_ref(), Some("acct.docker1"));
        assert_eq!(ecr_sidecar("s1", "proj").identifier(), Some("s1"));
    }

    #[tokio::test]
    async fn fake_lookup_pages() {
        let lookup = FakeLookup::new()
            .with_connector(connector_summary("a", ConnectorScope::Account, ConnectorStatus::Success))
            .with_connector(connector_summary("b", ConnectorScope::Org, ConnectorStatus::Success))
            .with_connector(connector_summary("c", ConnectorScope::Project, ConnectorStatus::Failure));
        let request = ConnectorListRequest::for_identifiers(["a", "b", "c"]);
        let mut query = ConnectorQuery::new("acc", None, None, 2);

        let first = lookup.list_connectors(&query, &request).await.unwrap();
        assert_eq!(first.content.len(), 2);
        assert_eq!(first.total_items, 3);

        query.page_index = 1;
        let second = lookup.list_connectors(&query, &request).await.unwrap();
        assert_eq!(second.content.len(), 1);
        assert_eq!(lookup.requests().len(), 2);
    }
}
