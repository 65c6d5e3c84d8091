//! Connector refresh: reconciliation, token-tagged fetches, stale responses

use pax_artifact::EditingContext;
use pax_connector::{
    ConnectorPage, ConnectorReference, ConnectorScope, ConnectorStatus, LookupError,
};
use pax_session::{EditingSession, ErrorKind, FetchOutcome, SessionConfig};
use pax_test_utils::{connector_summary, docker_primary, pipeline, FakeLookup};
use pretty_assertions::assert_eq;

fn build_session(config: SessionConfig) -> EditingSession {
    EditingSession::open("release", pipeline(), "build", EditingContext::Plain, config).unwrap()
}

fn lookup() -> FakeLookup {
    FakeLookup::new()
        .with_connector(connector_summary("docker", ConnectorScope::Account, ConnectorStatus::Success))
        .with_connector(connector_summary("aws", ConnectorScope::Org, ConnectorStatus::Failure))
}

#[tokio::test]
async fn refresh_fills_catalog_then_is_idempotent() {
    let mut session = build_session(SessionConfig::default());
    let lookup = lookup();

    let outcome = session.refresh_connectors(&lookup).await.unwrap();
    assert_eq!(outcome, FetchOutcome::Applied { ingested: 2 });
    assert_eq!(
        lookup.requests()[0].connector_identifiers,
        vec!["docker".to_string(), "aws".to_string()]
    );

    let first = session.reconcile().unwrap();
    let second = session.reconcile().unwrap();
    assert!(first.missing.is_empty());
    assert_eq!(first, second);
    assert_eq!(
        first
            .resolved
            .get(&ConnectorReference::new(ConnectorScope::Org, "aws"))
            .unwrap()
            .status,
        ConnectorStatus::Failure
    );

    assert_eq!(session.refresh_connectors(&lookup).await.unwrap(), FetchOutcome::UpToDate);
    assert_eq!(lookup.requests().len(), 1);
}

#[tokio::test]
async fn refresh_follows_pages() {
    let mut config = SessionConfig::default();
    config.connectors.page_size = 1;
    let mut session = build_session(config);
    let lookup = lookup();

    let outcome = session.refresh_connectors(&lookup).await.unwrap();
    assert_eq!(outcome, FetchOutcome::Applied { ingested: 2 });
    let pages: Vec<_> = lookup.queries().iter().map(|q| q.page_index).collect();
    assert_eq!(pages, vec![0, 1]);
    assert!(session.reconcile().unwrap().is_complete());
}

#[tokio::test]
async fn query_carries_configured_scope() {
    let config = SessionConfig::default().with_scope("acc", Some("default".into()), Some("web".into()));
    let mut session = build_session(config);
    let lookup = lookup();
    session.refresh_connectors(&lookup).await.unwrap();

    let query = &lookup.queries()[0];
    assert_eq!(query.account_identifier, "acc");
    assert_eq!(query.org_identifier.as_deref(), Some("default"));
    assert_eq!(query.project_identifier.as_deref(), Some("web"));
    assert!(query.include_all_connectors_available_at_scope);
}

#[test]
fn superseded_fetch_is_dropped() {
    let mut session = build_session(SessionConfig::default());
    let stale = session.begin_fetch().unwrap().unwrap();

    // The user edits the connector before the first lookup returns
    session.set_primary(docker_primary("org.mirror")).unwrap();
    let current = session.begin_fetch().unwrap().unwrap();
    assert!(current.token > stale.token);
    assert_eq!(
        current.request.connector_identifiers,
        vec!["mirror".to_string(), "aws".to_string()]
    );

    let document = session.document().clone();
    let stale_page = ConnectorPage {
        content: vec![connector_summary("docker", ConnectorScope::Account, ConnectorStatus::Success)],
        ..ConnectorPage::default()
    };
    assert_eq!(session.complete_fetch(stale.token, Ok(stale_page)), FetchOutcome::Stale);
    assert!(!session
        .catalog()
        .contains(&ConnectorReference::new(ConnectorScope::Account, "docker")));

    let page = ConnectorPage {
        content: vec![
            connector_summary("mirror", ConnectorScope::Org, ConnectorStatus::Success),
            connector_summary("aws", ConnectorScope::Org, ConnectorStatus::Success),
        ],
        ..ConnectorPage::default()
    };
    assert_eq!(
        session.complete_fetch(current.token, Ok(page)),
        FetchOutcome::Applied { ingested: 2 }
    );
    assert!(session.reconcile().unwrap().is_complete());

    // Fetch completion never touches the document
    assert!(session.document().same_version(&document));
}

#[test]
fn late_duplicate_completion_is_stale() {
    let mut session = build_session(SessionConfig::default());
    let ticket = session.begin_fetch().unwrap().unwrap();
    assert_eq!(
        session.complete_fetch(ticket.token, Ok(ConnectorPage::default())),
        FetchOutcome::Applied { ingested: 0 }
    );
    assert_eq!(
        session.complete_fetch(ticket.token, Ok(ConnectorPage::default())),
        FetchOutcome::Stale
    );
}

#[tokio::test]
async fn failed_lookup_is_retryable_by_the_user() {
    let mut session = build_session(SessionConfig::default());
    let lookup = lookup();
    lookup.fail_with(Some(LookupError::Transport("connection reset".into())));

    let err = session.refresh_connectors(&lookup).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
    assert!(err.is_retryable());
    assert_eq!(session.reconcile().unwrap().missing.len(), 2);

    lookup.fail_with(None);
    assert_eq!(
        session.refresh_connectors(&lookup).await.unwrap(),
        FetchOutcome::Applied { ingested: 2 }
    );
}

#[tokio::test]
async fn catalog_is_keyed_by_scope() {
    let mut session = build_session(SessionConfig::default());
    // Listing knows `docker` only at org scope; the artifact asks for account scope
    let lookup = FakeLookup::new()
        .with_connector(connector_summary("docker", ConnectorScope::Org, ConnectorStatus::Success))
        .with_connector(connector_summary("aws", ConnectorScope::Org, ConnectorStatus::Success));

    session.refresh_connectors(&lookup).await.unwrap();
    let outcome = session.reconcile().unwrap();
    assert_eq!(
        outcome.missing,
        vec![ConnectorReference::new(ConnectorScope::Account, "docker")]
    );
}
