//! End-to-end behaviour of `ClinicalRecordsClient` over a scripted transport.

use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;

use oncohub_clinical::transport::mock::MockTransport;
use oncohub_clinical::{CancelToken, ClinicalRecordsClient, RetryPolicy};
use oncohub_common::{AuthState, AuthToken, ErrorKind, OncohubError, SessionContext};
use oncohub_config::FhirConfig;

const TOKEN_OK: &str = r#"{"access_token":"tok-abc","token_type":"bearer","expires_in":3600}"#;

const BUNDLE: &str = r#"{
  "resourceType": "Bundle",
  "type": "searchset",
  "entry": [
    {"resource": {"resourceType": "DiagnosticReport", "id": "r1", "status": "final",
                  "code": {"text": "Tumor Genomic Profile"}, "issued": "2024-03-01T09:00:00Z",
                  "result": [{"reference": "Observation/o1"}]}},
    {"resource": {"resourceType": "DiagnosticReport", "id": "r2", "status": "preliminary",
                  "code": {"text": "CBC"}, "issued": "2024-03-02T09:00:00Z"}}
  ]
}"#;

fn fhir() -> FhirConfig {
    FhirConfig {
        client_id: Some("oncohub".to_string()),
        client_secret: Some(SecretString::from("s3cret".to_string())),
        ..FhirConfig::default()
    }
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(2),
        multiplier: 2.0,
    }
}

fn client(transport: MockTransport) -> ClinicalRecordsClient<MockTransport> {
    ClinicalRecordsClient::with_transport(transport, fhir(), fast_retry())
}

fn password() -> SecretString {
    SecretString::from("correct horse".to_string())
}

fn authenticated_session() -> SessionContext {
    let mut session = SessionContext::new();
    session.complete_authentication(AuthToken::new("tok-abc", "dr.house"));
    session
}

#[tokio::test]
async fn test_authenticate_then_fetch() {
    let c = client(MockTransport::new().reply(200, TOKEN_OK).reply(200, BUNDLE));
    let mut session = SessionContext::new();

    let token = c.authenticate(&mut session, "dr.house", &password()).await.unwrap();
    assert_eq!(token.expose(), "tok-abc");
    assert_eq!(session.state(), AuthState::Authenticated);

    let records = c
        .fetch_diagnostic_reports(&mut session, "erXuFYUfucBZaryVksYEcMg3", &CancelToken::new())
        .await
        .unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].report_id, "r1");
    assert_eq!(records[0].result, "Observation/o1");
    assert_eq!(records[1].result, "");

    let reqs = c.transport().requests();
    assert_eq!(reqs.len(), 2);
    assert_eq!(reqs[1].method, "GET");
    assert!(reqs[1].url.ends_with("/DiagnosticReport?patient=erXuFYUfucBZaryVksYEcMg3"));
    assert!(reqs[1]
        .headers
        .contains(&("Authorization".to_string(), "Bearer tok-abc".to_string())));
    assert!(reqs[1]
        .headers
        .contains(&("Accept".to_string(), "application/fhir+json".to_string())));
}

#[tokio::test]
async fn test_rejected_login_leaves_no_token() {
    let c = client(MockTransport::new().reply(401, r#"{"error":"invalid_grant"}"#));
    let mut session = authenticated_session();

    let err = c.authenticate(&mut session, "dr.house", &password()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotAuthenticated);
    assert_eq!(session.state(), AuthState::Unauthenticated);
    assert!(session.token().is_none());
}

#[tokio::test]
async fn test_fetch_without_login_makes_no_request() {
    let c = client(MockTransport::new());
    let mut session = SessionContext::new();

    let err = c
        .fetch_diagnostic_reports(&mut session, "p1", &CancelToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Authentication error: not authenticated");
    assert_eq!(c.transport().request_count(), 0);
}

#[tokio::test]
async fn test_empty_patient_id_is_rejected() {
    let c = client(MockTransport::new());
    let mut session = authenticated_session();
    let err = c
        .fetch_diagnostic_reports(&mut session, "  ", &CancelToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, OncohubError::InvalidInput(_)));
    assert_eq!(c.transport().request_count(), 0);
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let c = client(MockTransport::new().status(503).timeout().reply(200, BUNDLE));
    let mut session = authenticated_session();

    let records = c
        .fetch_diagnostic_reports(&mut session, "p1", &CancelToken::new())
        .await
        .unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(c.transport().request_count(), 3);
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let c = client(MockTransport::new().status(502).status(502).status(502).reply(200, BUNDLE));
    let mut session = authenticated_session();

    let err = c
        .fetch_diagnostic_reports(&mut session, "p1", &CancelToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, OncohubError::Fetch { status: 502, .. }));
    assert_eq!(c.transport().request_count(), 3);
}

#[tokio::test]
async fn test_rejected_token_invalidates_session() {
    let c = client(MockTransport::new().status(401));
    let mut session = authenticated_session();
    session.set_patient("p1");

    let err = c
        .fetch_diagnostic_reports(&mut session, "p1", &CancelToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotAuthenticated);
    assert_eq!(c.transport().request_count(), 1);
    assert!(!session.is_authenticated());
    assert_eq!(session.patient_id(), Some("p1"));
}

#[tokio::test]
async fn test_not_found_maps_to_no_data() {
    let c = client(MockTransport::new().reply(404, "not found"));
    let mut session = authenticated_session();
    let err = c
        .fetch_diagnostic_reports(&mut session, "p1", &CancelToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoData);
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn test_cancelled_fetch() {
    let c = client(MockTransport::new().reply(200, BUNDLE));
    let mut session = authenticated_session();
    let cancel = CancelToken::new();
    cancel.cancel();

    let err = c.fetch_diagnostic_reports(&mut session, "p1", &cancel).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cancelled);
}

#[tokio::test]
async fn test_fetch_and_save_writes_csv_and_sets_patient() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("beaker_report_data.csv");
    let c = client(MockTransport::new().reply(200, BUNDLE));
    let mut session = authenticated_session();

    let summary = c
        .fetch_and_save_patient_data(&mut session, "p1", &path, &CancelToken::new())
        .await
        .unwrap();
    assert_eq!(summary.rows, 2);
    assert_eq!(session.patient_id(), Some("p1"));

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "Report ID,Test Name,Date of Test,Result,Status");
    assert_eq!(lines[1], "r1,Tumor Genomic Profile,2024-03-01T09:00:00Z,Observation/o1,final");
    assert_eq!(lines[2], "r2,CBC,2024-03-02T09:00:00Z,,preliminary");
}

#[tokio::test]
async fn test_empty_bundle_writes_header_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");
    std::fs::write(&path, "stale,data\n").unwrap();
    let c = client(MockTransport::new().reply(200, r#"{"resourceType":"Bundle","total":0}"#));
    let mut session = authenticated_session();

    let summary = c
        .fetch_and_save_patient_data(&mut session, "p1", &path, &CancelToken::new())
        .await
        .unwrap();
    assert_eq!(summary.rows, 0);
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "Report ID,Test Name,Date of Test,Result,Status\n"
    );
}
