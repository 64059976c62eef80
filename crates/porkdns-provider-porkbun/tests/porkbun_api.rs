//! Wire-level tests against a mock Porkbun API
//!
//! Each test starts a wiremock server, points a PorkbunClient at it and
//! checks both the request shape and the error classification.

use std::sync::Arc;
use std::time::Duration;

use porkdns_core::traits::RecordStore;
use porkdns_core::{Error, ReadOutcome, Reconciler, Record, RetryPolicy};
use porkdns_provider_porkbun::PorkbunClient;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "pk1_foobarbaz";
const SECRET_KEY: &str = "sk1_foobarbaz";

fn client(server: &MockServer) -> PorkbunClient {
    PorkbunClient::new(API_KEY, SECRET_KEY)
        .unwrap()
        .with_base_url(server.uri())
}

fn desired() -> Record {
    Record::new("foobar.dev", "test", "A").with_content("0.0.0.1")
}

#[tokio::test]
async fn create_sends_credentials_and_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/dns/create/foobar.dev"))
        .and(body_partial_json(json!({
            "apikey": API_KEY,
            "secretapikey": SECRET_KEY,
            "name": "test",
            "type": "A",
            "content": "0.0.0.1",
            "ttl": "600",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "SUCCESS",
            "id": 987,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let id = client(&server)
        .create_record("foobar.dev", &desired().to_payload())
        .await
        .unwrap();
    assert_eq!(id, 987);
}

#[tokio::test]
async fn retrieve_parses_mixed_scalar_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/dns/retrieve/foobar.dev"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "SUCCESS",
            "records": [
                {
                    "id": "987",
                    "name": "test.foobar.dev",
                    "type": "A",
                    "content": "0.0.0.1",
                    "ttl": "600",
                    "prio": null,
                    "notes": null
                },
                {
                    "id": 988,
                    "name": "foobar.dev",
                    "type": "MX",
                    "content": "mail.foobar.dev",
                    "ttl": 3600,
                    "prio": 10,
                    "notes": "primary"
                }
            ]
        })))
        .mount(&server)
        .await;

    let records = client(&server).retrieve_records("foobar.dev").await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, "987");
    assert_eq!(records[0].prio, "");
    assert_eq!(records[1].id, "988");
    assert_eq!(records[1].ttl, "3600");
    assert_eq!(records[1].prio, "10");
    assert_eq!(records[1].notes, "primary");
}

#[tokio::test]
async fn edit_and_delete_address_record_by_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/dns/edit/foobar.dev/987"))
        .and(body_partial_json(json!({ "content": "0.0.0.2" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "SUCCESS" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/dns/delete/foobar.dev/987"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "SUCCESS" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let payload = desired().with_content("0.0.0.2").to_payload();
    client.edit_record("foobar.dev", 987, &payload).await.unwrap();
    client.delete_record("foobar.dev", 987).await.unwrap();
}

#[tokio::test]
async fn error_status_in_success_body_is_permanent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/dns/create/foobar.dev"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ERROR",
            "message": "Invalid type."
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .create_record("foobar.dev", &desired().to_payload())
        .await
        .unwrap_err();
    assert!(matches!(&err, Error::Api(msg) if msg == "Invalid type."));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn status_codes_are_classified() {
    let cases: [(u16, bool); 6] = [
        (400, false),
        (401, false),
        (404, false),
        (429, true),
        (500, true),
        (503, true),
    ];

    for (code, transient) in cases {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(code).set_body_json(json!({
                "status": "ERROR",
                "message": format!("failure {}", code)
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .retrieve_records("foobar.dev")
            .await
            .unwrap_err();
        assert_eq!(err.is_transient(), transient, "status {}: {}", code, err);
        assert!(err.to_string().contains(&format!("failure {}", code)));
    }
}

#[tokio::test]
async fn unparseable_body_is_json_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client(&server)
        .retrieve_records("foobar.dev")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Json(_)));
}

#[tokio::test]
async fn unreachable_server_is_transient() {
    let client = PorkbunClient::new(API_KEY, SECRET_KEY)
        .unwrap()
        .with_base_url("http://127.0.0.1:9");

    let err = client.retrieve_records("foobar.dev").await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
    assert!(err.is_transient());
}

#[tokio::test]
async fn reconciler_lifecycle_against_api() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/dns/create/foobar.dev"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "SUCCESS",
            "id": 987,
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/dns/retrieve/foobar.dev"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "SUCCESS",
            "records": [{
                "id": "987",
                "name": "test.foobar.dev",
                "type": "A",
                "content": "0.0.0.1",
                "ttl": "600",
                "prio": "0",
                "notes": ""
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/dns/delete/foobar.dev/987"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "SUCCESS" })))
        .expect(1)
        .mount(&server)
        .await;

    let reconciler = Reconciler::new(
        Arc::new(client(&server)),
        RetryPolicy::new(3, Duration::from_millis(10)),
    );

    let created = reconciler.create(&desired()).await;
    assert!(!created.has_error());
    let created = created.state.unwrap();
    assert_eq!(created.id.as_deref(), Some("987"));

    let read = reconciler.read(&created).await;
    let Some(ReadOutcome::Present(record)) = read.state else {
        panic!("expected present record");
    };
    assert_eq!(record.name, "test");
    assert_eq!(record.content.as_deref(), Some("0.0.0.1"));

    let deleted = reconciler.delete(&record).await;
    assert_eq!(deleted.state, Some(()));
}

#[tokio::test]
async fn reconciler_retries_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/dns/create/foobar.dev"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/dns/create/foobar.dev"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "SUCCESS",
            "id": "42",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reconciler = Reconciler::new(
        Arc::new(client(&server)),
        RetryPolicy::new(5, Duration::from_millis(10)),
    );

    let created = reconciler.try_create(&desired()).await.unwrap();
    assert_eq!(created.id.as_deref(), Some("42"));
}

#[tokio::test]
async fn reconciler_does_not_retry_auth_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "status": "ERROR",
            "message": "Invalid API key."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reconciler = Reconciler::new(
        Arc::new(client(&server)),
        RetryPolicy::new(5, Duration::from_millis(10)),
    );

    let response = reconciler.create(&desired()).await;
    assert!(response.has_error());
    assert_eq!(response.state.unwrap().id, None);
}
