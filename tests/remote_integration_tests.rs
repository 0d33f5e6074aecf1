use polaris_drive::models::{CellMeasurement, DriveSample, Location};
use polaris_drive::remote::{CollectorClient, RemoteError, SignupOutcome};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Collector server interaction against a mock HTTP server

fn sample(timestamp: i64) -> DriveSample {
    DriveSample::merge(
        "remote-device",
        timestamp,
        Location::new(59.437, 24.7536),
        CellMeasurement::default(),
        &BTreeMap::new(),
        "",
    )
    .with_id(timestamp / 1_000)
}

fn client(server: &MockServer) -> CollectorClient {
    CollectorClient::new(server.uri(), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_upload_posts_camel_case_array() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/drive-data/app"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let sent = client(&server)
        .upload(&[sample(2_000), sample(1_000)])
        .await
        .unwrap();
    assert_eq!(sent, 2);

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    let records = body.as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["deviceId"], "remote-device");
    assert_eq!(records[0]["timestamp"], 2_000);
    assert_eq!(records[0]["id"], 2);
    assert_eq!(records[0]["httpUploadRate"], -1.0);
    assert_eq!(records[0]["smsDeliveryTime"], -1.0);
    assert!(records[0]["timestampFormatted"].as_str().unwrap().len() == 19);
}

#[tokio::test]
async fn test_upload_of_nothing_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    assert_eq!(client(&server).upload(&[]).await.unwrap(), 0);
}

#[tokio::test]
async fn test_upload_rejection_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/drive-data/app"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database down"))
        .mount(&server)
        .await;

    let err = client(&server).upload(&[sample(1_000)]).await.unwrap_err();
    match err {
        RemoteError::Status { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "database down");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_signup_sends_device_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/signup"))
        .and(body_json(json!({
            "username": "driver",
            "password": "secret",
            "device_id": "remote-device"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = client(&server)
        .signup("driver", "secret", "remote-device")
        .await
        .unwrap();
    assert_eq!(outcome, SignupOutcome::Registered);
}

#[tokio::test]
async fn test_signup_of_existing_user_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/signup"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"detail": "username already registered"})),
        )
        .mount(&server)
        .await;

    let outcome = client(&server)
        .signup("driver", "secret", "remote-device")
        .await
        .unwrap();
    assert_eq!(outcome, SignupOutcome::AlreadyRegistered);
}

#[tokio::test]
async fn test_signup_other_bad_request_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/signup"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"detail": "Password too short"})))
        .mount(&server)
        .await;

    let err = client(&server)
        .signup("driver", "x", "remote-device")
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::Status { status: 400, .. }));
}
