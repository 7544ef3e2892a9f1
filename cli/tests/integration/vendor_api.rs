//! `FalconApi` against a wiremock server.

#![allow(clippy::expect_used)]

use fleetops_cli::application::ports::VendorApi;
use fleetops_cli::domain::Credentials;
use fleetops_cli::infra::vendor::FalconApi;
use serde_json::json;
use wiremock::matchers::{
    body_partial_json, body_string_contains, header, header_exists, method, path, query_param,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn creds() -> Credentials {
    Credentials {
        client_id: "client-id".to_string(),
        client_secret: "client-secret".to_string(),
    }
}

async fn setup() -> (MockServer, FalconApi) {
    let server = MockServer::start().await;
    let api = FalconApi::new(&server.uri()).expect("client builds");
    (server, api)
}

// --- Token lifecycle ---

#[tokio::test]
async fn test_request_token_posts_form_credentials() {
    let (server, api) = setup().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("client_id=client-id"))
        .and(body_string_contains("client_secret=client-secret"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "access_token": "session-token",
            "token_type": "bearer",
            "expires_in": 1799
        })))
        .expect(1)
        .mount(&server)
        .await;

    let token = api.request_token(&creds()).await.expect("token");
    assert_eq!(token, "session-token");
}

#[tokio::test]
async fn test_request_token_rejects_unauthorized() {
    let (server, api) = setup().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "errors": [{"code": 401, "message": "access denied, invalid client"}]
        })))
        .mount(&server)
        .await;

    let err = api.request_token(&creds()).await.expect_err("401 fails");
    assert!(err.to_string().contains("401"), "{err:#}");
}

#[tokio::test]
async fn test_request_token_rejects_empty_token() {
    let (server, api) = setup().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"access_token": ""})))
        .mount(&server)
        .await;

    assert!(api.request_token(&creds()).await.is_err());
}

#[tokio::test]
async fn test_revoke_uses_basic_auth_and_token_form() {
    let (server, api) = setup().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/revoke"))
        .and(header_exists("authorization"))
        .and(body_string_contains("token=session-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"resources": [], "errors": []})))
        .expect(1)
        .mount(&server)
        .await;

    api.revoke_token(&creds(), "session-token")
        .await
        .expect("revoked");
}

// --- Catalog ---

#[tokio::test]
async fn test_latest_installer_queries_newest_mac_package() {
    let (server, api) = setup().await;
    Mock::given(method("GET"))
        .and(path("/sensors/combined/installers/v1"))
        .and(header("authorization", "Bearer session-token"))
        .and(query_param("filter", "platform:\"mac\""))
        .and(query_param("limit", "1"))
        .and(query_param("sort", "version|desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": {"query_time": 0.01},
            "resources": [{
                "name": "FalconSensorMacOS.MaverickGyr.pkg",
                "sha256": "abc123",
                "version": "7.10.18005.0",
                "platform": "mac"
            }],
            "errors": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let artifact = api
        .latest_installer("session-token", "platform:\"mac\"")
        .await
        .expect("artifact");
    assert_eq!(artifact.name, "FalconSensorMacOS.MaverickGyr.pkg");
    assert_eq!(artifact.sha256, "abc123");
}

#[tokio::test]
async fn test_latest_installer_error_shaped_body_is_failure() {
    let (server, api) = setup().await;
    Mock::given(method("GET"))
        .and(path("/sensors/combined/installers/v1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resources": [],
            "errors": [{"code": 403, "message": "access denied, authorization failed"}]
        })))
        .mount(&server)
        .await;

    let err = api
        .latest_installer("session-token", "platform:\"mac\"")
        .await
        .expect_err("error-shaped");
    assert!(err.to_string().contains("access denied"), "{err:#}");
}

#[tokio::test]
async fn test_latest_installer_missing_sha_is_failure() {
    let (server, api) = setup().await;
    Mock::given(method("GET"))
        .and(path("/sensors/combined/installers/v1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resources": [{"name": "FalconSensor.pkg"}],
            "errors": []
        })))
        .mount(&server)
        .await;

    let err = api
        .latest_installer("session-token", "platform:\"mac\"")
        .await
        .expect_err("incomplete entry");
    assert!(err.to_string().contains("sha256"), "{err:#}");
}

#[tokio::test]
async fn test_latest_installer_empty_catalog_is_failure() {
    let (server, api) = setup().await;
    Mock::given(method("GET"))
        .and(path("/sensors/combined/installers/v1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"resources": [], "errors": []})))
        .mount(&server)
        .await;

    assert!(
        api.latest_installer("session-token", "platform:\"mac\"")
            .await
            .is_err()
    );
}

// --- Download ---

#[tokio::test]
async fn test_download_streams_body_to_file() {
    let (server, api) = setup().await;
    let payload = vec![7u8; 300_000];
    Mock::given(method("GET"))
        .and(path("/sensors/entities/download-installer/v3"))
        .and(query_param("id", "abc123"))
        .and(header("authorization", "Bearer session-token"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(payload.clone()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let dest = dir.path().join("FalconSensor.pkg");
    let report = api
        .download_installer("session-token", "abc123", &dest)
        .await
        .expect("downloaded");

    assert_eq!(report.status, 200);
    assert_eq!(report.bytes_written, payload.len() as u64);
    assert!(report.is_complete());
    assert_eq!(std::fs::read(&dest).expect("read"), payload);
}

#[tokio::test]
async fn test_download_non_200_writes_nothing() {
    let (server, api) = setup().await;
    Mock::given(method("GET"))
        .and(path("/sensors/entities/download-installer/v3"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let dest = dir.path().join("FalconSensor.pkg");
    let report = api
        .download_installer("session-token", "abc123", &dest)
        .await
        .expect("request completes");

    assert_eq!(report.status, 404);
    assert_eq!(report.bytes_written, 0);
    assert!(!dest.exists());
}

// --- Maintenance token ---

#[tokio::test]
async fn test_reveal_uninstall_token_sends_device_id() {
    let (server, api) = setup().await;
    Mock::given(method("POST"))
        .and(path("/policy/combined/reveal-uninstall-token/v1"))
        .and(header("authorization", "Bearer session-token"))
        .and(body_partial_json(json!({"device_id": "0a1b2c3d4e5f60718293a4b5c6d7e8f9"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resources": [{
                "device_id": "0a1b2c3d4e5f60718293a4b5c6d7e8f9",
                "uninstall_token": "maint-token-42"
            }],
            "errors": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let token = api
        .reveal_uninstall_token("session-token", "0a1b2c3d4e5f60718293a4b5c6d7e8f9")
        .await
        .expect("token");
    assert_eq!(token, "maint-token-42");
}
