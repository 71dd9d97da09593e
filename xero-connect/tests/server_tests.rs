#![cfg(feature = "server")]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use mockito::Matcher;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use url::Url;

use xero_connect::flow::{
    AuthorizationFlowCoordinator, AuthorizationSession, Authorizer, NotificationCenter,
};
use xero_connect::server::{
    app, config::XeroConfiguration, services::XeroAuthorizer, AppState,
};
use xero_connect::{AuthorizeStatus, FileSettingsStore, SettingsStore, XeroSettings};

const TOKEN_BODY: &str = r#"{
    "access_token": "access-1",
    "token_type": "Bearer",
    "expires_in": 1800,
    "refresh_token": "refresh-1",
    "scope": "openid offline_access"
}"#;

const CONNECTIONS_BODY: &str = r#"[
    {
        "id": "e1eede29-f875-4a5d-8470-17f6a29a88b1",
        "authEventId": "d99ecdfe-391d-43d2-b834-17636ba90e8d",
        "tenantId": "70784a63-d24b-46a9-a4db-0e70a274b056",
        "tenantType": "ORGANISATION",
        "tenantName": "Maple Florist",
        "createdDateUtc": "2019-07-09T23:40:30.1833130",
        "updatedDateUtc": "2020-05-15T01:35:13.8491980"
    }
]"#;

fn configured() -> XeroSettings {
    XeroSettings {
        client_id: Some("client-id".into()),
        client_secret: Some("client-secret".into()),
        redirect_uri: Some("http://localhost:8080/settings".into()),
        ..Default::default()
    }
}

fn xero_configuration(server: &mockito::ServerGuard) -> XeroConfiguration {
    XeroConfiguration {
        token_url: format!("{}/connect/token", server.url()),
        api_url: server.url(),
        ..Default::default()
    }
}

async fn store_with(dir: &TempDir, settings: &XeroSettings) -> Arc<FileSettingsStore> {
    let store = Arc::new(FileSettingsStore::new(dir.path().join("settings.json")));
    store.save(settings).await.unwrap();
    store
}

fn session(code: &str) -> AuthorizationSession {
    AuthorizationSession {
        code: code.into(),
        scope: None,
        state: None,
    }
}

#[tokio::test]
async fn test_authorizer_exchanges_code_and_resolves_tenant() {
    let mut server = mockito::Server::new_async().await;
    let token = server
        .mock("POST", "/connect/token")
        .match_header("authorization", Matcher::Regex("^Basic ".into()))
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex("grant_type=authorization_code".into()),
            Matcher::Regex("code=abc".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(TOKEN_BODY)
        .create_async()
        .await;
    let connections = server
        .mock("GET", "/connections")
        .match_header("authorization", "Bearer access-1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(CONNECTIONS_BODY)
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let store = store_with(&dir, &configured()).await;
    let authorizer = XeroAuthorizer::new(store, &xero_configuration(&server));

    let response = authorizer.authorize(&session("abc")).await.unwrap();

    token.assert_async().await;
    connections.assert_async().await;
    assert_eq!(response.status, AuthorizeStatus::Success);
    let token_data = response.token_data.unwrap();
    assert_eq!(token_data.access_token.as_deref(), Some("access-1"));
    assert_eq!(token_data.refresh_token.as_deref(), Some("refresh-1"));
    assert_eq!(
        token_data.tenant_id.as_deref(),
        Some("70784a63-d24b-46a9-a4db-0e70a274b056")
    );
    assert_eq!(token_data.tenant_name.as_deref(), Some("Maple Florist"));
    assert!(token_data.expires_at.is_some());
}

#[tokio::test]
async fn test_authorizer_explains_invalid_grant() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/connect/token")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error": "invalid_grant"}"#)
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let store = store_with(&dir, &configured()).await;
    let authorizer = XeroAuthorizer::new(store, &xero_configuration(&server));

    let response = authorizer.authorize(&session("used")).await.unwrap();

    assert_eq!(response.status, AuthorizeStatus::Error);
    assert!(response.token_data.is_none());
    assert!(response
        .message
        .unwrap()
        .contains("Authorization code has expired or already been used"));
}

#[tokio::test]
async fn test_authorizer_reports_rate_limit() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/connect/token")
        .with_status(429)
        .with_body("Too Many Requests")
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let store = store_with(&dir, &configured()).await;
    let authorizer = XeroAuthorizer::new(store, &xero_configuration(&server));

    let response = authorizer.authorize(&session("abc")).await.unwrap();

    assert_eq!(response.status, AuthorizeStatus::Error);
    assert_eq!(
        response.message.as_deref(),
        Some("Rate limit exceeded - Please try again later")
    );
}

#[tokio::test]
async fn test_authorizer_requires_client_credentials() {
    let server = mockito::Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let settings = XeroSettings {
        client_secret: None,
        ..configured()
    };
    let store = store_with(&dir, &settings).await;
    let authorizer = XeroAuthorizer::new(store, &xero_configuration(&server));

    let response = authorizer.authorize(&session("abc")).await.unwrap();

    assert_eq!(
        response.message.as_deref(),
        Some("Client ID or Client Secret is missing in Xero Settings.")
    );
}

#[tokio::test]
async fn test_authorizer_without_tenant_is_an_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/connect/token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(TOKEN_BODY)
        .create_async()
        .await;
    server
        .mock("GET", "/connections")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let store = store_with(&dir, &configured()).await;
    let authorizer = XeroAuthorizer::new(store, &xero_configuration(&server));

    let response = authorizer.authorize(&session("abc")).await.unwrap();

    assert_eq!(response.status, AuthorizeStatus::Error);
    assert_eq!(
        response.message.as_deref(),
        Some("Failed to get tenant information from Xero")
    );
}

#[tokio::test]
async fn test_authorizer_refresh_keeps_tenant() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/connect/token")
        .match_body(Matcher::Regex("grant_type=refresh_token".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(TOKEN_BODY)
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let mut settings = configured();
    settings.credential.tenant_id = Some("tenant-1".into());
    settings.credential.tenant_name = Some("Demo Company (NZ)".into());
    let store = store_with(&dir, &settings).await;
    let authorizer = XeroAuthorizer::new(store, &xero_configuration(&server));

    let response = authorizer.refresh("refresh-0").await.unwrap();

    let token_data = response.token_data.unwrap();
    assert_eq!(token_data.access_token.as_deref(), Some("access-1"));
    assert_eq!(token_data.tenant_id.as_deref(), Some("tenant-1"));
    assert_eq!(token_data.tenant_name.as_deref(), Some("Demo Company (NZ)"));
}

struct TestServer {
    app: Router,
    store: Arc<FileSettingsStore>,
    _dir: TempDir,
}

async fn test_server(server: &mockito::ServerGuard, settings: XeroSettings) -> TestServer {
    let dir = TempDir::new().unwrap();
    let store = store_with(&dir, &settings).await;
    let notifications = Arc::new(NotificationCenter::new());
    let authorizer = XeroAuthorizer::new(store.clone(), &xero_configuration(server));
    let coordinator =
        AuthorizationFlowCoordinator::new(authorizer, store.clone(), notifications.clone());

    let app = app(AppState {
        coordinator: Arc::new(coordinator),
        notifications,
        public_url: Url::parse("http://localhost:8080").unwrap(),
    });

    TestServer {
        app,
        store,
        _dir: dir,
    }
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let server = mockito::Server::new_async().await;
    let test = test_server(&server, XeroSettings::default()).await;

    let response = test.app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("healthy"));
}

#[tokio::test]
async fn test_callback_redirects_to_clean_address() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/connect/token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(TOKEN_BODY)
        .expect(1)
        .create_async()
        .await;
    server
        .mock("GET", "/connections")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(CONNECTIONS_BODY)
        .create_async()
        .await;
    let test = test_server(&server, configured()).await;

    let response = test
        .app
        .clone()
        .oneshot(get("/settings?code=abc&scope=openid%20offline_access"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/settings");

    let settings = test.store.load().await.unwrap();
    assert!(settings.credential.enable);
    assert_eq!(settings.credential.access_token.as_deref(), Some("access-1"));
    assert_eq!(
        settings.credential.tenant_name.as_deref(),
        Some("Maple Florist")
    );

    // The follow-up render shows the new status and the pending notification
    let response = test.app.oneshot(get("/settings")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains(r#"<span class="status connected">Connected</span>"#));
    assert!(html.contains("Authorization Successful!"));
}

#[tokio::test]
async fn test_consent_error_is_reported_and_stripped() {
    let server = mockito::Server::new_async().await;
    let test = test_server(&server, configured()).await;

    let response = test
        .app
        .clone()
        .oneshot(get("/settings?error=access_denied&state=xyz"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/settings");

    let response = test.app.oneshot(get("/api/status")).await.unwrap();
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["connected"], false);
    assert_eq!(body["label"], "Not Connected");
    assert_eq!(body["notifications"][0]["indicator"], "red");
}

#[tokio::test]
async fn test_authorize_endpoint_returns_consent_url() {
    let server = mockito::Server::new_async().await;
    let test = test_server(&server, configured()).await;

    let response = test.app.oneshot(post("/settings/authorize")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    let authorization_url = body["authorization_url"].as_str().unwrap();
    assert!(authorization_url.starts_with("https://login.xero.com/identity/connect/authorize?"));

    let stored = test.store.load().await.unwrap().state.unwrap();
    assert_eq!(body["state"], stored.as_str());
}

#[tokio::test]
async fn test_authorize_endpoint_rejects_missing_client_id() {
    let server = mockito::Server::new_async().await;
    let test = test_server(&server, XeroSettings::default()).await;

    let response = test.app.oneshot(post("/settings/authorize")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["error"], "Please enter the Client ID before authorizing.");
}

#[tokio::test]
async fn test_refresh_endpoint_requires_connection() {
    let server = mockito::Server::new_async().await;
    let test = test_server(&server, configured()).await;

    let response = test.app.oneshot(post("/api/refresh")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_refresh_failure_is_not_shown_again() {
    let server = mockito::Server::new_async().await;
    let test = test_server(&server, configured()).await;

    let response = test
        .app
        .clone()
        .oneshot(post("/api/refresh"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The JSON error was the report; the next page render has nothing pending
    let response = test.app.oneshot(get("/settings")).await.unwrap();
    let html = body_text(response).await;
    assert!(!html.contains("Xero is not connected"));
}

#[tokio::test]
async fn test_status_refreshes_expiring_credential() {
    let mut server = mockito::Server::new_async().await;
    let token = server
        .mock("POST", "/connect/token")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex("grant_type=refresh_token".into()),
            Matcher::Regex("refresh_token=refresh-0".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(TOKEN_BODY)
        .expect(1)
        .create_async()
        .await;

    let mut settings = configured();
    settings.credential.access_token = Some("access-0".into());
    settings.credential.refresh_token = Some("refresh-0".into());
    settings.credential.token_expires_at = Some(chrono::Utc::now() + chrono::Duration::minutes(2));
    settings.credential.enable = true;
    let test = test_server(&server, settings).await;

    let response = test.app.oneshot(get("/api/status")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    token.assert_async().await;
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["connected"], true);
    assert_eq!(body["notifications"][0]["indicator"], "green");

    let stored = test.store.load().await.unwrap().credential;
    assert_eq!(stored.access_token.as_deref(), Some("access-1"));
    assert_eq!(stored.refresh_token.as_deref(), Some("refresh-1"));
}
