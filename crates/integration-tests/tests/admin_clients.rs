//! Integration tests for admin client management.
//!
//! Run with: cargo test -p chatbot-admin-integration-tests

use reqwest::StatusCode;
use serde_json::{Value, json};

use chatbot_admin_integration_tests::{
    ADMIN_ANSWER1, ADMIN_ANSWER2, TestApp, client_config, client_quota, cookie_client,
    roleless_admin,
};

async fn body(resp: reqwest::Response) -> Value {
    resp.json().await.expect("Failed to parse JSON body")
}

// ============================================================================
// Access control
// ============================================================================

#[tokio::test]
async fn test_clients_require_session() {
    let app = TestApp::spawn().await;
    let client = cookie_client();

    for path in ["/api/clients", "/api/clients/acme", "/api/clients/acme/preview"] {
        let resp = client
            .get(app.url(path))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{path}");
    }
}

#[tokio::test]
async fn test_clients_locked_after_logout() {
    let app = TestApp::spawn().await;
    let client = app.admin_client().await;

    let resp = client.get(app.url("/api/clients")).send().await.expect("list");
    assert_eq!(resp.status(), StatusCode::OK);

    client.post(app.url("/auth/logout")).send().await.expect("logout");

    let resp = client.get(app.url("/api/clients")).send().await.expect("list");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_roleless_session_with_rejected_answers_is_forbidden() {
    let app = TestApp::spawn().await;
    let client = app.planted_client(&roleless_admin("rex", "nobody")).await;

    let resp = client.get(app.url("/api/clients")).send().await.expect("list");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(body(resp).await["error"], "forbidden");

    let status = app.session_status(&client).await;
    assert_eq!(status["session"]["email"], "silvacorreiaruben@gmail.com");
    assert_eq!(status["authorized"], false);
    // Both checks replayed the cached answers
    assert_eq!(app.backend.verify_calls(), 2);
}

#[tokio::test]
async fn test_roleless_session_with_accepted_answers_is_admitted() {
    let app = TestApp::spawn().await;
    app.backend.add_client(client_config("acme", true), None).await;
    let client = app
        .planted_client(&roleless_admin(ADMIN_ANSWER1, ADMIN_ANSWER2))
        .await;

    let resp = client.get(app.url("/api/clients")).send().await.expect("list");
    assert_eq!(resp.status(), StatusCode::OK);

    let status = app.session_status(&client).await;
    assert_eq!(status["authorized"], true);
    assert!(status["session"].get("role").is_none());
    assert_eq!(app.backend.verify_calls(), 2);
}

#[tokio::test]
async fn test_roleless_session_fails_closed_on_outage() {
    let app = TestApp::spawn().await;
    app.backend.set_verify_down(true);
    let client = app
        .planted_client(&roleless_admin(ADMIN_ANSWER1, ADMIN_ANSWER2))
        .await;

    let resp = client.get(app.url("/api/clients")).send().await.expect("list");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

// ============================================================================
// CRUD
// ============================================================================

#[tokio::test]
async fn test_list_clients() {
    let app = TestApp::spawn().await;
    app.backend.add_client(client_config("acme", true), None).await;
    app.backend.add_client(client_config("globex", false), None).await;
    let client = app.admin_client().await;

    let resp = client.get(app.url("/api/clients")).send().await.expect("list");
    assert_eq!(resp.status(), StatusCode::OK);

    let json = body(resp).await;
    let ids: Vec<&str> = json
        .as_array()
        .expect("Expected an array")
        .iter()
        .filter_map(|c| c["client_id"].as_str())
        .collect();
    assert_eq!(ids, ["acme", "globex"]);
}

#[tokio::test]
async fn test_create_and_show_client() {
    let app = TestApp::spawn().await;
    let client = app.admin_client().await;

    let resp = client
        .post(app.url("/api/clients"))
        .json(&json!({
            "client_id": "  initech ",
            "bot_description": "TPS report assistant",
            "webhook_url": "https://hooks.example.com/initech",
        }))
        .send()
        .await
        .expect("create");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let json = body(resp).await;
    assert_eq!(json["client_id"], "initech");
    assert_eq!(json["is_active"], true);

    let resp = client
        .get(app.url("/api/clients/initech"))
        .send()
        .await
        .expect("show");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body(resp).await["bot_description"], "TPS report assistant");
}

#[tokio::test]
async fn test_create_rejects_bad_input() {
    let app = TestApp::spawn().await;
    let client = app.admin_client().await;

    let bad = [
        json!({"client_id": "Not Valid!", "webhook_url": "https://hooks.example.com/x"}),
        json!({"client_id": "valid", "webhook_url": "ftp://hooks.example.com/x"}),
        json!({"client_id": "valid", "webhook_url": "not a url"}),
        json!({
            "client_id": "valid",
            "webhook_url": "https://hooks.example.com/x",
            "bot_description": "x".repeat(2001),
        }),
    ];

    for input in bad {
        let resp = client
            .post(app.url("/api/clients"))
            .json(&input)
            .send()
            .await
            .expect("create");
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{input}");
    }
    assert!(app.backend.client("valid").await.is_none());
}

#[tokio::test]
async fn test_update_client_partial() {
    let app = TestApp::spawn().await;
    app.backend.add_client(client_config("acme", true), None).await;
    let client = app.admin_client().await;

    let resp = client
        .put(app.url("/api/clients/acme"))
        .json(&json!({"is_active": false}))
        .send()
        .await
        .expect("update");
    assert_eq!(resp.status(), StatusCode::OK);

    let stored = app.backend.client("acme").await.expect("client kept");
    assert!(!stored.is_active);
    assert_eq!(stored.webhook_url, "https://hooks.example.com/acme");
    assert_eq!(stored.bot_description, "Support bot for acme");
}

#[tokio::test]
async fn test_invalid_update_changes_nothing() {
    let app = TestApp::spawn().await;
    app.backend.add_client(client_config("acme", true), None).await;
    let client = app.admin_client().await;

    let resp = client
        .put(app.url("/api/clients/acme"))
        .json(&json!({"is_active": false, "webhook_url": "mailto:ops@acme.test"}))
        .send()
        .await
        .expect("update");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let stored = app.backend.client("acme").await.expect("client kept");
    assert!(stored.is_active);
}

#[tokio::test]
async fn test_missing_client() {
    let app = TestApp::spawn().await;
    let client = app.admin_client().await;

    let resp = client
        .get(app.url("/api/clients/ghost"))
        .send()
        .await
        .expect("show");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = client
        .put(app.url("/api/clients/ghost"))
        .json(&json!({"is_active": true}))
        .send()
        .await
        .expect("update");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Quota and preview
// ============================================================================

#[tokio::test]
async fn test_quota_roundtrip() {
    let app = TestApp::spawn().await;
    app.backend
        .add_client(client_config("acme", true), Some(client_quota("acme", 100, 40)))
        .await;
    let client = app.admin_client().await;

    let resp = client
        .get(app.url("/api/clients/acme/quota"))
        .send()
        .await
        .expect("quota");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body(resp).await["messages_used"], 40);

    let resp = client
        .put(app.url("/api/clients/acme/quota"))
        .json(&json!({"message_limit": 500, "reset_usage": true}))
        .send()
        .await
        .expect("update quota");
    assert_eq!(resp.status(), StatusCode::OK);

    let json = body(resp).await;
    assert_eq!(json["message_limit"], 500);
    assert_eq!(json["messages_used"], 0);
}

#[tokio::test]
async fn test_quota_limit_must_be_positive() {
    let app = TestApp::spawn().await;
    app.backend
        .add_client(client_config("acme", true), Some(client_quota("acme", 100, 40)))
        .await;
    let client = app.admin_client().await;

    let resp = client
        .put(app.url("/api/clients/acme/quota"))
        .json(&json!({"message_limit": 0}))
        .send()
        .await
        .expect("update quota");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_preview_reports_exhausted_quota() {
    let app = TestApp::spawn().await;
    app.backend
        .add_client(client_config("acme", true), Some(client_quota("acme", 50, 50)))
        .await;
    let client = app.admin_client().await;

    let resp = client
        .get(app.url("/api/clients/acme/preview"))
        .send()
        .await
        .expect("preview");
    assert_eq!(resp.status(), StatusCode::OK);

    let json = body(resp).await;
    assert_eq!(json["status"], "quota_exhausted");
    assert_eq!(json["config"]["client_id"], "acme");
    assert_eq!(json["quota"]["message_limit"], 50);
}

#[tokio::test]
async fn test_preview_without_quota() {
    let app = TestApp::spawn().await;
    app.backend.add_client(client_config("globex", false), None).await;
    let client = app.admin_client().await;

    let resp = client
        .get(app.url("/api/clients/globex/preview"))
        .send()
        .await
        .expect("preview");
    assert_eq!(resp.status(), StatusCode::OK);

    let json = body(resp).await;
    assert_eq!(json["status"], "inactive");
    assert!(json.get("quota").is_none());
}
