//! Request dispatcher integration tests
//!
//! Tests for:
//! - Unknown routes and wrong methods
//! - Cross-origin preflight
//! - Body size limit enforcement
//! - Panic containment

use axum::{
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    middleware,
    routing::get,
    Router,
};
use axum_test::TestServer;
use bytes::Bytes;
use serde_json::Value;

use agent_gateway::middleware::catch_panics;

use crate::common::{constants, TestHarness};

#[tokio::test]
async fn test_unknown_openai_path_returns_openai_not_found() {
    let harness = TestHarness::new().await;

    let response = harness.server.get("/v1/embeddings").await;

    response.assert_status(StatusCode::NOT_FOUND);
    let json: Value = response.json();
    assert_eq!(json["error"]["code"], "not_found");
    assert_eq!(json["error"]["type"], "invalid_request_error");
    assert!(json["error"]["message"]
        .as_str()
        .unwrap()
        .contains("/v1/embeddings"));
}

#[tokio::test]
async fn test_unknown_ollama_path_returns_ollama_not_found() {
    let harness = TestHarness::new().await;

    let response = harness.server.post("/api/pull").await;

    response.assert_status(StatusCode::NOT_FOUND);
    let json: Value = response.json();
    assert!(json["error"].as_str().unwrap().contains("/api/pull"));
    assert_eq!(json["code"], "not_found");
}

#[tokio::test]
async fn test_wrong_method_on_known_path_is_not_found() {
    let harness = TestHarness::new().await;

    let response = harness.server.get("/v1/chat/completions").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let json: Value = response.json();
    assert_eq!(json["error"]["code"], "not_found");

    let response = harness.server.post("/api/tags").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let json: Value = response.json();
    assert_eq!(json["code"], "not_found");
}

#[tokio::test]
async fn test_options_returns_empty_success() {
    let harness = TestHarness::new().await;

    for path in ["/v1/chat/completions", "/api/chat", "/anything/at/all"] {
        let response = harness.server.method(Method::OPTIONS, path).await;

        assert!(
            response.status_code().is_success(),
            "OPTIONS {} returned {}",
            path,
            response.status_code()
        );
        assert!(response.text().is_empty());
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_some());
    }

    assert!(harness.agent.received_requests().await.is_empty());
}

#[tokio::test]
async fn test_browser_preflight_is_permissive() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .method(Method::OPTIONS, "/v1/chat/completions")
        .add_header(header::ORIGIN, HeaderValue::from_static("https://example.com"))
        .add_header(
            header::ACCESS_CONTROL_REQUEST_METHOD,
            HeaderValue::from_static("POST"),
        )
        .await;

    assert!(response.status_code().is_success());
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap()
            .to_str()
            .unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_cors_headers_on_regular_responses() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .get("/health")
        .add_header(header::ORIGIN, HeaderValue::from_static("https://example.com"))
        .await;

    response.assert_status_ok();
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_some());
}

#[tokio::test]
async fn test_oversized_body_rejected_before_parsing() {
    let harness = TestHarness::new().await;
    harness.agent.mock_reply("unused").await;

    // Not valid JSON: a parse attempt would produce 400, not 413
    let body = Bytes::from(vec![b'{'; constants::TEST_MAX_BODY_BYTES + 1]);
    let response = harness
        .server
        .post("/v1/chat/completions")
        .bytes(body)
        .await;

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    let json: Value = response.json();
    assert_eq!(json["error"]["code"], "payload_too_large");
    assert_eq!(json["error"]["type"], "invalid_request_error");
    assert!(harness.agent.received_requests().await.is_empty());
}

#[tokio::test]
async fn test_oversized_body_on_ollama_route() {
    let harness = TestHarness::new().await;

    let body = Bytes::from(vec![b' '; constants::TEST_MAX_BODY_BYTES * 2]);
    let response = harness.server.post("/api/chat").bytes(body).await;

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    let json: Value = response.json();
    assert_eq!(json["code"], "payload_too_large");
}

#[tokio::test]
async fn test_body_at_limit_is_accepted() {
    let harness = TestHarness::new().await;
    harness.agent.mock_reply("ok").await;

    let prefix = r#"{"prompt":""#;
    let suffix = r#""}"#;
    let filler = "a".repeat(constants::TEST_MAX_BODY_BYTES - prefix.len() - suffix.len());
    let body = format!("{}{}{}", prefix, filler, suffix);
    assert_eq!(body.len(), constants::TEST_MAX_BODY_BYTES);

    let response = harness
        .server
        .post("/v1/chat/completions")
        .add_header(
            HeaderName::from_static("content-type"),
            HeaderValue::from_static("application/json"),
        )
        .bytes(Bytes::from(body))
        .await;

    response.assert_status_ok();
}

fn panicking_router() -> Router {
    async fn boom() -> &'static str {
        panic!("secret internal state at 0xdeadbeef");
    }

    async fn fine() -> &'static str {
        "fine"
    }

    Router::new()
        .route("/v1/boom", get(boom))
        .route("/api/boom", get(boom))
        .route("/v1/fine", get(fine))
        .layer(middleware::from_fn(catch_panics))
}

#[tokio::test]
async fn test_panic_becomes_internal_fault() {
    let server = TestServer::new(panicking_router()).expect("Failed to create test server");

    let response = server.get("/v1/boom").await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let json: Value = response.json();
    assert_eq!(json["error"]["type"], "server_error");
    assert_eq!(json["error"]["message"], "Internal server error");
    assert!(!response.text().contains("deadbeef"));

    let response = server.get("/api/boom").await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let json: Value = response.json();
    assert_eq!(json["code"], "internal_error");

    // The server keeps serving other requests
    let response = server.get("/v1/fine").await;
    response.assert_status_ok();
    assert_eq!(response.text(), "fine");
}
