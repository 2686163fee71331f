//! Models endpoint integration tests
//!
//! Tests for:
//! - GET /v1/models - List the exposed model
//! - GET /v1/models/{id} - Get a specific model

use axum::http::StatusCode;
use serde_json::Value;

use crate::common::{constants, TestHarness};

#[tokio::test]
async fn test_list_models() {
    let harness = TestHarness::new().await;

    let response = harness.server.get("/v1/models").await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["object"], "list");
    let data = json["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["id"], constants::TEST_MODEL);
    assert_eq!(data[0]["object"], "model");
}

#[tokio::test]
async fn test_get_exposed_model() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .get(&format!("/v1/models/{}", constants::TEST_MODEL))
        .await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["id"], constants::TEST_MODEL);
}

#[tokio::test]
async fn test_get_unknown_model_is_not_found() {
    let harness = TestHarness::new().await;

    let response = harness.server.get("/v1/models/gpt-4o").await;

    response.assert_status(StatusCode::NOT_FOUND);
    let json: Value = response.json();
    assert_eq!(json["error"]["code"], "not_found");
    assert!(json["error"]["message"].as_str().unwrap().contains("gpt-4o"));
}
