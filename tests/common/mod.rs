//! Common test utilities for the gateway
//!
//! Shared harness that runs the real router against a mock downstream agent.

#![allow(dead_code)]

use std::sync::Arc;

use axum_test::TestServer;
use serde_json::{json, Value};

use agent_gateway::{routes, AgentBackend, AppState, Config};

use crate::mocks::{MockAgentServer, AGENT_CHAT_PATH};

/// Test configuration constants
pub mod constants {
    /// Model name exposed by the test gateway
    pub const TEST_MODEL: &str = "test-agent";
    /// Body limit used by the test gateway
    pub const TEST_MAX_BODY_BYTES: usize = 4096;
    /// Bearer token for auth tests
    pub const TEST_TOKEN: &str = "test-downstream-token";
}

/// Build a gateway config pointing at the mock agent
pub fn test_config(agent: &MockAgentServer) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        downstream_host: agent.host(),
        downstream_port: agent.port(),
        downstream_chat_path: AGENT_CHAT_PATH.to_string(),
        downstream_token: None,
        downstream_timeout_secs: 5,
        model_name: constants::TEST_MODEL.to_string(),
        max_body_bytes: constants::TEST_MAX_BODY_BYTES,
        default_session: "test-session".to_string(),
    }
}

/// Test harness: real router, real agent client, mock agent
pub struct TestHarness {
    pub server: TestServer,
    pub agent: MockAgentServer,
}

impl TestHarness {
    /// Create a harness with the default test config
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a harness, adjusting the config before the state is built
    pub async fn with_config<F>(adjust: F) -> Self
    where
        F: FnOnce(&mut Config),
    {
        let agent = MockAgentServer::start().await;
        let mut config = test_config(&agent);
        adjust(&mut config);

        let state = Arc::new(AppState::new(config).expect("Failed to build app state"));
        let app = routes::create_router(state);
        let server = TestServer::new(app).expect("Failed to create test server");

        Self { server, agent }
    }
}

/// Serve the real router over an arbitrary backend instead of the HTTP client
pub async fn server_with_backend(backend: Arc<dyn AgentBackend>) -> TestServer {
    let agent = MockAgentServer::start().await;
    let state = Arc::new(AppState::with_backend(test_config(&agent), backend));
    TestServer::new(routes::create_router(state)).expect("Failed to create test server")
}

/// Split an SSE body into its `data:` payloads
pub fn sse_payloads(body: &str) -> Vec<String> {
    body.split("\n\n")
        .filter(|event| !event.trim().is_empty())
        .map(|event| event.trim_start_matches("data: ").to_string())
        .collect()
}

/// Concatenate the content deltas of parsed SSE chunks
pub fn sse_content(payloads: &[String]) -> String {
    payloads
        .iter()
        .filter(|p| p.as_str() != "[DONE]")
        .filter_map(|p| serde_json::from_str::<Value>(p).ok())
        .filter_map(|v| v["choices"][0]["delta"]["content"].as_str().map(str::to_string))
        .collect()
}

/// Sample request data for tests
pub mod test_data {
    use super::*;

    /// Minimal chat request
    pub fn ping_request() -> Value {
        json!({
            "messages": [{"role": "user", "content": "ping"}]
        })
    }

    /// Chat request with streaming
    pub fn streaming_request(content: &str) -> Value {
        json!({
            "model": "gpt-4o",
            "messages": [{"role": "user", "content": content}],
            "stream": true
        })
    }
}
