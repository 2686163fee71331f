//! Downstream agent client
//!
//! HTTP client for the conversational agent behind the gateway.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, instrument, warn};

use crate::{
    config::Config,
    downstream::models::{extract_reply, AgentRequest},
    error::{GatewayError, GatewayResult, BODY_EXCERPT_CHARS},
};

/// Bytes of a failure body read to build its excerpt (4 bytes per char at most)
pub const ERROR_BODY_READ_BYTES: usize = BODY_EXCERPT_CHARS * 4;

/// Backend that turns a canonical prompt into a complete reply.
///
/// Implementations return only the two upstream error kinds; transport errors
/// never escape raw.
#[async_trait]
pub trait AgentBackend: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &'static str;

    /// Send one conversational turn and wait for the full reply
    async fn converse(&self, prompt: &str, session: &str) -> GatewayResult<String>;
}

/// Downstream agent client
pub struct AgentClient {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
    timeout: Duration,
}

impl AgentClient {
    /// Create a new agent client
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            url: config.downstream_chat_url(),
            token: config.downstream_token.clone(),
            timeout: config.downstream_timeout(),
        }
    }

    /// URL of the conversational endpoint this client targets
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl AgentBackend for AgentClient {
    fn name(&self) -> &'static str {
        "agent"
    }

    #[instrument(skip(self, prompt), fields(prompt_chars = prompt.chars().count()))]
    async fn converse(&self, prompt: &str, session: &str) -> GatewayResult<String> {
        let request = AgentRequest {
            prompt: prompt.to_string(),
            session_id: session.to_string(),
            timeout: self.timeout.as_secs(),
        };

        debug!(url = %self.url, "Sending prompt to downstream agent");

        let mut builder = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(&request);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(unavailable)?;

        let status = response.status();
        debug!(status = %status, "Downstream agent response status");

        if !status.is_success() {
            let body = match read_error_body(response).await {
                Ok(body) => body,
                Err(e) => {
                    warn!(status = %status, error = %e, "Failed to read downstream error body");
                    "unreadable response body".to_string()
                }
            };
            error!(status = %status, body = %body, "Downstream agent rejected request");
            return Err(GatewayError::upstream_rejected(status.as_u16(), &body));
        }

        let text = response.text().await.map_err(unavailable)?;

        if text.trim().is_empty() {
            error!(status = %status, "Downstream agent returned an empty body");
            return Err(GatewayError::upstream_rejected(
                status.as_u16(),
                "empty response body",
            ));
        }

        let reply = match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(body) => extract_reply(&body),
            Err(e) => {
                warn!(error = %e, "Downstream agent response is not JSON, using raw body");
                text
            }
        };

        debug!(reply_chars = reply.chars().count(), "Received downstream reply");
        Ok(reply)
    }
}

/// Read at most [`ERROR_BODY_READ_BYTES`] of a failure response.
///
/// The rest of the body is never pulled off the connection.
async fn read_error_body(mut response: reqwest::Response) -> Result<String, reqwest::Error> {
    let mut buf = Vec::with_capacity(1024);
    while buf.len() < ERROR_BODY_READ_BYTES {
        match response.chunk().await? {
            Some(chunk) => {
                let take = chunk.len().min(ERROR_BODY_READ_BYTES - buf.len());
                buf.extend_from_slice(&chunk[..take]);
            }
            None => break,
        }
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Map a transport failure to UpstreamUnavailable
fn unavailable(err: reqwest::Error) -> GatewayError {
    let timed_out = err.is_timeout();
    error!(error = %err, timed_out, "Failed to reach downstream agent");
    GatewayError::UpstreamUnavailable {
        detail: err.to_string(),
        timed_out,
    }
}
