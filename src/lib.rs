//! Agent Gateway - protocol-translation gateway for a conversational agent
//!
//! Exposes OpenAI-style and Ollama-style chat APIs over HTTP and routes every
//! request to a single downstream agent. Requests are normalized into one
//! canonical prompt, replies are wrapped in the caller's protocol envelope,
//! and streaming is simulated by fragmenting the complete reply.

pub mod config;
pub mod downstream;
pub mod error;
pub mod middleware;
pub mod normalize;
pub mod response;
pub mod routes;
pub mod streaming;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use chrono::{DateTime, Utc};

pub use crate::config::Config;
pub use crate::downstream::{AgentBackend, AgentClient};
pub use crate::error::{GatewayError, GatewayResult, ProtocolFamily};

/// Application state shared across all request handlers.
///
/// Built once at startup and never mutated.
pub struct AppState {
    pub config: Config,
    pub start_time: Instant,
    pub started_at: DateTime<Utc>,
    /// Backend that produces replies
    pub agent: Arc<dyn AgentBackend>,
}

impl AppState {
    /// Create a new application state talking to the configured agent
    pub fn new(config: Config) -> Result<Self> {
        // Initialize HTTP client with connection pooling; timeouts are per call
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(100)
            .build()?;

        let agent: Arc<dyn AgentBackend> = Arc::new(AgentClient::new(http_client, &config));

        Ok(Self::with_backend(config, agent))
    }

    /// Create an application state around an arbitrary backend
    pub fn with_backend(config: Config, agent: Arc<dyn AgentBackend>) -> Self {
        Self {
            config,
            start_time: Instant::now(),
            started_at: Utc::now(),
            agent,
        }
    }
}
