//! HTTP routes for the gateway
//!
//! This module defines every endpoint of both protocol families plus the
//! shared request pipeline (bounded body read, normalization, streaming
//! response assembly).

pub mod chat;
pub mod fallback;
pub mod health;
pub mod models;
pub mod ollama;

use std::future::Future;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware,
    response::Response,
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use http_body_util::LengthLimitError;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::debug;

use crate::{
    downstream::AgentBackend,
    error::{GatewayError, GatewayResult},
    middleware::{catch_panics, handle_preflight},
    normalize::ChatRequest,
    AppState,
};

/// Header clients may use to pass a session label
pub const SESSION_HEADER: &str = "x-session-id";

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Family A: OpenAI-style
    let openai_routes = Router::new()
        .route(
            "/v1/chat/completions",
            post(chat::chat_completions).fallback(fallback::not_found),
        )
        .route(
            "/v1/models",
            get(models::list_models).fallback(fallback::not_found),
        )
        .route(
            "/v1/models/:model_id",
            get(models::get_model).fallback(fallback::not_found),
        );

    // Family B: Ollama-style
    let ollama_routes = Router::new()
        .route(
            "/api/chat",
            post(ollama::chat).fallback(fallback::not_found),
        )
        .route(
            "/api/generate",
            post(ollama::generate).fallback(fallback::not_found),
        )
        .route("/api/tags", get(ollama::tags).fallback(fallback::not_found))
        .route(
            "/api/version",
            get(ollama::version).fallback(fallback::not_found),
        );

    let public_routes = Router::new().route(
        "/health",
        get(health::health_check).fallback(fallback::not_found),
    );

    // Middleware is applied in reverse order (last applied runs first):
    // preflight short-circuit, CORS, tracing, then panic containment.
    Router::new()
        .merge(public_routes)
        .merge(openai_routes)
        .merge(ollama_routes)
        .fallback(fallback::not_found)
        .layer(middleware::from_fn(catch_panics))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(middleware::from_fn(handle_preflight))
        .with_state(state)
}

/// A chat request that passed validation and normalization
#[derive(Debug, Clone)]
pub struct InboundChat {
    pub request: ChatRequest,
    /// Canonical prompt sent downstream
    pub prompt: String,
    /// Resolved session label
    pub session: String,
}

impl InboundChat {
    /// Read, parse and normalize a chat request.
    ///
    /// The body is bounded by the configured limit and is never parsed when
    /// it exceeds it.
    pub async fn read(state: &AppState, request: Request) -> GatewayResult<Self> {
        let header_hint = session_header(request.headers());
        let body = read_body(request, state.config.max_body_bytes).await?;

        let chat = ChatRequest::from_slice(&body)?;
        let prompt = chat.canonical_prompt()?;
        let session = chat.session_label(header_hint.as_deref(), &state.config.default_session);

        Ok(Self {
            request: chat,
            prompt,
            session,
        })
    }

    /// Phase one of a stream: the future that acquires the complete reply
    pub fn reply(
        &self,
        agent: Arc<dyn AgentBackend>,
    ) -> impl Future<Output = GatewayResult<String>> + Send + 'static {
        let prompt = self.prompt.clone();
        let session = self.session.clone();
        async move { agent.converse(&prompt, &session).await }
    }
}

fn session_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Read a request body into memory, aborting once it exceeds `limit` bytes
pub async fn read_body(request: Request, limit: usize) -> GatewayResult<Bytes> {
    let declared = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    if let Some(len) = declared {
        if len > limit as u64 {
            debug!(declared = len, limit, "Rejecting body by Content-Length");
            return Err(GatewayError::payload_too_large(limit));
        }
    }

    axum::body::to_bytes(request.into_body(), limit)
        .await
        .map_err(|e| {
            if e.into_inner().is::<LengthLimitError>() {
                GatewayError::payload_too_large(limit)
            } else {
                GatewayError::validation("Failed to read request body")
            }
        })
}

/// Build a streaming response with the headers SSE/NDJSON clients expect
pub fn stream_response(body: Body, content_type: &'static str) -> GatewayResult<Response> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CACHE_CONTROL, "no-cache")
        .header("X-Accel-Buffering", "no")
        .body(body)
        .map_err(|e| GatewayError::Internal(format!("Failed to build response: {}", e)))
}
