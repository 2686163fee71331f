//! Ollama-compatible endpoints
//!
//! - `POST /api/chat` - chat with `messages[]` (or a flat `prompt`)
//! - `POST /api/generate` - completion from a flat `prompt`
//! - `GET /api/tags` - local model listing
//! - `GET /api/version` - server version
//!
//! Streaming is opt-in (`"stream": true`) and framed as newline-delimited JSON.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::{
    error::{FamilyError, GatewayResult, ProtocolFamily},
    response::{ollama_chat, ollama_generate, CompletionMeta},
    routes::{stream_response, InboundChat},
    streaming::{emit, framed_body, OllamaEndpoint, OllamaNdjson, StreamFraming},
    AppState,
};

/// Handle `/api/chat`
pub async fn chat(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Response, FamilyError> {
    handle(state, request, OllamaEndpoint::Chat)
        .await
        .map_err(|e| e.for_family(ProtocolFamily::Ollama))
}

/// Handle `/api/generate`
pub async fn generate(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Response, FamilyError> {
    handle(state, request, OllamaEndpoint::Generate)
        .await
        .map_err(|e| e.for_family(ProtocolFamily::Ollama))
}

async fn handle(
    state: Arc<AppState>,
    request: Request,
    endpoint: OllamaEndpoint,
) -> GatewayResult<Response> {
    let start_time = Instant::now();
    let inbound = InboundChat::read(&state, request).await?;
    let meta = CompletionMeta::new(inbound.request.model.as_deref(), &state.config.model_name);

    info!(
        endpoint = ?endpoint,
        model = %meta.model,
        stream = inbound.request.stream,
        session = %inbound.session,
        prompt_chars = inbound.prompt.chars().count(),
        "Processing Ollama request"
    );

    if inbound.request.stream {
        let framing = OllamaNdjson::new(meta, endpoint);
        let content_type = framing.content_type();
        let events = emit(inbound.reply(state.agent.clone()));
        return stream_response(framed_body(events, framing), content_type);
    }

    let reply = state
        .agent
        .converse(&inbound.prompt, &inbound.session)
        .await?;

    info!(
        endpoint = ?endpoint,
        duration_ms = start_time.elapsed().as_millis() as u64,
        reply_chars = reply.chars().count(),
        "Ollama request completed"
    );

    let body = match endpoint {
        OllamaEndpoint::Chat => Json(ollama_chat(&meta, &inbound.prompt, &reply)).into_response(),
        OllamaEndpoint::Generate => {
            Json(ollama_generate(&meta, &inbound.prompt, &reply)).into_response()
        }
    };
    Ok(body)
}

/// Model details in a tags listing
#[derive(Debug, Clone, Serialize)]
pub struct ModelDetails {
    pub format: String,
    pub family: String,
    pub families: Vec<String>,
    pub parameter_size: String,
    pub quantization_level: String,
}

/// One entry of the tags listing
#[derive(Debug, Clone, Serialize)]
pub struct TagEntry {
    pub name: String,
    pub model: String,
    pub modified_at: String,
    pub size: u64,
    pub digest: String,
    pub details: ModelDetails,
}

/// Tags listing response
#[derive(Debug, Clone, Serialize)]
pub struct TagsResponse {
    pub models: Vec<TagEntry>,
}

/// List the exposed model in Ollama's nested metadata format
pub async fn tags(State(state): State<Arc<AppState>>) -> (StatusCode, Json<TagsResponse>) {
    let name = state.config.model_name.clone();
    let entry = TagEntry {
        name: name.clone(),
        model: name,
        modified_at: state.started_at.to_rfc3339(),
        size: 0,
        digest: String::new(),
        details: ModelDetails {
            format: "agent".to_string(),
            family: "agent".to_string(),
            families: vec!["agent".to_string()],
            parameter_size: "unknown".to_string(),
            quantization_level: "none".to_string(),
        },
    };

    (StatusCode::OK, Json(TagsResponse { models: vec![entry] }))
}

/// Version response
#[derive(Debug, Clone, Serialize)]
pub struct VersionResponse {
    pub version: String,
}

/// Report the gateway version
pub async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
