//! Chat completions endpoint
//!
//! OpenAI-compatible chat completions API endpoint.
//! Handles both streaming and non-streaming responses.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;

use crate::{
    error::{FamilyError, GatewayResult, ProtocolFamily},
    response::{openai_completion, CompletionMeta},
    routes::{stream_response, InboundChat},
    streaming::{emit, framed_body, OpenAiSse, StreamFraming},
    AppState,
};

/// Handle chat completion requests
///
/// Accepts `{model?, messages[] | prompt, stream?}` and answers with a single
/// `chat.completion` object or an SSE stream ending in `data: [DONE]`.
pub async fn chat_completions(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Response, FamilyError> {
    handle(state, request)
        .await
        .map_err(|e| e.for_family(ProtocolFamily::OpenAi))
}

async fn handle(state: Arc<AppState>, request: Request) -> GatewayResult<Response> {
    let start_time = Instant::now();
    let inbound = InboundChat::read(&state, request).await?;
    let meta = CompletionMeta::new(inbound.request.model.as_deref(), &state.config.model_name);

    info!(
        id = %meta.id,
        model = %meta.model,
        stream = inbound.request.stream,
        session = %inbound.session,
        prompt_chars = inbound.prompt.chars().count(),
        "Processing chat completion request"
    );

    if inbound.request.stream {
        let framing = OpenAiSse::new(meta);
        let content_type = framing.content_type();
        let events = emit(inbound.reply(state.agent.clone()));
        return stream_response(framed_body(events, framing), content_type);
    }

    let reply = state
        .agent
        .converse(&inbound.prompt, &inbound.session)
        .await?;
    let response = openai_completion(&meta, &inbound.prompt, &reply);

    info!(
        id = %meta.id,
        duration_ms = start_time.elapsed().as_millis() as u64,
        reply_chars = reply.chars().count(),
        "Chat completion request completed"
    );

    Ok((StatusCode::OK, Json(response)).into_response())
}
