//! Simulated incremental delivery
//!
//! The downstream agent only returns complete replies, so streaming is a
//! two-phase pipeline:
//!
//! 1. acquire the complete reply (or the failure) from the backend;
//! 2. lazily cut it into fixed-size fragments and emit them as events.
//!
//! [`emit`] produces protocol-neutral [`StreamEvent`]s; a [`StreamFraming`]
//! turns each event into wire bytes for one protocol family. Every stream ends
//! with exactly one [`StreamEvent::Finish`] followed by exactly one
//! [`StreamEvent::End`], including streams whose backend call failed.

use std::convert::Infallible;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use axum::body::Body;
use bytes::Bytes;
use futures::{future, FutureExt, Stream, StreamExt};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::{
    error::{GatewayError, GatewayResult},
    middleware::recover::panic_message,
    response::{CompletionMeta, FINISH_REASON_STOP},
};

/// Characters per emitted content fragment
pub const FRAGMENT_CHARS: usize = 16;

/// One step of a simulated stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A fragment of reply text, in original order
    Content(String),
    /// The reply is complete
    Finish,
    /// End-of-stream sentinel
    End,
}

/// Lazily split text into fragments of at most `size` characters.
///
/// Splits on char boundaries so multi-byte text is never cut mid-character.
pub fn fragments(text: &str, size: usize) -> Fragments<'_> {
    Fragments {
        rest: text,
        size: size.max(1),
    }
}

/// Iterator over the fragments of a reply, see [`fragments`]
#[derive(Debug, Clone)]
pub struct Fragments<'a> {
    rest: &'a str,
    size: usize,
}

impl<'a> Iterator for Fragments<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }
        let end = self
            .rest
            .char_indices()
            .nth(self.size)
            .map_or(self.rest.len(), |(idx, _)| idx);
        let (head, tail) = self.rest.split_at(end);
        self.rest = tail;
        Some(head)
    }
}

/// Logs when a stream is dropped before its sentinel was handed out,
/// i.e. when the client disconnected mid-stream.
struct EmissionGuard {
    fragments_sent: usize,
    completed: bool,
}

impl Drop for EmissionGuard {
    fn drop(&mut self) {
        if !self.completed {
            debug!(
                fragments_sent = self.fragments_sent,
                "Stream dropped before completion, client disconnected"
            );
        }
    }
}

/// Build the event stream for one reply.
///
/// Nothing happens until the stream is first polled; dropping the stream at
/// any point stops emission.
pub fn emit<F>(reply: F) -> impl Stream<Item = StreamEvent> + Send
where
    F: Future<Output = GatewayResult<String>> + Send,
{
    async_stream::stream! {
        let mut guard = EmissionGuard { fragments_sent: 0, completed: false };

        // The handler has already returned, so a panic here is outside
        // `catch_panics` and must be contained by the stream itself.
        let outcome = match AssertUnwindSafe(reply).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(payload) => {
                let detail = panic_message(&*payload);
                error!(panic = %detail, "Backend panicked during stream");
                Err(GatewayError::Internal(detail))
            }
        };

        let text = match outcome {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Downstream call failed during stream, emitting error fragment");
                format!("Error: {}", e.client_message())
            }
        };

        for fragment in fragments(&text, FRAGMENT_CHARS) {
            guard.fragments_sent += 1;
            yield StreamEvent::Content(fragment.to_string());
        }

        yield StreamEvent::Finish;
        guard.completed = true;
        yield StreamEvent::End;
    }
}

/// Wire framing of stream events for one protocol family
pub trait StreamFraming: Send + 'static {
    /// Content type of the framed body
    fn content_type(&self) -> &'static str;

    /// Bytes for one event, or `None` if the event has no wire form
    fn frame(&mut self, event: &StreamEvent) -> Option<Bytes>;
}

/// Frame an event stream into a response body
pub fn framed_body<S, F>(events: S, mut framing: F) -> Body
where
    S: Stream<Item = StreamEvent> + Send + 'static,
    F: StreamFraming,
{
    let frames = events
        .filter_map(move |event| future::ready(framing.frame(&event)))
        .map(Ok::<_, Infallible>);
    Body::from_stream(frames)
}

// ============================================================================
// OpenAI SSE framing
// ============================================================================

/// Delta content in a streaming chunk
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
pub struct Delta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// A choice in a streaming chunk
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StreamChoice {
    pub index: u32,
    pub delta: Delta,
    pub finish_reason: Option<String>,
}

/// OpenAI `chat.completion.chunk` object
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StreamChunk {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<StreamChoice>,
}

/// Format a stream chunk as an SSE data event: `data: {json}\n\n`
pub fn format_sse_chunk(chunk: &StreamChunk) -> Bytes {
    let json = serde_json::to_string(chunk).expect("StreamChunk should always serialize");
    Bytes::from(format!("data: {}\n\n", json))
}

/// Format the SSE done marker: `data: [DONE]\n\n`
pub fn format_sse_done() -> Bytes {
    Bytes::from_static(b"data: [DONE]\n\n")
}

/// OpenAI-style Server-Sent Events framing
pub struct OpenAiSse {
    meta: CompletionMeta,
    role_sent: bool,
}

impl OpenAiSse {
    pub fn new(meta: CompletionMeta) -> Self {
        Self {
            meta,
            role_sent: false,
        }
    }

    fn chunk(&self, delta: Delta, finish_reason: Option<String>) -> StreamChunk {
        StreamChunk {
            id: self.meta.id.clone(),
            object: "chat.completion.chunk".to_string(),
            created: self.meta.created_unix(),
            model: self.meta.model.clone(),
            choices: vec![StreamChoice {
                index: 0,
                delta,
                finish_reason,
            }],
        }
    }
}

impl StreamFraming for OpenAiSse {
    fn content_type(&self) -> &'static str {
        "text/event-stream"
    }

    fn frame(&mut self, event: &StreamEvent) -> Option<Bytes> {
        match event {
            StreamEvent::Content(text) => {
                // Role only on the first delta
                let role = (!self.role_sent).then(|| "assistant".to_string());
                self.role_sent = true;
                let delta = Delta {
                    role,
                    content: Some(text.clone()),
                };
                Some(format_sse_chunk(&self.chunk(delta, None)))
            }
            StreamEvent::Finish => Some(format_sse_chunk(
                &self.chunk(Delta::default(), Some(FINISH_REASON_STOP.to_string())),
            )),
            StreamEvent::End => Some(format_sse_done()),
        }
    }
}

// ============================================================================
// Ollama NDJSON framing
// ============================================================================

/// Which Ollama endpoint a stream answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OllamaEndpoint {
    /// `/api/chat`: text under `message.content`
    Chat,
    /// `/api/generate`: text under `response`
    Generate,
}

/// Ollama-style newline-delimited JSON framing.
///
/// NDJSON has no literal sentinel: the `done: true` line is the last frame
/// and [`StreamEvent::End`] closes the body without further bytes.
pub struct OllamaNdjson {
    meta: CompletionMeta,
    endpoint: OllamaEndpoint,
}

impl OllamaNdjson {
    pub fn new(meta: CompletionMeta, endpoint: OllamaEndpoint) -> Self {
        Self { meta, endpoint }
    }

    fn line(&self, text: &str, done: bool) -> Bytes {
        let mut value = serde_json::json!({
            "model": self.meta.model,
            "created_at": self.meta.created_at(),
            "done": done,
        });
        match self.endpoint {
            OllamaEndpoint::Chat => {
                value["message"] = serde_json::json!({"role": "assistant", "content": text});
            }
            OllamaEndpoint::Generate => {
                value["response"] = serde_json::Value::String(text.to_string());
            }
        }
        if done {
            value["done_reason"] = serde_json::Value::String(FINISH_REASON_STOP.to_string());
        }
        Bytes::from(format!("{}\n", value))
    }
}

impl StreamFraming for OllamaNdjson {
    fn content_type(&self) -> &'static str {
        "application/x-ndjson"
    }

    fn frame(&mut self, event: &StreamEvent) -> Option<Bytes> {
        match event {
            StreamEvent::Content(text) => Some(self.line(text, false)),
            StreamEvent::Finish => Some(self.line("", true)),
            StreamEvent::End => None,
        }
    }
}
