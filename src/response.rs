//! Success envelopes for both protocol families
//!
//! Builds OpenAI-style completion objects and Ollama-style chat/generate
//! responses around a downstream reply.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Characters per estimated token.
///
/// Usage counts are a length heuristic, not a tokenization.
pub const CHARS_PER_TOKEN: usize = 4;

/// Terminal reason reported for every completed reply
pub const FINISH_REASON_STOP: &str = "stop";

/// Estimate a token count from character length (rounded up)
pub fn estimate_tokens(text: &str) -> u32 {
    let chars = text.chars().count();
    u32::try_from(chars.div_ceil(CHARS_PER_TOKEN)).unwrap_or(u32::MAX)
}

/// Per-request metadata shared by every envelope of one response
#[derive(Debug, Clone)]
pub struct CompletionMeta {
    /// Unique identifier for this completion
    pub id: String,
    /// Model identifier echoed to the client
    pub model: String,
    /// Creation time
    pub created: DateTime<Utc>,
}

impl CompletionMeta {
    /// Fresh metadata: new id, current time, echoed or default model
    pub fn new(requested_model: Option<&str>, default_model: &str) -> Self {
        Self {
            id: format!("chatcmpl-{}", uuid::Uuid::new_v4().simple()),
            model: requested_model.unwrap_or(default_model).to_string(),
            created: Utc::now(),
        }
    }

    /// Creation time as a Unix timestamp
    pub fn created_unix(&self) -> i64 {
        self.created.timestamp()
    }

    /// Creation time in RFC 3339 form, as Ollama reports it
    pub fn created_at(&self) -> String {
        self.created.to_rfc3339()
    }
}

/// Approximate usage statistics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl Usage {
    /// Estimate usage from prompt and reply lengths
    pub fn estimate(prompt: &str, reply: &str) -> Self {
        let prompt_tokens = estimate_tokens(prompt);
        let completion_tokens = estimate_tokens(reply);
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

/// Assistant message in a response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssistantMessage {
    pub role: String,
    pub content: String,
}

impl AssistantMessage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Chat completion choice
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionChoice {
    pub index: u32,
    pub message: AssistantMessage,
    pub finish_reason: Option<String>,
}

/// OpenAI-style chat completion response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChatCompletionChoice>,
    pub usage: Usage,
}

/// Build the OpenAI completion envelope for a full reply
pub fn openai_completion(meta: &CompletionMeta, prompt: &str, reply: &str) -> ChatCompletionResponse {
    ChatCompletionResponse {
        id: meta.id.clone(),
        object: "chat.completion".to_string(),
        created: meta.created_unix(),
        model: meta.model.clone(),
        choices: vec![ChatCompletionChoice {
            index: 0,
            message: AssistantMessage::new(reply),
            finish_reason: Some(FINISH_REASON_STOP.to_string()),
        }],
        usage: Usage::estimate(prompt, reply),
    }
}

/// Ollama-style `/api/chat` response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OllamaChatResponse {
    pub model: String,
    pub created_at: String,
    pub message: AssistantMessage,
    pub done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_eval_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u32>,
}

/// Build the Ollama chat envelope for a full reply
pub fn ollama_chat(meta: &CompletionMeta, prompt: &str, reply: &str) -> OllamaChatResponse {
    let usage = Usage::estimate(prompt, reply);
    OllamaChatResponse {
        model: meta.model.clone(),
        created_at: meta.created_at(),
        message: AssistantMessage::new(reply),
        done: true,
        done_reason: Some(FINISH_REASON_STOP.to_string()),
        prompt_eval_count: Some(usage.prompt_tokens),
        eval_count: Some(usage.completion_tokens),
    }
}

/// Ollama-style `/api/generate` response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OllamaGenerateResponse {
    pub model: String,
    pub created_at: String,
    pub response: String,
    pub done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_eval_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u32>,
}

/// Build the Ollama generate envelope for a full reply
pub fn ollama_generate(meta: &CompletionMeta, prompt: &str, reply: &str) -> OllamaGenerateResponse {
    let usage = Usage::estimate(prompt, reply);
    OllamaGenerateResponse {
        model: meta.model.clone(),
        created_at: meta.created_at(),
        response: reply.to_string(),
        done: true,
        done_reason: Some(FINISH_REASON_STOP.to_string()),
        prompt_eval_count: Some(usage.prompt_tokens),
        eval_count: Some(usage.completion_tokens),
    }
}
