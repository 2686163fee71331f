//! Inbound request normalization
//!
//! Both protocol families are parsed into one [`ChatRequest`] whose input is a
//! tagged union over the known request shapes. Every shape reduces to an
//! ordered list of [`Message`]s and then to a single canonical prompt string.
//!
//! Normalization is lossy and one-way: non-text content parts (images, audio,
//! tool payloads) are dropped because the downstream agent accepts text only.

use serde::Deserialize;

use crate::error::{GatewayError, GatewayResult};

/// Separator placed between rendered messages
pub const MESSAGE_SEPARATOR: &str = "\n\n";

/// Tag prefixed to system-role content
pub const SYSTEM_TAG: &str = "[System]";

/// Tag prefixed to assistant-role content
pub const ASSISTANT_TAG: &str = "[Assistant]";

/// Role of a message participant.
///
/// Unrecognized roles (`tool`, `function`, `developer`, ...) render as user
/// content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "system" => Role::System,
            "assistant" => Role::Assistant,
            _ => Role::User,
        }
    }
}

/// A typed part of multimodal content. Only `text` parts carry meaning here.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ContentPart {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

/// Message content - either plain text or typed parts
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl Content {
    /// Text carried by this content.
    ///
    /// Text parts are joined with newlines in their original order; every
    /// other part type is discarded.
    pub fn as_text(&self) -> String {
        match self {
            Content::Text(text) => text.clone(),
            Content::Parts(parts) => parts
                .iter()
                .filter(|part| part.kind == "text")
                .filter_map(|part| part.text.as_deref())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// A chat message with role and content
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default)]
    pub content: Option<Content>,
}

impl Message {
    /// Build a plain-text message
    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(Content::Text(text.into())),
        }
    }

    /// Render this message as one canonical prompt segment.
    ///
    /// Returns `None` when the message has no text left after filtering.
    pub fn render(&self) -> Option<String> {
        let text = self.content.as_ref().map(Content::as_text)?;
        if text.trim().is_empty() {
            return None;
        }

        Some(match self.role {
            Role::System => format!("{} {}", SYSTEM_TAG, text),
            Role::Assistant => format!("{} {}", ASSISTANT_TAG, text),
            Role::User => text,
        })
    }
}

/// Render an ordered message list as the canonical prompt
pub fn render_prompt(messages: &[Message]) -> String {
    messages
        .iter()
        .filter_map(Message::render)
        .collect::<Vec<_>>()
        .join(MESSAGE_SEPARATOR)
}

/// Raw request body accepted by every chat endpoint of either family.
///
/// Unknown fields (`temperature`, `options`, `tools`, ...) are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct ChatBody {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub messages: Option<Vec<Message>>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub system: Option<String>,
    #[serde(default)]
    pub stream: Option<bool>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
}

/// The request shapes a client can send
#[derive(Debug, Clone, PartialEq)]
pub enum RequestShape {
    /// Role/content pairs (`messages`)
    Messages(Vec<Message>),
    /// A single flat prompt with an optional system instruction
    Prompt {
        prompt: String,
        system: Option<String>,
    },
}

impl RequestShape {
    /// Reduce any shape to an ordered message list
    pub fn into_messages(self) -> Vec<Message> {
        match self {
            RequestShape::Messages(messages) => messages,
            RequestShape::Prompt { prompt, system } => {
                let mut messages = Vec::with_capacity(2);
                if let Some(system) = system {
                    messages.push(Message::text(Role::System, system));
                }
                messages.push(Message::text(Role::User, prompt));
                messages
            }
        }
    }
}

/// A validated chat request, independent of protocol family
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub shape: RequestShape,
    /// Client-declared model identifier. Echoed back, never used for routing.
    pub model: Option<String>,
    pub stream: bool,
    /// Client-supplied session hint
    pub session: Option<String>,
}

impl ChatRequest {
    /// Parse a raw body into a validated request
    pub fn from_slice(body: &[u8]) -> GatewayResult<Self> {
        let raw: ChatBody = serde_json::from_slice(body)
            .map_err(|e| GatewayError::validation(format!("Invalid request body: {}", e)))?;
        Self::try_from(raw)
    }

    /// Render the canonical prompt for this request.
    ///
    /// Fails when no text survives normalization.
    pub fn canonical_prompt(&self) -> GatewayResult<String> {
        let prompt = render_prompt(&self.shape.clone().into_messages());
        if prompt.is_empty() {
            return Err(GatewayError::validation(
                "Request contains no text content to send",
            ));
        }
        Ok(prompt)
    }

    /// Resolve the session label: body hint, then header hint, then default
    ///
    /// Blank hints are skipped at every level.
    pub fn session_label(&self, header_hint: Option<&str>, default: &str) -> String {
        non_blank(self.session.as_deref())
            .or_else(|| non_blank(header_hint))
            .unwrap_or(default)
            .to_string()
    }
}

fn non_blank(hint: Option<&str>) -> Option<&str> {
    hint.map(str::trim).filter(|s| !s.is_empty())
}

impl TryFrom<ChatBody> for ChatRequest {
    type Error = GatewayError;

    fn try_from(body: ChatBody) -> Result<Self, Self::Error> {
        let shape = match (body.messages, body.prompt) {
            (Some(messages), _) => {
                if messages.is_empty() {
                    return Err(GatewayError::validation("'messages' must not be empty"));
                }
                RequestShape::Messages(messages)
            }
            (None, Some(prompt)) => RequestShape::Prompt {
                prompt,
                system: body.system.filter(|s| !s.trim().is_empty()),
            },
            (None, None) => {
                return Err(GatewayError::validation(
                    "Request must contain 'messages' or 'prompt'",
                ))
            }
        };

        Ok(Self {
            shape,
            model: body.model.filter(|m| !m.trim().is_empty()),
            stream: body.stream.unwrap_or(false),
            session: body
                .session_id
                .filter(|s| !s.trim().is_empty())
                .or(body.user.filter(|u| !u.trim().is_empty())),
        })
    }
}
