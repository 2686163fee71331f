//! Downstream agent data models
//!
//! Data structures for the agent's conversational endpoint.

use serde::Serialize;
use serde_json::Value;

/// Fields checked, in order, for the reply text in a downstream response.
///
/// The agent's response schema has drifted between versions; this list is a
/// compatibility shim until a single reply field is agreed on.
pub const REPLY_FIELDS: &[&str] = &["response", "reply", "message", "text", "content", "output"];

/// Request body sent to the downstream agent
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AgentRequest {
    /// Canonical prompt text
    pub prompt: String,
    /// Conversation label the agent uses to keep context
    pub session_id: String,
    /// Seconds the agent may spend on this turn
    pub timeout: u64,
}

/// Pull the reply text out of a downstream JSON response.
///
/// The first candidate field holding a non-empty string wins. When none
/// matches, the whole response is serialized so callers always get text.
pub fn extract_reply(body: &Value) -> String {
    REPLY_FIELDS
        .iter()
        .filter_map(|field| body.get(*field))
        .filter_map(Value::as_str)
        .find(|text| !text.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| body.to_string())
}
