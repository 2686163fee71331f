//! Error types for the gateway
//!
//! Every failure is reduced to one of four kinds and rendered in the error
//! shape of the protocol family the client spoke.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Maximum number of characters of a downstream body surfaced to clients
pub const BODY_EXCERPT_CHARS: usize = 256;

/// Gateway errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GatewayError {
    /// Malformed, oversized, missing or unroutable input. Always client-caused.
    #[error("{message}")]
    Validation { status: StatusCode, message: String },

    /// The downstream agent could not be reached or did not answer in time
    #[error("Downstream agent unavailable: {detail}")]
    UpstreamUnavailable { detail: String, timed_out: bool },

    /// The downstream agent answered with a failure status
    #[error("Downstream agent returned status {status}: {excerpt}")]
    UpstreamRejected { status: u16, excerpt: String },

    /// Unexpected failure while processing a request
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Create a 400 validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    /// Create a 413 validation error for bodies over the configured limit
    pub fn payload_too_large(limit: usize) -> Self {
        Self::Validation {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            message: format!("Request body exceeds the {} byte limit", limit),
        }
    }

    /// Create a 404 validation error for an unknown (method, path) pair
    pub fn not_found(method: &str, path: &str) -> Self {
        Self::Validation {
            status: StatusCode::NOT_FOUND,
            message: format!("No route for {} {}", method, path),
        }
    }

    /// Create an UpstreamRejected error, truncating the body to an excerpt
    pub fn upstream_rejected(status: u16, body: &str) -> Self {
        Self::UpstreamRejected {
            status,
            excerpt: excerpt(body),
        }
    }

    /// HTTP status used when rendering this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { status, .. } => *status,
            Self::UpstreamUnavailable { timed_out: true, .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::UpstreamUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::UpstreamRejected { .. } => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error category
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "invalid_request_error",
            Self::UpstreamUnavailable { .. } => "upstream_unavailable",
            Self::UpstreamRejected { .. } => "upstream_error",
            Self::Internal(_) => "server_error",
        }
    }

    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { status, .. } if *status == StatusCode::NOT_FOUND => "not_found",
            Self::Validation { status, .. } if *status == StatusCode::PAYLOAD_TOO_LARGE => {
                "payload_too_large"
            }
            Self::Validation { .. } => "invalid_request",
            Self::UpstreamUnavailable { timed_out: true, .. } => "upstream_timeout",
            Self::UpstreamUnavailable { .. } => "upstream_unavailable",
            Self::UpstreamRejected { .. } => "upstream_rejected",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Message safe to show a client.
    ///
    /// Transport errors and panics can carry internal addresses or state,
    /// so only validation and rejection messages pass through verbatim.
    pub fn client_message(&self) -> String {
        match self {
            Self::Validation { message, .. } => message.clone(),
            Self::UpstreamUnavailable { timed_out: true, .. } => {
                "Downstream agent did not respond in time".to_string()
            }
            Self::UpstreamUnavailable { .. } => "Downstream agent is unavailable".to_string(),
            Self::UpstreamRejected { status, excerpt } => {
                format!("Downstream agent returned status {}: {}", status, excerpt)
            }
            Self::Internal(_) => "Internal server error".to_string(),
        }
    }

    /// Pair this error with the protocol family it should be rendered for
    pub fn for_family(self, family: ProtocolFamily) -> FamilyError {
        FamilyError {
            family,
            error: self,
        }
    }
}

/// Truncate a downstream body to at most [`BODY_EXCERPT_CHARS`] characters
pub fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(BODY_EXCERPT_CHARS) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

/// Inbound protocol family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolFamily {
    /// OpenAI-style chat completions API
    OpenAi,
    /// Ollama-style chat API
    Ollama,
}

impl ProtocolFamily {
    /// Infer the family from a request path (`/api/*` is Ollama)
    pub fn from_path(path: &str) -> Self {
        if path == "/api" || path.starts_with("/api/") {
            Self::Ollama
        } else {
            Self::OpenAi
        }
    }
}

/// OpenAI error body
#[derive(Debug, Serialize)]
pub struct OpenAiErrorResponse {
    pub error: OpenAiErrorBody,
}

/// OpenAI error details
#[derive(Debug, Serialize)]
pub struct OpenAiErrorBody {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: String,
    pub param: Option<String>,
    pub code: String,
}

/// An error bound to the protocol family it is rendered for
#[derive(Debug)]
pub struct FamilyError {
    pub family: ProtocolFamily,
    pub error: GatewayError,
}

impl IntoResponse for FamilyError {
    fn into_response(self) -> Response {
        let status = self.error.status_code();

        match &self.error {
            GatewayError::Validation { .. } => {
                tracing::debug!(status = %status, error = %self.error, "Rejecting request");
            }
            other => {
                tracing::error!(status = %status, error = %other, "Request failed");
            }
        }

        let message = self.error.client_message();
        match self.family {
            ProtocolFamily::OpenAi => {
                let body = OpenAiErrorResponse {
                    error: OpenAiErrorBody {
                        message,
                        error_type: self.error.error_type().to_string(),
                        param: None,
                        code: self.error.code().to_string(),
                    },
                };
                (status, Json(body)).into_response()
            }
            ProtocolFamily::Ollama => {
                let body = json!({
                    "error": message,
                    "code": self.error.code(),
                });
                (status, Json(body)).into_response()
            }
        }
    }
}

/// Result type alias for convenience
pub type GatewayResult<T> = Result<T, GatewayError>;
