//! Configuration management for the gateway
//!
//! Configuration is loaded once from environment variables at startup and is
//! read-only for the lifetime of the process.

use anyhow::{bail, Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Default request body ceiling (1 MiB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,

    /// Downstream agent host
    pub downstream_host: String,
    /// Downstream agent port
    pub downstream_port: u16,
    /// Path of the downstream conversational endpoint
    pub downstream_chat_path: String,
    /// Optional bearer token sent to the downstream agent
    pub downstream_token: Option<String>,
    /// Upper bound for a single downstream call (in seconds)
    pub downstream_timeout_secs: u64,

    /// Model identifier exposed to clients
    pub model_name: String,
    /// Maximum accepted request body size (in bytes)
    pub max_body_bytes: usize,
    /// Session label used when the client supplies none
    pub default_session: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            downstream_host: "127.0.0.1".to_string(),
            downstream_port: 8000,
            downstream_chat_path: "/v1/chat".to_string(),
            downstream_token: None,
            downstream_timeout_secs: 120,
            model_name: "agent".to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            default_session: "default".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Missing keys fall back to the values of [`Config::default`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            host: lookup("GATEWAY_HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "GATEWAY_PORT", defaults.port)?,

            downstream_host: lookup("DOWNSTREAM_HOST").unwrap_or(defaults.downstream_host),
            downstream_port: parse_or(&lookup, "DOWNSTREAM_PORT", defaults.downstream_port)?,
            downstream_chat_path: lookup("DOWNSTREAM_CHAT_PATH")
                .map(|p| normalize_path(&p))
                .unwrap_or(defaults.downstream_chat_path),
            downstream_token: lookup("DOWNSTREAM_TOKEN").filter(|t| !t.trim().is_empty()),
            downstream_timeout_secs: parse_or(
                &lookup,
                "DOWNSTREAM_TIMEOUT_SECS",
                defaults.downstream_timeout_secs,
            )?,

            model_name: lookup("GATEWAY_MODEL_NAME")
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(defaults.model_name),
            max_body_bytes: parse_or(&lookup, "GATEWAY_MAX_BODY_BYTES", defaults.max_body_bytes)?,
            default_session: lookup("GATEWAY_DEFAULT_SESSION")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.default_session),
        };

        if config.max_body_bytes == 0 {
            bail!("GATEWAY_MAX_BODY_BYTES must be greater than zero");
        }
        if config.downstream_timeout_secs == 0 {
            bail!("DOWNSTREAM_TIMEOUT_SECS must be greater than zero");
        }

        Ok(config)
    }

    /// Base URL of the downstream agent, e.g. `http://127.0.0.1:8000`
    pub fn downstream_base_url(&self) -> String {
        format!("http://{}:{}", self.downstream_host, self.downstream_port)
    }

    /// Full URL of the downstream conversational endpoint
    pub fn downstream_chat_url(&self) -> String {
        format!("{}{}", self.downstream_base_url(), self.downstream_chat_path)
    }

    /// Downstream call timeout
    pub fn downstream_timeout(&self) -> Duration {
        Duration::from_secs(self.downstream_timeout_secs)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {}", key)),
        None => Ok(default),
    }
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}
