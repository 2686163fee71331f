//! Downstream agent integration module
//!
//! Provides the client the gateway uses to reach the conversational agent.

pub mod client;
pub mod models;

pub use client::{AgentBackend, AgentClient};
pub use models::*;
