//! Mock infrastructure for testing external services
//!
//! This module provides mock servers for external dependencies:
//! - Downstream conversational agent


pub use agent::*;
