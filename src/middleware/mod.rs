//! Middleware module
//!
//! Contains Tower middleware for preflight handling and panic containment.

pub mod preflight;
pub mod recover;

pub use preflight::handle_preflight;
pub use recover::catch_panics;
