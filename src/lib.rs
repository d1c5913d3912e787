//! Autopost: resilient group posting through Chrome DevTools Protocol
//!
//! Types a formatted post (and attaches media) into the composer of each
//! configured group, resolving the platform's volatile UI through ordered
//! fallback matchers and retrying failed groups on a fresh browser session.

pub mod error;
pub mod config;

pub mod cdp;
pub mod session;
pub mod input;
pub mod workflow;

// Re-exports
pub use error::{Error, Result, RunAbort};

/// Autopost library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
