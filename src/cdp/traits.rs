//! CDP (Chrome DevTools Protocol) layer traits
//!
//! This module defines the abstract interfaces for CDP communication.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::types::CookieParam;

/// CDP response representation
#[derive(Debug, Clone)]
pub struct CdpResponse {
    /// Response ID (matches request ID)
    pub id: u64,
    /// Response result
    pub result: Option<Value>,
    /// Error if any
    pub error: Option<CdpError>,
}

/// CDP error representation
#[derive(Debug, Clone)]
pub struct CdpError {
    /// Error code
    pub code: i32,
    /// Error message
    pub message: String,
    /// Additional error data
    pub data: Option<Value>,
}

/// CDP connection trait
///
/// Represents a WebSocket connection to a browser or page target.
#[async_trait]
pub trait CdpConnection: Send + Sync + std::fmt::Debug {
    /// Send a CDP command and wait for response
    async fn send_command(&self, method: &str, params: Value) -> Result<CdpResponse, crate::Error>;

    /// Close the connection
    async fn close(&self) -> Result<(), crate::Error>;

    /// Check if connection is active
    fn is_active(&self) -> bool;
}

/// CDP client trait
///
/// Typed methods over one page target.
#[async_trait]
pub trait CdpClient: Send + Sync + std::fmt::Debug {
    /// Call a raw CDP method (returns JSON Value)
    async fn call_method(&self, method: &str, params: Value) -> Result<Value, crate::Error>;

    /// Navigate to a URL; fails when the browser reports a network error
    async fn navigate(&self, url: &str) -> Result<NavigationResult, crate::Error>;

    /// Evaluate JavaScript in the page and return the value
    async fn evaluate(&self, script: &str, await_promise: bool) -> Result<EvaluationResult, crate::Error>;

    /// Evaluate JavaScript and return a remote object id, `None` for null/undefined
    async fn evaluate_handle(&self, script: &str) -> Result<Option<String>, crate::Error>;

    /// Capture a screenshot; `full_page` captures beyond the viewport
    async fn screenshot(&self, format: ScreenshotFormat, full_page: bool) -> Result<Vec<u8>, crate::Error>;

    /// Enable a domain
    async fn enable_domain(&self, domain: &str) -> Result<(), crate::Error>;

    /// Close the underlying connection
    async fn close(&self) -> Result<(), crate::Error>;
}

/// Navigation result
#[derive(Debug, Clone)]
pub struct NavigationResult {
    /// Loader ID
    pub loader_id: Option<String>,
    /// Requested URL
    pub url: String,
}

/// JavaScript evaluation result
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationResult {
    /// String value
    String(String),
    /// Number value
    Number(f64),
    /// Boolean value
    Bool(bool),
    /// Null value
    Null,
    /// Object/Array (as JSON)
    Object(Value),
}

/// Screenshot format
#[derive(Debug, Clone, Copy)]
pub enum ScreenshotFormat {
    /// PNG format
    Png,
    /// JPEG format
    Jpeg(u8), // quality 0-100
}

/// CDP browser trait
///
/// Browser-level operations: isolated contexts, targets and cookies.
#[async_trait]
pub trait CdpBrowser: Send + Sync + std::fmt::Debug {
    /// Create an isolated browser context, returning its id
    async fn create_browser_context(&self) -> Result<String, crate::Error>;

    /// Dispose a browser context and every page in it
    async fn dispose_browser_context(&self, context_id: &str) -> Result<(), crate::Error>;

    /// Set cookies for a browser context
    async fn set_cookies(&self, context_id: &str, cookies: &[CookieParam]) -> Result<(), crate::Error>;

    /// Create a page target, returning its WebSocket URL
    async fn create_target(&self, url: &str, context_id: Option<&str>) -> Result<String, crate::Error>;

    /// Create a CDP client for a page target
    async fn create_client(&self, target_url: &str) -> Result<Arc<dyn CdpClient>, crate::Error>;

    /// Close every connection this browser opened
    async fn close(&self) -> Result<(), crate::Error>;
}
