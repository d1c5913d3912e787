//! # Chrome DevTools Protocol (CDP) layer
//!
//! WebSocket plumbing between Autopost and a Chrome/Chromium started with
//! remote debugging.
//!
//! ## Module structure
//! - `traits`: core CDP trait definitions
//! - `types`: wire structures
//! - `connection`: WebSocket connection with request/response routing
//! - `client`: typed page-level commands
//! - `browser`: browser contexts, targets and cookies
//! - `mock`: recording mock for tests
//!
//! ## Example
//! ```rust,no_run
//! use autopost::cdp::{CdpBrowser, CdpBrowserImpl};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let browser = CdpBrowserImpl::new("ws://localhost:9222");
//! let context_id = browser.create_browser_context().await?;
//! let target = browser.create_target("about:blank", Some(&context_id)).await?;
//! let client = browser.create_client(&target).await?;
//!
//! let result = client.navigate("https://example.com").await?;
//! println!("Navigated to: {}", result.url);
//! # Ok(())
//! # }
//! ```

pub mod traits;
pub mod types;
pub mod connection;
pub mod client;
pub mod browser;
pub mod mock;


pub use traits::{
    CdpConnection, CdpClient, CdpBrowser, CdpResponse, CdpError,
    NavigationResult, EvaluationResult, ScreenshotFormat,
};
pub use types::CookieParam;

// Re-export implementation structs
pub use connection::CdpWebSocketConnection;
pub use client::CdpClientImpl;
pub use browser::CdpBrowserImpl;

pub use mock::{MockCdpClient, MockCdpBrowser};
