//! # Session layer
//!
//! Browser contexts, pages and elements behind async traits, so the posting
//! workflow runs the same against Chrome and against a scripted DOM.
//!
//! ## Core concepts
//! - **BrowserLauncher**: opens an isolated browser context per session
//! - **BrowserContext**: own cookie jar, owns its pages
//! - **PageContext**: navigation, element queries, typing, screenshots
//! - **ElementRef**: scoped queries, clicks, attributes, file inputs
//! - **Matcher**: the structured descriptor every lookup goes through
//!
//! ## Module structure
//! - `traits`: core trait definitions
//! - `matcher`: element matchers
//! - `scripts`: in-page JavaScript behind the CDP implementation
//! - `manager`: single live session with reopen
//! - `browser`, `page`, `element`: CDP implementations
//! - `mock`: scripted DOM for tests
//!
//! ## Example
//! ```rust,no_run
//! use autopost::session::{CdpLauncher, Matcher, NavigationOptions, SessionManager};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut sessions = SessionManager::new(
//!     Arc::new(CdpLauncher::new("ws://localhost:9222")),
//!     Vec::new(),
//!     "https://www.facebook.com".to_string(),
//!     NavigationOptions::default(),
//! );
//!
//! let page = sessions.open().await?;
//! let dialogs = page.query_all(&Matcher::css(r#"div[role="dialog"]"#)).await?;
//! println!("{} dialogs open", dialogs.len());
//! sessions.close().await;
//! # Ok(())
//! # }
//! ```

pub mod traits;
pub mod matcher;
pub mod scripts;
pub mod manager;
pub mod browser;
pub mod page;
pub mod element;
pub mod mock;


pub use traits::{
    BrowserLauncher, BrowserContext, PageContext, ElementRef,
    NavigationOptions, LoadState,
};
pub use matcher::Matcher;
pub use manager::{SessionManager, SessionHandle};

// Re-export implementation structs
pub use browser::{CdpLauncher, BrowserContextImpl};
pub use page::PageContextImpl;
pub use element::ElementRefImpl;

pub use mock::{MockLauncher, MockDom, MockNode, MockEvent};
