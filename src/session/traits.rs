//! Session management traits
//!
//! The posting workflow talks to the browser only through these interfaces,
//! so a scripted DOM (`session::mock`) can stand in for Chrome.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::input::Cookie;
use crate::session::matcher::Matcher;
use crate::Error;

/// Navigation options
#[derive(Debug, Clone)]
pub struct NavigationOptions {
    /// Ceiling for the navigation command itself
    pub timeout: Duration,
    /// Load state to wait for once the navigation committed
    pub wait_until: LoadState,
    /// Ceiling for reaching `wait_until`
    pub load_timeout: Duration,
}

impl Default for NavigationOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            wait_until: LoadState::DOMContentLoaded,
            load_timeout: Duration::from_secs(15),
        }
    }
}

/// Document load state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// `document.readyState` is `interactive` or later
    DOMContentLoaded,
    /// `document.readyState` is `complete`
    Load,
}

impl LoadState {
    /// Whether a `document.readyState` value satisfies this state
    pub fn is_reached(&self, ready_state: &str) -> bool {
        match self {
            LoadState::DOMContentLoaded => matches!(ready_state, "interactive" | "complete"),
            LoadState::Load => ready_state == "complete",
        }
    }
}

/// Starts isolated browser sessions
#[async_trait]
pub trait BrowserLauncher: Send + Sync + std::fmt::Debug {
    /// Attach to a browser and open a fresh isolated context in it
    async fn launch(&self) -> Result<Arc<dyn BrowserContext>, Error>;
}

/// Isolated browser context (own cookie jar)
#[async_trait]
pub trait BrowserContext: Send + Sync + std::fmt::Debug {
    /// Get context ID
    fn id(&self) -> &str;

    /// Install cookies into this context
    async fn add_cookies(&self, cookies: &[Cookie]) -> Result<(), Error>;

    /// Open a page in this context
    async fn new_page(&self) -> Result<Arc<dyn PageContext>, Error>;

    /// Close every page and dispose the context. Idempotent.
    async fn close(&self) -> Result<(), Error>;

    /// Check if context is still active
    fn is_active(&self) -> bool;
}

/// Page context
#[async_trait]
pub trait PageContext: Send + Sync + std::fmt::Debug {
    /// Get page ID
    fn id(&self) -> &str;

    /// Navigate and wait for `options.wait_until`
    async fn navigate(&self, url: &str, options: NavigationOptions) -> Result<(), Error>;

    /// All elements in the document matching `matcher`, in document order
    async fn query_all(&self, matcher: &Matcher) -> Result<Vec<Arc<dyn ElementRef>>, Error>;

    /// Type into the focused element, one character every `delay`
    async fn type_text(&self, text: &str, delay: Duration) -> Result<(), Error>;

    /// PNG screenshot
    async fn screenshot(&self, full_page: bool) -> Result<Vec<u8>, Error>;

    /// Close the page
    async fn close(&self) -> Result<(), Error>;

    /// Check if page is still active
    fn is_active(&self) -> bool;
}

/// Element reference
#[async_trait]
pub trait ElementRef: Send + Sync + std::fmt::Debug {
    /// Get element ID
    fn id(&self) -> &str;

    /// Descendants matching `matcher`, in document order
    async fn query_all(&self, matcher: &Matcher) -> Result<Vec<Arc<dyn ElementRef>>, Error>;

    /// Wait until the element is attached to the document
    async fn wait_for_attached(&self, timeout: Duration) -> Result<(), Error>;

    /// Get attribute value
    async fn get_attribute(&self, name: &str) -> Result<Option<String>, Error>;

    /// Whether the element renders a pointer cursor or has a click handler
    async fn is_pointer_interactive(&self) -> Result<bool, Error>;

    /// Click element
    async fn click(&self) -> Result<(), Error>;

    /// Hand a batch of files to a file input in one operation
    async fn set_input_files(&self, files: &[PathBuf]) -> Result<(), Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_state_reached() {
        assert!(LoadState::DOMContentLoaded.is_reached("interactive"));
        assert!(LoadState::DOMContentLoaded.is_reached("complete"));
        assert!(!LoadState::DOMContentLoaded.is_reached("loading"));
        assert!(!LoadState::Load.is_reached("interactive"));
        assert!(LoadState::Load.is_reached("complete"));
    }

    #[test]
    fn test_navigation_defaults() {
        let options = NavigationOptions::default();
        assert_eq!(options.timeout, Duration::from_secs(30));
        assert_eq!(options.load_timeout, Duration::from_secs(15));
        assert_eq!(options.wait_until, LoadState::DOMContentLoaded);
    }
}
