//! Page context implementation
//!
//! Manages page lifecycle and operations.

use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::cdp::traits::{CdpClient, EvaluationResult, ScreenshotFormat};
use crate::session::element::query_elements;
use crate::session::matcher::Matcher;
use crate::session::traits::{ElementRef, LoadState, NavigationOptions, PageContext};
use crate::Error;

const LOAD_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Page context implementation
#[derive(Debug)]
pub struct PageContextImpl {
    id: String,
    cdp_client: Arc<dyn CdpClient>,
    is_active: AtomicBool,
}

impl PageContextImpl {
    /// Create a new page context
    pub fn new(cdp_client: Arc<dyn CdpClient>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            cdp_client,
            is_active: AtomicBool::new(true),
        }
    }

    fn ensure_active(&self) -> Result<(), Error> {
        if self.is_active() {
            Ok(())
        } else {
            Err(Error::session_closed(format!("page {}", self.id)))
        }
    }

    async fn wait_for_load_state(&self, state: LoadState, timeout: Duration) -> Result<(), Error> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            if let EvaluationResult::String(ready_state) = self
                .cdp_client
                .evaluate("document.readyState", false)
                .await?
            {
                if state.is_reached(&ready_state) {
                    return Ok(());
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(Error::timeout(format!("{:?} not reached within {:?}", state, timeout)));
            }
            tokio::time::sleep(LOAD_POLL_INTERVAL).await;
        }
    }

    async fn press_enter(&self) -> Result<(), Error> {
        for (event_type, text) in [("keyDown", "\r"), ("keyUp", "")] {
            self.cdp_client
                .call_method(
                    "Input.dispatchKeyEvent",
                    json!({
                        "type": event_type,
                        "key": "Enter",
                        "code": "Enter",
                        "windowsVirtualKeyCode": 13,
                        "text": text,
                    }),
                )
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl PageContext for PageContextImpl {
    fn id(&self) -> &str {
        &self.id
    }

    #[instrument(skip(self, options), fields(page = %self.id))]
    async fn navigate(&self, url: &str, options: NavigationOptions) -> Result<(), Error> {
        self.ensure_active()?;

        match tokio::time::timeout(options.timeout, self.cdp_client.navigate(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(Error::Navigation(reason))) => return Err(Error::Navigation(reason)),
            Ok(Err(e)) => return Err(Error::navigation(format!("{}: {}", url, e))),
            Err(_) => {
                return Err(Error::navigation(format!(
                    "{} did not respond within {:?}",
                    url, options.timeout
                )))
            }
        }

        self.wait_for_load_state(options.wait_until, options.load_timeout)
            .await
            .map_err(|e| Error::navigation(format!("{}: {}", url, e)))?;

        debug!("Loaded {}", url);
        Ok(())
    }

    async fn query_all(&self, matcher: &Matcher) -> Result<Vec<Arc<dyn ElementRef>>, Error> {
        self.ensure_active()?;
        query_elements(&self.cdp_client, matcher, None).await
    }

    async fn type_text(&self, text: &str, delay: Duration) -> Result<(), Error> {
        self.ensure_active()?;

        for ch in text.chars() {
            if ch == '\n' {
                self.press_enter().await?;
            } else {
                self.cdp_client
                    .call_method("Input.insertText", json!({ "text": ch.to_string() }))
                    .await?;
            }
            tokio::time::sleep(delay).await;
        }

        Ok(())
    }

    async fn screenshot(&self, full_page: bool) -> Result<Vec<u8>, Error> {
        self.ensure_active()?;
        self.cdp_client
            .screenshot(ScreenshotFormat::Png, full_page)
            .await
    }

    async fn close(&self) -> Result<(), Error> {
        if self.is_active.swap(false, Ordering::SeqCst) {
            self.cdp_client.close().await?;
        }
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.is_active.load(Ordering::SeqCst)
    }
}
