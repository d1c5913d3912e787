//! CDP browser control implementation
//!
//! Attaches to a Chrome started with `--remote-debugging-port` and drives it
//! through the browser-level target.

use super::client::CdpClientImpl;
use super::connection::CdpWebSocketConnection;
use super::traits::*;
use super::types::CookieParam;
use crate::Error;
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// CDP browser implementation
#[derive(Debug)]
pub struct CdpBrowserImpl {
    /// Browser endpoint (e.g., "ws://localhost:9222")
    endpoint: String,
    /// Connection to the browser target, opened on first use
    browser_connection: Mutex<Option<Arc<dyn CdpConnection>>>,
    /// Page connections (target_id -> client)
    clients: Mutex<HashMap<String, Arc<dyn CdpClient>>>,
}

impl CdpBrowserImpl {
    /// Create a new CDP browser controller
    ///
    /// # Arguments
    /// * `endpoint` - Browser endpoint (e.g., "ws://localhost:9222")
    pub fn new<S: Into<String>>(endpoint: S) -> Self {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        info!("Creating CDP browser controller for endpoint: {}", endpoint);
        Self {
            endpoint,
            browser_connection: Mutex::new(None),
            clients: Mutex::new(HashMap::new()),
        }
    }

    fn http_endpoint(&self) -> String {
        self.endpoint
            .replace("ws://", "http://")
            .replace("wss://", "https://")
    }

    /// WebSocket URL of a page target
    fn page_ws_url(&self, target_id: &str) -> String {
        format!("{}/devtools/page/{}", self.endpoint, target_id)
    }

    /// Discover the browser-level WebSocket URL via `/json/version`
    async fn browser_ws_url(&self) -> Result<String, Error> {
        let url = format!("{}/json/version", self.http_endpoint());
        debug!("Fetching browser version from {}", url);

        let version: serde_json::Value = reqwest::get(&url)
            .await
            .map_err(|e| {
                Error::internal(format!(
                    r#"Failed to connect to Chrome CDP endpoint at {}.
Please start Chrome with:
  Linux: google-chrome --remote-debugging-port=9222 --user-data-dir=/tmp/chrome-debug
  macOS: /Applications/Google\ Chrome.app/Contents/MacOS/Google\ Chrome --remote-debugging-port=9222 --user-data-dir=/tmp/chrome-debug
Original error: {}"#,
                    self.endpoint, e
                ))
            })?
            .json()
            .await
            .map_err(|e| Error::internal(format!("Failed to parse version: {}", e)))?;

        version
            .get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| Error::internal("No webSocketDebuggerUrl in /json/version"))
    }

    /// Send a command to the browser target
    async fn browser_call(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value, Error> {
        let connection = {
            let mut guard = self.browser_connection.lock().await;
            match guard.as_ref() {
                Some(connection) if connection.is_active() => Arc::clone(connection),
                _ => {
                    let ws_url = self.browser_ws_url().await?;
                    let connection: Arc<dyn CdpConnection> = CdpWebSocketConnection::connect(ws_url).await?;
                    *guard = Some(Arc::clone(&connection));
                    connection
                }
            }
        };

        connection
            .send_command(method, params)
            .await?
            .result
            .ok_or_else(|| Error::cdp(format!("No result for {}", method)))
    }
}

#[async_trait]
impl CdpBrowser for CdpBrowserImpl {
    async fn create_browser_context(&self) -> Result<String, Error> {
        let result = self
            .browser_call("Target.createBrowserContext", json!({ "disposeOnDetach": true }))
            .await?;

        let context_id = result
            .get("browserContextId")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::cdp("No browserContextId in response"))?;

        info!("Created browser context {}", context_id);
        Ok(context_id.to_string())
    }

    async fn dispose_browser_context(&self, context_id: &str) -> Result<(), Error> {
        info!("Disposing browser context {}", context_id);
        self.browser_call(
            "Target.disposeBrowserContext",
            json!({ "browserContextId": context_id }),
        )
        .await?;
        Ok(())
    }

    async fn set_cookies(&self, context_id: &str, cookies: &[CookieParam]) -> Result<(), Error> {
        debug!("Setting {} cookies in context {}", cookies.len(), context_id);
        self.browser_call(
            "Storage.setCookies",
            json!({ "cookies": cookies, "browserContextId": context_id }),
        )
        .await?;
        Ok(())
    }

    async fn create_target(&self, url: &str, context_id: Option<&str>) -> Result<String, Error> {
        let mut params = json!({ "url": url });
        if let Some(context_id) = context_id {
            params["browserContextId"] = json!(context_id);
        }

        let result = self.browser_call("Target.createTarget", params).await?;
        let target_id = result
            .get("targetId")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::cdp("No targetId in response"))?;

        debug!("Created target {} at {}", target_id, url);
        Ok(self.page_ws_url(target_id))
    }

    async fn create_client(&self, target_url: &str) -> Result<Arc<dyn CdpClient>, Error> {
        debug!("Creating CDP client for target: {}", target_url);

        let connection = CdpWebSocketConnection::connect(target_url).await?;
        let client: Arc<dyn CdpClient> = Arc::new(CdpClientImpl::new(connection));

        client.enable_domain("Page").await?;
        client.enable_domain("Runtime").await?;
        client.enable_domain("DOM").await?;

        let target_id = target_url.rsplit('/').next().unwrap_or("unknown").to_string();
        self.clients.lock().await.insert(target_id, Arc::clone(&client));

        Ok(client)
    }

    async fn close(&self) -> Result<(), Error> {
        let clients: Vec<(String, Arc<dyn CdpClient>)> = self.clients.lock().await.drain().collect();

        for (target_id, client) in clients {
            if let Err(e) = client.close().await {
                warn!("Failed to close connection to target {}: {}", target_id, e);
            }
        }

        if let Some(connection) = self.browser_connection.lock().await.take() {
            connection.close().await?;
        }

        info!("Closed CDP connections to {}", self.endpoint);
        Ok(())
    }
}
