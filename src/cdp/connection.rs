//! CDP WebSocket connection implementation
//!
//! One connection per target. Writes go through a locked sink; a spawned
//! reader task routes responses back to the waiting command by id.

use super::traits::{CdpConnection, CdpError as CdpErrorResponse, CdpResponse};
use super::types::*;
use crate::Error;
use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{oneshot, Mutex};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type PendingMap = Arc<Mutex<HashMap<u64, PendingCommand>>>;

/// CDP timeout configuration
#[derive(Debug, Clone)]
struct CdpTimeoutConfig {
    /// Default timeout for most commands (seconds)
    default_timeout_secs: u64,
    /// Timeout for screenshot commands (seconds)
    screenshot_timeout_secs: u64,
    /// Timeout for page navigation commands (seconds)
    navigation_timeout_secs: u64,
    /// Timeout for file uploads (seconds)
    upload_timeout_secs: u64,
}

impl Default for CdpTimeoutConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: 30,
            screenshot_timeout_secs: 90,
            navigation_timeout_secs: 60,
            upload_timeout_secs: 120,
        }
    }
}

impl CdpTimeoutConfig {
    /// Get timeout duration for a specific command method
    fn timeout_for(&self, method: &str) -> Duration {
        let secs = match method {
            "Page.captureScreenshot" => self.screenshot_timeout_secs,
            "Page.navigate" => self.navigation_timeout_secs,
            "DOM.setFileInputFiles" => self.upload_timeout_secs,
            _ => self.default_timeout_secs,
        };
        Duration::from_secs(secs)
    }
}

/// Pending command response
#[derive(Debug)]
struct PendingCommand {
    /// Response channel sender
    sender: oneshot::Sender<CdpResponse>,
    /// Command method (for logging)
    method: String,
}

/// CDP WebSocket connection implementation
#[derive(Debug)]
pub struct CdpWebSocketConnection {
    /// WebSocket URL
    url: String,
    /// Write half of the socket
    sink: Mutex<SplitSink<WsStream, Message>>,
    /// Next command ID
    next_id: AtomicU64,
    /// Pending commands (ID -> response sender)
    pending: PendingMap,
    /// Cleared by `close` or when the reader sees the socket end
    is_active: Arc<AtomicBool>,
    /// Timeout configuration
    timeout_config: CdpTimeoutConfig,
}

impl CdpWebSocketConnection {
    /// Connect to a CDP WebSocket
    ///
    /// # Arguments
    /// * `url` - WebSocket URL (e.g., "ws://localhost:9222/devtools/page/ABC123")
    pub async fn connect<S: Into<String>>(url: S) -> Result<Arc<Self>, Error> {
        let url = url.into();
        info!("Connecting to CDP WebSocket: {}", url);

        let (ws_stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| Error::websocket(format!("Failed to connect to {}: {}", url, e)))?;
        let (sink, stream) = ws_stream.split();

        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let is_active = Arc::new(AtomicBool::new(true));

        tokio::spawn(Self::read_loop(
            stream,
            Arc::clone(&pending),
            Arc::clone(&is_active),
        ));

        Ok(Arc::new(Self {
            url,
            sink: Mutex::new(sink),
            next_id: AtomicU64::new(1),
            pending,
            is_active,
            timeout_config: CdpTimeoutConfig::default(),
        }))
    }

    /// Route every incoming frame until the socket closes
    async fn read_loop(mut stream: SplitStream<WsStream>, pending: PendingMap, is_active: Arc<AtomicBool>) {
        while let Some(message) = stream.next().await {
            match message {
                Ok(Message::Text(text)) => Self::dispatch(&text, &pending).await,
                Ok(Message::Close(_)) => {
                    debug!("WebSocket close frame received");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("WebSocket read error: {}", e);
                    break;
                }
            }
        }

        is_active.store(false, Ordering::SeqCst);
        // Dropping the senders fails every waiter instead of leaving it to time out
        pending.lock().await.clear();
        debug!("CDP reader exited");
    }

    async fn dispatch(text: &str, pending: &PendingMap) {
        if let Ok(response) = serde_json::from_str::<CdpRpcResponse>(text) {
            let waiter = pending.lock().await.remove(&response.id);
            match waiter {
                Some(command) => {
                    debug!("Response for command {} ({})", response.id, command.method);
                    let _ = command.sender.send(CdpResponse {
                        id: response.id,
                        result: Some(response.result),
                        error: response.error.map(|e| CdpErrorResponse {
                            code: e.code,
                            message: e.message,
                            data: e.data,
                        }),
                    });
                }
                None => warn!("Received response for unknown command ID: {}", response.id),
            }
            return;
        }

        match serde_json::from_str::<CdpNotification>(text) {
            Ok(event) => debug!("Ignoring event: {}", event.method),
            Err(_) => warn!("Unknown message format: {}", text),
        }
    }
}

#[async_trait]
impl CdpConnection for CdpWebSocketConnection {
    async fn send_command(&self, method: &str, params: serde_json::Value) -> Result<CdpResponse, Error> {
        if !self.is_active.load(Ordering::SeqCst) {
            return Err(Error::websocket(format!("Connection to {} is not active", self.url)));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = CdpRequest {
            id,
            method: method.to_string(),
            params: if params.is_null() { None } else { Some(params) },
        };
        let json = serde_json::to_string(&request)?;

        let (sender, receiver) = oneshot::channel();
        self.pending.lock().await.insert(
            id,
            PendingCommand {
                sender,
                method: method.to_string(),
            },
        );

        debug!("Sending CDP command {}: {}", id, method);
        let sent = self.sink.lock().await.send(Message::Text(json)).await;
        if let Err(e) = sent {
            self.pending.lock().await.remove(&id);
            return Err(Error::websocket(format!("Failed to send {}: {}", method, e)));
        }

        let timeout_duration = self.timeout_config.timeout_for(method);
        match tokio::time::timeout(timeout_duration, receiver).await {
            Ok(Ok(response)) => {
                if let Some(error) = &response.error {
                    return Err(Error::cdp(format!(
                        "{} failed: {} (code: {})",
                        method, error.message, error.code
                    )));
                }
                Ok(response)
            }
            Ok(Err(_)) => Err(Error::websocket(format!(
                "Connection closed while waiting for {} ({})",
                method, id
            ))),
            Err(_) => {
                self.pending.lock().await.remove(&id);
                Err(Error::timeout(format!(
                    "Command {} ({}) timed out after {:?}",
                    method, id, timeout_duration
                )))
            }
        }
    }

    async fn close(&self) -> Result<(), Error> {
        if !self.is_active.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        info!("Closing CDP WebSocket connection to {}", self.url);
        self.sink
            .lock()
            .await
            .close()
            .await
            .map_err(|e| Error::websocket(format!("Failed to close WebSocket: {}", e)))
    }

    fn is_active(&self) -> bool {
        self.is_active.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeouts_by_method() {
        let config = CdpTimeoutConfig::default();

        assert_eq!(config.timeout_for("Page.captureScreenshot"), Duration::from_secs(90));
        assert_eq!(config.timeout_for("Page.navigate"), Duration::from_secs(60));
        assert_eq!(config.timeout_for("DOM.setFileInputFiles"), Duration::from_secs(120));
        assert_eq!(config.timeout_for("Runtime.evaluate"), Duration::from_secs(30));
        assert_eq!(config.timeout_for("Page.reload"), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_dispatch_routes_response_to_waiter() {
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let (sender, receiver) = oneshot::channel();
        pending.lock().await.insert(
            7,
            PendingCommand {
                sender,
                method: "Runtime.evaluate".to_string(),
            },
        );

        CdpWebSocketConnection::dispatch(r#"{"id":7,"result":{"ok":true}}"#, &pending).await;

        let response = receiver.await.unwrap();
        assert_eq!(response.id, 7);
        assert_eq!(response.result.unwrap()["ok"], true);
        assert!(pending.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_carries_protocol_error() {
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let (sender, receiver) = oneshot::channel();
        pending.lock().await.insert(
            3,
            PendingCommand {
                sender,
                method: "DOM.setFileInputFiles".to_string(),
            },
        );

        CdpWebSocketConnection::dispatch(
            r#"{"id":3,"error":{"code":-32000,"message":"Node is not a file input element"}}"#,
            &pending,
        )
        .await;

        let response = receiver.await.unwrap();
        let error = response.error.unwrap();
        assert_eq!(error.code, -32000);
        assert!(error.message.contains("file input"));
    }
}
