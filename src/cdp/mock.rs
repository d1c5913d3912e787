//! Mock CDP implementation for testing
//!
//! Records every command and answers from canned responses, so the session
//! layer can be tested without a browser.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::cdp::traits::*;
use crate::cdp::types::CookieParam;
use crate::Error;

/// One recorded CDP call
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: String,
    pub params: serde_json::Value,
}

/// Mock CDP client
#[derive(Debug, Default)]
pub struct MockCdpClient {
    calls: Mutex<Vec<RecordedCall>>,
    responses: Mutex<HashMap<String, serde_json::Value>>,
    evaluations: Mutex<VecDeque<EvaluationResult>>,
    handles: Mutex<VecDeque<Option<String>>>,
    closed: AtomicBool,
}

impl MockCdpClient {
    /// Create a new mock CDP client
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method` with `result` from now on
    pub fn respond(&self, method: &str, result: serde_json::Value) {
        self.responses
            .lock()
            .unwrap()
            .insert(method.to_string(), result);
    }

    /// Queue the result of the next `evaluate` call
    pub fn push_evaluation(&self, result: EvaluationResult) {
        self.evaluations.lock().unwrap().push_back(result);
    }

    /// Queue the result of the next `evaluate_handle` call
    pub fn push_handle(&self, object_id: Option<&str>) {
        self.handles
            .lock()
            .unwrap()
            .push_back(object_id.map(str::to_string));
    }

    /// Every call made so far, oldest first
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls of one method
    pub fn calls_to(&self, method: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.method == method)
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn record(&self, method: &str, params: serde_json::Value) {
        self.calls.lock().unwrap().push(RecordedCall {
            method: method.to_string(),
            params,
        });
    }
}

#[async_trait]
impl CdpClient for MockCdpClient {
    async fn call_method(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value, Error> {
        if self.is_closed() {
            return Err(Error::cdp("Connection is closed"));
        }
        self.record(method, params);
        Ok(self
            .responses
            .lock()
            .unwrap()
            .get(method)
            .cloned()
            .unwrap_or_else(|| serde_json::json!({})))
    }

    async fn navigate(&self, url: &str) -> Result<NavigationResult, Error> {
        self.call_method("Page.navigate", serde_json::json!({ "url": url }))
            .await?;
        Ok(NavigationResult {
            loader_id: Some(uuid::Uuid::new_v4().to_string()),
            url: url.to_string(),
        })
    }

    async fn evaluate(&self, script: &str, _await_promise: bool) -> Result<EvaluationResult, Error> {
        self.record("Runtime.evaluate", serde_json::json!({ "expression": script }));

        if let Some(result) = self.evaluations.lock().unwrap().pop_front() {
            return Ok(result);
        }

        if script.contains("document.readyState") {
            Ok(EvaluationResult::String("complete".to_string()))
        } else {
            Ok(EvaluationResult::Null)
        }
    }

    async fn evaluate_handle(&self, script: &str) -> Result<Option<String>, Error> {
        self.record("Runtime.evaluate", serde_json::json!({ "expression": script, "returnByValue": false }));
        Ok(self.handles.lock().unwrap().pop_front().flatten())
    }

    async fn screenshot(&self, format: ScreenshotFormat, full_page: bool) -> Result<Vec<u8>, Error> {
        self.call_method(
            "Page.captureScreenshot",
            serde_json::json!({ "captureBeyondViewport": full_page }),
        )
        .await?;

        // Minimal image signatures
        Ok(match format {
            ScreenshotFormat::Png => vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A],
            ScreenshotFormat::Jpeg(_) => vec![0xFF, 0xD8, 0xFF, 0xE0],
        })
    }

    async fn enable_domain(&self, domain: &str) -> Result<(), Error> {
        self.call_method(&format!("{}.enable", domain), serde_json::json!({}))
            .await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), Error> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Mock CDP browser
///
/// Every target shares one `MockCdpClient` so tests can inspect it.
#[derive(Debug)]
pub struct MockCdpBrowser {
    client: Arc<MockCdpClient>,
    next_context: AtomicU64,
    contexts: Mutex<Vec<String>>,
    disposed: Mutex<Vec<String>>,
    cookies: Mutex<Vec<(String, CookieParam)>>,
    is_active: AtomicBool,
    context_fails: bool,
}

impl MockCdpBrowser {
    /// Create a new mock CDP browser
    pub fn new() -> Self {
        Self {
            client: Arc::new(MockCdpClient::new()),
            next_context: AtomicU64::new(1),
            contexts: Mutex::new(Vec::new()),
            disposed: Mutex::new(Vec::new()),
            cookies: Mutex::new(Vec::new()),
            is_active: AtomicBool::new(true),
            context_fails: false,
        }
    }

    /// `create_browser_context` always fails
    pub fn failing_contexts(mut self) -> Self {
        self.context_fails = true;
        self
    }

    pub fn client(&self) -> Arc<MockCdpClient> {
        Arc::clone(&self.client)
    }

    pub fn contexts(&self) -> Vec<String> {
        self.contexts.lock().unwrap().clone()
    }

    pub fn disposed(&self) -> Vec<String> {
        self.disposed.lock().unwrap().clone()
    }

    /// Cookies set so far with the context they were set in
    pub fn cookies(&self) -> Vec<(String, CookieParam)> {
        self.cookies.lock().unwrap().clone()
    }

    pub fn is_active(&self) -> bool {
        self.is_active.load(Ordering::SeqCst)
    }

    fn ensure_active(&self) -> Result<(), Error> {
        if self.is_active() {
            Ok(())
        } else {
            Err(Error::cdp("Browser is closed"))
        }
    }
}

impl Default for MockCdpBrowser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CdpBrowser for MockCdpBrowser {
    async fn create_browser_context(&self) -> Result<String, Error> {
        self.ensure_active()?;
        if self.context_fails {
            return Err(Error::cdp("Target.createBrowserContext failed"));
        }
        let id = format!("context-{}", self.next_context.fetch_add(1, Ordering::SeqCst));
        self.contexts.lock().unwrap().push(id.clone());
        Ok(id)
    }

    async fn dispose_browser_context(&self, context_id: &str) -> Result<(), Error> {
        self.ensure_active()?;
        self.disposed.lock().unwrap().push(context_id.to_string());
        Ok(())
    }

    async fn set_cookies(&self, context_id: &str, cookies: &[CookieParam]) -> Result<(), Error> {
        self.ensure_active()?;
        let mut stored = self.cookies.lock().unwrap();
        for cookie in cookies {
            stored.push((context_id.to_string(), cookie.clone()));
        }
        Ok(())
    }

    async fn create_target(&self, _url: &str, _context_id: Option<&str>) -> Result<String, Error> {
        self.ensure_active()?;
        Ok(format!(
            "ws://localhost:9222/devtools/page/{}",
            uuid::Uuid::new_v4()
        ))
    }

    async fn create_client(&self, _target_url: &str) -> Result<Arc<dyn CdpClient>, Error> {
        self.ensure_active()?;
        Ok(self.client.clone())
    }

    async fn close(&self) -> Result<(), Error> {
        self.is_active.store(false, Ordering::SeqCst);
        Ok(())
    }
}
