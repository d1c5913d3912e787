//! CDP client implementation
//!
//! This module provides a high-level CDP client with typed methods for the
//! page-level commands the session layer needs.

use super::traits::*;
use super::types::*;
use crate::Error;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::sync::Arc;
use tracing::{debug, info};

/// CDP client implementation
#[derive(Debug, Clone)]
pub struct CdpClientImpl {
    /// Underlying CDP connection
    connection: Arc<dyn CdpConnection>,
}

impl CdpClientImpl {
    /// Create a new CDP client
    ///
    /// # Arguments
    /// * `connection` - CDP connection instance
    pub fn new(connection: Arc<dyn CdpConnection>) -> Self {
        Self { connection }
    }

    /// Parse remote object value to evaluation result
    fn parse_remote_object(obj: &RemoteObject) -> EvaluationResult {
        match obj.r#type.as_str() {
            "string" => EvaluationResult::String(
                obj.value
                    .as_ref()
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string(),
            ),
            "number" => EvaluationResult::Number(
                obj.value.as_ref().and_then(|v| v.as_f64()).unwrap_or(0.0),
            ),
            "boolean" => EvaluationResult::Bool(
                obj.value.as_ref().and_then(|v| v.as_bool()).unwrap_or(false),
            ),
            "object" if obj.subtype.as_deref() == Some("null") => EvaluationResult::Null,
            "object" => EvaluationResult::Object(obj.value.clone().unwrap_or(serde_json::Value::Null)),
            _ => EvaluationResult::Null,
        }
    }

    async fn run_evaluate(&self, script: &str, await_promise: bool, by_value: bool) -> Result<RemoteObject, Error> {
        let params = EvaluateParams {
            expression: script.to_string(),
            await_promise: Some(await_promise),
            return_by_value: Some(by_value),
        };

        let result = self
            .call_method("Runtime.evaluate", serde_json::to_value(params)?)
            .await?;

        let response: EvaluateResponse = serde_json::from_value(result)
            .map_err(|e| Error::cdp(format!("Failed to parse EvaluateResponse: {}", e)))?;

        if let Some(exception) = response.exception_details {
            return Err(Error::script_execution_failed(exception.message()));
        }

        Ok(response.result)
    }
}

#[async_trait]
impl CdpClient for CdpClientImpl {
    async fn call_method(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value, Error> {
        debug!("Calling CDP method: {}", method);

        let response = self.connection.send_command(method, params).await?;

        response.result.ok_or_else(|| Error::cdp("No result in response"))
    }

    async fn navigate(&self, url: &str) -> Result<NavigationResult, Error> {
        info!("Navigating to {}", url);

        let params = NavigateParams { url: url.to_string() };
        let result = self
            .call_method("Page.navigate", serde_json::to_value(params)?)
            .await?;

        let response: NavigateResponse = serde_json::from_value(result).unwrap_or_default();
        if let Some(error_text) = response.error_text {
            return Err(Error::navigation(format!("{}: {}", url, error_text)));
        }

        Ok(NavigationResult {
            loader_id: response.loader_id,
            url: url.to_string(),
        })
    }

    async fn evaluate(&self, script: &str, await_promise: bool) -> Result<EvaluationResult, Error> {
        let remote = self.run_evaluate(script, await_promise, true).await?;
        Ok(Self::parse_remote_object(&remote))
    }

    async fn evaluate_handle(&self, script: &str) -> Result<Option<String>, Error> {
        let remote = self.run_evaluate(script, false, false).await?;
        Ok(remote.object_id)
    }

    async fn screenshot(&self, format: ScreenshotFormat, full_page: bool) -> Result<Vec<u8>, Error> {
        let (format, quality) = match format {
            ScreenshotFormat::Png => ("png".to_string(), None),
            ScreenshotFormat::Jpeg(q) => ("jpeg".to_string(), Some(q)),
        };

        let params = CaptureScreenshotParams {
            format,
            quality,
            capture_beyond_viewport: full_page,
        };

        let result = self
            .call_method("Page.captureScreenshot", serde_json::to_value(params)?)
            .await?;

        let data = result
            .get("data")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::cdp("No data in screenshot result"))?;

        BASE64
            .decode(data)
            .map_err(|e| Error::cdp(format!("Failed to decode screenshot: {}", e)))
    }

    async fn enable_domain(&self, domain: &str) -> Result<(), Error> {
        self.call_method(&format!("{}.enable", domain), serde_json::json!({}))
            .await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), Error> {
        self.connection.close().await
    }
}
