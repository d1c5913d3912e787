//! Element reference implementation
//!
//! Elements are addressed through the `data-autopost-ref` tag written by
//! `scripts::query_all`.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::cdp::traits::{CdpClient, EvaluationResult};
use crate::session::matcher::Matcher;
use crate::session::scripts;
use crate::session::traits::ElementRef;
use crate::Error;

const ATTACH_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Element box in CSS pixels
#[derive(Debug, Clone, Copy, Deserialize)]
struct BoundingBox {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

/// Element reference implementation
#[derive(Debug)]
pub struct ElementRefImpl {
    element_ref: String,
    cdp_client: Arc<dyn CdpClient>,
}

impl ElementRefImpl {
    /// Create a new element reference
    pub fn new(element_ref: String, cdp_client: Arc<dyn CdpClient>) -> Self {
        Self {
            element_ref,
            cdp_client,
        }
    }

    async fn bounding_box(&self) -> Result<BoundingBox, Error> {
        match self
            .cdp_client
            .evaluate(&scripts::scroll_and_measure(&self.element_ref), false)
            .await?
        {
            EvaluationResult::String(raw) => serde_json::from_str(&raw).map_err(Error::from),
            _ => Err(Error::script_execution_failed(format!(
                "element {} is detached",
                self.element_ref
            ))),
        }
    }

    async fn is_attached(&self) -> Result<bool, Error> {
        Ok(matches!(
            self.cdp_client
                .evaluate(&scripts::is_attached(&self.element_ref), false)
                .await?,
            EvaluationResult::Bool(true)
        ))
    }
}

/// Tag and wrap every match of `matcher` under `scope`
pub(crate) async fn query_elements(
    cdp_client: &Arc<dyn CdpClient>,
    matcher: &Matcher,
    scope: Option<&str>,
) -> Result<Vec<Arc<dyn ElementRef>>, Error> {
    let refs: Vec<String> = match cdp_client
        .evaluate(&scripts::query_all(matcher, scope), false)
        .await?
    {
        EvaluationResult::String(raw) => serde_json::from_str(&raw)?,
        EvaluationResult::Null => {
            return Err(Error::script_execution_failed(format!(
                "query scope {} is detached",
                scope.unwrap_or("document")
            )))
        }
        other => {
            return Err(Error::script_execution_failed(format!(
                "unexpected query result: {:?}",
                other
            )))
        }
    };

    debug!("{} matched {} element(s)", matcher, refs.len());

    Ok(refs
        .into_iter()
        .map(|element_ref| {
            Arc::new(ElementRefImpl::new(element_ref, Arc::clone(cdp_client))) as Arc<dyn ElementRef>
        })
        .collect())
}

#[async_trait]
impl ElementRef for ElementRefImpl {
    fn id(&self) -> &str {
        &self.element_ref
    }

    async fn query_all(&self, matcher: &Matcher) -> Result<Vec<Arc<dyn ElementRef>>, Error> {
        query_elements(&self.cdp_client, matcher, Some(&self.element_ref)).await
    }

    async fn wait_for_attached(&self, timeout: Duration) -> Result<(), Error> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            if self.is_attached().await? {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(Error::timeout(format!(
                    "element {} not attached within {:?}",
                    self.element_ref, timeout
                )));
            }
            tokio::time::sleep(ATTACH_POLL_INTERVAL).await;
        }
    }

    async fn get_attribute(&self, name: &str) -> Result<Option<String>, Error> {
        match self
            .cdp_client
            .evaluate(&scripts::get_attribute(&self.element_ref, name), false)
            .await?
        {
            EvaluationResult::String(value) => Ok(Some(value)),
            _ => Ok(None),
        }
    }

    async fn is_pointer_interactive(&self) -> Result<bool, Error> {
        Ok(matches!(
            self.cdp_client
                .evaluate(&scripts::is_pointer_interactive(&self.element_ref), false)
                .await?,
            EvaluationResult::Bool(true)
        ))
    }

    async fn click(&self) -> Result<(), Error> {
        let bbox = self.bounding_box().await?;
        if bbox.width <= 0.0 || bbox.height <= 0.0 {
            return Err(Error::script_execution_failed(format!(
                "element {} is not visible",
                self.element_ref
            )));
        }

        // Click at center of element
        let x = bbox.x + bbox.width / 2.0;
        let y = bbox.y + bbox.height / 2.0;

        for event_type in ["mouseMoved", "mousePressed", "mouseReleased"] {
            self.cdp_client
                .call_method(
                    "Input.dispatchMouseEvent",
                    json!({
                        "type": event_type,
                        "x": x,
                        "y": y,
                        "button": "left",
                        "clickCount": 1,
                    }),
                )
                .await?;
        }

        Ok(())
    }

    async fn set_input_files(&self, files: &[PathBuf]) -> Result<(), Error> {
        let object_id = self
            .cdp_client
            .evaluate_handle(&scripts::element_expr(&self.element_ref))
            .await?
            .ok_or_else(|| {
                Error::script_execution_failed(format!("element {} is detached", self.element_ref))
            })?;

        let files: Vec<String> = files
            .iter()
            .map(|path| path.to_string_lossy().into_owned())
            .collect();

        self.cdp_client
            .call_method(
                "DOM.setFileInputFiles",
                json!({
                    "files": files,
                    "objectId": object_id,
                }),
            )
            .await?;

        Ok(())
    }
}
