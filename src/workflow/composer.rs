//! Composer lookup
//!
//! Opening the composer can surface several dialog overlays at once, the
//! messaging pop-up among them. The composer is the first overlay whose
//! label does not name the messaging surface.

use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::config::UiText;
use crate::session::{ElementRef, Matcher, NavigationOptions, PageContext};
use crate::workflow::model::GroupTarget;
use crate::workflow::wait::{Settle, WaitPolicy};
use crate::{Error, Result};

/// Button that opens the composer
pub fn composer_trigger(ui: &UiText) -> Matcher {
    Matcher::css_with_text(r#"div[role="button"]"#, ui.composer_trigger.as_str())
}

/// Open dialog overlays
pub fn dialog_overlays() -> Matcher {
    Matcher::css(r#"div[role="dialog"]"#)
}

/// Opens the composer of a group page
#[derive(Debug, Clone)]
pub struct ComposerLocator {
    platform_url: String,
    ui: UiText,
    navigation: NavigationOptions,
}

impl ComposerLocator {
    pub fn new<S: Into<String>>(platform_url: S, ui: UiText, navigation: NavigationOptions) -> Self {
        Self {
            platform_url: platform_url.into().trim_end_matches('/').to_string(),
            ui,
            navigation,
        }
    }

    /// Group page URL
    pub fn group_url(&self, group: &GroupTarget) -> String {
        format!("{}/groups/{}", self.platform_url, group)
    }

    /// Navigate to `group`, open its composer and return the composer overlay
    #[instrument(skip(self, page, wait), fields(group = %group))]
    pub async fn open(
        &self,
        page: &dyn PageContext,
        group: &GroupTarget,
        wait: &WaitPolicy,
    ) -> Result<Arc<dyn ElementRef>> {
        let url = self.group_url(group);
        info!("Opening group: {}", url);
        page.navigate(&url, self.navigation.clone()).await?;
        wait.settle(Settle::AfterNavigation).await;

        let trigger = page
            .query_all(&composer_trigger(&self.ui))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                Error::composer_not_found(format!("no \"{}\" button on {}", self.ui.composer_trigger, url))
            })?;
        trigger.click().await?;
        wait.settle(Settle::ComposerOpened).await;

        let overlays = page.query_all(&dialog_overlays()).await?;
        let composer = self.select_composer(overlays).await?;
        wait.settle(Settle::ComposerReady).await;

        Ok(composer)
    }

    /// First overlay whose label does not contain the messaging marker
    pub async fn select_composer(&self, overlays: Vec<Arc<dyn ElementRef>>) -> Result<Arc<dyn ElementRef>> {
        let total = overlays.len();

        for (index, overlay) in overlays.into_iter().enumerate() {
            let label = overlay.get_attribute("aria-label").await?;
            match label {
                Some(label) if label.contains(self.ui.messaging_marker.as_str()) => {
                    debug!("Skipping overlay {} labelled {:?}", index, label);
                }
                _ => {
                    debug!("Using overlay {} of {}", index, total);
                    return Ok(overlay);
                }
            }
        }

        Err(Error::composer_not_found(format!(
            "none of {} dialog overlays is a post composer",
            total
        )))
    }
}
