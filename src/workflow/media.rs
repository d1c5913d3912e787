//! Media attachment

use std::path::PathBuf;
use tracing::{debug, info, instrument};

use crate::session::{Matcher, PageContext};
use crate::workflow::model::MediaAsset;
use crate::workflow::wait::{Settle, WaitPolicy};
use crate::{Error, Result};

/// Upload-control matchers, highest priority first
pub fn upload_chain() -> Vec<Matcher> {
    vec![
        Matcher::css(r#"input[type="file"][multiple][accept*="image"]"#),
        Matcher::css(r#"input[type="file"][multiple][accept*="video"]"#),
        Matcher::css(r#"input[type="file"][multiple]"#),
    ]
}

/// Hands the media batch to the page's multi-file input
#[derive(Debug, Clone)]
pub struct MediaUploader {
    chain: Vec<Matcher>,
}

impl Default for MediaUploader {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaUploader {
    pub fn new() -> Self {
        Self { chain: upload_chain() }
    }

    /// Attach every asset in one batch.
    ///
    /// Fails with the run-fatal `MediaUploadControlNotFound` when no upload
    /// control matches.
    #[instrument(skip_all, fields(files = media.len()))]
    pub async fn attach(&self, page: &dyn PageContext, media: &[MediaAsset], wait: &WaitPolicy) -> Result<()> {
        info!("Uploading {} media files...", media.len());

        let mut control = None;
        for matcher in &self.chain {
            if let Some(input) = page.query_all(matcher).await?.into_iter().next() {
                debug!("Upload control matched {}", matcher);
                control = Some(input);
                break;
            }
        }

        let control = control.ok_or_else(|| {
            Error::media_control_not_found(format!("none of {} file input matchers matched", self.chain.len()))
        })?;

        let files: Vec<PathBuf> = media.iter().map(|asset| asset.path().to_path_buf()).collect();
        control.set_input_files(&files).await?;

        let names: Vec<String> = media
            .iter()
            .filter_map(|asset| asset.path().file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect();
        info!("Files uploaded: {}", names.join(", "));

        wait.settle(Settle::AfterUpload).await;
        Ok(())
    }
}
