//! Screenshot evidence
//!
//! Captures never fail the caller: a screenshot that cannot be taken or
//! written is logged and reported as `None`.

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::{info, warn};

use crate::session::PageContext;
use crate::workflow::model::GroupTarget;

/// What a screenshot documents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    /// Post published
    Success,
    /// An attempt failed (1-based attempt number)
    AttemptFailure { attempt: usize },
    /// Editor chain exhausted
    NoEditor,
    /// No upload control
    NoFileInput,
    /// Landing page did not load
    LandingLoad,
}

impl Artifact {
    /// File name for this artifact
    pub fn file_name(&self, group: Option<&GroupTarget>, timestamp: i64) -> String {
        let group = group
            .map(|group| format!("-{}", sanitize(group.as_str())))
            .unwrap_or_default();

        match self {
            Artifact::Success => format!("evidence-group{}-{}.png", group, timestamp),
            Artifact::AttemptFailure { attempt } => {
                format!("error-group{}-attempt{}-{}.png", group, attempt, timestamp)
            }
            Artifact::NoEditor => format!("error-no-editor{}-{}.png", group, timestamp),
            Artifact::NoFileInput => format!("error-no-file-input{}-{}.png", group, timestamp),
            Artifact::LandingLoad => format!("error-landing-load{}-{}.png", group, timestamp),
        }
    }
}

/// Keep group ids usable as file name parts
fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
        .collect()
}

/// Writes full-page screenshots into the evidence directory
#[derive(Debug)]
pub struct EvidenceRecorder {
    dir: PathBuf,
    last_timestamp: AtomicI64,
}

impl EvidenceRecorder {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self {
            dir: dir.into(),
            last_timestamp: AtomicI64::new(0),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Milliseconds since the epoch, strictly greater than any earlier stamp
    fn next_timestamp(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let previous = self
            .last_timestamp
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(now.max(last + 1)))
            .unwrap_or(now);
        now.max(previous + 1)
    }

    /// Screenshot `page` as `artifact`; returns the written path
    pub async fn capture(
        &self,
        page: &dyn PageContext,
        artifact: Artifact,
        group: Option<&GroupTarget>,
    ) -> Option<PathBuf> {
        let path = self.dir.join(artifact.file_name(group, self.next_timestamp()));

        let png = match page.screenshot(true).await {
            Ok(png) => png,
            Err(e) => {
                warn!("Failed to capture {}: {}", path.display(), e);
                return None;
            }
        };

        if let Err(e) = tokio::fs::create_dir_all(&self.dir).await {
            warn!("Failed to create evidence directory {}: {}", self.dir.display(), e);
            return None;
        }

        match tokio::fs::write(&path, &png).await {
            Ok(()) => {
                info!("Screenshot saved: {}", path.display());
                Some(path)
            }
            Err(e) => {
                warn!("Failed to write {}: {}", path.display(), e);
                None
            }
        }
    }
}
