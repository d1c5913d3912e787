//! Run data: targets, content, media, and what happened to each attempt

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Opaque platform group identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupTarget(String);

impl GroupTarget {
    pub fn new<S: Into<String>>(id: S) -> Self {
        GroupTarget(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GroupTarget {
    fn from(id: &str) -> Self {
        GroupTarget::new(id)
    }
}

impl From<String> for GroupTarget {
    fn from(id: String) -> Self {
        GroupTarget(id)
    }
}

/// Post body, already formatted for the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostContent(String);

impl PostContent {
    pub fn new<S: Into<String>>(text: S) -> Self {
        PostContent(text.into())
    }

    pub fn text(&self) -> &str {
        &self.0
    }
}

/// Kind of attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// `jpg` is an image, `mp4` a video; extensions match case-insensitively
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "jpg" => Some(MediaKind::Image),
            "mp4" => Some(MediaKind::Video),
            _ => None,
        }
    }
}

/// File attached to every post of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAsset {
    path: PathBuf,
    kind: MediaKind,
}

impl MediaAsset {
    pub fn new(path: PathBuf, kind: MediaKind) -> Self {
        Self { path, kind }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }
}

/// How one attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    RetryableFailure,
    FatalFailure,
}

/// One execution of the posting pipeline for one group
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptRecord {
    pub group: GroupTarget,
    /// 1-based
    pub attempt: usize,
    pub outcome: AttemptOutcome,
    /// Failure description; `None` on success
    pub reason: Option<String>,
    /// Wait before this attempt started; `None` for the first attempt
    pub backoff: Option<Duration>,
}

/// Final state of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupOutcome {
    Posted,
    Failed,
}

/// Everything that happened to one group
#[derive(Debug, Clone, PartialEq)]
pub struct GroupReport {
    pub group: GroupTarget,
    pub outcome: GroupOutcome,
    pub attempts: Vec<AttemptRecord>,
}

/// Per-group results of a run, in processing order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub groups: Vec<GroupReport>,
}

impl RunReport {
    /// Attempt records of `group`, oldest first
    pub fn records_for(&self, group: &GroupTarget) -> Vec<&AttemptRecord> {
        self.groups
            .iter()
            .filter(|report| &report.group == group)
            .flat_map(|report| report.attempts.iter())
            .collect()
    }

    /// Groups that were posted to
    pub fn posted(&self) -> Vec<&GroupTarget> {
        self.with_outcome(GroupOutcome::Posted)
    }

    /// Groups that exhausted their attempts or hit a fatal failure
    pub fn failed(&self) -> Vec<&GroupTarget> {
        self.with_outcome(GroupOutcome::Failed)
    }

    fn with_outcome(&self, outcome: GroupOutcome) -> Vec<&GroupTarget> {
        self.groups
            .iter()
            .filter(|report| report.outcome == outcome)
            .map(|report| &report.group)
            .collect()
    }
}
