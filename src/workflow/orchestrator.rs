//! Group posting orchestration
//!
//! Groups are processed one at a time. Each group gets up to `max_retries`
//! attempts; every attempt after the first runs on a freshly recreated
//! session after a fixed backoff. A missing upload control is not retried:
//! it stops the whole run.

use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::{Config, RetryConfig};
use crate::error::RunAbort;
use crate::input::Cookie;
use crate::session::{BrowserLauncher, SessionManager};
use crate::workflow::composer::ComposerLocator;
use crate::workflow::editor::EditorResolver;
use crate::workflow::evidence::{Artifact, EvidenceRecorder};
use crate::workflow::media::MediaUploader;
use crate::workflow::model::{
    AttemptOutcome, AttemptRecord, GroupOutcome, GroupReport, GroupTarget, MediaAsset, PostContent, RunReport,
};
use crate::workflow::submit::PostSubmitter;
use crate::workflow::wait::{Settle, Sleeper, WaitPolicy};
use crate::{Error, Result};

/// Attempt budget and backoff schedule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: usize,
    delays: Vec<Duration>,
}

impl RetryPolicy {
    /// `delays[i]` is waited before attempt `i + 2`; at least
    /// `max_retries - 1` delays are required
    pub fn new(max_retries: usize, delays: Vec<Duration>) -> Result<Self> {
        if max_retries == 0 {
            return Err(Error::configuration("max_retries must be at least 1"));
        }
        if delays.len() + 1 < max_retries {
            return Err(Error::configuration(format!(
                "{} attempts need {} retry delays, got {}",
                max_retries,
                max_retries - 1,
                delays.len()
            )));
        }
        Ok(Self { max_retries, delays })
    }

    pub fn from_config(config: &RetryConfig) -> Result<Self> {
        Self::new(
            config.max_retries,
            config.retry_delays_ms.iter().copied().map(Duration::from_millis).collect(),
        )
    }

    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    /// Backoff before the attempt with 0-based `index`; none for the first
    pub fn delay_before(&self, index: usize) -> Option<Duration> {
        index
            .checked_sub(1)
            .and_then(|previous| self.delays.get(previous).copied())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delays: vec![
                Duration::from_millis(3000),
                Duration::from_millis(5000),
                Duration::from_millis(7000),
            ],
        }
    }
}

/// Posts one piece of content to a list of groups
#[derive(Debug)]
pub struct GroupPostOrchestrator {
    sessions: SessionManager,
    composer: ComposerLocator,
    editor: EditorResolver,
    uploader: MediaUploader,
    submitter: PostSubmitter,
    evidence: EvidenceRecorder,
    wait: WaitPolicy,
    retry: RetryPolicy,
}

impl GroupPostOrchestrator {
    /// Build every component from `config`
    pub fn new(sessions: SessionManager, config: &Config, sleeper: Arc<dyn Sleeper>) -> Result<Self> {
        Ok(Self {
            sessions,
            composer: ComposerLocator::new(
                config.platform_url.clone(),
                config.ui.clone(),
                config.timings.navigation(),
            ),
            editor: EditorResolver::new(&config.ui),
            uploader: MediaUploader::new(),
            submitter: PostSubmitter::new(&config.ui),
            evidence: EvidenceRecorder::new(config.evidence_dir.clone()),
            wait: WaitPolicy::new(config.timings.clone(), sleeper),
            retry: RetryPolicy::from_config(&config.retry)?,
        })
    }

    /// Build with a session manager that launches through `launcher`
    pub fn with_launcher(
        launcher: Arc<dyn BrowserLauncher>,
        cookies: Vec<Cookie>,
        config: &Config,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self> {
        let sessions = SessionManager::new(
            launcher,
            cookies,
            config.platform_url.clone(),
            config.timings.navigation(),
        );
        Self::new(sessions, config, sleeper)
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn evidence(&self) -> &EvidenceRecorder {
        &self.evidence
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Post `content` (and `media`, if any) to every group in order.
    ///
    /// The session is closed on every exit path. A run-fatal failure stops
    /// the run and comes back as `RunAbort` with the report so far.
    pub async fn run(
        &mut self,
        groups: &[GroupTarget],
        content: &PostContent,
        media: &[MediaAsset],
    ) -> std::result::Result<RunReport, RunAbort> {
        let mut report = RunReport::default();

        if let Err(source) = self.start().await {
            self.sessions.close().await;
            return Err(RunAbort {
                group: None,
                report,
                source,
            });
        }

        for (index, group) in groups.iter().enumerate() {
            info!("Processing group {}/{}: {}", index + 1, groups.len(), group);

            let (group_report, fatal) = self.post_to_group(group, content, media).await;
            report.groups.push(group_report);

            if let Some(source) = fatal {
                error!("Aborting run at group {}: {}", group, source);
                self.sessions.close().await;
                return Err(RunAbort {
                    group: Some(group.clone()),
                    report,
                    source,
                });
            }

            self.wait.settle(Settle::BetweenGroups).await;
        }

        info!(
            "Run finished: {} posted, {} failed",
            report.posted().len(),
            report.failed().len()
        );
        self.wait.settle(Settle::BeforeShutdown).await;
        self.sessions.close().await;
        Ok(report)
    }

    /// Open the first session; a landing page that never loads is fatal
    async fn start(&mut self) -> Result<()> {
        if let Err(e) = self.sessions.open().await {
            error!("Error loading landing page: {}", e);
            self.capture(Artifact::LandingLoad, None).await;
            return Err(e);
        }
        Ok(())
    }

    /// Attempt loop for one group. The second value is set when the group
    /// ended on a run-fatal failure.
    async fn post_to_group(
        &mut self,
        group: &GroupTarget,
        content: &PostContent,
        media: &[MediaAsset],
    ) -> (GroupReport, Option<Error>) {
        let max_retries = self.retry.max_retries();
        let mut attempts = Vec::new();

        for index in 0..max_retries {
            let attempt = index + 1;
            let backoff = self.retry.delay_before(index);
            if index > 0 {
                info!("Retry {}/{}...", attempt, max_retries);
            }

            let result = self.run_attempt(group, content, media, backoff).await;
            let record = |outcome, reason| AttemptRecord {
                group: group.clone(),
                attempt,
                outcome,
                reason,
                backoff,
            };

            match result {
                Ok(()) => {
                    attempts.push(record(AttemptOutcome::Success, None));
                    info!("Successfully posted to group {}", group);
                    return (report(group, GroupOutcome::Posted, attempts), None);
                }
                Err(e) if e.is_run_fatal() => {
                    attempts.push(record(AttemptOutcome::FatalFailure, Some(e.to_string())));
                    return (report(group, GroupOutcome::Failed, attempts), Some(e));
                }
                Err(e) => {
                    warn!("Attempt {}/{} failed for group {}: {}", attempt, max_retries, group, e);
                    attempts.push(record(AttemptOutcome::RetryableFailure, Some(e.to_string())));
                    self.capture(Artifact::AttemptFailure { attempt }, Some(group)).await;
                }
            }
        }

        error!("Failed to post to group {} after {} attempts", group, max_retries);
        (report(group, GroupOutcome::Failed, attempts), None)
    }

    /// Recreate the session when `backoff` is set, then run the pipeline
    async fn run_attempt(
        &mut self,
        group: &GroupTarget,
        content: &PostContent,
        media: &[MediaAsset],
        backoff: Option<Duration>,
    ) -> Result<()> {
        if let Some(delay) = backoff {
            self.sessions.recreate(self.wait.backoff(delay)).await?;
            self.wait.settle(Settle::AfterNavigation).await;
        }
        self.pipeline(group, content, media).await
    }

    /// Navigate, open composer, type, attach media, submit, capture
    async fn pipeline(&self, group: &GroupTarget, content: &PostContent, media: &[MediaAsset]) -> Result<()> {
        let page = self.sessions.page()?;

        let composer = self.composer.open(page.as_ref(), group, &self.wait).await?;

        let editor = match self.editor.resolve(composer.as_ref(), &self.wait).await {
            Ok(editor) => editor,
            Err(e) => {
                self.capture(Artifact::NoEditor, Some(group)).await;
                return Err(e);
            }
        };
        self.editor
            .type_content(page.as_ref(), &editor, content, &self.wait)
            .await?;

        if !media.is_empty() {
            if let Err(e) = self.uploader.attach(page.as_ref(), media, &self.wait).await {
                if e.is_run_fatal() {
                    self.capture(Artifact::NoFileInput, Some(group)).await;
                }
                return Err(e);
            }
        }

        self.submitter.submit(composer.as_ref(), &self.wait).await?;
        self.wait.settle(Settle::AfterSubmit).await;

        self.capture(Artifact::Success, Some(group)).await;
        Ok(())
    }

    /// Screenshot the live page, if there is one
    async fn capture(&self, artifact: Artifact, group: Option<&GroupTarget>) {
        match self.sessions.page() {
            Ok(page) => {
                self.evidence.capture(page.as_ref(), artifact, group).await;
            }
            Err(e) => warn!("No page to capture {:?}: {}", artifact, e),
        }
    }
}

fn report(group: &GroupTarget, outcome: GroupOutcome, attempts: Vec<AttemptRecord>) -> GroupReport {
    GroupReport {
        group: group.clone(),
        outcome,
        attempts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_policy_delays() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries(), 3);
        assert_eq!(policy.delay_before(0), None);
        assert_eq!(policy.delay_before(1), Some(Duration::from_millis(3000)));
        assert_eq!(policy.delay_before(2), Some(Duration::from_millis(5000)));
    }

    #[test]
    fn test_retry_policy_validation() {
        assert!(RetryPolicy::new(0, vec![]).is_err());
        assert!(RetryPolicy::new(3, vec![Duration::from_secs(1)]).is_err());
        assert!(RetryPolicy::new(1, vec![]).is_ok());
        assert!(RetryPolicy::new(2, vec![Duration::from_secs(1)]).is_ok());
    }

    #[test]
    fn test_retry_policy_from_config() {
        let policy = RetryPolicy::from_config(&RetryConfig::default()).unwrap();
        assert_eq!(policy, RetryPolicy::default());
    }
}
