//! Waiting
//!
//! Every fixed pause of the pipeline is a named `Settle` point resolved
//! against the configured `Timings`, and every pause goes through a
//! `Sleeper` so tests can observe waits without spending them.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

use crate::config::Timings;

/// Why the pipeline is pausing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pause {
    Settle(Settle),
    /// Wait before a retry attempt
    Backoff,
}

/// Source of delays
#[async_trait]
pub trait Sleeper: Send + Sync + std::fmt::Debug {
    async fn sleep(&self, pause: Pause, duration: Duration);
}

/// Real time
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, _pause: Pause, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Returns immediately and remembers every requested delay
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<(Pause, Duration)>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requested pauses with their delays, oldest first
    pub fn pauses(&self) -> Vec<(Pause, Duration)> {
        self.slept.lock().map(|slept| slept.clone()).unwrap_or_default()
    }

    /// Requested delays, oldest first
    pub fn slept(&self) -> Vec<Duration> {
        self.pauses().into_iter().map(|(_, duration)| duration).collect()
    }

    /// Retry backoffs only
    pub fn backoffs(&self) -> Vec<Duration> {
        self.pauses()
            .into_iter()
            .filter(|(pause, _)| *pause == Pause::Backoff)
            .map(|(_, duration)| duration)
            .collect()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, pause: Pause, duration: Duration) {
        if let Ok(mut slept) = self.slept.lock() {
            slept.push((pause, duration));
        }
    }
}

/// Named fixed pauses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settle {
    /// After the landing or group page loaded
    AfterNavigation,
    /// After clicking the composer trigger
    ComposerOpened,
    /// After picking the composer overlay
    ComposerReady,
    /// After focusing the editor
    AfterFocus,
    /// After typing the body
    AfterTyping,
    /// After handing files to the upload control
    AfterUpload,
    /// Before clicking submit
    BeforeSubmit,
    /// After clicking submit
    AfterSubmit,
    /// Between two groups
    BetweenGroups,
    /// Before closing the final session
    BeforeShutdown,
}

/// Settle points, ceilings and delays derived from `Timings`
#[derive(Debug, Clone)]
pub struct WaitPolicy {
    timings: Timings,
    sleeper: Arc<dyn Sleeper>,
}

impl WaitPolicy {
    pub fn new(timings: Timings, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { timings, sleeper }
    }

    /// Configured duration of a settle point
    pub fn duration(&self, point: Settle) -> Duration {
        let t = &self.timings;
        Duration::from_millis(match point {
            Settle::AfterNavigation => t.post_navigation_settle_ms,
            Settle::ComposerOpened => t.composer_open_settle_ms,
            Settle::ComposerReady => t.composer_ready_settle_ms,
            Settle::AfterFocus => t.focus_settle_ms,
            Settle::AfterTyping => t.typing_settle_ms,
            Settle::AfterUpload => t.upload_settle_ms,
            Settle::BeforeSubmit => t.pre_click_settle_ms,
            Settle::AfterSubmit => t.publish_settle_ms,
            Settle::BetweenGroups => t.group_settle_ms,
            Settle::BeforeShutdown => t.shutdown_settle_ms,
        })
    }

    pub async fn settle(&self, point: Settle) {
        let duration = self.duration(point);
        debug!("Settling {:?} for {:?}", point, duration);
        self.sleeper.sleep(Pause::Settle(point), duration).await;
    }

    /// Wait before a retry attempt
    pub async fn backoff(&self, duration: Duration) {
        debug!("Backing off for {:?}", duration);
        self.sleeper.sleep(Pause::Backoff, duration).await;
    }

    /// Ceiling for an editor candidate to attach
    pub fn attach_ceiling(&self) -> Duration {
        Duration::from_millis(self.timings.editor_attach_timeout_ms)
    }

    /// Ceiling for clicking the paragraph inside a rich editor
    pub fn paragraph_click_ceiling(&self) -> Duration {
        Duration::from_millis(self.timings.paragraph_click_timeout_ms)
    }

    /// Delay between typed characters
    pub fn keystroke_delay(&self) -> Duration {
        Duration::from_millis(self.timings.keystroke_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_settle_uses_configured_timings() {
        let sleeper = Arc::new(RecordingSleeper::new());
        let wait = WaitPolicy::new(Timings::default(), sleeper.clone());

        wait.settle(Settle::AfterNavigation).await;
        wait.settle(Settle::ComposerReady).await;
        wait.settle(Settle::AfterSubmit).await;
        wait.backoff(Duration::from_secs(3)).await;

        assert_eq!(
            sleeper.slept(),
            vec![
                Duration::from_secs(2),
                Duration::from_secs(3),
                Duration::from_secs(8),
                Duration::from_secs(3),
            ]
        );
        assert_eq!(sleeper.backoffs(), vec![Duration::from_secs(3)]);
        assert_eq!(
            sleeper.pauses()[1],
            (Pause::Settle(Settle::ComposerReady), Duration::from_secs(3))
        );
    }

    #[test]
    fn test_ceilings() {
        let wait = WaitPolicy::new(Timings::default(), Arc::new(TokioSleeper));
        assert_eq!(wait.attach_ceiling(), Duration::from_secs(2));
        assert_eq!(wait.paragraph_click_ceiling(), Duration::from_secs(5));
        assert_eq!(wait.keystroke_delay(), Duration::from_millis(30));
        assert_eq!(wait.duration(Settle::BeforeShutdown), Duration::from_secs(5));
    }
}
