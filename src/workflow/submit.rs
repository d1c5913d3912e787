//! Submit control resolution
//!
//! Four strategies, tried in order inside the composer. A strategy that
//! errors counts as a miss; the next one still runs.

use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::config::UiText;
use crate::session::{ElementRef, Matcher};
use crate::workflow::wait::{Settle, WaitPolicy};
use crate::{Error, Result};

/// Submit strategies, highest priority first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitStrategy {
    /// `div[aria-label="<label>"][role="button"]`
    AriaLabelButton,
    /// Button-role element whose text contains the label
    ButtonWithText,
    /// Button with exactly the label as accessible name
    RoleName,
    /// Any element with the label text that behaves like a link or button
    PointerText,
}

impl SubmitStrategy {
    pub const ALL: [SubmitStrategy; 4] = [
        SubmitStrategy::AriaLabelButton,
        SubmitStrategy::ButtonWithText,
        SubmitStrategy::RoleName,
        SubmitStrategy::PointerText,
    ];

    /// Matcher this strategy queries
    pub fn matcher(&self, label: &str) -> Matcher {
        match self {
            SubmitStrategy::AriaLabelButton => {
                Matcher::css(format!(r#"div[aria-label="{}"][role="button"]"#, label))
            }
            SubmitStrategy::ButtonWithText => Matcher::css_with_text(r#"div[role="button"]"#, label),
            SubmitStrategy::RoleName => Matcher::role("button", label),
            SubmitStrategy::PointerText => Matcher::text(label),
        }
    }
}

/// Finds and clicks the submit control
#[derive(Debug, Clone)]
pub struct PostSubmitter {
    label: String,
}

impl PostSubmitter {
    pub fn new(ui: &UiText) -> Self {
        Self {
            label: ui.submit_label.clone(),
        }
    }

    /// Click the first control any strategy resolves. Returns the strategy
    /// that clicked.
    #[instrument(skip_all)]
    pub async fn submit(&self, composer: &dyn ElementRef, wait: &WaitPolicy) -> Result<SubmitStrategy> {
        info!("Clicking {} button...", self.label);

        for strategy in SubmitStrategy::ALL {
            match self.try_strategy(strategy, composer, wait).await {
                Ok(true) => {
                    info!("Clicked via {:?}", strategy);
                    return Ok(strategy);
                }
                Ok(false) => debug!("{:?} found nothing", strategy),
                Err(e) => warn!("{:?} failed: {}", strategy, e),
            }
        }

        Err(Error::submit_not_found(format!(
            "no \"{}\" control could be clicked",
            self.label
        )))
    }

    async fn try_strategy(
        &self,
        strategy: SubmitStrategy,
        composer: &dyn ElementRef,
        wait: &WaitPolicy,
    ) -> Result<bool> {
        let candidates = composer.query_all(&strategy.matcher(&self.label)).await?;

        if strategy == SubmitStrategy::PointerText {
            return click_pointer_interactive(candidates, wait).await;
        }

        match candidates.into_iter().next() {
            Some(control) => {
                wait.settle(Settle::BeforeSubmit).await;
                control.click().await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Click candidates with a pointer cursor or click handler, in order, until
/// one click lands. Candidates that cannot be inspected or clicked are
/// skipped; the last click error is returned when none landed.
async fn click_pointer_interactive(candidates: Vec<Arc<dyn ElementRef>>, wait: &WaitPolicy) -> Result<bool> {
    let mut last_error = None;

    for candidate in candidates {
        match candidate.is_pointer_interactive().await {
            Ok(true) => {}
            Ok(false) => continue,
            Err(e) => {
                debug!("Skipping {}: {}", candidate.id(), e);
                continue;
            }
        }

        wait.settle(Settle::BeforeSubmit).await;
        match candidate.click().await {
            Ok(()) => return Ok(true),
            Err(e) => {
                debug!("Click on {} failed: {}", candidate.id(), e);
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(e) => Err(e),
        None => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Timings;
    use crate::session::{BrowserLauncher, MockDom, MockLauncher, MockNode, PageContext};
    use crate::workflow::wait::RecordingSleeper;
    use std::time::Duration;

    fn matcher(strategy: SubmitStrategy) -> Matcher {
        strategy.matcher("Post")
    }

    async fn run(dialog: MockNode) -> (MockLauncher, Result<SubmitStrategy>, Vec<Duration>) {
        let launcher = MockLauncher::new(move |_| MockDom::new().node(Matcher::css("dialog"), dialog.clone()));
        let page: Arc<dyn PageContext> = launcher.launch().await.unwrap().new_page().await.unwrap();
        let composer = page.query_all(&Matcher::css("dialog")).await.unwrap().remove(0);

        let sleeper = Arc::new(RecordingSleeper::new());
        let wait = WaitPolicy::new(Timings::default(), sleeper.clone());
        let result = PostSubmitter::new(&UiText::default())
            .submit(composer.as_ref(), &wait)
            .await;
        (launcher, result, sleeper.slept())
    }

    #[test]
    fn test_strategy_matchers() {
        assert_eq!(
            matcher(SubmitStrategy::AriaLabelButton),
            Matcher::css(r#"div[aria-label="Post"][role="button"]"#)
        );
        assert_eq!(matcher(SubmitStrategy::RoleName), Matcher::role("button", "Post"));
        assert_eq!(matcher(SubmitStrategy::PointerText), Matcher::text("Post"));
    }

    #[tokio::test]
    async fn test_first_strategy_wins_and_settles_before_click() {
        let dialog = MockNode::new("dialog")
            .child(matcher(SubmitStrategy::AriaLabelButton), MockNode::new("aria-post"))
            .child(matcher(SubmitStrategy::RoleName), MockNode::new("role-post"));

        let (launcher, result, slept) = run(dialog).await;

        assert_eq!(result.unwrap(), SubmitStrategy::AriaLabelButton);
        assert_eq!(launcher.clicked(), vec!["aria-post"]);
        assert_eq!(slept, vec![Duration::from_secs(2)]);
    }

    #[tokio::test]
    async fn test_failing_click_falls_through() {
        let dialog = MockNode::new("dialog")
            .child(
                matcher(SubmitStrategy::AriaLabelButton),
                MockNode::new("covered").failing_click(),
            )
            .child(matcher(SubmitStrategy::ButtonWithText), MockNode::new("text-post"));

        let (launcher, result, _) = run(dialog).await;

        assert_eq!(result.unwrap(), SubmitStrategy::ButtonWithText);
        assert_eq!(launcher.clicked(), vec!["text-post"]);
    }

    #[tokio::test]
    async fn test_pointer_text_skips_plain_text() {
        let dialog = MockNode::new("dialog")
            .child(matcher(SubmitStrategy::PointerText), MockNode::new("caption"))
            .child(matcher(SubmitStrategy::PointerText), MockNode::new("link").pointer());

        let (launcher, result, _) = run(dialog).await;

        assert_eq!(result.unwrap(), SubmitStrategy::PointerText);
        assert_eq!(launcher.clicked(), vec!["link"]);
    }

    #[tokio::test]
    async fn test_pointer_text_moves_past_unclickable_candidate() {
        let dialog = MockNode::new("dialog")
            .child(
                matcher(SubmitStrategy::PointerText),
                MockNode::new("overlaid").pointer().failing_click(),
            )
            .child(matcher(SubmitStrategy::PointerText), MockNode::new("link").pointer());

        let (launcher, result, slept) = run(dialog).await;

        assert_eq!(result.unwrap(), SubmitStrategy::PointerText);
        assert_eq!(launcher.clicked(), vec!["link"]);
        assert_eq!(slept, vec![Duration::from_secs(2), Duration::from_secs(2)]);
    }

    #[tokio::test]
    async fn test_all_strategies_fail() {
        let dialog = MockNode::new("dialog")
            .child(matcher(SubmitStrategy::PointerText), MockNode::new("caption"));

        let (launcher, result, slept) = run(dialog).await;

        assert!(matches!(result, Err(Error::SubmitButtonNotFound(_))));
        assert!(launcher.clicked().is_empty());
        assert!(slept.is_empty());
    }
}
