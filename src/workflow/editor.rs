//! Editor resolution and typing
//!
//! The composer's text surface has no stable selector, so the resolver walks
//! an ordered list of structural matchers and takes the first whose first
//! match attaches in time.

use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::config::UiText;
use crate::session::{ElementRef, Matcher, PageContext};
use crate::workflow::model::PostContent;
use crate::workflow::wait::{Settle, WaitPolicy};
use crate::{Error, Result};

/// Which matcher produced the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKind {
    /// Rich-text editor; typing goes to its first paragraph
    Rich,
    ContentEditable,
    Textbox,
    AriaLabel,
    AriaPlaceholder,
    TextArea,
    AnyContentEditable,
}

/// One step of the editor chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorProbe {
    pub kind: EditorKind,
    pub matcher: Matcher,
}

impl EditorProbe {
    fn new(kind: EditorKind, selector: String) -> Self {
        Self {
            kind,
            matcher: Matcher::Css(selector),
        }
    }
}

/// Editor matchers, highest priority first
pub fn editor_chain(ui: &UiText) -> Vec<EditorProbe> {
    vec![
        EditorProbe::new(EditorKind::Rich, r#"div[data-lexical-editor="true"]"#.to_string()),
        EditorProbe::new(EditorKind::ContentEditable, r#"div[contenteditable="true"]"#.to_string()),
        EditorProbe::new(EditorKind::Textbox, r#"div[role="textbox"]"#.to_string()),
        EditorProbe::new(EditorKind::AriaLabel, format!(r#"div[aria-label*="{}"]"#, ui.write_hint)),
        EditorProbe::new(
            EditorKind::AriaPlaceholder,
            format!(r#"div[aria-placeholder*="{}"]"#, ui.write_hint),
        ),
        EditorProbe::new(EditorKind::TextArea, "textarea".to_string()),
        EditorProbe::new(EditorKind::AnyContentEditable, r#"[contenteditable="true"]"#.to_string()),
    ]
}

/// Paragraphs inside a rich editor
pub fn paragraph() -> Matcher {
    Matcher::css("p")
}

/// The editor picked by the chain
#[derive(Debug, Clone)]
pub struct ResolvedEditor {
    pub kind: EditorKind,
    pub element: Arc<dyn ElementRef>,
}

/// Finds the editor inside the composer and types into it
#[derive(Debug, Clone)]
pub struct EditorResolver {
    chain: Vec<EditorProbe>,
}

impl EditorResolver {
    pub fn new(ui: &UiText) -> Self {
        Self {
            chain: editor_chain(ui),
        }
    }

    pub fn chain(&self) -> &[EditorProbe] {
        &self.chain
    }

    /// First chain entry with an attachable match
    #[instrument(skip_all)]
    pub async fn resolve(&self, composer: &dyn ElementRef, wait: &WaitPolicy) -> Result<ResolvedEditor> {
        for probe in &self.chain {
            let Some(candidate) = composer.query_all(&probe.matcher).await?.into_iter().next() else {
                debug!("No match for {}", probe.matcher);
                continue;
            };

            match candidate.wait_for_attached(wait.attach_ceiling()).await {
                Ok(()) => {
                    info!("Editor found: {:?}", probe.kind);
                    return Ok(ResolvedEditor {
                        kind: probe.kind,
                        element: candidate,
                    });
                }
                Err(e) => debug!("{} matched but never attached: {}", probe.matcher, e),
            }
        }

        Err(Error::editor_not_found(format!(
            "none of {} editor matchers found an attached element",
            self.chain.len()
        )))
    }

    /// Focus the editor and type `content` keystroke by keystroke
    #[instrument(skip_all, fields(kind = ?editor.kind))]
    pub async fn type_content(
        &self,
        page: &dyn PageContext,
        editor: &ResolvedEditor,
        content: &PostContent,
        wait: &WaitPolicy,
    ) -> Result<()> {
        self.focus(editor, wait).await?;
        wait.settle(Settle::AfterFocus).await;

        info!("Typing content...");
        page.type_text(content.text(), wait.keystroke_delay()).await?;
        wait.settle(Settle::AfterTyping).await;
        Ok(())
    }

    async fn focus(&self, editor: &ResolvedEditor, wait: &WaitPolicy) -> Result<()> {
        if editor.kind == EditorKind::Rich {
            if let Some(paragraph) = editor.element.query_all(&paragraph()).await?.into_iter().next() {
                let ceiling = wait.paragraph_click_ceiling();
                return tokio::time::timeout(ceiling, paragraph.click())
                    .await
                    .map_err(|_| Error::timeout(format!("editor paragraph click exceeded {:?}", ceiling)))?;
            }
        }

        editor.element.click().await
    }
}
