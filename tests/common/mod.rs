//! Common test utilities
//!
//! Builds scripted group pages for the mock browser and an orchestrator
//! wired to it with a recording sleeper, so no test waits in real time.

#![allow(dead_code)]

use autopost::config::{Config, UiText};
use autopost::session::{MockDom, MockLauncher, MockNode};
use autopost::workflow::composer::{composer_trigger, dialog_overlays};
use autopost::workflow::editor::editor_chain;
use autopost::workflow::media::upload_chain;
use autopost::workflow::{
    EditorKind, GroupPostOrchestrator, GroupTarget, MediaAsset, MediaKind, RecordingSleeper, Sleeper,
    SubmitStrategy,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Orchestrator plus everything a test inspects afterwards
pub struct Harness {
    pub launcher: Arc<MockLauncher>,
    pub sleeper: Arc<RecordingSleeper>,
    pub evidence_dir: PathBuf,
    pub orchestrator: GroupPostOrchestrator,
}

impl Harness {
    /// `dom_for(n)` is the page of the `n`-th session
    pub fn new<F>(dom_for: F) -> Self
    where
        F: Fn(usize) -> MockDom + Send + Sync + 'static,
    {
        Self::with_sleeper(dom_for, |_, recording| recording as Arc<dyn Sleeper>)
    }

    /// Like `new`, with the orchestrator's sleeper built by `sleeper_for`
    /// from the launcher and the recording sleeper kept by the harness
    pub fn with_sleeper<F, S>(dom_for: F, sleeper_for: S) -> Self
    where
        F: Fn(usize) -> MockDom + Send + Sync + 'static,
        S: FnOnce(Arc<MockLauncher>, Arc<RecordingSleeper>) -> Arc<dyn Sleeper>,
    {
        let evidence_dir = std::env::temp_dir().join(format!("autopost-test-{}", uuid::Uuid::new_v4()));
        let config = Config {
            evidence_dir: evidence_dir.clone(),
            ..Config::default()
        };

        let launcher = Arc::new(MockLauncher::new(dom_for));
        let sleeper = Arc::new(RecordingSleeper::new());
        let orchestrator = GroupPostOrchestrator::with_launcher(
            launcher.clone(),
            Vec::new(),
            &config,
            sleeper_for(launcher.clone(), sleeper.clone()),
        )
        .expect("default config is valid");

        Self {
            launcher,
            sleeper,
            evidence_dir,
            orchestrator,
        }
    }

    /// Evidence file names, sorted
    pub fn evidence(&self) -> Vec<String> {
        evidence_files(&self.evidence_dir)
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.evidence_dir);
    }
}

pub fn evidence_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    };
    names.sort();
    names
}

pub fn groups(ids: &[&str]) -> Vec<GroupTarget> {
    ids.iter().map(|id| GroupTarget::from(*id)).collect()
}

pub fn media() -> Vec<MediaAsset> {
    vec![
        MediaAsset::new(PathBuf::from("/media/01.jpg"), MediaKind::Image),
        MediaAsset::new(PathBuf::from("/media/02.mp4"), MediaKind::Video),
    ]
}

/// Name of the editor node built for `kind`
pub fn editor_name(kind: EditorKind) -> String {
    format!("editor-{:?}", kind)
}

/// Composer overlay holding an editor of `editor` kind and, optionally, a
/// submit control reachable through `submit`
pub fn composer(editor: EditorKind, submit: Option<SubmitStrategy>) -> MockNode {
    let ui = UiText::default();
    let probe = editor_chain(&ui)
        .into_iter()
        .find(|probe| probe.kind == editor)
        .expect("every kind has a probe");

    let mut dialog = MockNode::new("composer")
        .attr("aria-label", "Create post")
        .child(probe.matcher, MockNode::new(editor_name(editor)));

    if let Some(strategy) = submit {
        dialog = dialog.child(strategy.matcher(&ui.submit_label), MockNode::new("submit").pointer());
    }
    dialog
}

/// Group page with a composer trigger, a messaging overlay and `composer`
pub fn group_page(composer: MockNode) -> MockDom {
    messaging_only_page().node(dialog_overlays(), composer)
}

/// Group page whose only overlay is the messaging pop-up
pub fn messaging_only_page() -> MockDom {
    MockDom::new()
        .node(composer_trigger(&UiText::default()), MockNode::new("trigger"))
        .node(
            dialog_overlays(),
            MockNode::new("messenger").attr("aria-label", "Messenger"),
        )
}

/// Add a multi-file image input to `dom`
pub fn with_upload_control(dom: MockDom) -> MockDom {
    dom.node(upload_chain()[0].clone(), MockNode::new("file-input"))
}

/// Page where everything resolves on the first try
pub fn happy_page() -> MockDom {
    group_page(composer(EditorKind::Rich, Some(SubmitStrategy::AriaLabelButton)))
}
