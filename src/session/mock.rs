//! Scripted browser for testing
//!
//! A `MockDom` maps matchers to canned elements; a `MockLauncher` builds a
//! fresh DOM for every launch, so tests can change what the page offers
//! from one session to the next. Every interaction lands in a shared
//! event log.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::input::Cookie;
use crate::session::matcher::Matcher;
use crate::session::traits::{BrowserContext, BrowserLauncher, ElementRef, NavigationOptions, PageContext};
use crate::Error;

/// PNG signature returned as screenshot bytes
const PNG_BYTES: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Interaction recorded by the mock browser
#[derive(Debug, Clone, PartialEq)]
pub enum MockEvent {
    /// Session `n` launched (0-based)
    Launched(usize),
    /// Cookies installed into session `n`
    CookiesAdded(usize),
    Navigated(String),
    /// Element name
    Clicked(String),
    /// Whole text of one `type_text` call
    Typed(String),
    /// Element name and the batch handed to it
    FilesSet(String, Vec<PathBuf>),
    /// Screenshot taken in session `n`
    Screenshot(usize),
    /// Session `n` closed
    Closed(usize),
}

type EventLog = Arc<Mutex<Vec<MockEvent>>>;

fn record(log: &EventLog, event: MockEvent) {
    log.lock().unwrap().push(event);
}

/// Canned element
#[derive(Debug, Clone)]
pub struct MockNode {
    name: String,
    attributes: HashMap<String, String>,
    attached: bool,
    pointer: bool,
    click_fails: bool,
    rejects_files: bool,
    children: HashMap<Matcher, Vec<MockNode>>,
}

impl MockNode {
    /// Attached, non-pointer element named `name`
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            attributes: HashMap::new(),
            attached: true,
            pointer: false,
            click_fails: false,
            rejects_files: false,
            children: HashMap::new(),
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    /// Never attaches to the document
    pub fn detached(mut self) -> Self {
        self.attached = false;
        self
    }

    /// Renders a pointer cursor
    pub fn pointer(mut self) -> Self {
        self.pointer = true;
        self
    }

    pub fn failing_click(mut self) -> Self {
        self.click_fails = true;
        self
    }

    /// `set_input_files` fails on this element
    pub fn rejecting_files(mut self) -> Self {
        self.rejects_files = true;
        self
    }

    /// Add a descendant returned for `matcher`
    pub fn child(mut self, matcher: Matcher, node: MockNode) -> Self {
        self.children.entry(matcher).or_default().push(node);
        self
    }
}

/// Canned document
#[derive(Debug, Clone, Default)]
pub struct MockDom {
    matches: HashMap<Matcher, Vec<MockNode>>,
    navigation_failures: Vec<String>,
    screenshot_fails: bool,
}

impl MockDom {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document-level element returned for `matcher`
    pub fn node(mut self, matcher: Matcher, node: MockNode) -> Self {
        self.matches.entry(matcher).or_default().push(node);
        self
    }

    /// Fail navigations to URLs containing `fragment`
    pub fn fail_navigation<S: Into<String>>(mut self, fragment: S) -> Self {
        self.navigation_failures.push(fragment.into());
        self
    }

    pub fn failing_screenshots(mut self) -> Self {
        self.screenshot_fails = true;
        self
    }
}

/// Mock launcher
pub struct MockLauncher {
    dom_for: Box<dyn Fn(usize) -> MockDom + Send + Sync>,
    launches: AtomicUsize,
    log: EventLog,
}

impl std::fmt::Debug for MockLauncher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockLauncher")
            .field("launches", &self.launches)
            .finish()
    }
}

impl MockLauncher {
    /// `dom_for(n)` builds the document of the `n`-th launch (0-based)
    pub fn new<F>(dom_for: F) -> Self
    where
        F: Fn(usize) -> MockDom + Send + Sync + 'static,
    {
        Self {
            dom_for: Box::new(dom_for),
            launches: AtomicUsize::new(0),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every event so far, oldest first
    pub fn events(&self) -> Vec<MockEvent> {
        self.log.lock().unwrap().clone()
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    /// Names of clicked elements, in order
    pub fn clicked(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                MockEvent::Clicked(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    /// Texts typed, in order
    pub fn typed(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                MockEvent::Typed(text) => Some(text),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl BrowserLauncher for MockLauncher {
    async fn launch(&self) -> Result<Arc<dyn BrowserContext>, Error> {
        let index = self.launches.fetch_add(1, Ordering::SeqCst);
        record(&self.log, MockEvent::Launched(index));

        Ok(Arc::new(MockContext {
            id: format!("mock-context-{}", index),
            index,
            dom: Arc::new((self.dom_for)(index)),
            log: Arc::clone(&self.log),
            active: Arc::new(AtomicBool::new(true)),
        }))
    }
}

/// Mock browser context
#[derive(Debug)]
pub struct MockContext {
    id: String,
    index: usize,
    dom: Arc<MockDom>,
    log: EventLog,
    active: Arc<AtomicBool>,
}

impl MockContext {
    fn ensure_active(&self) -> Result<(), Error> {
        if self.is_active() {
            Ok(())
        } else {
            Err(Error::session_closed(self.id.clone()))
        }
    }
}

#[async_trait]
impl BrowserContext for MockContext {
    fn id(&self) -> &str {
        &self.id
    }

    async fn add_cookies(&self, _cookies: &[Cookie]) -> Result<(), Error> {
        self.ensure_active()?;
        record(&self.log, MockEvent::CookiesAdded(self.index));
        Ok(())
    }

    async fn new_page(&self) -> Result<Arc<dyn PageContext>, Error> {
        self.ensure_active()?;
        Ok(Arc::new(MockPage {
            id: format!("mock-page-{}", self.index),
            index: self.index,
            dom: Arc::clone(&self.dom),
            log: Arc::clone(&self.log),
            active: Arc::clone(&self.active),
        }))
    }

    async fn close(&self) -> Result<(), Error> {
        if self.active.swap(false, Ordering::SeqCst) {
            record(&self.log, MockEvent::Closed(self.index));
        }
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

/// Mock page
#[derive(Debug)]
pub struct MockPage {
    id: String,
    index: usize,
    dom: Arc<MockDom>,
    log: EventLog,
    active: Arc<AtomicBool>,
}

impl MockPage {
    fn ensure_active(&self) -> Result<(), Error> {
        if self.is_active() {
            Ok(())
        } else {
            Err(Error::session_closed(self.id.clone()))
        }
    }
}

fn wrap(nodes: Option<&Vec<MockNode>>, log: &EventLog) -> Vec<Arc<dyn ElementRef>> {
    nodes
        .map(|nodes| {
            nodes
                .iter()
                .map(|node| {
                    Arc::new(MockElement {
                        node: node.clone(),
                        log: Arc::clone(log),
                    }) as Arc<dyn ElementRef>
                })
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl PageContext for MockPage {
    fn id(&self) -> &str {
        &self.id
    }

    async fn navigate(&self, url: &str, _options: NavigationOptions) -> Result<(), Error> {
        self.ensure_active()?;
        if self
            .dom
            .navigation_failures
            .iter()
            .any(|fragment| url.contains(fragment.as_str()))
        {
            return Err(Error::navigation(format!("{}: net::ERR_TIMED_OUT", url)));
        }
        record(&self.log, MockEvent::Navigated(url.to_string()));
        Ok(())
    }

    async fn query_all(&self, matcher: &Matcher) -> Result<Vec<Arc<dyn ElementRef>>, Error> {
        self.ensure_active()?;
        Ok(wrap(self.dom.matches.get(matcher), &self.log))
    }

    async fn type_text(&self, text: &str, _delay: Duration) -> Result<(), Error> {
        self.ensure_active()?;
        record(&self.log, MockEvent::Typed(text.to_string()));
        Ok(())
    }

    async fn screenshot(&self, _full_page: bool) -> Result<Vec<u8>, Error> {
        self.ensure_active()?;
        if self.dom.screenshot_fails {
            return Err(Error::cdp("Page.captureScreenshot failed"));
        }
        record(&self.log, MockEvent::Screenshot(self.index));
        Ok(PNG_BYTES.to_vec())
    }

    async fn close(&self) -> Result<(), Error> {
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

/// Mock element
#[derive(Debug)]
pub struct MockElement {
    node: MockNode,
    log: EventLog,
}

#[async_trait]
impl ElementRef for MockElement {
    fn id(&self) -> &str {
        &self.node.name
    }

    async fn query_all(&self, matcher: &Matcher) -> Result<Vec<Arc<dyn ElementRef>>, Error> {
        Ok(wrap(self.node.children.get(matcher), &self.log))
    }

    async fn wait_for_attached(&self, timeout: Duration) -> Result<(), Error> {
        if self.node.attached {
            Ok(())
        } else {
            Err(Error::timeout(format!("{} not attached within {:?}", self.node.name, timeout)))
        }
    }

    async fn get_attribute(&self, name: &str) -> Result<Option<String>, Error> {
        Ok(self.node.attributes.get(name).cloned())
    }

    async fn is_pointer_interactive(&self) -> Result<bool, Error> {
        Ok(self.node.pointer)
    }

    async fn click(&self) -> Result<(), Error> {
        if self.node.click_fails {
            return Err(Error::script_execution_failed(format!("{} is not clickable", self.node.name)));
        }
        record(&self.log, MockEvent::Clicked(self.node.name.clone()));
        Ok(())
    }

    async fn set_input_files(&self, files: &[PathBuf]) -> Result<(), Error> {
        if self.node.rejects_files {
            return Err(Error::script_execution_failed(format!("{} rejected files", self.node.name)));
        }
        record(
            &self.log,
            MockEvent::FilesSet(self.node.name.clone(), files.to_vec()),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dom_is_rebuilt_per_launch() {
        let launcher = MockLauncher::new(|index| {
            if index == 0 {
                MockDom::new()
            } else {
                MockDom::new().node(Matcher::css("textarea"), MockNode::new("editor"))
            }
        });

        let first = launcher.launch().await.unwrap().new_page().await.unwrap();
        assert!(first.query_all(&Matcher::css("textarea")).await.unwrap().is_empty());

        let second = launcher.launch().await.unwrap().new_page().await.unwrap();
        let found = second.query_all(&Matcher::css("textarea")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), "editor");
        assert_eq!(launcher.launches(), 2);
    }

    #[tokio::test]
    async fn test_children_and_interactions_are_logged() {
        let dialog = MockNode::new("dialog")
            .child(Matcher::css("button"), MockNode::new("post").attr("aria-label", "Post"));
        let launcher = MockLauncher::new(move |_| MockDom::new().node(Matcher::css("dialog"), dialog.clone()));

        let page = launcher.launch().await.unwrap().new_page().await.unwrap();
        let dialog = page.query_all(&Matcher::css("dialog")).await.unwrap().remove(0);
        let button = dialog.query_all(&Matcher::css("button")).await.unwrap().remove(0);

        assert_eq!(button.get_attribute("aria-label").await.unwrap(), Some("Post".to_string()));
        button.click().await.unwrap();
        page.type_text("hello", Duration::ZERO).await.unwrap();

        assert_eq!(launcher.clicked(), vec!["post"]);
        assert_eq!(launcher.typed(), vec!["hello"]);
    }

    #[tokio::test]
    async fn test_closed_context_disables_page() {
        let launcher = MockLauncher::new(|_| MockDom::new());
        let context = launcher.launch().await.unwrap();
        let page = context.new_page().await.unwrap();

        context.close().await.unwrap();
        assert!(!page.is_active());
        assert!(page.screenshot(true).await.is_err());
        assert_eq!(
            launcher.events(),
            vec![MockEvent::Launched(0), MockEvent::Closed(0)]
        );
    }
}
