//! Session manager implementation
//!
//! Owns the single live session of a run and rebuilds it on demand:
//! launch, isolated context, cookies, page, landing navigation.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::input::Cookie;
use crate::session::traits::{BrowserContext, BrowserLauncher, NavigationOptions, PageContext};
use crate::Error;

/// The live context and its page
#[derive(Debug, Clone)]
pub struct SessionHandle {
    context: Arc<dyn BrowserContext>,
    page: Arc<dyn PageContext>,
}

impl SessionHandle {
    pub fn context(&self) -> &Arc<dyn BrowserContext> {
        &self.context
    }

    pub fn page(&self) -> &Arc<dyn PageContext> {
        &self.page
    }
}

/// Session manager
#[derive(Debug)]
pub struct SessionManager {
    launcher: Arc<dyn BrowserLauncher>,
    cookies: Vec<Cookie>,
    landing_url: String,
    navigation: NavigationOptions,
    current: Option<SessionHandle>,
    opened: usize,
}

impl SessionManager {
    /// Create a new session manager
    ///
    /// # Arguments
    /// * `launcher` - Starts browser sessions
    /// * `cookies` - Installed into every new context
    /// * `landing_url` - Baseline page loaded after every launch
    /// * `navigation` - Timeouts for the landing navigation
    pub fn new(
        launcher: Arc<dyn BrowserLauncher>,
        cookies: Vec<Cookie>,
        landing_url: String,
        navigation: NavigationOptions,
    ) -> Self {
        Self {
            launcher,
            cookies,
            landing_url,
            navigation,
            current: None,
            opened: 0,
        }
    }

    /// Replace any live session with a fresh one and load the landing page.
    ///
    /// The new session is kept even when the landing navigation fails, so
    /// the caller can still capture evidence from it.
    pub async fn open(&mut self) -> Result<Arc<dyn PageContext>, Error> {
        self.close().await;

        let context = self.launcher.launch().await?;
        let page = match self.prepare(&context).await {
            Ok(page) => page,
            Err(e) => {
                if let Err(close_err) = context.close().await {
                    warn!("Failed to close half-open context {}: {}", context.id(), close_err);
                }
                return Err(e);
            }
        };

        self.opened += 1;
        self.current = Some(SessionHandle {
            context,
            page: Arc::clone(&page),
        });
        info!("Session {} opened", self.opened);

        page.navigate(&self.landing_url, self.navigation.clone())
            .await?;
        Ok(page)
    }

    async fn prepare(&self, context: &Arc<dyn BrowserContext>) -> Result<Arc<dyn PageContext>, Error> {
        context.add_cookies(&self.cookies).await?;
        debug!("Installed {} cookies into context {}", self.cookies.len(), context.id());
        context.new_page().await
    }

    /// Close the live session, wait out `pause`, then open a fresh one.
    ///
    /// The old handle is always released before the new one is acquired.
    pub async fn recreate<F>(&mut self, pause: F) -> Result<Arc<dyn PageContext>, Error>
    where
        F: std::future::Future<Output = ()>,
    {
        self.close().await;
        pause.await;
        self.open().await
    }

    /// Close the live session, if any. Failures are logged and swallowed.
    pub async fn close(&mut self) {
        if let Some(handle) = self.current.take() {
            if let Err(e) = handle.context.close().await {
                warn!("Failed to close browser context {}: {}", handle.context.id(), e);
            } else {
                debug!("Closed browser context {}", handle.context.id());
            }
        }
    }

    /// Page of the live session
    pub fn page(&self) -> Result<Arc<dyn PageContext>, Error> {
        self.current
            .as_ref()
            .map(|handle| Arc::clone(&handle.page))
            .ok_or_else(|| Error::session_closed("no live session"))
    }

    /// Live session, if any
    pub fn current(&self) -> Option<&SessionHandle> {
        self.current.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    /// Number of sessions opened so far
    pub fn sessions_opened(&self) -> usize {
        self.opened
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::mock::{MockDom, MockEvent, MockLauncher};

    fn manager(launcher: &Arc<MockLauncher>) -> SessionManager {
        SessionManager::new(
            launcher.clone(),
            Vec::new(),
            "https://www.facebook.com".to_string(),
            NavigationOptions::default(),
        )
    }

    #[tokio::test]
    async fn test_open_navigates_to_landing() {
        let launcher = Arc::new(MockLauncher::new(|_| MockDom::new()));
        let mut sessions = manager(&launcher);

        assert!(sessions.page().is_err());
        sessions.open().await.unwrap();

        assert!(sessions.is_open());
        assert_eq!(sessions.sessions_opened(), 1);
        assert_eq!(
            launcher.events(),
            vec![
                MockEvent::Launched(0),
                MockEvent::CookiesAdded(0),
                MockEvent::Navigated("https://www.facebook.com".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_reopen_closes_previous_session() {
        let launcher = Arc::new(MockLauncher::new(|_| MockDom::new()));
        let mut sessions = manager(&launcher);

        sessions.open().await.unwrap();
        sessions.open().await.unwrap();

        assert_eq!(sessions.sessions_opened(), 2);
        assert!(launcher.events().contains(&MockEvent::Closed(0)));
        assert_eq!(launcher.launches(), 2);
    }

    #[tokio::test]
    async fn test_recreate_closes_before_pausing() {
        let launcher = Arc::new(MockLauncher::new(|_| MockDom::new()));
        let mut sessions = manager(&launcher);
        sessions.open().await.unwrap();

        let observed = launcher.clone();
        sessions
            .recreate(async move {
                assert_eq!(observed.events().last(), Some(&MockEvent::Closed(0)));
            })
            .await
            .unwrap();

        assert_eq!(launcher.launches(), 2);
        assert_eq!(sessions.sessions_opened(), 2);
    }

    #[tokio::test]
    async fn test_failed_landing_keeps_session() {
        let launcher = Arc::new(MockLauncher::new(|_| {
            MockDom::new().fail_navigation("facebook.com")
        }));
        let mut sessions = manager(&launcher);

        let result = sessions.open().await;
        assert!(matches!(result, Err(Error::Navigation(_))));
        assert!(sessions.page().is_ok());

        sessions.close().await;
        sessions.close().await;
        assert!(!sessions.is_open());
        assert!(launcher.events().contains(&MockEvent::Closed(0)));
    }
}
