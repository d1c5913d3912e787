//! Browser context implementation
//!
//! Each launch attaches a fresh CDP browser controller and creates its own
//! isolated browser context, so cookies and storage never leak between
//! sessions.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::cdp::browser::CdpBrowserImpl;
use crate::cdp::traits::CdpBrowser;
use crate::cdp::types::CookieParam;
use crate::input::Cookie;
use crate::session::page::PageContextImpl;
use crate::session::traits::{BrowserContext, BrowserLauncher, PageContext};
use crate::Error;

/// Launches sessions against a Chrome started with remote debugging
#[derive(Debug, Clone)]
pub struct CdpLauncher {
    endpoint: String,
}

impl CdpLauncher {
    pub fn new<S: Into<String>>(endpoint: S) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl BrowserLauncher for CdpLauncher {
    async fn launch(&self) -> Result<Arc<dyn BrowserContext>, Error> {
        attach(Arc::new(CdpBrowserImpl::new(self.endpoint.clone()))).await
    }
}

/// Open a context in `browser`; the browser is closed when that fails
async fn attach(browser: Arc<dyn CdpBrowser>) -> Result<Arc<dyn BrowserContext>, Error> {
    match BrowserContextImpl::open(Arc::clone(&browser)).await {
        Ok(context) => Ok(Arc::new(context)),
        Err(e) => {
            if let Err(close_err) = browser.close().await {
                warn!("Failed to close browser after launch error: {}", close_err);
            }
            Err(e)
        }
    }
}

/// Browser context implementation
#[derive(Debug)]
pub struct BrowserContextImpl {
    id: String,
    cdp_browser: Arc<dyn CdpBrowser>,
    pages: Mutex<Vec<Arc<dyn PageContext>>>,
    is_active: AtomicBool,
}

impl BrowserContextImpl {
    /// Create an isolated context in `cdp_browser`
    pub async fn open(cdp_browser: Arc<dyn CdpBrowser>) -> Result<Self, Error> {
        let id = cdp_browser.create_browser_context().await?;
        info!("Opened browser context {}", id);

        Ok(Self {
            id,
            cdp_browser,
            pages: Mutex::new(Vec::new()),
            is_active: AtomicBool::new(true),
        })
    }

    fn ensure_active(&self) -> Result<(), Error> {
        if self.is_active() {
            Ok(())
        } else {
            Err(Error::session_closed(format!("browser context {}", self.id)))
        }
    }
}

/// CDP form of a loaded cookie
pub(crate) fn cookie_param(cookie: &Cookie) -> CookieParam {
    CookieParam {
        name: cookie.name.clone(),
        value: cookie.value.clone(),
        domain: cookie.domain.clone(),
        path: cookie.path.clone(),
        secure: cookie.secure,
        http_only: cookie.http_only,
        same_site: cookie.same_site.as_str().to_string(),
        expires: cookie.expires,
    }
}

#[async_trait]
impl BrowserContext for BrowserContextImpl {
    fn id(&self) -> &str {
        &self.id
    }

    async fn add_cookies(&self, cookies: &[Cookie]) -> Result<(), Error> {
        self.ensure_active()?;
        let params: Vec<CookieParam> = cookies.iter().map(cookie_param).collect();
        self.cdp_browser.set_cookies(&self.id, &params).await
    }

    async fn new_page(&self) -> Result<Arc<dyn PageContext>, Error> {
        self.ensure_active()?;

        let ws_url = self
            .cdp_browser
            .create_target("about:blank", Some(&self.id))
            .await?;
        let cdp_client = self.cdp_browser.create_client(&ws_url).await?;

        let page: Arc<dyn PageContext> = Arc::new(PageContextImpl::new(cdp_client));
        self.pages.lock().await.push(Arc::clone(&page));
        Ok(page)
    }

    async fn close(&self) -> Result<(), Error> {
        if !self.is_active.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        for page in self.pages.lock().await.drain(..) {
            if let Err(e) = page.close().await {
                warn!("Failed to close page {}: {}", page.id(), e);
            }
        }

        if let Err(e) = self.cdp_browser.dispose_browser_context(&self.id).await {
            warn!("Failed to dispose browser context {}: {}", self.id, e);
        }
        self.cdp_browser.close().await?;

        info!("Closed browser context {}", self.id);
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.is_active.load(Ordering::SeqCst)
    }
}
