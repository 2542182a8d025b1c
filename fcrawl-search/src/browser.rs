//! Browser-automation capability set.
//!
//! The search core never talks to a particular automation product. It only
//! needs the small set of operations described by [`BrowserLauncher`],
//! [`Browser`], [`BrowserContext`] and [`Page`]. The crate ships one
//! implementation ([`crate::http_browser`]); anything else that can navigate
//! and hand back rendered HTML can be plugged in.
//!
//! Resource lifetimes are explicit: [`with_browser`] and [`with_context`]
//! acquire a browser or context, run the supplied work, and release the
//! resource on every exit path.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;

use crate::error::{Result, SearchError};

/// Options for starting a browser instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Run without a visible window.
    pub headless: bool,
    /// Browser-wide locale tag, e.g. `en-US`.
    pub locale: Option<String>,
    /// Override for the User-Agent header.
    pub user_agent: Option<String>,
}

/// Options for one isolated session inside a browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextOptions {
    /// Locale tag the session presents, e.g. `ja-JP`.
    pub locale_tag: String,
    /// Extra headers sent with every request of this session.
    pub headers: Vec<(String, String)>,
    /// Upper bound for a single navigation.
    pub navigation_timeout: Duration,
}

/// A cookie to install into a context before browsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
    /// Domain the cookie applies to, e.g. `.google.com`.
    pub domain: String,
    /// Path the cookie applies to.
    pub path: String,
}

impl Cookie {
    /// A cookie for `domain` with path `/`.
    pub fn new(name: &str, value: impl Into<String>, domain: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
            domain: domain.to_string(),
            path: "/".to_string(),
        }
    }
}

/// Starts browser instances.
pub trait BrowserLauncher: Send + Sync {
    /// The browser type this launcher produces.
    type Browser: Browser;

    /// Start a new browser.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::SessionCreation`] if the browser cannot start.
    fn launch(&self, options: &LaunchOptions) -> impl Future<Output = Result<Self::Browser>> + Send;
}

/// A running browser instance that can host isolated contexts.
///
/// Browsers are cheap handles: clones refer to the same instance.
pub trait Browser: Clone + Send + Sync {
    /// The context type this browser opens.
    type Context: BrowserContext;

    /// Open a new isolated context (own cookies and storage).
    fn new_context(
        &self,
        options: &ContextOptions,
    ) -> impl Future<Output = Result<Self::Context>> + Send;

    /// Shut the browser down.
    fn close(&self) -> impl Future<Output = Result<()>> + Send;
}

/// An isolated cookie/storage scope inside a browser.
///
/// Contexts are cheap handles: clones refer to the same session.
pub trait BrowserContext: Clone + Send + Sync {
    /// The page type this context opens.
    type Page: Page;

    /// Install cookies into this context.
    fn add_cookies(&self, cookies: &[Cookie]) -> impl Future<Output = Result<()>> + Send;

    /// Open a new page (tab) in this context.
    fn new_page(&self) -> impl Future<Output = Result<Self::Page>> + Send;

    /// Close the context and every page in it.
    fn close(&self) -> impl Future<Output = Result<()>> + Send;
}

/// One browser tab.
pub trait Page: Send + Sync {
    /// Navigate to `url` and wait for the document to load.
    fn goto(&self, url: &str) -> impl Future<Output = Result<()>> + Send;

    /// The currently rendered document as HTML.
    fn content(&self) -> impl Future<Output = Result<String>> + Send;

    /// Click the first element matching `selector` if it is visible.
    ///
    /// Returns whether a click happened.
    fn click_if_visible(&self, selector: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Wait up to `timeout` for an element matching `selector` to appear.
    ///
    /// Returns whether the element appeared.
    fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<bool>> + Send;
}

/// Launch a browser, run `work` with it, and always close it afterwards.
///
/// Launch failures are reported as [`SearchError::SessionCreation`]. A
/// failure to close is logged and does not replace the work's output. A
/// panic inside `work` closes the browser and comes back as
/// [`SearchError::Browser`].
pub async fn with_browser<L, F, Fut, T>(launcher: &L, options: &LaunchOptions, work: F) -> Result<T>
where
    L: BrowserLauncher,
    F: FnOnce(L::Browser) -> Fut,
    Fut: Future<Output = T>,
{
    let browser = launcher.launch(options).await.map_err(|e| match e {
        SearchError::SessionCreation(msg) => SearchError::SessionCreation(msg),
        other => SearchError::SessionCreation(other.to_string()),
    })?;

    let handle = browser.clone();

    let outcome = AssertUnwindSafe(async move { work(handle).await })
        .catch_unwind()
        .await;

    if let Err(err) = browser.close().await {
        tracing::warn!(error = %err, "failed to close browser");
    }

    outcome.map_err(panicked)
}

/// Open a context, run `work` with a handle to it, and always close it.
///
/// The context is closed before this function returns on every path: normal
/// completion, an error value produced by `work`, or a panic inside `work`.
/// A panic is reported as [`SearchError::Browser`] once the context is
/// closed; otherwise only a failure to open the context is an error.
pub async fn with_context<B, F, Fut, T>(browser: &B, options: &ContextOptions, work: F) -> Result<T>
where
    B: Browser,
    F: FnOnce(B::Context) -> Fut,
    Fut: Future<Output = T>,
{
    let context = browser.new_context(options).await?;
    let handle = context.clone();

    let outcome = AssertUnwindSafe(async move { work(handle).await })
        .catch_unwind()
        .await;

    if let Err(err) = context.close().await {
        tracing::warn!(error = %err, "failed to close browser context");
    }

    outcome.map_err(panicked)
}

fn panicked(payload: Box<dyn Any + Send>) -> SearchError {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    tracing::warn!(panic = %message, "browser work panicked");
    SearchError::Browser(format!("engine panicked: {message}"))
}
