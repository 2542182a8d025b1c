//! Static-HTML browser built on [`reqwest`].
//!
//! Implements the [`crate::browser`] capability set without a JavaScript
//! engine: every context is its own [`reqwest::Client`] with a private cookie
//! jar, locale headers and a realistic, rotating User-Agent. Navigation is a
//! plain GET and the "rendered" document is the response body. There is
//! nothing to click, so consent handling is a no-op.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::seq::SliceRandom;
use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use scraper::{Html, Selector};
use url::Url;

use crate::browser::{Browser, BrowserContext, BrowserLauncher, ContextOptions, Cookie, LaunchOptions, Page};
use crate::error::{Result, SearchError};

/// Realistic browser User-Agent strings, rotated per browser launch.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:135.0) Gecko/20100101 Firefox/135.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:135.0) Gecko/20100101 Firefox/135.0",
];

/// Select a random User-Agent string from the rotation list.
pub fn random_user_agent() -> &'static str {
    let mut rng = rand::thread_rng();
    USER_AGENTS
        .choose(&mut rng)
        .copied()
        // SAFETY: USER_AGENTS is a non-empty const array, choose only returns None on empty slices
        .unwrap_or(USER_AGENTS[0])
}

/// Launches [`HttpBrowser`] instances. Launching never touches the network.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpLauncher;

impl BrowserLauncher for HttpLauncher {
    type Browser = HttpBrowser;

    async fn launch(&self, options: &LaunchOptions) -> Result<HttpBrowser> {
        if !options.headless {
            tracing::debug!("static HTML browser has no window, running headless");
        }
        let user_agent = match options.user_agent {
            Some(ref custom) => custom.clone(),
            None => random_user_agent().to_owned(),
        };
        HeaderValue::from_str(&user_agent)
            .map_err(|e| SearchError::SessionCreation(format!("invalid User-Agent: {e}")))?;
        Ok(HttpBrowser {
            user_agent,
            closed: Arc::new(AtomicBool::new(false)),
        })
    }
}

/// A browser handle whose contexts are independent HTTP clients.
#[derive(Debug, Clone)]
pub struct HttpBrowser {
    user_agent: String,
    closed: Arc<AtomicBool>,
}

impl HttpBrowser {
    /// The User-Agent every context of this browser sends.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

impl Browser for HttpBrowser {
    type Context = HttpContext;

    async fn new_context(&self, options: &ContextOptions) -> Result<HttpContext> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SearchError::Browser("browser is closed".into()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml"),
        );
        for (name, value) in &options.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| SearchError::Browser(format!("invalid header name {name:?}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| SearchError::Browser(format!("invalid header value {value:?}: {e}")))?;
            headers.insert(name, value);
        }

        let jar = Arc::new(Jar::default());
        let client = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .default_headers(headers)
            .timeout(options.navigation_timeout)
            .user_agent(self.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| SearchError::Browser(format!("failed to build HTTP client: {e}")))?;

        tracing::trace!(locale = %options.locale_tag, "opened HTTP context");

        Ok(HttpContext {
            client,
            jar,
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// One isolated HTTP session: its own client, cookie jar and headers.
#[derive(Debug, Clone)]
pub struct HttpContext {
    client: reqwest::Client,
    jar: Arc<Jar>,
    closed: Arc<AtomicBool>,
}

impl HttpContext {
    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SearchError::Browser("context is closed".into()));
        }
        Ok(())
    }
}

impl BrowserContext for HttpContext {
    type Page = HttpPage;

    async fn add_cookies(&self, cookies: &[Cookie]) -> Result<()> {
        self.ensure_open()?;
        for cookie in cookies {
            let host = cookie.domain.trim_start_matches('.');
            let origin = Url::parse(&format!("https://{host}{}", cookie.path))
                .map_err(|e| SearchError::Browser(format!("invalid cookie domain {host:?}: {e}")))?;
            let header = format!(
                "{}={}; Domain={}; Path={}",
                cookie.name, cookie.value, cookie.domain, cookie.path
            );
            self.jar.add_cookie_str(&header, &origin);
        }
        Ok(())
    }

    async fn new_page(&self) -> Result<HttpPage> {
        self.ensure_open()?;
        Ok(HttpPage {
            client: self.client.clone(),
            document: Arc::new(Mutex::new(None)),
            closed: Arc::clone(&self.closed),
        })
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// A tab holding the body of the last successful navigation.
#[derive(Debug)]
pub struct HttpPage {
    client: reqwest::Client,
    document: Arc<Mutex<Option<String>>>,
    closed: Arc<AtomicBool>,
}

impl HttpPage {
    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SearchError::Browser("page belongs to a closed context".into()));
        }
        Ok(())
    }

    fn set_document(&self, html: String) -> Result<()> {
        let mut guard = self
            .document
            .lock()
            .map_err(|_| SearchError::Browser("page state poisoned".into()))?;
        *guard = Some(html);
        Ok(())
    }

    fn document(&self) -> Result<String> {
        let guard = self
            .document
            .lock()
            .map_err(|_| SearchError::Browser("page state poisoned".into()))?;
        guard
            .clone()
            .ok_or_else(|| SearchError::Browser("no document loaded".into()))
    }
}

impl Page for HttpPage {
    async fn goto(&self, url: &str) -> Result<()> {
        self.ensure_open()?;
        tracing::trace!(url, "HTTP navigation");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SearchError::Timeout(format!("{url}: {e}"))
                } else {
                    SearchError::Navigation(format!("request to {url} failed: {e}"))
                }
            })?
            .error_for_status()
            .map_err(|e| SearchError::Navigation(format!("{url} returned an error status: {e}")))?;

        let html = response
            .text()
            .await
            .map_err(|e| SearchError::Navigation(format!("reading {url} failed: {e}")))?;

        tracing::trace!(bytes = html.len(), "HTTP response received");
        self.set_document(html)
    }

    async fn content(&self) -> Result<String> {
        self.ensure_open()?;
        self.document()
    }

    async fn click_if_visible(&self, _selector: &str) -> Result<bool> {
        self.ensure_open()?;
        Ok(false)
    }

    async fn wait_for_selector(&self, selector: &str, _timeout: Duration) -> Result<bool> {
        self.ensure_open()?;
        let selector = Selector::parse(selector)
            .map_err(|e| SearchError::Browser(format!("invalid selector {selector:?}: {e:?}")))?;
        let html = self.document()?;
        let document = Html::parse_document(&html);
        let found = document.select(&selector).next().is_some();
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context_options() -> ContextOptions {
        ContextOptions {
            locale_tag: "ja-JP".into(),
            headers: vec![("Accept-Language".into(), "ja-JP,ja;q=0.9,en;q=0.8".into())],
            navigation_timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn random_user_agent_returns_valid_ua() {
        let ua = random_user_agent();
        assert!(USER_AGENTS.contains(&ua));
        assert!(ua.contains("Mozilla/5.0"));
    }

    #[tokio::test]
    async fn launch_uses_custom_user_agent() {
        let options = LaunchOptions {
            headless: true,
            locale: None,
            user_agent: Some("CustomBot/1.0".into()),
        };
        let browser = HttpLauncher.launch(&options).await.expect("launch");
        assert_eq!(browser.user_agent(), "CustomBot/1.0");
    }

    #[tokio::test]
    async fn launch_rejects_unencodable_user_agent() {
        let options = LaunchOptions {
            headless: true,
            locale: None,
            user_agent: Some("bad\nagent".into()),
        };
        let result = HttpLauncher.launch(&options).await;
        assert!(matches!(result, Err(SearchError::SessionCreation(_))));
    }

    #[tokio::test]
    async fn context_accepts_locale_headers_and_cookies() {
        let browser = HttpLauncher
            .launch(&LaunchOptions::default())
            .await
            .expect("launch");
        let context = browser
            .new_context(&context_options())
            .await
            .expect("context");
        let cookies = [Cookie::new("PREF", "hl=ja&gl=JP", ".google.com")];
        assert!(context.add_cookies(&cookies).await.is_ok());
    }

    #[tokio::test]
    async fn invalid_header_rejected() {
        let browser = HttpLauncher
            .launch(&LaunchOptions::default())
            .await
            .expect("launch");
        let options = ContextOptions {
            headers: vec![("bad header".into(), "x".into())],
            ..context_options()
        };
        assert!(browser.new_context(&options).await.is_err());
    }

    #[tokio::test]
    async fn closed_context_refuses_new_pages() {
        let browser = HttpLauncher
            .launch(&LaunchOptions::default())
            .await
            .expect("launch");
        let context = browser
            .new_context(&context_options())
            .await
            .expect("context");
        let page = context.new_page().await.expect("page");
        context.close().await.expect("close");

        assert!(context.new_page().await.is_err());
        assert!(page.content().await.is_err());
    }

    #[tokio::test]
    async fn closed_browser_refuses_new_contexts() {
        let browser = HttpLauncher
            .launch(&LaunchOptions::default())
            .await
            .expect("launch");
        browser.close().await.expect("close");
        assert!(browser.new_context(&context_options()).await.is_err());
    }

    #[tokio::test]
    async fn wait_for_selector_inspects_current_document() {
        let browser = HttpLauncher
            .launch(&LaunchOptions::default())
            .await
            .expect("launch");
        let context = browser
            .new_context(&context_options())
            .await
            .expect("context");
        let page = context.new_page().await.expect("page");

        assert!(page.content().await.is_err());

        page.set_document(r#"<ol><li class="b_algo">x</li></ol>"#.into())
            .expect("set document");
        let found = page
            .wait_for_selector("li.b_algo", Duration::from_secs(1))
            .await
            .expect("selector");
        assert!(found);
        let missing = page
            .wait_for_selector("div.yuRUbf", Duration::from_secs(1))
            .await
            .expect("selector");
        assert!(!missing);
        assert!(!page.click_if_visible("button").await.expect("click"));
    }

    #[tokio::test]
    #[ignore] // Live test: run with `cargo test -- --ignored`
    async fn live_navigation_loads_document() {
        let browser = HttpLauncher
            .launch(&LaunchOptions::default())
            .await
            .expect("launch");
        let context = browser
            .new_context(&context_options())
            .await
            .expect("context");
        let page = context.new_page().await.expect("page");
        page.goto("https://example.com/").await.expect("navigate");
        let html = page.content().await.expect("content");
        assert!(html.contains("Example Domain"));
    }
}
