//! Scripted in-memory browser for integration tests.
//!
//! The fake serves engine-shaped result pages from a per-engine script and
//! records every browser, context and navigation event, so tests can check
//! both results and resource lifetimes without any network access.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fcrawl_search::browser::{
    Browser, BrowserContext, BrowserLauncher, ContextOptions, Cookie, LaunchOptions, Page,
};
use fcrawl_search::{ExecutionMode, Result, SearchConfig, SearchEngine, SearchError};
use url::Url;

/// What one engine serves.
#[derive(Debug, Clone, Default)]
pub struct EngineScript {
    /// Result URLs per page index.
    pub pages: Vec<Vec<&'static str>>,
    /// Navigation to this page index fails with an HTTP error.
    pub fail_at_page: Option<usize>,
    /// Navigation to this page index panics.
    pub panic_at_page: Option<usize>,
}

impl EngineScript {
    pub fn pages(pages: Vec<Vec<&'static str>>) -> Self {
        Self {
            pages,
            ..Default::default()
        }
    }

    pub fn failing_at(page: usize) -> Self {
        Self {
            fail_at_page: Some(page),
            ..Default::default()
        }
    }
}

/// Something the fake browser observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Launch,
    BrowserClosed,
    ContextOpened(String),
    CookiesAdded(Vec<String>),
    ContextClosed,
    Goto(String),
}

#[derive(Default)]
struct FakeState {
    scripts: HashMap<SearchEngine, EngineScript>,
    fail_launch: bool,
    /// Zero-based launch attempt that fails; other attempts succeed.
    fail_launch_at: Option<usize>,
    events: Mutex<Vec<Event>>,
}

impl FakeState {
    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

/// Launcher for the scripted browser.
#[derive(Clone)]
pub struct FakeLauncher {
    state: Arc<FakeState>,
}

impl FakeLauncher {
    pub fn new(scripts: impl IntoIterator<Item = (SearchEngine, EngineScript)>) -> Self {
        Self {
            state: Arc::new(FakeState {
                scripts: scripts.into_iter().collect(),
                ..Default::default()
            }),
        }
    }

    /// A launcher whose browser never starts.
    pub fn failing() -> Self {
        Self {
            state: Arc::new(FakeState {
                fail_launch: true,
                ..Default::default()
            }),
        }
    }

    /// A launcher whose `attempt`-th launch (zero-based) fails.
    pub fn failing_launch_at(
        attempt: usize,
        scripts: impl IntoIterator<Item = (SearchEngine, EngineScript)>,
    ) -> Self {
        Self {
            state: Arc::new(FakeState {
                scripts: scripts.into_iter().collect(),
                fail_launch_at: Some(attempt),
                ..Default::default()
            }),
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.events.lock().unwrap().clone()
    }

    pub fn count(&self, wanted: &Event) -> usize {
        self.events().iter().filter(|e| *e == wanted).count()
    }

    /// Result-page navigations (warm-up visits excluded).
    pub fn result_page_gotos(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Goto(url) if url.contains("/search?") => Some(url),
                _ => None,
            })
            .collect()
    }

    /// Number of result pages fetched from `engine`.
    pub fn pages_fetched(&self, engine: SearchEngine) -> usize {
        self.result_page_gotos()
            .iter()
            .filter(|url| {
                Url::parse(url)
                    .ok()
                    .and_then(|u| engine_of(&u))
                    .is_some_and(|e| e == engine)
            })
            .count()
    }
}

impl BrowserLauncher for FakeLauncher {
    type Browser = FakeBrowser;

    async fn launch(&self, _options: &LaunchOptions) -> Result<FakeBrowser> {
        let attempt = self.count(&Event::Launch);
        self.state.record(Event::Launch);
        if self.state.fail_launch || self.state.fail_launch_at == Some(attempt) {
            return Err(SearchError::Browser("chromium executable not found".into()));
        }
        Ok(FakeBrowser {
            state: Arc::clone(&self.state),
        })
    }
}

#[derive(Clone)]
pub struct FakeBrowser {
    state: Arc<FakeState>,
}

impl Browser for FakeBrowser {
    type Context = FakeContext;

    async fn new_context(&self, options: &ContextOptions) -> Result<FakeContext> {
        self.state
            .record(Event::ContextOpened(options.locale_tag.clone()));
        Ok(FakeContext {
            state: Arc::clone(&self.state),
        })
    }

    async fn close(&self) -> Result<()> {
        self.state.record(Event::BrowserClosed);
        Ok(())
    }
}

#[derive(Clone)]
pub struct FakeContext {
    state: Arc<FakeState>,
}

impl BrowserContext for FakeContext {
    type Page = FakePage;

    async fn add_cookies(&self, cookies: &[Cookie]) -> Result<()> {
        self.state.record(Event::CookiesAdded(
            cookies.iter().map(|c| c.name.clone()).collect(),
        ));
        Ok(())
    }

    async fn new_page(&self) -> Result<FakePage> {
        Ok(FakePage {
            state: Arc::clone(&self.state),
            html: Mutex::new(String::new()),
        })
    }

    async fn close(&self) -> Result<()> {
        self.state.record(Event::ContextClosed);
        Ok(())
    }
}

pub struct FakePage {
    state: Arc<FakeState>,
    html: Mutex<String>,
}

impl Page for FakePage {
    async fn goto(&self, url: &str) -> Result<()> {
        self.state.record(Event::Goto(url.to_string()));
        let parsed = Url::parse(url).map_err(|e| SearchError::Navigation(e.to_string()))?;
        let html = match (engine_of(&parsed), page_index(&parsed)) {
            (Some(engine), Some(index)) => {
                let script = self.state.scripts.get(&engine).cloned().unwrap_or_default();
                if script.panic_at_page == Some(index) {
                    panic!("scripted panic on {engine} page {index}");
                }
                if script.fail_at_page == Some(index) {
                    return Err(SearchError::Navigation(format!("HTTP 503 for {url}")));
                }
                let urls = script.pages.get(index).cloned().unwrap_or_default();
                render(engine, &urls)
            }
            _ => "<html><body>home</body></html>".to_string(),
        };
        *self.html.lock().unwrap() = html;
        Ok(())
    }

    async fn content(&self) -> Result<String> {
        Ok(self.html.lock().unwrap().clone())
    }

    async fn click_if_visible(&self, _selector: &str) -> Result<bool> {
        Ok(false)
    }

    async fn wait_for_selector(&self, _selector: &str, _timeout: Duration) -> Result<bool> {
        Ok(true)
    }
}

fn engine_of(url: &Url) -> Option<SearchEngine> {
    match url.host_str()? {
        "www.google.com" => Some(SearchEngine::Google),
        "www.bing.com" => Some(SearchEngine::Bing),
        "search.brave.com" => Some(SearchEngine::Brave),
        _ => None,
    }
}

fn page_index(url: &Url) -> Option<usize> {
    if url.path() != "/search" {
        return None;
    }
    let param = |name: &str| -> Option<usize> {
        url.query_pairs()
            .find(|(k, _)| k == name)
            .and_then(|(_, v)| v.parse().ok())
    };
    match engine_of(url)? {
        SearchEngine::Google => param("start").map(|s| s / 10),
        SearchEngine::Bing => param("first").map(|f| f.saturating_sub(1) / 10),
        SearchEngine::Brave => param("offset").map(|o| o / 10),
    }
}

/// Minimal results markup in each engine's own shape.
fn render(engine: SearchEngine, urls: &[&str]) -> String {
    let items: String = urls
        .iter()
        .map(|u| match engine {
            SearchEngine::Google => format!(
                r#"<div class="g"><div data-snf="x5WNvb"><a href="{u}"><h3>Google {u}</h3></a></div><div><div class="VwiC3b">About {u}</div></div></div>"#
            ),
            SearchEngine::Bing => format!(
                r#"<li class="b_algo"><h2><a href="{u}">Bing {u}</a></h2><div class="b_caption"><p>About {u}</p></div></li>"#
            ),
            SearchEngine::Brave => format!(
                r#"<div class="snippet" data-type="web"><a href="{u}"><div class="title">Brave {u}</div></a><div class="snippet-description">About {u}</div></div>"#
            ),
        })
        .collect();
    format!("<html><body>{items}</body></html>")
}

/// Configuration without pacing delays.
pub fn fast_config(engines: Vec<SearchEngine>, mode: Option<ExecutionMode>) -> SearchConfig {
    SearchConfig {
        engines,
        mode,
        settle_delay_ms: (0, 0),
        request_delay_ms: (0, 0),
        timeout_seconds: 5,
        ..Default::default()
    }
}
