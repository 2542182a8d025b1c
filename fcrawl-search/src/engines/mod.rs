//! Search engine drivers.
//!
//! Each engine is described by one [`EngineDriver`] value: a handful of
//! constants plus plain functions for URL building, result extraction and
//! session priming. Drivers live in [`REGISTRY`]; adding an engine means
//! adding a module with a `DRIVER` static and listing it there.

pub mod bing;
pub mod brave;
pub mod google;

use scraper::{ElementRef, Selector};
use url::form_urlencoded;
use url::Url;

use crate::browser::{BrowserContext, ContextOptions, Cookie, Page};
use crate::error::{Result, SearchError};
use crate::types::{Locale, SearchEngine, SearchResult};

use std::time::Duration;

/// Every registered driver, in declaration order of [`SearchEngine`].
pub static REGISTRY: &[&EngineDriver] = &[&google::DRIVER, &bing::DRIVER, &brave::DRIVER];

/// Per-engine session state, created fresh for every browser context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSession {
    /// Locale requested for this search, if any.
    pub locale: Option<Locale>,
    /// Random 32-character uppercase hex id (Bing's `cvid`).
    pub conversation_id: String,
}

impl EngineSession {
    /// A new session with a freshly generated conversation id.
    pub fn new(locale: Option<Locale>) -> Self {
        Self {
            locale,
            conversation_id: generate_conversation_id(),
        }
    }

    /// Language code, defaulting to `en`.
    pub fn language(&self) -> &str {
        self.locale.as_ref().map_or("en", |l| l.language.as_str())
    }

    /// Region code, defaulting to `US`.
    pub fn region(&self) -> &str {
        self.locale
            .as_ref()
            .and_then(|l| l.region.as_deref())
            .unwrap_or("US")
    }

    /// Full locale tag, defaulting to `en-US`.
    pub fn tag(&self) -> String {
        self.locale
            .as_ref()
            .map_or_else(|| "en-US".to_string(), Locale::tag)
    }
}

/// Locale tag and headers an engine wants on its browser context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Locale tag presented by the context.
    pub locale_tag: String,
    /// Extra request headers.
    pub headers: Vec<(String, String)>,
}

impl SessionOptions {
    /// Combine with a navigation timeout into full context options.
    pub fn into_context_options(self, navigation_timeout: Duration) -> ContextOptions {
        ContextOptions {
            locale_tag: self.locale_tag,
            headers: self.headers,
            navigation_timeout,
        }
    }
}

/// Everything the paginator needs to know about one engine.
///
/// Selectors in `ready_selector` and `consent_selectors` are handed to the
/// browser layer verbatim.
#[derive(Debug)]
pub struct EngineDriver {
    /// Which engine this driver scrapes.
    pub engine: SearchEngine,
    /// Organic results the engine shows per page.
    pub results_per_page: usize,
    /// Page visited once before pagination to warm up the session.
    pub home_url: Option<&'static str>,
    /// Element to wait for after each navigation (results rendered by JS).
    pub ready_selector: Option<&'static str>,
    /// Consent/cookie-wall buttons, tried in order.
    pub consent_selectors: &'static [&'static str],
    /// Results-page URL for a 0-based page index, without locale parameters.
    pub search_url: fn(query: &str, page: usize, session: &EngineSession) -> String,
    /// Extra query parameters for a locale.
    pub locale_params: fn(locale: &Locale) -> Vec<(&'static str, String)>,
    /// Parse a rendered results page.
    pub extract: fn(html: &str) -> Result<Vec<SearchResult>>,
    /// Headers and locale tag for this engine's context.
    pub session_options: fn(locale: Option<&Locale>) -> SessionOptions,
    /// Cookies installed into a fresh context.
    pub session_cookies: fn(session: &EngineSession) -> Vec<Cookie>,
}

impl EngineDriver {
    /// Full results-page URL for `page` (0-based), locale parameters included.
    pub fn build_search_url(&self, query: &str, page: usize, session: &EngineSession) -> String {
        let mut url = (self.search_url)(query, page, session);
        if let Some(locale) = &session.locale {
            let params = (self.locale_params)(locale);
            if !params.is_empty() {
                let mut serializer = form_urlencoded::Serializer::new(String::new());
                for (key, value) in &params {
                    serializer.append_pair(key, value);
                }
                url.push(if url.contains('?') { '&' } else { '?' });
                url.push_str(&serializer.finish());
            }
        }
        url
    }

    /// Parse a rendered results page into results numbered from 1.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Extraction`] only if the page cannot be
    /// examined at all; malformed individual results are skipped.
    pub fn extract_results(&self, html: &str) -> Result<Vec<SearchResult>> {
        (self.extract)(html)
    }

    /// Context options for this engine.
    pub fn session_options(&self, locale: Option<&Locale>) -> SessionOptions {
        (self.session_options)(locale)
    }

    /// Install this engine's cookies into `context`.
    ///
    /// # Errors
    ///
    /// Propagates the context's cookie error.
    pub async fn prime_session<C: BrowserContext>(
        &self,
        context: &C,
        session: &EngineSession,
    ) -> Result<()> {
        let cookies = (self.session_cookies)(session);
        if cookies.is_empty() {
            return Ok(());
        }
        tracing::trace!(engine = %self.engine, count = cookies.len(), "priming session cookies");
        context.add_cookies(&cookies).await
    }

    /// Best-effort dismissal of a consent interstitial.
    ///
    /// Clicks the first visible consent button. Failures are ignored.
    pub async fn handle_consent<P: Page>(&self, page: &P) {
        for selector in self.consent_selectors {
            match page.click_if_visible(selector).await {
                Ok(true) => {
                    tracing::debug!(engine = %self.engine, selector, "dismissed consent popup");
                    return;
                }
                Ok(false) => {}
                Err(err) => {
                    tracing::trace!(engine = %self.engine, selector, error = %err, "consent click failed");
                }
            }
        }
    }
}

/// Look up the driver for an engine.
///
/// [`REGISTRY`] is indexed by variant; it lists drivers in declaration order
/// of [`SearchEngine`].
pub fn driver(engine: SearchEngine) -> &'static EngineDriver {
    REGISTRY[engine as usize]
}

impl SearchEngine {
    /// The registered driver for this engine.
    pub fn driver(&self) -> &'static EngineDriver {
        driver(*self)
    }
}

/// `Accept-Language` priming shared by all engines.
pub(crate) fn accept_language_options(locale: Option<&Locale>) -> SessionOptions {
    let tag = locale.map_or_else(|| "en-US".to_string(), Locale::tag);
    let language = locale.map_or("en", |l| l.language.as_str());
    SessionOptions {
        headers: vec![(
            "Accept-Language".to_string(),
            format!("{tag},{language};q=0.9,en;q=0.8"),
        )],
        locale_tag: tag,
    }
}

/// Form-encode `pairs` behind `base`.
pub(crate) fn url_with_query(base: &str, pairs: &[(&str, &str)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    format!("{base}?{}", serializer.finish())
}

pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| SearchError::Extraction(format!("invalid selector {css:?}: {e:?}")))
}

/// Join text nodes and collapse runs of whitespace.
pub(crate) fn clean_text<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of the first match among `selectors` that is not empty.
pub(crate) fn first_text(element: ElementRef<'_>, selectors: &[Selector]) -> Option<String> {
    selectors.iter().find_map(|sel| {
        element
            .select(sel)
            .next()
            .map(|el| clean_text(el.text()))
            .filter(|text| !text.is_empty())
    })
}

/// Accept only absolute HTTP(S) URLs.
pub(crate) fn absolute_http_url(href: &str) -> Option<String> {
    let href = href.trim();
    let parsed = Url::parse(href).ok()?;
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Some(href.to_string()),
        _ => None,
    }
}

fn generate_conversation_id() -> String {
    let bytes: [u8; 16] = rand::random();
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}
