//! Google search engine. Best results but aggressive bot detection.
//!
//! Google shows a consent wall in many regions and adapts results to the
//! `PREF`/`NID` cookies, so the session is warmed up on the homepage and
//! primed with locale cookies before the first results page.

use scraper::{ElementRef, Html};
use url::Url;

use super::{
    absolute_http_url, accept_language_options, clean_text, first_text, selector, url_with_query,
    EngineDriver, EngineSession,
};
use crate::browser::Cookie;
use crate::error::Result;
use crate::types::{Locale, SearchEngine, SearchResult};

const RESULTS_PER_PAGE: usize = 10;
const COOKIE_DOMAIN: &str = ".google.com";

/// Google driver.
pub static DRIVER: EngineDriver = EngineDriver {
    engine: SearchEngine::Google,
    results_per_page: RESULTS_PER_PAGE,
    home_url: Some("https://www.google.com/"),
    ready_selector: None,
    consent_selectors: &[
        "button:has-text('Accept all')",
        "button:has-text('Accept')",
        "button:has-text('I agree')",
        "[aria-label='Accept all']",
    ],
    search_url,
    locale_params,
    extract: parse_google_html,
    session_options: accept_language_options,
    session_cookies,
};

fn search_url(query: &str, page: usize, _session: &EngineSession) -> String {
    let start = (page * RESULTS_PER_PAGE).to_string();
    url_with_query(
        "https://www.google.com/search",
        &[("q", query), ("start", &start)],
    )
}

fn locale_params(locale: &Locale) -> Vec<(&'static str, String)> {
    let mut params = vec![("hl", locale.language.clone())];
    if let Some(region) = &locale.region {
        params.push(("gl", region.clone()));
    }
    params
}

fn session_cookies(session: &EngineSession) -> Vec<Cookie> {
    let language = session.language();
    let region = session.region();
    vec![
        Cookie::new("PREF", format!("hl={language}&gl={region}"), COOKIE_DOMAIN),
        Cookie::new("NID", format!("hl={language}"), COOKIE_DOMAIN),
    ]
}

/// Parse a Google results page.
///
/// Result blocks are `div[data-snf='x5WNvb']`, or `div.yuRUbf` on older
/// layouts. The snippet lives in a sibling block, so it is looked up next to
/// the container first and then in the container's parent.
fn parse_google_html(html: &str) -> Result<Vec<SearchResult>> {
    let document = Html::parse_document(html);

    let primary_sel = selector("div[data-snf='x5WNvb']")?;
    let fallback_sel = selector("div.yuRUbf")?;
    let title_sel = selector("h3")?;
    let link_sel = selector("a[href]")?;
    let snippet_sels = [selector("div.VwiC3b")?];

    let mut containers: Vec<ElementRef<'_>> = document.select(&primary_sel).collect();
    if containers.is_empty() {
        containers = document.select(&fallback_sel).collect();
    }

    let mut results = Vec::new();

    for element in containers {
        let url = match element
            .select(&link_sel)
            .next()
            .and_then(|a| a.value().attr("href"))
            .and_then(resolve_href)
        {
            Some(u) => u,
            None => continue,
        };

        let title = element
            .select(&title_sel)
            .next()
            .map(|el| clean_text(el.text()))
            .unwrap_or_default();

        let description = element
            .next_siblings()
            .find_map(ElementRef::wrap)
            .and_then(|sibling| first_text(sibling, &snippet_sels))
            .or_else(|| {
                element
                    .parent()
                    .and_then(ElementRef::wrap)
                    .and_then(|parent| first_text(parent, &snippet_sels))
            })
            .unwrap_or_default();

        results.push(SearchResult {
            title,
            url,
            description,
            engine: SearchEngine::Google.name().to_string(),
            position: results.len() + 1,
        });
    }

    tracing::debug!(count = results.len(), "Google results parsed");
    Ok(results)
}

/// Accept direct links and unwrap `/url?q=` redirect links.
fn resolve_href(href: &str) -> Option<String> {
    if let Some(url) = absolute_http_url(href) {
        return Some(url);
    }
    let base = Url::parse("https://www.google.com/").ok()?;
    let joined = base.join(href.trim()).ok()?;
    if joined.path() != "/url" {
        return None;
    }
    joined
        .query_pairs()
        .find(|(k, _)| k == "q" || k == "url")
        .and_then(|(_, v)| absolute_http_url(&v))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOCK_GOOGLE_HTML: &str = r#"<!DOCTYPE html>
<html>
<body>
<div id="rso">
  <div class="g">
    <div data-snf="x5WNvb">
      <a href="https://www.rust-lang.org/"><h3>Rust Programming Language</h3></a>
    </div>
    <div data-snf="nke7rc"><div class="VwiC3b">A language empowering
      everyone to build reliable and efficient software.</div></div>
  </div>
  <div class="g">
    <div data-snf="x5WNvb">
      <a href="/url?q=https://doc.rust-lang.org/book/&amp;sa=U"><h3>The Rust Book</h3></a>
    </div>
    <div data-snf="nke7rc"><div class="VwiC3b">An introductory book about Rust.</div></div>
  </div>
  <div class="g">
    <div data-snf="x5WNvb">
      <a href="/search?q=related"><h3>Related searches</h3></a>
    </div>
  </div>
  <div class="g">
    <div data-snf="x5WNvb">
      <a href="https://en.wikipedia.org/wiki/Rust_(programming_language)"><h3>Rust - Wikipedia</h3></a>
    </div>
  </div>
</div>
</body>
</html>"#;

    const MOCK_LEGACY_HTML: &str = r#"<html><body>
<div class="g">
  <div class="yuRUbf"><a href="https://crates.io/"><h3>crates.io</h3></a></div>
  <div class="VwiC3b">The Rust community's crate registry.</div>
</div>
</body></html>"#;

    #[test]
    fn parse_mock_html_returns_results() {
        let results = parse_google_html(MOCK_GOOGLE_HTML).expect("should parse");
        assert_eq!(results.len(), 3);

        assert_eq!(results[0].title, "Rust Programming Language");
        assert_eq!(results[0].url, "https://www.rust-lang.org/");
        assert_eq!(
            results[0].description,
            "A language empowering everyone to build reliable and efficient software."
        );
        assert_eq!(results[0].engine, "google");
        assert_eq!(results[0].position, 1);

        assert_eq!(results[1].url, "https://doc.rust-lang.org/book/");
        assert_eq!(results[1].position, 2);

        assert!(results[2].url.contains("wikipedia.org"));
        assert!(results[2].description.is_empty());
        assert_eq!(results[2].position, 3);
    }

    #[test]
    fn parse_falls_back_to_legacy_containers() {
        let results = parse_google_html(MOCK_LEGACY_HTML).expect("should parse");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].url, "https://crates.io/");
        assert_eq!(results[0].description, "The Rust community's crate registry.");
    }

    #[test]
    fn parse_empty_html_returns_empty() {
        let results = parse_google_html("<html><body></body></html>").expect("should parse");
        assert!(results.is_empty());
    }

    #[test]
    fn search_url_pages_by_ten() {
        let session = EngineSession::new(None);
        assert_eq!(
            search_url("rust", 0, &session),
            "https://www.google.com/search?q=rust&start=0"
        );
        assert_eq!(
            search_url("rust", 2, &session),
            "https://www.google.com/search?q=rust&start=20"
        );
    }

    #[test]
    fn locale_params_include_region_when_present() {
        let locale: Locale = "de-DE".parse().expect("locale");
        assert_eq!(
            locale_params(&locale),
            vec![("hl", "de".to_string()), ("gl", "DE".to_string())]
        );
        let bare: Locale = "fr".parse().expect("locale");
        assert_eq!(locale_params(&bare), vec![("hl", "fr".to_string())]);
    }

    #[test]
    fn cookies_carry_locale() {
        let session = EngineSession::new(Some("ja-JP".parse().expect("locale")));
        let cookies = session_cookies(&session);
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies[0].name, "PREF");
        assert_eq!(cookies[0].value, "hl=ja&gl=JP");
        assert_eq!(cookies[1].value, "hl=ja");
        assert!(cookies.iter().all(|c| c.domain == ".google.com"));
    }

    #[test]
    fn resolve_href_rejects_internal_links() {
        assert!(resolve_href("/search?q=more").is_none());
        assert!(resolve_href("#").is_none());
        assert_eq!(
            resolve_href("/url?url=https://example.com/x&sa=U"),
            Some("https://example.com/x".to_string())
        );
    }
}
