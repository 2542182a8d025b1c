//! Brave Search engine. Independent index, good quality results.
//!
//! Brave has its own crawler and index, which makes it a valuable source of
//! results that Google and Bing miss. It needs no cookie priming.

use scraper::Html;

use super::{
    absolute_http_url, accept_language_options, clean_text, first_text, selector, url_with_query,
    EngineDriver, EngineSession,
};
use crate::browser::Cookie;
use crate::error::Result;
use crate::types::{Locale, SearchEngine, SearchResult};

const RESULTS_PER_PAGE: usize = 10;

/// Brave Search driver.
pub static DRIVER: EngineDriver = EngineDriver {
    engine: SearchEngine::Brave,
    results_per_page: RESULTS_PER_PAGE,
    home_url: None,
    ready_selector: None,
    consent_selectors: &[
        "button:has-text('Accept')",
        "button:has-text('Got it')",
        "[data-action='accept']",
    ],
    search_url,
    locale_params,
    extract: parse_brave_html,
    session_options: accept_language_options,
    session_cookies,
};

fn search_url(query: &str, page: usize, _session: &EngineSession) -> String {
    let offset = (page * RESULTS_PER_PAGE).to_string();
    url_with_query(
        "https://search.brave.com/search",
        &[("q", query), ("offset", &offset)],
    )
}

fn locale_params(locale: &Locale) -> Vec<(&'static str, String)> {
    locale
        .region
        .as_ref()
        .map(|region| vec![("country", region.to_lowercase())])
        .unwrap_or_default()
}

fn session_cookies(_session: &EngineSession) -> Vec<Cookie> {
    Vec::new()
}

fn parse_brave_html(html: &str) -> Result<Vec<SearchResult>> {
    let document = Html::parse_document(html);

    let result_sel = selector("div.snippet[data-type='web']")?;
    let link_sel = selector("a[href^='http']")?;
    let link_title_sel = [selector(".title")?];
    let title_sels = [
        selector(".search-snippet-title")?,
        selector(".title")?,
        selector("h2")?,
    ];
    let snippet_sels = [
        selector(".snippet-description")?,
        selector(".generic-snippet")?,
        selector("p.snippet-content")?,
        selector(".snippet-content")?,
    ];

    let mut results = Vec::new();

    for element in document.select(&result_sel) {
        let link = match element.select(&link_sel).next() {
            Some(el) => el,
            None => continue,
        };
        let url = match link.value().attr("href").and_then(absolute_http_url) {
            Some(u) => u,
            None => continue,
        };

        let title = first_text(link, &link_title_sel)
            .or_else(|| first_text(element, &title_sels))
            .unwrap_or_else(|| clean_text(link.text()));
        let description = first_text(element, &snippet_sels).unwrap_or_default();

        results.push(SearchResult {
            title,
            url,
            description,
            engine: SearchEngine::Brave.name().to_string(),
            position: results.len() + 1,
        });
    }

    tracing::debug!(count = results.len(), "Brave results parsed");
    Ok(results)
}
