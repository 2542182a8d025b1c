//! Bing search engine. Decent fallback with Microsoft's index.
//!
//! Bing only returns stable, locale-correct results when the session carries
//! its market cookies and a conversation id (`cvid`) that also appears in
//! every results URL. Result links are often wrapped in `bing.com/ck/a`
//! redirects whose `u` parameter holds the base64-encoded target.

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use scraper::Html;
use url::Url;

use super::{
    absolute_http_url, accept_language_options, clean_text, first_text, selector, url_with_query,
    EngineDriver, EngineSession,
};
use crate::browser::Cookie;
use crate::error::Result;
use crate::types::{Locale, SearchEngine, SearchResult};

const RESULTS_PER_PAGE: usize = 10;
const COOKIE_DOMAIN: &str = ".bing.com";

/// Bing driver.
pub static DRIVER: EngineDriver = EngineDriver {
    engine: SearchEngine::Bing,
    results_per_page: RESULTS_PER_PAGE,
    home_url: Some("https://www.bing.com/"),
    ready_selector: Some("li.b_algo"),
    consent_selectors: &[
        "button#bnp_btn_accept",
        "button:has-text('Accept')",
        "button:has-text('Agree')",
        "#bnp_container button",
    ],
    search_url,
    locale_params,
    extract: parse_bing_html,
    session_options: accept_language_options,
    session_cookies,
};

fn search_url(query: &str, page: usize, session: &EngineSession) -> String {
    let first = (page * RESULTS_PER_PAGE + 1).to_string();
    url_with_query(
        "https://www.bing.com/search",
        &[
            ("q", query),
            ("pq", query),
            ("cvid", &session.conversation_id),
            ("first", &first),
            ("filters", "rcrse:\"1\""),
            ("FORM", "PERE"),
            ("ghc", "1"),
            ("lq", "0"),
            ("qs", "n"),
            ("sk", ""),
            ("sp", "-1"),
        ],
    )
}

fn locale_params(locale: &Locale) -> Vec<(&'static str, String)> {
    let mut params = vec![("setlang", interface_language(locale)), ("mkt", locale.tag())];
    if let Some(region) = &locale.region {
        params.push(("cc", region.clone()));
    }
    params
}

/// Bing wants script-qualified codes for Chinese.
fn interface_language(locale: &Locale) -> String {
    if locale.language == "zh" {
        match locale.region.as_deref().map(str::to_ascii_lowercase).as_deref() {
            Some("hans" | "cn") => return "zh-cn".to_string(),
            Some("hant" | "tw" | "hk") => return "zh-tw".to_string(),
            _ => {}
        }
    }
    locale.language.clone()
}

fn session_cookies(session: &EngineSession) -> Vec<Cookie> {
    let language = session.language();
    let market = session.tag();
    vec![
        Cookie::new("_EDGE_S", format!("mkt={market}&ui={language}"), COOKIE_DOMAIN),
        Cookie::new(
            "SRCHHPGUSR",
            format!(
                "SRCHLANG={language}&IG={}&SRCHMKT={market}",
                session.conversation_id
            ),
            COOKIE_DOMAIN,
        ),
        Cookie::new("_EDGE_CD", format!("m={market}&u={language}"), COOKIE_DOMAIN),
    ]
}

/// Parse a Bing results page.
///
/// Organic results are `li.b_algo` blocks with the title link in `h2 a`.
fn parse_bing_html(html: &str) -> Result<Vec<SearchResult>> {
    let document = Html::parse_document(html);

    let result_sel = selector("li.b_algo")?;
    let link_sel = selector("h2 a")?;
    let snippet_sels = [
        selector("div.b_caption p")?,
        selector("p.b_lineclamp2")?,
        selector("p.b_algoSlug")?,
        selector("div.b_caption")?,
    ];

    let mut results = Vec::new();

    for element in document.select(&result_sel) {
        let link = match element.select(&link_sel).next() {
            Some(el) => el,
            None => continue,
        };

        let url = match link
            .value()
            .attr("href")
            .map(decode_redirect)
            .and_then(|u| absolute_http_url(&u))
        {
            Some(u) => u,
            None => continue,
        };

        let title = clean_text(link.text());
        let description = first_text(element, &snippet_sels).unwrap_or_default();

        results.push(SearchResult {
            title,
            url,
            description,
            engine: SearchEngine::Bing.name().to_string(),
            position: results.len() + 1,
        });
    }

    tracing::debug!(count = results.len(), "Bing results parsed");
    Ok(results)
}

/// Unwrap a `bing.com/ck/a` redirect link.
///
/// The target sits in the `u` parameter as `a1` followed by base64 (URL-safe
/// or standard alphabet, padding optional). Anything that does not decode to
/// UTF-8 leaves the link unchanged.
fn decode_redirect(href: &str) -> String {
    if !href.contains("bing.com/ck/a") {
        return href.to_string();
    }
    let encoded = Url::parse(href).ok().and_then(|url| {
        url.query_pairs()
            .find(|(k, _)| k == "u")
            .map(|(_, v)| v.into_owned())
    });
    let Some(encoded) = encoded else {
        return href.to_string();
    };
    let payload = encoded.strip_prefix("a1").unwrap_or(&encoded).trim_end_matches('=');
    URL_SAFE_NO_PAD
        .decode(payload)
        .or_else(|_| STANDARD_NO_PAD.decode(payload))
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| href.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOCK_BING_HTML: &str = r#"<!DOCTYPE html>
<html>
<body>
<ol id="b_results">
<li class="b_algo">
  <h2><a href="https://www.rust-lang.org/" h="ID=SERP">Rust Programming Language</a></h2>
  <div class="b_caption"><p>A language empowering everyone to build reliable and efficient software.</p></div>
</li>
<li class="b_algo">
  <h2><a href="https://www.bing.com/ck/a?!&amp;&amp;p=abc&amp;u=a1aHR0cHM6Ly9kb2MucnVzdC1sYW5nLm9yZy9ib29rLw&amp;ntb=1">The Rust Programming Language Book</a></h2>
  <p class="b_lineclamp2">An introductory book about Rust.</p>
</li>
<li class="b_algo">
  <h2>No link here</h2>
</li>
<li class="b_algo">
  <h2><a href="https://en.wikipedia.org/wiki/Rust_(programming_language)" h="ID=SERP">Rust (programming language) - Wikipedia</a></h2>
  <div class="b_caption"><div class="b_attribution">en.wikipedia.org</div></div>
</li>
</ol>
</body>
</html>"#;

    #[test]
    fn parse_mock_html_returns_results() {
        let results = parse_bing_html(MOCK_BING_HTML).expect("should parse");
        assert_eq!(results.len(), 3);

        assert_eq!(results[0].title, "Rust Programming Language");
        assert_eq!(results[0].url, "https://www.rust-lang.org/");
        assert!(results[0]
            .description
            .contains("reliable and efficient software"));
        assert_eq!(results[0].engine, "bing");
        assert_eq!(results[0].position, 1);

        assert_eq!(results[1].url, "https://doc.rust-lang.org/book/");
        assert_eq!(results[1].description, "An introductory book about Rust.");

        assert!(results[2].url.contains("wikipedia.org"));
        assert_eq!(results[2].description, "en.wikipedia.org");
        assert_eq!(results[2].position, 3);
    }

    #[test]
    fn parse_empty_html_returns_empty() {
        let results = parse_bing_html("<html><body></body></html>").expect("should parse");
        assert!(results.is_empty());
    }

    #[test]
    fn decode_redirect_handles_both_alphabets() {
        // "https://example.com/?a=1" in URL-safe base64, unpadded
        let wrapped = "https://www.bing.com/ck/a?u=a1aHR0cHM6Ly9leGFtcGxlLmNvbS8_YT0x";
        assert_eq!(decode_redirect(wrapped), "https://example.com/?a=1");

        let padded = "https://www.bing.com/ck/a?u=a1aHR0cHM6Ly9leGFtcGxlLmNvbQ==";
        assert_eq!(decode_redirect(padded), "https://example.com");
    }

    #[test]
    fn decode_redirect_leaves_other_links_alone() {
        assert_eq!(decode_redirect("https://example.com/"), "https://example.com/");
        let garbage = "https://www.bing.com/ck/a?u=a1%%%";
        assert_eq!(decode_redirect(garbage), garbage);
    }

    #[test]
    fn search_url_carries_conversation_id() {
        let session = EngineSession {
            locale: None,
            conversation_id: "ABCDEF0123456789ABCDEF0123456789".into(),
        };
        let url = search_url("rust", 1, &session);
        assert!(url.starts_with("https://www.bing.com/search?q=rust&pq=rust&"));
        assert!(url.contains("cvid=ABCDEF0123456789ABCDEF0123456789"));
        assert!(url.contains("first=11"));
        assert!(url.contains("FORM=PERE"));
    }

    #[test]
    fn chinese_locales_map_to_script_codes() {
        let hans: Locale = "zh-Hans".parse().expect("locale");
        assert_eq!(interface_language(&hans), "zh-cn");
        let tw: Locale = "zh-TW".parse().expect("locale");
        assert_eq!(interface_language(&tw), "zh-tw");
        let hk: Locale = "zh_HK".parse().expect("locale");
        assert_eq!(interface_language(&hk), "zh-tw");
        let ja: Locale = "ja-JP".parse().expect("locale");
        assert_eq!(interface_language(&ja), "ja");
    }

    #[test]
    fn locale_params_include_market_and_country() {
        let locale: Locale = "ja-JP".parse().expect("locale");
        assert_eq!(
            locale_params(&locale),
            vec![
                ("setlang", "ja".to_string()),
                ("mkt", "ja-JP".to_string()),
                ("cc", "JP".to_string()),
            ]
        );
    }

    #[test]
    fn cookies_embed_market_and_conversation_id() {
        let session = EngineSession {
            locale: Some("ja-JP".parse().expect("locale")),
            conversation_id: "C0FFEE".into(),
        };
        let cookies = session_cookies(&session);
        let names: Vec<&str> = cookies.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["_EDGE_S", "SRCHHPGUSR", "_EDGE_CD"]);
        assert_eq!(cookies[0].value, "mkt=ja-JP&ui=ja");
        assert_eq!(cookies[1].value, "SRCHLANG=ja&IG=C0FFEE&SRCHMKT=ja-JP");
        assert_eq!(cookies[2].value, "m=ja-JP&u=ja");
        assert!(cookies.iter().all(|c| c.domain == ".bing.com"));
    }
}
