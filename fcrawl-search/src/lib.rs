//! # fcrawl-search
//!
//! Multi-engine web search through browser sessions.
//!
//! Given a query, this crate drives several search-engine scrapers (Google,
//! Bing, Brave) through a browser-automation capability set, collects
//! paginated results per engine, and merges them into a single
//! deduplicated list ranked by how many engines agree on each URL.
//!
//! ## Design
//!
//! - Engines are plain data: one [`engines::EngineDriver`] per engine in a
//!   static registry, covering URL shape, DOM shape and session priming
//! - The browser is a set of traits ([`browser`]); [`http_browser`] is a
//!   built-in static-HTML implementation backed by `reqwest`
//! - Engines run strictly one after another, either sharing one browser
//!   (one isolated context each) or with a browser apiece
//! - Graceful degradation: a failing engine only marks its own status
//! - Human-like pacing between navigations and result pages
//!
//! ## Security
//!
//! - No API keys or secrets to leak
//! - No network listeners; this is a library, not a server
//! - Search queries are logged only at trace level

pub mod aggregator;
pub mod browser;
pub mod cache;
pub mod config;
pub mod engines;
pub mod error;
pub mod http_browser;
pub mod orchestrator;
pub mod paginator;
pub mod types;

pub use browser::{Browser, BrowserContext, BrowserLauncher, Page};
pub use cache::{CacheStore, MemoryCache};
pub use config::SearchConfig;
pub use error::{Result, SearchError};
pub use http_browser::HttpLauncher;
pub use paginator::EngineRun;
pub use types::{
    AggregatedResult, AggregationStats, EngineStatus, ExecutionMode, Locale, SearchEngine,
    SearchOutcome, SearchResult,
};

/// Search the web with every engine in `config`, using `launcher` for
/// browser sessions.
///
/// Engines run in the configured order; their results are deduplicated by
/// normalised URL and ranked by engine agreement, then truncated to
/// `config.max_results`.
///
/// # Errors
///
/// Returns [`SearchError::Config`] if `config` is invalid or the query is
/// empty. Individual engine failures never fail the call; they are reported
/// in [`SearchOutcome::statuses`].
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> fcrawl_search::Result<()> {
/// let config = fcrawl_search::SearchConfig::default();
/// let outcome = fcrawl_search::search(&fcrawl_search::HttpLauncher, "rust programming", &config).await?;
/// for result in &outcome.results {
///     println!("[{}] {}: {}", result.score, result.title, result.url);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn search<L: BrowserLauncher>(
    launcher: &L,
    query: &str,
    config: &SearchConfig,
) -> Result<SearchOutcome> {
    orchestrator::search(launcher, query, config).await
}

/// Search with the built-in HTTP browser and default configuration.
///
/// # Errors
///
/// Same as [`search`].
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> fcrawl_search::Result<()> {
/// let outcome = fcrawl_search::search_default("weather today").await?;
/// println!("{} results", outcome.results.len());
/// # Ok(())
/// # }
/// ```
pub async fn search_default(query: &str) -> Result<SearchOutcome> {
    search(&HttpLauncher, query, &SearchConfig::default()).await
}
