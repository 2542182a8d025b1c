//! Per-engine pagination.
//!
//! One engine's turn: prime the context, open a page, optionally warm up on
//! the engine's homepage, then walk result pages until enough results are
//! collected or a page contributes nothing new. Everything that goes wrong
//! inside a turn ends up in that engine's [`EngineStatus`]; nothing here
//! ever fails a sibling engine.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use rand::Rng;

use crate::browser::{BrowserContext, Page};
use crate::config::SearchConfig;
use crate::engines::{EngineDriver, EngineSession};
use crate::error::{Result, SearchError};
use crate::types::{EngineStatus, Locale, SearchEngine, SearchResult};

/// How long to wait for an engine's ready selector after navigation.
const READY_TIMEOUT: Duration = Duration::from_secs(5);

/// Randomised human-like delays, as `(min, max)` millisecond ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// After every navigation.
    pub settle_ms: (u64, u64),
    /// Between two result pages.
    pub between_pages_ms: (u64, u64),
}

impl Pacing {
    /// Pacing taken from a search configuration.
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            settle_ms: config.settle_delay_ms,
            between_pages_ms: config.request_delay_ms,
        }
    }

    /// No delays at all.
    pub fn none() -> Self {
        Self {
            settle_ms: (0, 0),
            between_pages_ms: (0, 0),
        }
    }

    async fn settle(&self) {
        sleep_in_range(self.settle_ms).await;
    }

    async fn between_pages(&self) {
        sleep_in_range(self.between_pages_ms).await;
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self::from_config(&SearchConfig::default())
    }
}

async fn sleep_in_range(range: (u64, u64)) {
    let delay = jitter(range);
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

fn jitter((min, max): (u64, u64)) -> Duration {
    if max <= min {
        return Duration::from_millis(min);
    }
    Duration::from_millis(rand::thread_rng().gen_range(min..=max))
}

/// The result list and status of one engine's turn.
#[derive(Debug, Clone)]
pub struct EngineRun {
    /// Engine that ran.
    pub engine: SearchEngine,
    /// Collected results, positions 1..=n. Empty when the turn failed.
    pub results: Vec<SearchResult>,
    /// How the turn went.
    pub status: EngineStatus,
}

impl EngineRun {
    /// Turn a pagination outcome into a run, logging failures.
    pub fn finish(engine: SearchEngine, outcome: Result<Vec<SearchResult>>, started: Instant) -> Self {
        let elapsed = started.elapsed();
        match outcome {
            Ok(results) => {
                tracing::debug!(%engine, count = results.len(), ?elapsed, "engine finished");
                Self {
                    engine,
                    status: EngineStatus::succeeded(engine, results.len(), elapsed),
                    results,
                }
            }
            Err(err) => Self::failed(engine, err, started),
        }
    }

    /// A failed run with no results.
    pub fn failed(engine: SearchEngine, error: SearchError, started: Instant) -> Self {
        tracing::warn!(%engine, error = %error, "engine failed");
        Self {
            engine,
            results: Vec::new(),
            status: EngineStatus::failed(engine, started.elapsed(), error),
        }
    }
}

/// Settings for one engine's turn.
#[derive(Debug, Clone)]
pub struct PageRequest<'a> {
    /// Search query.
    pub query: &'a str,
    /// Number of results wanted from this engine.
    pub limit: usize,
    /// Locale for URL parameters and cookies.
    pub locale: Option<Locale>,
    /// Delays between steps.
    pub pacing: Pacing,
    /// Upper bound for one navigation.
    pub navigation_timeout: Duration,
}

/// Run one engine's whole turn inside an already opened context.
///
/// `started` marks when work for this engine began, so elapsed time can
/// include browser start-up. Never fails: errors become a failed status.
pub async fn run_engine<C: BrowserContext>(
    driver: &EngineDriver,
    context: &C,
    request: &PageRequest<'_>,
    started: Instant,
) -> EngineRun {
    let outcome = collect(driver, context, request).await;
    EngineRun::finish(driver.engine, outcome, started)
}

async fn collect<C: BrowserContext>(
    driver: &EngineDriver,
    context: &C,
    request: &PageRequest<'_>,
) -> Result<Vec<SearchResult>> {
    let session = EngineSession::new(request.locale.clone());
    driver.prime_session(context, &session).await?;
    let page = context.new_page().await?;
    paginate(driver, &page, request, &session).await
}

/// Walk result pages on `page` until the limit is reached or a page adds
/// no unseen URL.
///
/// At most `ceil(limit / results_per_page) + 1` pages are fetched. Results
/// are deduplicated by exact URL within this engine and renumbered from 1.
///
/// # Errors
///
/// Any navigation, timeout or extraction error aborts the walk.
pub async fn paginate<P: Page>(
    driver: &EngineDriver,
    page: &P,
    request: &PageRequest<'_>,
    session: &EngineSession,
) -> Result<Vec<SearchResult>> {
    let engine = driver.engine;
    let limit = request.limit;
    let mut results: Vec<SearchResult> = Vec::new();
    if limit == 0 {
        return Ok(results);
    }

    tracing::trace!(%engine, query = request.query, limit, "paginating");

    if let Some(home) = driver.home_url {
        navigate(page, home, request.navigation_timeout).await?;
        request.pacing.settle().await;
        driver.handle_consent(page).await;
    }

    let max_pages = limit.div_ceil(driver.results_per_page.max(1)) + 1;
    let mut seen: HashSet<String> = HashSet::new();

    for page_index in 0..max_pages {
        let url = driver.build_search_url(request.query, page_index, session);
        navigate(page, &url, request.navigation_timeout).await?;
        request.pacing.settle().await;

        if page_index == 0 {
            driver.handle_consent(page).await;
        }

        if let Some(selector) = driver.ready_selector {
            match page.wait_for_selector(selector, READY_TIMEOUT).await {
                Ok(true) => {}
                Ok(false) => tracing::trace!(%engine, selector, "ready selector not found"),
                Err(err) => tracing::trace!(%engine, selector, error = %err, "ready wait failed"),
            }
        }

        let html = page.content().await?;
        let extracted = driver.extract_results(&html)?;

        let mut added = 0;
        for mut result in extracted {
            if results.len() >= limit {
                break;
            }
            if seen.insert(result.url.clone()) {
                result.position = results.len() + 1;
                results.push(result);
                added += 1;
            }
        }

        tracing::debug!(%engine, page = page_index, added, total = results.len(), "result page processed");

        if results.len() >= limit || added == 0 {
            break;
        }
        if page_index + 1 < max_pages {
            request.pacing.between_pages().await;
        }
    }

    Ok(results)
}

async fn navigate<P: Page>(page: &P, url: &str, timeout: Duration) -> Result<()> {
    match tokio::time::timeout(timeout, page.goto(url)).await {
        Ok(result) => result,
        Err(_) => Err(SearchError::Timeout(format!(
            "navigation to {url} exceeded {}ms",
            timeout.as_millis()
        ))),
    }
}
