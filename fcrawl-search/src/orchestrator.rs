//! Session orchestration: one browser per invocation or one per engine.
//!
//! Engines are processed strictly in the requested order, one at a time.
//! In shared mode a single browser hosts one isolated context per engine;
//! in sequential mode every engine gets its own browser. Either way each
//! engine's context is closed before the next one opens.

use std::time::Instant;

use crate::aggregator::{aggregate, stats};
use crate::browser::{with_browser, with_context, Browser, BrowserLauncher, LaunchOptions};
use crate::config::SearchConfig;
use crate::error::{Result, SearchError};
use crate::paginator::{run_engine, EngineRun, PageRequest, Pacing};
use crate::types::{ExecutionMode, SearchEngine, SearchOutcome};

/// Search with every configured engine, then merge and rank.
///
/// # Pipeline
///
/// 1. Validate `config` (the only hard failure)
/// 2. Run each engine in order, in shared or sequential mode
/// 3. Aggregate all results, truncated to `config.max_results`
/// 4. Summarise the ranked list
///
/// Engine failures never fail the call; they show up in
/// [`SearchOutcome::statuses`].
///
/// # Errors
///
/// Returns [`SearchError::Config`] for an invalid configuration or an
/// empty query.
pub async fn search<L: BrowserLauncher>(
    launcher: &L,
    query: &str,
    config: &SearchConfig,
) -> Result<SearchOutcome> {
    config.validate()?;
    if query.trim().is_empty() {
        return Err(SearchError::Config("query must not be empty".into()));
    }

    let runs = run_engines(launcher, query, config).await?;

    let results = aggregate(
        runs.iter().flat_map(|run| run.results.iter()),
        Some(config.max_results),
    );
    let stats = stats(&results);

    let failed = runs.iter().filter(|run| !run.status.success).count();
    tracing::debug!(
        engines = runs.len(),
        failed,
        results = results.len(),
        "search finished"
    );

    Ok(SearchOutcome {
        results,
        statuses: runs.into_iter().map(|run| run.status).collect(),
        stats,
    })
}

/// Run every configured engine and return one [`EngineRun`] per engine,
/// in request order.
///
/// # Errors
///
/// Returns [`SearchError::Config`] if the locale cannot be parsed.
pub async fn run_engines<L: BrowserLauncher>(
    launcher: &L,
    query: &str,
    config: &SearchConfig,
) -> Result<Vec<EngineRun>> {
    let locale = config.parsed_locale()?;
    let launch = LaunchOptions {
        headless: config.headless,
        locale: locale.as_ref().map(|l| l.tag()),
        user_agent: config.user_agent.clone(),
    };
    let request = PageRequest {
        query,
        limit: config.per_engine_limit(),
        locale,
        pacing: Pacing::from_config(config),
        navigation_timeout: config.navigation_timeout(),
    };

    let mode = config.effective_mode();
    tracing::debug!(mode = mode.name(), engines = config.engines.len(), limit = request.limit, "running engines");

    let runs = match mode {
        ExecutionMode::Shared => run_shared(launcher, &launch, &config.engines, &request).await,
        ExecutionMode::Sequential => {
            run_sequential(launcher, &launch, &config.engines, &request).await
        }
    };
    Ok(runs)
}

/// One browser for all engines, one context per engine.
async fn run_shared<L: BrowserLauncher>(
    launcher: &L,
    launch: &LaunchOptions,
    engines: &[SearchEngine],
    request: &PageRequest<'_>,
) -> Vec<EngineRun> {
    let started = Instant::now();
    let outcome = with_browser(launcher, launch, |browser| async move {
        let mut runs = Vec::with_capacity(engines.len());
        for &engine in engines {
            runs.push(run_in_context(&browser, engine, request, Instant::now()).await);
        }
        runs
    })
    .await;

    match outcome {
        Ok(runs) => runs,
        Err(err) => {
            let reason = match err {
                SearchError::SessionCreation(msg) => msg,
                other => other.to_string(),
            };
            engines
                .iter()
                .map(|&engine| {
                    EngineRun::failed(engine, SearchError::SessionCreation(reason.clone()), started)
                })
                .collect()
        }
    }
}

/// A fresh browser for every engine.
async fn run_sequential<L: BrowserLauncher>(
    launcher: &L,
    launch: &LaunchOptions,
    engines: &[SearchEngine],
    request: &PageRequest<'_>,
) -> Vec<EngineRun> {
    let mut runs = Vec::with_capacity(engines.len());
    for &engine in engines {
        let started = Instant::now();
        let outcome = with_browser(launcher, launch, |browser| async move {
            run_in_context(&browser, engine, request, started).await
        })
        .await;
        runs.push(match outcome {
            Ok(run) => run,
            Err(err) => EngineRun::failed(engine, err, started),
        });
    }
    runs
}

/// Open an isolated context for `engine`, run its turn, close the context.
async fn run_in_context<B: Browser>(
    browser: &B,
    engine: SearchEngine,
    request: &PageRequest<'_>,
    started: Instant,
) -> EngineRun {
    let driver = engine.driver();
    let options = driver
        .session_options(request.locale.as_ref())
        .into_context_options(request.navigation_timeout);

    let outcome = with_context(browser, &options, |context| async move {
        run_engine(driver, &context, request, started).await
    })
    .await;

    match outcome {
        Ok(run) => run,
        Err(err) => EngineRun::failed(engine, err, started),
    }
}
