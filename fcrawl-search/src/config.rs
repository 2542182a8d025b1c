//! Search configuration with sensible defaults.
//!
//! [`SearchConfig`] controls which engines are driven, how many results are
//! wanted, locale, browser mode, navigation timeouts and pacing. The defaults
//! are tuned for polite, human-paced scraping.

use std::time::Duration;

use crate::error::SearchError;
use crate::types::{ExecutionMode, Locale, SearchEngine};

/// Configuration for one search invocation.
///
/// Use [`Default::default()`] for sensible defaults, or construct with
/// field overrides for custom behaviour.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Engines to drive, in processing order.
    pub engines: Vec<SearchEngine>,
    /// Maximum number of aggregated results to return.
    pub max_results: usize,
    /// Language-region tag for regional results, e.g. `ja-JP`.
    pub locale: Option<String>,
    /// Run the browser without a visible window.
    pub headless: bool,
    /// Browser allocation mode. `None` picks shared for multi-engine
    /// searches and sequential for a single engine.
    pub mode: Option<ExecutionMode>,
    /// Per-navigation timeout in seconds.
    pub timeout_seconds: u64,
    /// Random delay range in milliseconds `(min, max)` after each navigation.
    pub settle_delay_ms: (u64, u64),
    /// Random delay range in milliseconds `(min, max)` between result pages.
    pub request_delay_ms: (u64, u64),
    /// Custom User-Agent string. If `None`, the browser picks one.
    pub user_agent: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            engines: SearchEngine::all().to_vec(),
            max_results: 10,
            locale: None,
            headless: true,
            mode: None,
            timeout_seconds: 30,
            settle_delay_ms: (500, 1500),
            request_delay_ms: (1000, 2000),
            user_agent: None,
        }
    }
}

impl SearchConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `max_results` must be greater than 0
    /// - `timeout_seconds` must be greater than 0
    /// - `engines` must not be empty or contain the same engine twice
    /// - both delay ranges must have `min <= max`
    /// - `locale`, when set, must parse as a [`Locale`]
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.max_results == 0 {
            return Err(SearchError::Config(
                "max_results must be greater than 0".into(),
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(SearchError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.engines.is_empty() {
            return Err(SearchError::Config(
                "at least one engine must be enabled".into(),
            ));
        }
        for (i, engine) in self.engines.iter().enumerate() {
            if self.engines[..i].contains(engine) {
                return Err(SearchError::Config(format!(
                    "engine {engine} listed more than once"
                )));
            }
        }
        if self.settle_delay_ms.0 > self.settle_delay_ms.1 {
            return Err(SearchError::Config(
                "settle_delay_ms min must be <= max".into(),
            ));
        }
        if self.request_delay_ms.0 > self.request_delay_ms.1 {
            return Err(SearchError::Config(
                "request_delay_ms min must be <= max".into(),
            ));
        }
        self.parsed_locale()?;
        Ok(())
    }

    /// The configured locale, parsed.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if the tag is malformed.
    pub fn parsed_locale(&self) -> Result<Option<Locale>, SearchError> {
        self.locale.as_deref().map(str::parse::<Locale>).transpose()
    }

    /// The mode actually used for this configuration.
    pub fn effective_mode(&self) -> ExecutionMode {
        match self.mode {
            Some(mode) => mode,
            None if self.engines.len() > 1 => ExecutionMode::Shared,
            None => ExecutionMode::Sequential,
        }
    }

    /// How many results each engine is asked for.
    ///
    /// A single engine is asked for exactly `max_results`. With several
    /// engines each one over-fetches (`max(10, total / n + 5)`) so enough
    /// unique results survive cross-engine deduplication.
    pub fn per_engine_limit(&self) -> usize {
        let n = self.engines.len();
        if n > 1 {
            (self.max_results / n + 5).max(10)
        } else {
            self.max_results
        }
    }

    /// The per-navigation timeout.
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}
