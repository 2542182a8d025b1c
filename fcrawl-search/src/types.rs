//! Core value types: results, per-engine statuses, engine identifiers, locales.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::SearchError;

/// A single organic result scraped from one engine's results page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// The title of the search result page.
    pub title: String,
    /// Absolute HTTP(S) URL of the result.
    pub url: String,
    /// A text snippet summarising the page content.
    pub description: String,
    /// Identifier of the engine that returned this result.
    pub engine: String,
    /// 1-indexed rank within this engine's own result stream.
    pub position: usize,
}

/// Outcome of one engine's turn. Exactly one exists per requested engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStatus {
    /// Engine identifier.
    pub engine: String,
    /// Whether pagination finished without an error.
    pub success: bool,
    /// Number of results the engine contributed.
    pub result_count: usize,
    /// Wall time spent on this engine.
    pub elapsed_time: Duration,
    /// Error message when `success` is false.
    pub error: Option<String>,
}

impl EngineStatus {
    /// A successful turn that collected `result_count` results.
    pub fn succeeded(engine: SearchEngine, result_count: usize, elapsed_time: Duration) -> Self {
        Self {
            engine: engine.name().to_string(),
            success: true,
            result_count,
            elapsed_time,
            error: None,
        }
    }

    /// A failed turn. Failed engines always contribute zero results.
    pub fn failed(engine: SearchEngine, elapsed_time: Duration, error: impl fmt::Display) -> Self {
        Self {
            engine: engine.name().to_string(),
            success: false,
            result_count: 0,
            elapsed_time,
            error: Some(error.to_string()),
        }
    }
}

/// A result after cross-engine merging.
///
/// `score` always equals `engines.len()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedResult {
    /// URL as first observed (not normalised).
    pub url: String,
    /// Title from the first contributing result.
    pub title: String,
    /// Description from the first contributing result.
    pub description: String,
    /// Engine that contributed this URL first, in engine-processing order.
    pub primary_engine: String,
    /// Every engine that surfaced the same normalised URL.
    pub engines: BTreeSet<String>,
    /// Number of distinct engines that surfaced this URL.
    pub score: usize,
    /// Lowest position observed across contributing results.
    pub best_position: usize,
}

/// Summary of an aggregated result list, for observability only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationStats {
    /// Number of aggregated results.
    pub total: usize,
    /// Histogram of score → number of results with that score.
    pub by_engine_count: BTreeMap<usize, usize>,
    /// Histogram of primary engine → number of results it contributed first.
    pub by_primary_engine: BTreeMap<String, usize>,
}

/// Everything one search invocation produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Deduplicated results ranked by engine agreement.
    pub results: Vec<AggregatedResult>,
    /// One status per requested engine, in request order.
    pub statuses: Vec<EngineStatus>,
    /// Summary of `results`.
    pub stats: AggregationStats,
}

/// Search engines that fcrawl can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchEngine {
    /// Google: best results, consent wall in the EU.
    Google,
    /// Bing: needs session cookies and a conversation id for stable results.
    Bing,
    /// Brave Search: independent index, no cookie priming needed.
    Brave,
}

impl SearchEngine {
    /// Returns the lowercase identifier of this engine.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Bing => "bing",
            Self::Brave => "brave",
        }
    }

    /// Returns all available engine variants.
    pub fn all() -> &'static [SearchEngine] {
        &[Self::Google, Self::Bing, Self::Brave]
    }

    /// Parse a comma-separated engine list such as `"google,bing"` or `"all"`.
    ///
    /// Order is preserved and repeated identifiers are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::UnknownEngine`] for the first identifier that
    /// does not name an engine, or [`SearchError::Config`] if the list is empty.
    pub fn parse_list(spec: &str) -> Result<Vec<SearchEngine>, SearchError> {
        let mut engines = Vec::new();
        for token in spec.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let parsed: Vec<SearchEngine> = if token.eq_ignore_ascii_case("all") {
                Self::all().to_vec()
            } else {
                vec![token.parse()?]
            };
            for engine in parsed {
                if !engines.contains(&engine) {
                    engines.push(engine);
                }
            }
        }
        if engines.is_empty() {
            return Err(SearchError::Config("no engines given".into()));
        }
        Ok(engines)
    }
}

impl fmt::Display for SearchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SearchEngine {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::all()
            .iter()
            .copied()
            .find(|engine| engine.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| SearchError::UnknownEngine(wanted.to_string()))
    }
}

/// How browser resources are allocated across the requested engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// One browser for the whole invocation, one isolated context per engine.
    #[serde(alias = "parallel")]
    Shared,
    /// One browser per engine, started and torn down in turn.
    Sequential,
}

impl ExecutionMode {
    /// Returns the lowercase name of this mode.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Shared => "shared",
            Self::Sequential => "sequential",
        }
    }
}

/// A language tag with an optional region, e.g. `ja-JP` or `zh-Hant`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locale {
    /// Lowercase language code (`ja`).
    pub language: String,
    /// Region or script subtag (`JP`, `Hant`), if any.
    pub region: Option<String>,
}

impl Locale {
    /// The canonical `lang-REGION` form of this locale.
    pub fn tag(&self) -> String {
        match &self.region {
            Some(region) => format!("{}-{region}", self.language),
            None => self.language.clone(),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag())
    }
}

impl FromStr for Locale {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split(|c| c == '-' || c == '_');
        let language = parts.next().unwrap_or_default().to_ascii_lowercase();
        if language.is_empty() || !language.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(SearchError::Config(format!("invalid locale: {s:?}")));
        }
        let region = parts.next().filter(|r| !r.is_empty()).map(|r| {
            if r.len() == 2 {
                r.to_ascii_uppercase()
            } else {
                let mut chars = r.chars();
                let first = chars.next().map(|c| c.to_ascii_uppercase());
                first
                    .into_iter()
                    .chain(chars.map(|c| c.to_ascii_lowercase()))
                    .collect()
            }
        });
        Ok(Self { language, region })
    }
}
