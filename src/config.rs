//! Persistent configuration for fcrawl.
//!
//! [`CrawlConfig`] is read from `config.toml` in the fcrawl config directory
//! (see [`crate::fcrawl_dirs`]), then adjusted by `FCRAWL_*` environment
//! variables. Every field has a default, so a missing or partial file is
//! fine.

use std::path::{Path, PathBuf};
use std::time::Duration;

use fcrawl_search::{ExecutionMode, MemoryCache, SearchConfig, SearchEngine};
use serde::{Deserialize, Serialize};

use crate::error::{CrawlError, Result};

/// Environment variable overriding `search.engines` (`google,bing` or `all`).
pub const ENGINES_ENV: &str = "FCRAWL_ENGINES";
/// Environment variable overriding `search.locale` (empty clears it).
pub const LOCALE_ENV: &str = "FCRAWL_LOCALE";
/// Environment variable overriding `search.max_results`.
pub const LIMIT_ENV: &str = "FCRAWL_LIMIT";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Search defaults.
    pub search: SearchSettings,
    /// Result cache settings.
    pub cache: CacheSettings,
}

/// The `[search]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Engine identifiers, in processing order.
    pub engines: Vec<String>,
    /// Maximum number of aggregated results.
    pub max_results: usize,
    /// Language-region tag such as `ja-JP`.
    pub locale: Option<String>,
    /// Run the browser without a window.
    pub headless: bool,
    /// `shared` (alias `parallel`) or `sequential`. Unset picks by engine count.
    pub mode: Option<ExecutionMode>,
    /// Per-navigation timeout in seconds.
    pub timeout_seconds: u64,
    /// Delay range after each navigation, milliseconds.
    pub settle_delay_ms: (u64, u64),
    /// Delay range between result pages, milliseconds.
    pub request_delay_ms: (u64, u64),
    /// Custom User-Agent.
    pub user_agent: Option<String>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        let core = SearchConfig::default();
        Self {
            engines: core.engines.iter().map(|e| e.name().to_string()).collect(),
            max_results: core.max_results,
            locale: core.locale,
            headless: core.headless,
            mode: core.mode,
            timeout_seconds: core.timeout_seconds,
            settle_delay_ms: core.settle_delay_ms,
            request_delay_ms: core.request_delay_ms,
            user_agent: core.user_agent,
        }
    }
}

/// The `[cache]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Whether search outcomes are cached.
    pub enabled: bool,
    /// How long a cached outcome stays valid.
    pub ttl_seconds: u64,
    /// Maximum number of cached outcomes.
    pub max_entries: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: 3600,
            max_entries: 100,
        }
    }
}

impl CacheSettings {
    /// An in-memory store sized by these settings, or `None` when disabled.
    pub fn memory_cache(&self) -> Option<MemoryCache> {
        self.enabled
            .then(|| MemoryCache::new(self.max_entries, Duration::from_secs(self.ttl_seconds)))
    }
}

impl CrawlConfig {
    /// Load from the default location, then apply environment overrides.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// if an environment override is malformed.
    pub fn load() -> Result<Self> {
        let path = Self::default_config_path();
        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Self::default()
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CrawlError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| CrawlError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> PathBuf {
        crate::fcrawl_dirs::config_file()
    }

    /// Apply `FCRAWL_ENGINES`, `FCRAWL_LOCALE` and `FCRAWL_LIMIT` from the
    /// process environment.
    ///
    /// # Errors
    ///
    /// See [`CrawlConfig::apply_env`].
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_env(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown engine identifier or a limit that is
    /// not a positive integer.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(engines) = lookup(ENGINES_ENV) {
            let parsed = SearchEngine::parse_list(&engines)?;
            self.search.engines = parsed.iter().map(|e| e.name().to_string()).collect();
        }
        if let Some(locale) = lookup(LOCALE_ENV) {
            let locale = locale.trim();
            self.search.locale = (!locale.is_empty()).then(|| locale.to_string());
        }
        if let Some(limit) = lookup(LIMIT_ENV) {
            self.search.max_results = match limit.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(CrawlError::Config(format!(
                        "{LIMIT_ENV} must be a positive integer, got {limit:?}"
                    )));
                }
            };
        }
        Ok(())
    }

    /// The validated search configuration these settings describe.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown engine identifiers or any value that
    /// [`SearchConfig::validate`] rejects.
    pub fn to_search_config(&self) -> Result<SearchConfig> {
        let s = &self.search;
        let engines = if s.engines.is_empty() {
            Vec::new()
        } else {
            SearchEngine::parse_list(&s.engines.join(","))?
        };
        let config = SearchConfig {
            engines,
            max_results: s.max_results,
            locale: s.locale.clone(),
            headless: s.headless,
            mode: s.mode,
            timeout_seconds: s.timeout_seconds,
            settle_delay_ms: s.settle_delay_ms,
            request_delay_ms: s.request_delay_ms,
            user_agent: s.user_agent.clone(),
        };
        config.validate()?;
        Ok(config)
    }
}
