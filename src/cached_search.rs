//! Search with a result cache in front.
//!
//! Outcomes are stored as JSON blobs under
//! [`search_cache_key`](fcrawl_search::cache::search_cache_key). A blob that
//! no longer decodes counts as a miss, and a failing store never fails a
//! search.

use fcrawl_search::cache::search_cache_key;
use fcrawl_search::{BrowserLauncher, CacheStore, MemoryCache, SearchConfig, SearchOutcome};
use serde::{Deserialize, Serialize};

use crate::config::CacheSettings;
use crate::error::{CrawlError, Result};

/// How a search uses the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheMode {
    /// Serve from cache when possible, store fresh outcomes.
    #[default]
    Normal,
    /// Always search; still store the fresh outcome.
    Bypass,
    /// Never search; fail when nothing is cached.
    Only,
}

/// One answered query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchReport {
    /// The query as given.
    pub query: String,
    /// Ranked results, statuses and stats.
    pub outcome: SearchOutcome,
    /// Whether `outcome` came from the cache.
    pub from_cache: bool,
}

/// A browser launcher paired with an optional cache store.
pub struct CachedSearch<L, S> {
    launcher: L,
    store: Option<S>,
}

impl<L: BrowserLauncher> CachedSearch<L, MemoryCache> {
    /// An in-memory cache sized by `settings`; no cache when disabled.
    pub fn from_settings(launcher: L, settings: &CacheSettings) -> Self {
        Self {
            launcher,
            store: settings.memory_cache(),
        }
    }
}

impl<L: BrowserLauncher, S: CacheStore> CachedSearch<L, S> {
    /// Searches through `launcher`, caching in `store`.
    pub fn new(launcher: L, store: S) -> Self {
        Self {
            launcher,
            store: Some(store),
        }
    }

    /// Searches through `launcher` without any cache.
    pub fn uncached(launcher: L) -> Self {
        Self {
            launcher,
            store: None,
        }
    }

    /// The cache store, if any.
    pub fn store(&self) -> Option<&S> {
        self.store.as_ref()
    }

    /// Answer `query`, consulting the cache according to `mode`.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::Search`] for an invalid configuration and
    /// [`CrawlError::NotCached`] in [`CacheMode::Only`] on a miss.
    pub async fn run(&self, query: &str, config: &SearchConfig, mode: CacheMode) -> Result<SearchReport> {
        config.validate()?;
        let key = search_cache_key(query, config);

        if mode != CacheMode::Bypass {
            if let Some(outcome) = self.read(&key).await {
                tracing::debug!(key = %key, results = outcome.results.len(), "serving cached outcome");
                return Ok(SearchReport {
                    query: query.to_string(),
                    outcome,
                    from_cache: true,
                });
            }
        }

        if mode == CacheMode::Only {
            return Err(CrawlError::NotCached(query.to_string()));
        }

        let outcome = fcrawl_search::search(&self.launcher, query, config).await?;
        if !outcome.results.is_empty() {
            self.write(&key, &outcome).await?;
        }

        Ok(SearchReport {
            query: query.to_string(),
            outcome,
            from_cache: false,
        })
    }

    async fn read(&self, key: &str) -> Option<SearchOutcome> {
        let store = self.store.as_ref()?;
        let blob = match store.get(key).await {
            Ok(blob) => blob?,
            Err(err) => {
                tracing::warn!(key, error = %err, "cache read failed");
                return None;
            }
        };
        match serde_json::from_slice(&blob) {
            Ok(outcome) => Some(outcome),
            Err(err) => {
                tracing::debug!(key, error = %err, "discarding undecodable cache entry");
                None
            }
        }
    }

    async fn write(&self, key: &str, outcome: &SearchOutcome) -> Result<()> {
        let Some(store) = self.store.as_ref() else {
            return Ok(());
        };
        let blob = serde_json::to_vec(outcome)?;
        if let Err(err) = store.put(key, blob).await {
            tracing::warn!(key, error = %err, "cache write failed");
        }
        Ok(())
    }
}
