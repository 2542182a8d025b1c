//! Cache Store boundary and an in-memory implementation.
//!
//! The search core treats caching as an opaque key → blob store. Keys are
//! derived from the query and the options that change what a search
//! returns; storage medium, TTL and eviction belong to the store. The
//! in-memory [`MemoryCache`] uses [`moka`] for async-friendly caching with
//! TTL and automatic eviction.

use std::future::Future;
use std::time::Duration;

use moka::future::Cache;
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::config::SearchConfig;
use crate::error::Result;

/// An opaque key → blob store.
pub trait CacheStore: Send + Sync {
    /// Fetch the blob stored under `key`, if any.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;

    /// Store `blob` under `key`, replacing any previous value.
    fn put(&self, key: &str, blob: Vec<u8>) -> impl Future<Output = Result<()>> + Send;
}

/// Deterministic key for `query` under `options`.
///
/// SHA-256 over the query followed by `options` serialised as compact JSON
/// with sorted object keys; the first 16 hex characters.
pub fn cache_key(query: &str, options: &serde_json::Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(query.as_bytes());
    // serde_json objects are BTreeMap-backed, so keys serialise sorted.
    hasher.update(options.to_string().as_bytes());
    let digest = hasher.finalize();
    digest
        .iter()
        .take(8)
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Key for a search: query plus sorted engines, limit, locale and mode.
///
/// Engine order does not matter. Pacing and timeouts do not take part
/// because they never change which results come back.
pub fn search_cache_key(query: &str, config: &SearchConfig) -> String {
    let mut engines: Vec<&str> = config.engines.iter().map(|e| e.name()).collect();
    engines.sort_unstable();
    engines.dedup();
    let locale = config
        .parsed_locale()
        .ok()
        .flatten()
        .map(|l| l.tag())
        .or_else(|| config.locale.clone());
    let options = json!({
        "engines": engines,
        "limit": config.max_results,
        "locale": locale,
        "mode": config.effective_mode().name(),
    });
    cache_key(query.trim(), &options)
}

/// Process-local [`CacheStore`] with a capacity bound and TTL.
#[derive(Clone)]
pub struct MemoryCache {
    inner: Cache<String, Vec<u8>>,
}

impl MemoryCache {
    /// A cache holding at most `max_entries` blobs, each for `ttl`.
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_entries)
                .time_to_live(ttl)
                .build(),
        }
    }
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entries", &self.inner.entry_count())
            .finish()
    }
}

impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.inner.get(key).await)
    }

    async fn put(&self, key: &str, blob: Vec<u8>) -> Result<()> {
        self.inner.insert(key.to_string(), blob).await;
        Ok(())
    }
}
