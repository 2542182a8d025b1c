//! fcrawl: multi-engine web search with a result cache.
//!
//! The search core lives in [`fcrawl_search`]: engine drivers, pagination,
//! orchestration and URL-normalized aggregation. This crate adds the pieces an
//! application needs around it:
//!
//! - [`config`]: a TOML file under [`fcrawl_dirs::config_dir`] with
//!   `FCRAWL_*` environment overrides
//! - [`cached_search`]: [`CachedSearch`], which answers repeated queries from a
//!   [`CacheStore`](fcrawl_search::CacheStore)
//! - [`logging`]: tracing subscriber setup
//!
//! ```no_run
//! # async fn demo() -> fcrawl::Result<()> {
//! use fcrawl::{CacheMode, CachedSearch, CrawlConfig};
//! use fcrawl_search::HttpLauncher;
//!
//! fcrawl::logging::init("info");
//! let config = CrawlConfig::load()?;
//! let search = CachedSearch::from_settings(HttpLauncher, &config.cache);
//! let report = search
//!     .run("rust async", &config.to_search_config()?, CacheMode::Normal)
//!     .await?;
//! for result in &report.outcome.results {
//!     println!("{} ({})", result.url, result.score);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cached_search;
pub mod config;
pub mod error;
pub mod fcrawl_dirs;
pub mod logging;

pub use cached_search::{CacheMode, CachedSearch, SearchReport};
pub use config::CrawlConfig;
pub use error::{CrawlError, Result};
pub use fcrawl_search;
