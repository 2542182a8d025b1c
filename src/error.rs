//! Error types for fcrawl.

use fcrawl_search::SearchError;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    /// The search core rejected the request.
    #[error("search error: {0}")]
    Search(#[from] SearchError),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A cached outcome could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Cache-only mode and nothing cached for this query.
    #[error("not in cache: {0}")]
    NotCached(String),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, CrawlError>;
