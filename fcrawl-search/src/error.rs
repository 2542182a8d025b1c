//! Error types for the fcrawl-search crate.
//!
//! Only [`SearchError::UnknownEngine`] and [`SearchError::Config`] ever
//! reach the caller of [`crate::search`]. Everything that goes wrong inside
//! one engine's turn is folded into that engine's
//! [`EngineStatus`](crate::types::EngineStatus) instead.

/// Errors that can occur during web search operations.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// An engine identifier did not match any registered engine.
    #[error("unknown engine: {0} (available: google, bing, brave)")]
    UnknownEngine(String),

    /// Invalid search configuration.
    #[error("config error: {0}")]
    Config(String),

    /// A results page failed to load within an engine's turn.
    #[error("navigation error: {0}")]
    Navigation(String),

    /// A results page could not be parsed at all.
    #[error("extraction error: {0}")]
    Extraction(String),

    /// The browser itself could not be started.
    #[error("browser creation failed: {0}")]
    SessionCreation(String),

    /// A context or page operation failed.
    #[error("browser error: {0}")]
    Browser(String),

    /// A navigation did not complete within the configured timeout.
    #[error("timed out: {0}")]
    Timeout(String),

    /// The cache store rejected a read or write.
    #[error("cache error: {0}")]
    Cache(String),
}

/// Convenience type alias for fcrawl-search results.
pub type Result<T> = std::result::Result<T, SearchError>;
