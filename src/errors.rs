//! Typed error taxonomy for the crawl core and the search-backend sink.
//!
//! Per-URL failures (`CrawlError`) are always recovered locally by the
//! coordinator; only `CrawlError::InvariantViolation` is fatal. Search sink
//! failures (`SearchSinkError`) are the sink's own responsibility and never
//! abort a run.

use thiserror::Error;

/// Errors arising while driving a single URL through the crawl pipeline.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("navigation to {url} produced no response")]
    NavigationFailure { url: String },

    #[error("{url} redirected with status {status}")]
    RedirectEncountered { url: String, status: u16 },

    #[error("{url} returned non-OK status {status}")]
    HttpNotOk { url: String, status: u16 },

    #[error("malformed XML for {url}: {source}")]
    MalformedXml {
        url: String,
        #[source]
        source: quick_xml::Error,
    },

    #[error("extraction failed for {url}: {message}")]
    ExtractionFailure { url: String, message: String },

    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

impl CrawlError {
    /// Whether this error should merely be logged and the page skipped, as
    /// opposed to aborting the whole run.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InvariantViolation(_))
    }
}

/// Errors arising from the search-backend sink's index lifecycle.
#[derive(Debug, Error)]
pub enum SearchSinkError {
    #[error("search backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("failed to create physical index {name}: {source}")]
    IndexCreation {
        name: String,
        #[source]
        source: tantivy::TantivyError,
    },

    #[error("failed to commit batch to index {name}: {source}")]
    CommitFailed {
        name: String,
        #[source]
        source: tantivy::TantivyError,
    },

    #[error("alias swap failed: {0}")]
    AliasSwap(String),
}

pub type CrawlResult<T> = std::result::Result<T, CrawlError>;
pub type SearchSinkResult<T> = std::result::Result<T, SearchSinkError>;
