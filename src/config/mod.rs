//! §4.H Configuration: the fully-resolved settings for one crawl run, and
//! the typestate builder that produces them.

pub mod builder;

pub use builder::{CrawlerConfigBuilder, NeedsRootUrl, Ready};

use std::num::NonZeroUsize;

use url::Url;

use crate::url_filter::UrlFilter;

/// Fully-resolved settings for one crawl run. Produced only via
/// [`CrawlerConfigBuilder`], which enforces at compile time that at least
/// one root URL has been supplied.
#[derive(Debug, Clone)]
pub struct CrawlerConfiguration {
    /// Every root URL admitted into the frontier at the start of the run.
    pub root_urls: Vec<Url>,
    /// Scope filters derived from `root_urls` via
    /// [`UrlFilter::for_root_url`], one pair per root.
    pub filters: Vec<UrlFilter>,
    /// Upper bound on concurrently in-flight page extractions (§4.E).
    pub degree_of_parallelism: NonZeroUsize,
}
