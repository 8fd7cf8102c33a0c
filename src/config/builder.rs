//! Typestate builder for [`super::CrawlerConfiguration`].
//!
//! Grounded on the teacher's `CrawlConfigBuilder<WithStorageDir, WithStartUrl,
//! Complete>` marker-type pattern, slimmed down: this crawler has exactly one
//! required field (at least one root URL), so there are only two states.

use std::marker::PhantomData;
use std::num::NonZeroUsize;

use anyhow::{anyhow, Result};
use url::Url;

use crate::url_filter::UrlFilter;

use super::CrawlerConfiguration;

/// Marker type: no root URL has been supplied yet.
pub struct NeedsRootUrl;
/// Marker type: at least one root URL has been supplied; `.build()` is
/// available.
pub struct Ready;

const DEFAULT_DEGREE_OF_PARALLELISM: usize = 4;

pub struct CrawlerConfigBuilder<State = NeedsRootUrl> {
    root_urls: Vec<Url>,
    degree_of_parallelism: NonZeroUsize,
    _phantom: PhantomData<State>,
}

impl Default for CrawlerConfigBuilder<NeedsRootUrl> {
    fn default() -> Self {
        Self {
            root_urls: Vec::new(),
            degree_of_parallelism: NonZeroUsize::new(DEFAULT_DEGREE_OF_PARALLELISM)
                .unwrap_or(NonZeroUsize::MIN),
            _phantom: PhantomData,
        }
    }
}

impl CrawlerConfigBuilder<NeedsRootUrl> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one root URL. The first call transitions the builder into the
    /// `Ready` state, at which point `.build()` becomes available.
    #[must_use]
    pub fn root_url(self, url: Url) -> CrawlerConfigBuilder<Ready> {
        CrawlerConfigBuilder {
            root_urls: vec![url],
            degree_of_parallelism: self.degree_of_parallelism,
            _phantom: PhantomData,
        }
    }
}

impl CrawlerConfigBuilder<Ready> {
    /// Add an additional root URL beyond the first.
    #[must_use]
    pub fn add_root_url(mut self, url: Url) -> Self {
        self.root_urls.push(url);
        self
    }

    pub fn build(self) -> Result<CrawlerConfiguration> {
        if self.root_urls.is_empty() {
            return Err(anyhow!("at least one root URL is required"));
        }
        let filters = self
            .root_urls
            .iter()
            .flat_map(UrlFilter::for_root_url)
            .collect();
        Ok(CrawlerConfiguration {
            root_urls: self.root_urls,
            filters,
            degree_of_parallelism: self.degree_of_parallelism,
        })
    }
}

// Available at any state, since parallelism always has a sensible default.
impl<State> CrawlerConfigBuilder<State> {
    /// Override the degree of parallelism (default 4).
    #[must_use]
    pub fn degree_of_parallelism(mut self, n: NonZeroUsize) -> Self {
        self.degree_of_parallelism = n;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_without_root_url_is_unreachable_at_compile_time() {
        // `CrawlerConfigBuilder<NeedsRootUrl>` has no `.build()` method; this
        // test documents that invariant rather than exercising it.
        let builder = CrawlerConfigBuilder::new();
        let _ = builder.root_url(Url::parse("https://example.com/").unwrap());
    }

    #[test]
    fn build_with_root_url_succeeds_and_derives_filters() {
        let config = CrawlerConfigBuilder::new()
            .root_url(Url::parse("https://example.com/a/").unwrap())
            .build()
            .unwrap();
        assert_eq!(config.root_urls.len(), 1);
        assert_eq!(config.filters.len(), 2);
        assert_eq!(config.degree_of_parallelism.get(), DEFAULT_DEGREE_OF_PARALLELISM);
    }

    #[test]
    fn multiple_roots_accumulate_filters() {
        let config = CrawlerConfigBuilder::new()
            .root_url(Url::parse("https://a.example/").unwrap())
            .add_root_url(Url::parse("https://b.example/").unwrap())
            .build()
            .unwrap();
        assert_eq!(config.root_urls.len(), 2);
        assert_eq!(config.filters.len(), 4);
    }

    #[test]
    fn degree_of_parallelism_override_is_applied() {
        let config = CrawlerConfigBuilder::new()
            .degree_of_parallelism(NonZeroUsize::new(8).unwrap())
            .root_url(Url::parse("https://example.com/").unwrap())
            .build()
            .unwrap();
        assert_eq!(config.degree_of_parallelism.get(), 8);
    }
}
