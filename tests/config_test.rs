//! Integration coverage for spec §3's "both host and www.host filters"
//! rule as it plays out through the public `CrawlerConfigBuilder` surface
//! (the shape `main.rs` drives from parsed CLI arguments).

use std::num::NonZeroUsize;

use kodegen_tools_citescrape::config::CrawlerConfigBuilder;
use kodegen_tools_citescrape::url_filter::matches_any;
use url::Url;

#[test]
fn single_root_yields_host_and_www_filters_covering_the_root() {
    let config = CrawlerConfigBuilder::new()
        .root_url(Url::parse("https://example.com/blog/post").unwrap())
        .build()
        .unwrap();

    assert_eq!(config.filters.len(), 2);
    assert!(matches_any(&config.filters, &Url::parse("https://example.com/blog/other").unwrap()));
    assert!(matches_any(&config.filters, &Url::parse("https://www.example.com/blog/other").unwrap()));
    assert!(!matches_any(&config.filters, &Url::parse("https://example.com/other/other").unwrap()));
}

#[test]
fn multiple_roots_accumulate_independent_scopes() {
    let config = CrawlerConfigBuilder::new()
        .root_url(Url::parse("https://a.example/docs/").unwrap())
        .add_root_url(Url::parse("https://b.example/wiki/").unwrap())
        .degree_of_parallelism(NonZeroUsize::new(8).unwrap())
        .build()
        .unwrap();

    assert_eq!(config.root_urls.len(), 2);
    assert_eq!(config.filters.len(), 4);
    assert_eq!(config.degree_of_parallelism.get(), 8);
    assert!(matches_any(&config.filters, &Url::parse("https://a.example/docs/x").unwrap()));
    assert!(matches_any(&config.filters, &Url::parse("https://b.example/wiki/x").unwrap()));
    assert!(!matches_any(&config.filters, &Url::parse("https://a.example/wiki/x").unwrap()));
}
