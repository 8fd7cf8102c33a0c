//! §4.E Crawl Coordinator: drives the frontier, enforces the parallelism
//! bound, detects termination, dispatches extraction workers, and emits
//! `PageCrawled` events.
//!
//! Grounded on `crawl_engine/orchestrator.rs::crawl_pages` (permit-gated
//! spawn of one task per URL, draining completions), but the permit and
//! termination bookkeeping live inside [`crate::frontier::Frontier`]
//! instead of a free-standing `tokio::sync::Semaphore` — per §5, "the
//! tasks list and the parallelism counter share the same lock" as
//! `pending`, which a separate semaphore cannot guarantee on its own.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use url::Url;

use crate::browser::BrowserCollaborator;
use crate::config::CrawlerConfiguration;
use crate::errors::CrawlError;
use crate::events::{CrawlEvent, CrawlEventBus};
use crate::frontier::Frontier;
use crate::page_extractor::{extract_page_data, PageData};

/// Drives one crawl run to completion: admits the configured root URLs,
/// then loops `take` → `acquire_permit` → spawn worker until the frontier
/// reports closed-and-empty. Returns the total number of pages
/// successfully extracted.
pub async fn run(
    config: &CrawlerConfiguration,
    browser: Arc<BrowserCollaborator>,
    events: CrawlEventBus,
) -> Result<u64, CrawlError> {
    let frontier = Frontier::with_parallelism(
        config.filters.clone(),
        config.degree_of_parallelism.get(),
    );
    for root in &config.root_urls {
        frontier.admit(root).await;
    }

    let pages_crawled = Arc::new(AtomicU64::new(0));
    let mut workers: Vec<JoinHandle<()>> = Vec::new();

    loop {
        let Some(url) = frontier.take().await else {
            break;
        };
        frontier.acquire_permit().await;

        let worker_frontier = frontier.clone();
        let worker_browser = Arc::clone(&browser);
        let worker_events = events.clone();
        let worker_pages_crawled = Arc::clone(&pages_crawled);

        workers.push(tokio::spawn(async move {
            crawl_one(&url, &worker_browser, &worker_frontier, &worker_events, &worker_pages_crawled).await;
            // §4.E: discoveries are admitted inside `crawl_one`, before
            // this point, while the permit is still held — so releasing
            // it here and letting `Frontier` check termination under its
            // own lock can never miss a just-discovered URL.
            worker_frontier.release_permit().await;
        }));

        workers.retain(|handle| !handle.is_finished());
    }

    for handle in workers {
        if let Err(join_err) = handle.await {
            error!(error = %join_err, "crawl worker task panicked");
        }
    }

    // `take` only returns `None` once `Frontier` has closed itself, which it
    // only ever does from `release_permit` after observing `pending` empty
    // under the same lock (§4.E). If `pending` is non-empty here, that
    // bookkeeping invariant was violated and URLs were silently abandoned.
    if !frontier.pending_is_empty().await {
        return Err(CrawlError::InvariantViolation(
            "frontier reported closed with pending URLs still queued".to_string(),
        ));
    }

    let total = pages_crawled.load(Ordering::Relaxed);
    events.publish(CrawlEvent::CrawlCompleted { pages_crawled: total });
    Ok(total)
}

/// One worker's full lifecycle for a single URL: extract, emit
/// `PageCrawled`, then admit every discovered link/feed/sitemap. Errors are
/// recovered locally per §7 — the coordinator never aborts because of a
/// single bad page.
async fn crawl_one(
    url: &Url,
    browser: &BrowserCollaborator,
    frontier: &Frontier,
    events: &CrawlEventBus,
    pages_crawled: &AtomicU64,
) {
    let page = match browser.new_page().await {
        Ok(page) => page,
        Err(e) => {
            warn!(%url, error = %e, "failed to open browser page");
            return;
        }
    };

    let extraction = extract_page_data(&page, url, frontier).await;
    let _ = page.close().await;

    let data = match extraction {
        Ok(Some(data)) => data,
        Ok(None) => return,
        Err(CrawlError::RedirectEncountered { url, status }) => {
            warn!(%url, status, "redirect encountered, skipping original URL");
            return;
        }
        Err(e @ CrawlError::ExtractionFailure { .. }) => {
            error!(error = %e, "extraction failed, skipping page");
            return;
        }
        Err(e) => {
            debug_assert!(e.is_recoverable(), "per-page extraction must never surface a fatal error");
            warn!(error = %e, "navigation error, skipping page");
            return;
        }
    };

    pages_crawled.fetch_add(1, Ordering::Relaxed);
    admit_discoveries(&data, frontier).await;

    let data = Arc::new(data);
    events.publish(CrawlEvent::PageCrawled { data: Arc::clone(&data) });
    info!(url = %data.canonical_url, "page crawled");
}

/// Admit every link, feed, and sitemap discovered on the page into the
/// frontier. `PageLink::follow` governs whether a downstream consumer
/// should traverse the link, not whether the frontier discovers it — every
/// in-scope URL a page references is admitted; sinks honor `robots`
/// independently (§9 open question c).
async fn admit_discoveries(data: &PageData, frontier: &Frontier) {
    for link in &data.links {
        frontier.admit(&link.url).await;
    }
    for feed in &data.feeds {
        frontier.admit(feed).await;
    }
    for sitemap in &data.sitemaps {
        frontier.admit(sitemap).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroUsize;

    fn test_config(root: &str) -> CrawlerConfiguration {
        let url = Url::parse(root).unwrap();
        CrawlerConfiguration {
            root_urls: vec![url.clone()],
            filters: crate::url_filter::UrlFilter::for_root_url(&url),
            degree_of_parallelism: NonZeroUsize::new(2).unwrap(),
        }
    }

    #[test]
    fn config_filters_cover_root() {
        let config = test_config("https://example.com/a/");
        assert!(crate::url_filter::matches_any(
            &config.filters,
            &Url::parse("https://example.com/a/x").unwrap()
        ));
    }
}
