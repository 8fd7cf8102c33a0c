//! §4.C Page Extractor: drives navigation, dispatches on content-type, and
//! assembles the final `PageData` record.

use std::time::Duration;

use anyhow::Context;
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams, EventRequestPaused, FailRequestParams,
};
use chromiumoxide::cdp::browser_protocol::network::{
    ErrorReason, EventResponseReceived, ResourceType,
};
use chromiumoxide::Page;
use chrono::Utc;
use futures_util::StreamExt;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};
use url::Url;

use crate::errors::{CrawlError, CrawlResult};
use crate::frontier::Frontier;
use crate::robots;

use super::extractors;
use super::schema::{PageData, PageLink};
use super::xml_feeds;

const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Abort image/media/font subresources on `page` to cut load cost; continue
/// everything else. Runs as a background task for the page's lifetime.
pub async fn install_request_interception(page: &Page) -> anyhow::Result<()> {
    page.execute(EnableParams::default())
        .await
        .context("failed to enable request interception")?;

    let mut events = page
        .event_listener::<EventRequestPaused>()
        .await
        .context("failed to subscribe to intercepted requests")?;
    let page = page.clone();

    tokio::spawn(async move {
        while let Some(event) = events.next().await {
            let blocked = matches!(
                event.resource_type,
                ResourceType::Image | ResourceType::Media | ResourceType::Font
            );
            let result = if blocked {
                page.execute(FailRequestParams::new(
                    event.request_id.clone(),
                    ErrorReason::BlockedByClient,
                ))
                .await
                .map(|_| ())
            } else {
                page.execute(ContinueRequestParams::new(event.request_id.clone()))
                    .await
                    .map(|_| ())
            };
            if let Err(e) = result {
                debug!(error = %e, "request interception action failed, request may have already completed");
            }
        }
    });

    Ok(())
}

/// The main-frame response last observed for a page: the navigated URL,
/// its HTTP status, and its `content-type` header.
#[derive(Clone, Default)]
struct MainFrameResponse {
    url: String,
    status: u16,
    content_type: String,
    x_robots_tag: Option<String>,
}

/// Subscribe to `Network.responseReceived` and keep the most recent
/// response for the page's main frame, so navigation outcomes (§4.C) can
/// be classified without a second round-trip to the browser.
async fn track_main_frame_response(page: &Page) -> anyhow::Result<Arc<Mutex<Option<MainFrameResponse>>>> {
    let latest: Arc<Mutex<Option<MainFrameResponse>>> = Arc::new(Mutex::new(None));
    let mut events = page
        .event_listener::<EventResponseReceived>()
        .await
        .context("failed to subscribe to response events")?;
    let main_frame_id = page.mainframe().await.ok().flatten();
    let latest_clone = latest.clone();

    tokio::spawn(async move {
        while let Some(event) = events.next().await {
            if main_frame_id.is_some() && Some(&event.frame_id) != main_frame_id.as_ref() {
                continue;
            }
            let headers_object = event.response.headers.inner().as_object().cloned();
            let header_value = |name: &str| {
                headers_object.as_ref().and_then(|headers| {
                    headers
                        .iter()
                        .find(|(key, _)| key.eq_ignore_ascii_case(name))
                        .and_then(|(_, v)| v.as_str())
                        .map(str::to_string)
                })
            };
            let content_type = header_value("content-type")
                .unwrap_or_else(|| "text/html".to_string())
                .split(';')
                .next()
                .unwrap_or("text/html")
                .trim()
                .to_ascii_lowercase();
            let x_robots_tag = header_value("x-robots-tag");
            *latest_clone.lock().unwrap_or_else(|e| e.into_inner()) = Some(MainFrameResponse {
                url: event.response.url.clone(),
                status: event.response.status as u16,
                content_type,
                x_robots_tag,
            });
        }
    });

    Ok(latest)
}

/// Load `url` and, on success, produce a `PageData`. Returns `Ok(None)` for
/// the "log and skip" outcomes (`NavigationFailure`, `HttpNotOk`);
/// `Err(CrawlError::RedirectEncountered)` for 301/302. Every redirect or
/// navigation response URL observed along the way is recorded in
/// `frontier` via `admit_seen`, per §4.C.
pub async fn extract_page_data(
    page: &Page,
    url: &Url,
    frontier: &Frontier,
) -> CrawlResult<Option<PageData>> {
    let latest_response = track_main_frame_response(page)
        .await
        .map_err(|e| CrawlError::NavigationFailure {
            url: format!("{url} ({e})"),
        })?;

    let goto_result = tokio::time::timeout(NAVIGATION_TIMEOUT, page.goto(url.as_str()))
        .await
        .map_err(|_| CrawlError::NavigationFailure { url: url.to_string() })?;

    let Ok(_) = goto_result else {
        warn!(%url, "navigation produced no response");
        return Ok(None);
    };

    tokio::time::timeout(NAVIGATION_TIMEOUT, page.wait_for_navigation())
        .await
        .map_err(|_| CrawlError::NavigationFailure { url: url.to_string() })?
        .map_err(|_| CrawlError::NavigationFailure { url: url.to_string() })?;

    let Some(observed) = latest_response
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .clone()
    else {
        warn!(%url, "navigation produced no response");
        return Ok(None);
    };

    if let Ok(observed_url) = Url::parse(&observed.url) {
        frontier.admit_seen(&observed_url).await;
    }

    let status = observed.status;
    if status == 301 || status == 302 {
        return Err(CrawlError::RedirectEncountered { url: url.to_string(), status });
    }
    if !(200..300).contains(&status) {
        let err = CrawlError::HttpNotOk { url: url.to_string(), status };
        warn!(%url, error = %err, "skipping page");
        return Ok(None);
    }

    let content_type = observed.content_type;

    let (metadata, raw_links, feeds_and_sitemaps, main_text, headings) = tokio::try_join!(
        extractors::extract_metadata(page),
        extractors::extract_links(page),
        extractors::extract_feeds_and_sitemaps(page),
        extractors::extract_main_text(page),
        extractors::extract_headings(page),
    )
    .map_err(|e| CrawlError::ExtractionFailure {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    let content = page.content().await.ok();

    let canonical_url = metadata
        .canonical_href
        .as_deref()
        .and_then(|href| crate::normalize::resolve_normalized(url, href))
        .unwrap_or_else(|| crate::normalize::normalize(url));

    let robots_sources = observed
        .x_robots_tag
        .iter()
        .map(String::as_str)
        .chain(metadata.robots_meta.iter().map(String::as_str));
    let page_robots = robots::merge(robots_sources);

    let mut feed_links: Vec<PageLink> = Vec::new();
    if content_type == "application/atom+xml" || content_type == "application/xml" {
        match xml_feeds::atom_entry_links(content.as_deref().unwrap_or_default()) {
            Ok(hrefs) => feed_links.extend(hrefs.into_iter().filter_map(|href| {
                crate::normalize::resolve_normalized(&canonical_url, &href)
                    .map(|url| PageLink { url, text: None, follow: true })
            })),
            Err(source) => {
                let err = CrawlError::MalformedXml { url: url.to_string(), source };
                warn!(%url, error = %err, "continuing with HTML extraction");
            }
        }
    }
    if content_type == "application/rss+xml" || content_type == "application/xml" {
        match xml_feeds::rss_item_links(content.as_deref().unwrap_or_default()) {
            Ok(hrefs) => feed_links.extend(hrefs.into_iter().filter_map(|href| {
                crate::normalize::resolve_normalized(&canonical_url, &href)
                    .map(|url| PageLink { url, text: None, follow: true })
            })),
            Err(source) => {
                let err = CrawlError::MalformedXml { url: url.to_string(), source };
                warn!(%url, error = %err, "continuing with HTML extraction");
            }
        }
    }

    let html_links = raw_links.into_iter().filter_map(|raw| {
        let link_url = Url::parse(&raw.href).ok()?;
        let rel_follow = raw.rel.as_deref().and_then(robots::rel_follow_override);
        let follow = page_robots.follow_links && rel_follow.unwrap_or(true);
        Some(PageLink { url: link_url, text: raw.text, follow })
    });

    let links: Vec<PageLink> = feed_links.into_iter().chain(html_links).collect();

    let feeds = feeds_and_sitemaps
        .feeds
        .into_iter()
        .filter_map(|href| crate::normalize::resolve_normalized(url, &href))
        .collect();
    let sitemaps = feeds_and_sitemaps
        .sitemaps
        .into_iter()
        .filter_map(|href| crate::normalize::resolve_normalized(url, &href))
        .collect();

    Ok(Some(PageData {
        canonical_url,
        mime_type: Some(content_type),
        content,
        title: metadata.title,
        description: metadata.description,
        links,
        feeds,
        sitemaps,
        main_element_texts: main_text.texts,
        headers: headings.headers,
        robots: Some(page_robots),
        crawled_at: Utc::now(),
    }))
}
