//! §3 data model: `PageData`, `PageLink`, and the browser-evaluate result
//! shapes extraction scripts deserialize into.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::robots::RobotConfiguration;

/// `{ url, text: optional string, follow: bool }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLink {
    pub url: Url,
    pub text: Option<String>,
    pub follow: bool,
}

/// A fully-extracted page record. Immutable after the extractor emits it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageData {
    pub canonical_url: Url,
    pub mime_type: Option<String>,
    pub content: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub links: Vec<PageLink>,
    pub feeds: Vec<Url>,
    pub sitemaps: Vec<Url>,
    pub main_element_texts: Vec<String>,
    pub headers: Vec<String>,
    pub robots: Option<RobotConfiguration>,
    pub crawled_at: DateTime<Utc>,
}

/// Raw shape returned by `METADATA_SCRIPT`: `document.title`, meta
/// description candidates, canonical link, and `meta[name=robots]` values
/// in document order.
#[derive(Debug, Clone, Deserialize)]
pub struct RawMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub canonical_href: Option<String>,
    pub robots_meta: Vec<String>,
}

/// Raw shape returned by `LINKS_SCRIPT`: every resolved anchor with its
/// rendered text and `rel` attribute.
#[derive(Debug, Clone, Deserialize)]
pub struct RawLink {
    pub href: String,
    pub text: Option<String>,
    pub rel: Option<String>,
}

/// Raw shape returned by `FEEDS_AND_SITEMAPS_SCRIPT`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawFeedsAndSitemaps {
    pub feeds: Vec<String>,
    pub sitemaps: Vec<String>,
}

/// Raw shape returned by `MAIN_TEXT_SCRIPT`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawMainText {
    pub texts: Vec<String>,
}

/// Raw shape returned by `HEADINGS_SCRIPT`: `innerText` of every h1..h6, in
/// document order.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawHeadings {
    pub headers: Vec<String>,
}
