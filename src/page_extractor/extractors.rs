//! Per-field extraction functions, each evaluating one script in
//! `js_scripts.rs` against a live page and deserializing the result.

use anyhow::{Context, Result};
use chromiumoxide::Page;

use super::js_scripts::{
    FEEDS_AND_SITEMAPS_SCRIPT, HEADINGS_SCRIPT, LINKS_SCRIPT, MAIN_TEXT_SCRIPT, METADATA_SCRIPT,
};
use super::schema::{RawFeedsAndSitemaps, RawHeadings, RawLink, RawMainText, RawMetadata};

/// Run `script` against `page` and deserialize the returned JSON value.
async fn evaluate<T: serde::de::DeserializeOwned>(page: &Page, script: &str) -> Result<T> {
    let js_result = page
        .evaluate(script)
        .await
        .context("failed to execute extraction script")?;
    let value = js_result
        .into_value()
        .context("failed to read extraction script result")?;
    serde_json::from_value(value).context("failed to deserialize extraction script result")
}

pub async fn extract_metadata(page: &Page) -> Result<RawMetadata> {
    evaluate(page, METADATA_SCRIPT).await
}

pub async fn extract_links(page: &Page) -> Result<Vec<RawLink>> {
    evaluate(page, LINKS_SCRIPT).await
}

pub async fn extract_feeds_and_sitemaps(page: &Page) -> Result<RawFeedsAndSitemaps> {
    evaluate(page, FEEDS_AND_SITEMAPS_SCRIPT).await
}

pub async fn extract_main_text(page: &Page) -> Result<RawMainText> {
    evaluate(page, MAIN_TEXT_SCRIPT).await
}

pub async fn extract_headings(page: &Page) -> Result<RawHeadings> {
    evaluate(page, HEADINGS_SCRIPT).await
}
