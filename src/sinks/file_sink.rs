//! §4.F Streaming File Sink: one UTF-8 JSON document shaped
//! `{ "Version": 1, "CreatedAt": <ISO-8601 UTC>, "Pages": [ ...PageData ] }`,
//! appended to as records arrive.
//!
//! Grounded on `content_saver/json_saver.rs`'s serialize-then-write pattern,
//! restructured: that module writes one whole document per page, this sink
//! writes one whole document for the entire run, holding the file open and
//! appending each `PageData` under a mutex so writes never interleave.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;

use crate::page_extractor::PageData;

/// Owns the open output file for one run's file sink. `write_page` may be
/// called concurrently by multiple callers; writes are serialized
/// internally. `close` must be called once, after the last `write_page`, to
/// emit the closing `]}` and flush to disk.
pub struct FileSink {
    writer: Mutex<BufWriter<File>>,
    wrote_first_page: Mutex<bool>,
}

impl FileSink {
    /// Create (or replace) the file at `path`, creating its parent
    /// directory if missing, and write the document preamble up through
    /// the opening `[` of the `Pages` array.
    pub async fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path: PathBuf = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("failed to create directory {}", parent.display()))?;
            }
        }

        let file = File::create(&path)
            .await
            .with_context(|| format!("failed to create output file {}", path.display()))?;
        let mut writer = BufWriter::new(file);

        let created_at = Utc::now().to_rfc3339();
        let preamble = format!(
            "{{\"Version\":1,\"CreatedAt\":{},\"Pages\":[",
            serde_json::to_string(&created_at).unwrap_or_else(|_| "null".to_string())
        );
        writer
            .write_all(preamble.as_bytes())
            .await
            .context("failed to write output document preamble")?;

        Ok(Self {
            writer: Mutex::new(writer),
            wrote_first_page: Mutex::new(false),
        })
    }

    /// Append one `PageData` record to the `Pages` array. Non-ASCII bytes
    /// are written exactly as `serde_json` produces them (no ASCII
    /// escaping), matching the relaxed-escaping requirement.
    pub async fn write_page(&self, data: &PageData) -> Result<()> {
        let json = serde_json::to_vec(data).context("failed to serialize page record")?;

        let mut wrote_first_page = self.wrote_first_page.lock().await;
        let mut writer = self.writer.lock().await;
        if *wrote_first_page {
            writer
                .write_all(b",")
                .await
                .context("failed to write record separator")?;
        }
        writer
            .write_all(&json)
            .await
            .context("failed to write page record")?;
        *wrote_first_page = true;
        Ok(())
    }

    /// Close the `Pages` array and the document object, then flush.
    pub async fn close(self) -> Result<()> {
        let mut writer = self.writer.into_inner();
        writer
            .write_all(b"]}")
            .await
            .context("failed to write document closing brackets")?;
        writer.flush().await.context("failed to flush output file")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::robots::RobotConfiguration;
    use chrono::Utc as ChronoUtc;
    use url::Url;

    fn sample_page(url: &str) -> PageData {
        PageData {
            canonical_url: Url::parse(url).unwrap(),
            mime_type: Some("text/html".to_string()),
            content: None,
            title: Some("Title".to_string()),
            description: None,
            links: Vec::new(),
            feeds: Vec::new(),
            sitemaps: Vec::new(),
            main_element_texts: Vec::new(),
            headers: Vec::new(),
            robots: Some(RobotConfiguration::default()),
            crawled_at: ChronoUtc::now(),
        }
    }

    #[tokio::test]
    async fn writes_a_well_formed_document_with_two_pages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");

        let sink = FileSink::create(&path).await.unwrap();
        sink.write_page(&sample_page("https://example.com/a")).await.unwrap();
        sink.write_page(&sample_page("https://example.com/b")).await.unwrap();
        sink.close().await.unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed["Version"], 1);
        assert!(parsed["CreatedAt"].is_string());
        assert_eq!(parsed["Pages"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn empty_run_still_produces_valid_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");

        let sink = FileSink::create(&path).await.unwrap();
        sink.close().await.unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed["Pages"].as_array().unwrap().len(), 0);
    }
}
