//! §4.G Search-Backend Sink: a single consumer task that batches incoming
//! records into a freshly-created physical `tantivy` index, then atomically
//! swaps a stable `webpages` alias onto it and deletes whichever index(es)
//! the alias previously pointed to.
//!
//! Grounded on `search/engine.rs` for the index-lifecycle shape (schema
//! build, `MmapDirectory`, `IndexWriter`, commit-then-reload wrapped in
//! `spawn_blocking`) and `search/indexer/mod.rs` for the batching/channel
//! idiom. `tantivy` has no native alias concept, so the alias itself is a
//! bespoke pointer file (see [`swap_alias`]) published via the same
//! write-to-temp-then-rename trick `search/engine.rs::recover_index` uses
//! for corruption-recovery backups.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tantivy::directory::MmapDirectory;
use tantivy::schema::{Schema, TextFieldIndexing, TextOptions, STORED, STRING, TEXT};
use tantivy::{doc, Index, IndexSettings, IndexWriter};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::errors::{SearchSinkError, SearchSinkResult};
use crate::page_extractor::PageData;

const ALIAS_NAME: &str = "webpages";
const BATCH_SIZE: usize = 10;
const WRITER_MEMORY_BUDGET: usize = 50_000_000;

/// `index_dir/alias_webpages.json`: `{ "index": "webpages_<ts>_<rand>" }`.
#[derive(Serialize, Deserialize)]
struct AliasPointer {
    index: String,
}

struct WebpageSchema {
    schema: Schema,
    url: tantivy::schema::Field,
    title: tantivy::schema::Field,
    description: tantivy::schema::Field,
    body: tantivy::schema::Field,
    headings: tantivy::schema::Field,
    crawled_at: tantivy::schema::Field,
}

fn build_schema() -> WebpageSchema {
    let mut builder = Schema::builder();
    let url = builder.add_text_field("url", STRING | STORED);
    let text_indexing = TextOptions::default().set_indexing_options(
        TextFieldIndexing::default().set_tokenizer("default"),
    );
    let title = builder.add_text_field("title", text_indexing.clone() | STORED);
    let description = builder.add_text_field("description", text_indexing.clone() | STORED);
    let body = builder.add_text_field("body", TEXT);
    let headings = builder.add_text_field("headings", TEXT);
    let crawled_at = builder.add_date_field(
        "crawled_at",
        tantivy::schema::DateOptions::default().set_stored().set_indexed().set_fast(),
    );
    let schema = builder.build();
    WebpageSchema { schema, url, title, description, body, headings, crawled_at }
}

/// Handle to a running search-sink consumer task. `enqueue` never blocks
/// (the channel is unbounded, per §4.G); call `finish` exactly once, after
/// the last `enqueue`, to drain the final batch and perform the alias swap.
pub struct SearchSink {
    sender: mpsc::UnboundedSender<Arc<PageData>>,
    task: JoinHandle<SearchSinkResult<()>>,
}

impl SearchSink {
    /// Create a fresh physical index under `index_dir` and start its
    /// consumer task.
    pub fn spawn(index_dir: impl Into<PathBuf>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let index_dir = index_dir.into();
        let task = tokio::spawn(run_consumer(index_dir, receiver));
        Self { sender, task }
    }

    /// Enqueue a record for indexing. Returns an error only if the consumer
    /// task has already exited (e.g. due to an earlier fatal index error).
    pub fn enqueue(&self, data: Arc<PageData>) -> SearchSinkResult<()> {
        self.sender
            .send(data)
            .map_err(|_| SearchSinkError::BackendUnavailable("consumer task has exited".into()))
    }

    /// Signal end of input, wait for the final batch to flush and the
    /// alias swap to complete.
    pub async fn finish(self) -> SearchSinkResult<()> {
        drop(self.sender);
        self.task
            .await
            .map_err(|e| SearchSinkError::BackendUnavailable(format!("consumer task panicked: {e}")))?
    }
}

async fn run_consumer(
    index_dir: PathBuf,
    mut receiver: mpsc::UnboundedReceiver<Arc<PageData>>,
) -> SearchSinkResult<()> {
    tokio::fs::create_dir_all(&index_dir)
        .await
        .map_err(|e| SearchSinkError::BackendUnavailable(format!("failed to create index directory: {e}")))?;

    let index_name = new_physical_index_name();
    let index_path = index_dir.join(&index_name);
    let schema = build_schema();

    let (index, mut writer) = create_physical_index(&index_path, &schema)?;

    let mut batch: Vec<Arc<PageData>> = Vec::with_capacity(BATCH_SIZE);
    loop {
        match receiver.try_recv() {
            Ok(page) => {
                batch.push(page);
                if batch.len() >= BATCH_SIZE {
                    flush_batch(&mut writer, &schema, &mut batch)?;
                }
            }
            Err(mpsc::error::TryRecvError::Empty) => {
                if !batch.is_empty() {
                    flush_batch(&mut writer, &schema, &mut batch)?;
                }
                match receiver.recv().await {
                    Some(page) => batch.push(page),
                    None => break,
                }
            }
            Err(mpsc::error::TryRecvError::Disconnected) => break,
        }
    }
    if !batch.is_empty() {
        flush_batch(&mut writer, &schema, &mut batch)?;
    }

    commit_and_reload(writer, index, &index_name).await?;
    swap_alias(&index_dir, &index_name).await?;

    info!(index = %index_name, "search index published under alias");
    Ok(())
}

fn new_physical_index_name() -> String {
    let timestamp = chrono::Utc::now().format("%Y%m%d%H%M%S");
    let suffix: String = {
        let mut rng = rand::rng();
        (0..8).map(|_| char::from_digit(rng.random_range(0..16), 16).unwrap()).collect()
    };
    format!("{ALIAS_NAME}_{timestamp}_{suffix}")
}

fn create_physical_index(
    index_path: &Path,
    schema: &WebpageSchema,
) -> SearchSinkResult<(Index, IndexWriter)> {
    std::fs::create_dir_all(index_path).map_err(|e| {
        SearchSinkError::BackendUnavailable(format!("failed to create {}: {e}", index_path.display()))
    })?;
    let directory = MmapDirectory::open(index_path).map_err(|e| SearchSinkError::IndexCreation {
        name: index_path.display().to_string(),
        source: e.into(),
    })?;
    let index = Index::create(directory, schema.schema.clone(), IndexSettings::default())
        .map_err(|e| SearchSinkError::IndexCreation { name: index_path.display().to_string(), source: e })?;
    let writer = index
        .writer(WRITER_MEMORY_BUDGET)
        .map_err(|e| SearchSinkError::IndexCreation { name: index_path.display().to_string(), source: e })?;
    Ok((index, writer))
}

fn flush_batch(
    writer: &mut IndexWriter,
    schema: &WebpageSchema,
    batch: &mut Vec<Arc<PageData>>,
) -> SearchSinkResult<()> {
    for page in batch.drain(..) {
        let crawled_at = tantivy::DateTime::from_timestamp_secs(page.crawled_at.timestamp());
        let document = doc!(
            schema.url => page.canonical_url.to_string(),
            schema.title => page.title.clone().unwrap_or_default(),
            schema.description => page.description.clone().unwrap_or_default(),
            schema.body => page.main_element_texts.join("\n"),
            schema.headings => page.headers.join("\n"),
            schema.crawled_at => crawled_at,
        );
        writer
            .add_document(document)
            .map_err(|e| SearchSinkError::CommitFailed { name: "pending batch".to_string(), source: e })?;
    }
    Ok(())
}

async fn commit_and_reload(mut writer: IndexWriter, _index: Index, index_name: &str) -> SearchSinkResult<()> {
    let name = index_name.to_string();
    tokio::task::spawn_blocking(move || writer.commit())
        .await
        .map_err(|e| SearchSinkError::BackendUnavailable(format!("commit task panicked: {e}")))?
        .map_err(|e| SearchSinkError::CommitFailed { name, source: e })?;
    Ok(())
}

/// Atomically point `alias_webpages.json` at `new_index_name` and delete
/// whichever physical index it previously named. The pointer write is
/// write-to-temp-file-then-`rename` within `index_dir`, so a reader never
/// observes a half-written pointer.
async fn swap_alias(index_dir: &Path, new_index_name: &str) -> SearchSinkResult<()> {
    let alias_path = index_dir.join(format!("alias_{ALIAS_NAME}.json"));
    let previous_index = match tokio::fs::read_to_string(&alias_path).await {
        Ok(content) => serde_json::from_str::<AliasPointer>(&content).ok().map(|p| p.index),
        Err(_) => None,
    };

    let pointer = AliasPointer { index: new_index_name.to_string() };
    let body = serde_json::to_vec(&pointer)
        .map_err(|e| SearchSinkError::AliasSwap(format!("failed to serialize alias pointer: {e}")))?;

    let tmp_path = index_dir.join(format!(".alias_{ALIAS_NAME}.json.tmp"));
    tokio::fs::write(&tmp_path, &body)
        .await
        .map_err(|e| SearchSinkError::AliasSwap(format!("failed to write alias pointer: {e}")))?;
    tokio::fs::rename(&tmp_path, &alias_path)
        .await
        .map_err(|e| SearchSinkError::AliasSwap(format!("failed to publish alias pointer: {e}")))?;

    if let Some(previous) = previous_index {
        if previous != new_index_name {
            let previous_path = index_dir.join(&previous);
            if let Err(e) = tokio::fs::remove_dir_all(&previous_path).await {
                warn!(index = %previous, error = %e, "failed to delete formerly-aliased index");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::robots::RobotConfiguration;
    use chrono::Utc;
    use url::Url;

    fn sample_page(url: &str) -> Arc<PageData> {
        Arc::new(PageData {
            canonical_url: Url::parse(url).unwrap(),
            mime_type: Some("text/html".to_string()),
            content: None,
            title: Some("Example".to_string()),
            description: Some("An example page".to_string()),
            links: Vec::new(),
            feeds: Vec::new(),
            sitemaps: Vec::new(),
            main_element_texts: vec!["hello world".to_string()],
            headers: vec!["Hello".to_string()],
            robots: Some(RobotConfiguration::default()),
            crawled_at: Utc::now(),
        })
    }

    #[tokio::test]
    async fn run_then_rerun_swaps_alias_and_removes_prior_index() {
        let dir = tempfile::tempdir().unwrap();

        let sink = SearchSink::spawn(dir.path());
        sink.enqueue(sample_page("https://example.com/a")).unwrap();
        sink.finish().await.unwrap();

        let alias_path = dir.path().join("alias_webpages.json");
        let pointer: AliasPointer =
            serde_json::from_str(&tokio::fs::read_to_string(&alias_path).await.unwrap()).unwrap();
        let first_index = pointer.index.clone();
        assert!(dir.path().join(&first_index).exists());

        let sink = SearchSink::spawn(dir.path());
        sink.enqueue(sample_page("https://example.com/b")).unwrap();
        sink.finish().await.unwrap();

        let pointer: AliasPointer =
            serde_json::from_str(&tokio::fs::read_to_string(&alias_path).await.unwrap()).unwrap();
        assert_ne!(pointer.index, first_index);
        assert!(!dir.path().join(&first_index).exists());
        assert!(dir.path().join(&pointer.index).exists());
    }

    #[tokio::test]
    async fn batch_larger_than_ten_flushes_in_groups() {
        let dir = tempfile::tempdir().unwrap();
        let sink = SearchSink::spawn(dir.path());
        for i in 0..25 {
            sink.enqueue(sample_page(&format!("https://example.com/{i}"))).unwrap();
        }
        sink.finish().await.unwrap();

        let alias_path = dir.path().join("alias_webpages.json");
        assert!(alias_path.exists());
    }
}
