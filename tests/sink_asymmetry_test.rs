//! Integration test for spec §9 open question (c): the file sink indexes
//! every crawled page regardless of `robots.indexPage`, while the
//! search-backend sink honors it. Exercised here by wiring both sinks to a
//! real `CrawlEventBus`, the way `main.rs` does, without a browser.

use std::sync::Arc;

use chrono::Utc;
use kodegen_tools_citescrape::events::{CrawlEvent, CrawlEventBus};
use kodegen_tools_citescrape::page_extractor::PageData;
use kodegen_tools_citescrape::robots::RobotConfiguration;
use kodegen_tools_citescrape::sinks::file_sink::FileSink;
use kodegen_tools_citescrape::sinks::search_sink::SearchSink;
use tantivy::collector::Count;
use tantivy::query::AllQuery;
use tantivy::Index;
use url::Url;

fn page(url: &str, index_page: bool) -> Arc<PageData> {
    Arc::new(PageData {
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
        robots: Some(RobotConfiguration { index_page, follow_links: true }),
        crawled_at: Utc::now(),
    })
}

#[tokio::test]
async fn file_sink_keeps_noindex_pages_search_sink_drops_them() {
    let output_dir = tempfile::tempdir().unwrap();
    let index_dir = tempfile::tempdir().unwrap();

    let events = CrawlEventBus::new();
    let mut file_receiver = events.subscribe();
    let mut search_receiver = events.subscribe();

    let file_sink = FileSink::create(output_dir.path().join("out.json")).await.unwrap();
    let search_sink = SearchSink::spawn(index_dir.path());

    let indexed_page = page("https://example.com/public", true);
    let noindex_page = page("https://example.com/private", false);

    events.publish(CrawlEvent::PageCrawled { data: Arc::clone(&indexed_page) });
    events.publish(CrawlEvent::PageCrawled { data: Arc::clone(&noindex_page) });
    events.publish(CrawlEvent::CrawlCompleted { pages_crawled: 2 });

    while let Some(event) = file_receiver.recv().await {
        match event {
            CrawlEvent::PageCrawled { data } => file_sink.write_page(&data).await.unwrap(),
            CrawlEvent::CrawlCompleted { .. } => break,
        }
    }
    file_sink.close().await.unwrap();

    while let Some(event) = search_receiver.recv().await {
        match event {
            CrawlEvent::PageCrawled { data } => {
                if data.robots.map(|r| r.index_page).unwrap_or(true) {
                    search_sink.enqueue(Arc::clone(&data)).unwrap();
                }
            }
            CrawlEvent::CrawlCompleted { .. } => break,
        }
    }
    search_sink.finish().await.unwrap();

    let contents = tokio::fs::read_to_string(output_dir.path().join("out.json")).await.unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(parsed["Pages"].as_array().unwrap().len(), 2, "file sink keeps every page regardless of robots");

    let alias_path = index_dir.path().join("alias_webpages.json");
    let pointer: serde_json::Value =
        serde_json::from_str(&tokio::fs::read_to_string(&alias_path).await.unwrap()).unwrap();
    let index_name = pointer["index"].as_str().unwrap();
    let index_path = index_dir.path().join(index_name);

    let doc_count = tokio::task::spawn_blocking(move || {
        let index = Index::open_in_dir(&index_path).unwrap();
        let reader = index.reader().unwrap();
        let searcher = reader.searcher();
        searcher.search(&AllQuery, &Count).unwrap()
    })
    .await
    .unwrap();

    assert_eq!(doc_count, 1, "search sink must skip pages with robots.indexPage == false");
}
