//! CLI entry point: builds a `CrawlerConfiguration` from command-line
//! arguments, wires the two sinks to the coordinator's event bus, and
//! runs one crawl to completion.
//!
//! Grounded on this codebase's async-main + `anyhow::Result` idiom; the
//! `clap`-derive CLI shape has no direct teacher counterpart (the
//! teacher's own `main.rs` wires an HTTP/MCP server instead) and follows
//! the `clap` derive surface used elsewhere in the retrieved pack.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use url::Url;

use kodegen_tools_citescrape::browser::{BrowserCollaborator, BrowserSettings};
use kodegen_tools_citescrape::config::CrawlerConfigBuilder;
use kodegen_tools_citescrape::events::{CrawlEvent, CrawlEventBus};
use kodegen_tools_citescrape::sinks::file_sink::FileSink;
use kodegen_tools_citescrape::sinks::search_sink::SearchSink;
use kodegen_tools_citescrape::{coordinator, logging};

const DEFAULT_OUTPUT_PATH: &str = "citescrape-output.json";
const DEFAULT_SEARCH_INDEX_DIR: &str = "citescrape-search-index";
const MAX_DEFAULT_PARALLELISM: usize = 16;

/// Site-scoped web crawler: visits pages from one or more root URLs,
/// extracts structured content, and streams records to a file sink and a
/// search-backend sink.
#[derive(Parser, Debug)]
#[command(name = "kodegen-citescrape", version, about)]
struct Cli {
    /// Root URL to start crawling from. May be repeated.
    #[arg(required = true, num_args = 1..)]
    root_url: Vec<Url>,

    /// Maximum number of concurrently in-flight page extractions. Defaults
    /// to the number of logical CPUs, capped at 16.
    #[arg(long)]
    parallelism: Option<NonZeroUsize>,

    /// Path to the streaming JSON output file.
    #[arg(long, default_value = DEFAULT_OUTPUT_PATH)]
    output: PathBuf,

    /// Directory holding the search-backend sink's physical indices and
    /// alias pointer file.
    #[arg(long, default_value = DEFAULT_SEARCH_INDEX_DIR)]
    search_index_dir: PathBuf,

    /// Log level (`trace`, `debug`, `info`, `warn`, `error`). Overrides
    /// `RUST_LOG` when set.
    #[arg(long)]
    log_level: Option<String>,
}

fn default_parallelism() -> NonZeroUsize {
    std::thread::available_parallelism()
        .map(|n| NonZeroUsize::new(n.get().min(MAX_DEFAULT_PARALLELISM)).unwrap_or(NonZeroUsize::MIN))
        .unwrap_or(NonZeroUsize::new(4).unwrap_or(NonZeroUsize::MIN))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_level.as_deref())?;

    let parallelism = cli.parallelism.unwrap_or_else(default_parallelism);

    let mut roots = cli.root_url.into_iter();
    let first_root: Url = roots.next().context("at least one root URL is required")?;

    let mut config_builder = CrawlerConfigBuilder::new()
        .degree_of_parallelism(parallelism)
        .root_url(first_root);
    for root in roots {
        config_builder = config_builder.add_root_url(root);
    }
    let config = config_builder.build().context("failed to build crawler configuration")?;

    let events = CrawlEventBus::new();
    let file_sink_receiver = events.subscribe();
    let search_sink_receiver = events.subscribe();

    let file_sink = FileSink::create(&cli.output)
        .await
        .with_context(|| format!("failed to open output file {}", cli.output.display()))?;
    let file_sink_task = tokio::spawn(run_file_sink(file_sink, file_sink_receiver));

    let search_sink = SearchSink::spawn(cli.search_index_dir.clone());
    let search_sink_task = tokio::spawn(run_search_sink(search_sink, search_sink_receiver));

    let browser = Arc::new(
        BrowserCollaborator::launch(BrowserSettings::default())
            .await
            .context("failed to launch headless browser")?,
    );

    let run_result = coordinator::run(&config, Arc::clone(&browser), events).await;

    match Arc::try_unwrap(browser) {
        Ok(browser) => {
            if let Err(e) = browser.close().await {
                warn!(error = %e, "error closing browser");
            }
        }
        Err(_) => warn!("browser still has outstanding references at shutdown"),
    }

    match file_sink_task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "file sink failed during shutdown"),
        Err(e) => error!(error = %e, "file sink task panicked"),
    }
    match search_sink_task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "search sink failed during shutdown"),
        Err(e) => error!(error = %e, "search sink task panicked"),
    }

    let pages_crawled = run_result.context("crawl run aborted on an invariant violation")?;
    info!(pages_crawled, "crawl run complete");
    Ok(())
}

/// Drain `PageCrawled` events into the file sink until `CrawlCompleted`,
/// then close the sink so the trailing `]}` is flushed. The queue is
/// unbounded (§4.G), so a file sink slower than the crawl never loses a
/// record. The file sink ignores `robots.indexPage` by design (§9 open
/// question c): it is a debug/audit trail of everything crawled, not a
/// public index.
async fn run_file_sink(sink: FileSink, mut receiver: mpsc::UnboundedReceiver<CrawlEvent>) -> anyhow::Result<()> {
    while let Some(event) = receiver.recv().await {
        match event {
            CrawlEvent::PageCrawled { data } => {
                if let Err(e) = sink.write_page(&data).await {
                    warn!(error = %e, "failed to write page to file sink");
                }
            }
            CrawlEvent::CrawlCompleted { .. } => break,
        }
    }
    sink.close().await
}

/// Drain `PageCrawled` events into the search-backend sink until
/// `CrawlCompleted`, then finish it so the last batch commits and the
/// alias swap runs. The queue is unbounded (§4.G); the search sink's own
/// batching provides backpressure instead of the channel dropping events.
/// Unlike the file sink, pages with `robots.indexPage == false` are
/// skipped (§9 open question c): this sink is the public-facing index.
async fn run_search_sink(sink: SearchSink, mut receiver: mpsc::UnboundedReceiver<CrawlEvent>) -> anyhow::Result<()> {
    while let Some(event) = receiver.recv().await {
        match event {
            CrawlEvent::PageCrawled { data } => {
                let should_index = data.robots.map(|r| r.index_page).unwrap_or(true);
                if should_index {
                    if let Err(e) = sink.enqueue(data) {
                        warn!(error = %e, "failed to enqueue page for search indexing");
                    }
                }
            }
            CrawlEvent::CrawlCompleted { .. } => break,
        }
    }
    sink.finish().await.map_err(anyhow::Error::from)
}
