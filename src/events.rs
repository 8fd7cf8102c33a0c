//! §9 event/subscription pattern: every extracted page is fanned out to
//! each registered sink over its own unbounded queue, generalized down
//! from this codebase's richer event-bus idiom to the two event types
//! this system needs.
//!
//! Per §4.G, a sink's inbound channel must be unbounded so a slow sink
//! never causes the crawl to drop records for *any* sink — a single
//! bounded `broadcast` channel shared across sinks would let one slow
//! subscriber's lag evict events before a faster subscriber ever saw
//! them. `CrawlEventBus` instead holds one `mpsc::UnboundedSender` per
//! subscriber and clones each event out to all of them.

use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use crate::page_extractor::PageData;

/// Events the coordinator emits. Listeners must be registered (via
/// `subscribe`) before the crawl starts, or early events may be missed.
#[derive(Debug, Clone)]
pub enum CrawlEvent {
    PageCrawled { data: Arc<PageData> },
    CrawlCompleted { pages_crawled: u64 },
}

/// Fans every published `CrawlEvent` out to each subscriber's own
/// unbounded queue. Cheap to clone; clones share the same subscriber list.
#[derive(Clone)]
pub struct CrawlEventBus {
    subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<CrawlEvent>>>>,
}

impl CrawlEventBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Register a new listener. Must be called before the coordinator
    /// starts dispatching workers, or early events may be missed. The
    /// returned queue is unbounded: the subscriber's own pace never feeds
    /// back into the crawl or into other subscribers.
    #[must_use]
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<CrawlEvent> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(sender);
        receiver
    }

    /// Publish to every current subscriber. A subscriber that has dropped
    /// its receiver is simply skipped; this is best-effort the way
    /// `broadcast::Sender::send` is for callers with no subscribers.
    pub fn publish(&self, event: CrawlEvent) {
        let subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        for sender in subscribers.iter() {
            let _ = sender.send(event.clone());
        }
    }
}

impl Default for CrawlEventBus {
    fn default() -> Self {
        Self::new()
    }
}
