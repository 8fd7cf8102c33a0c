pub mod browser;
pub mod config;
pub mod coordinator;
pub mod errors;
pub mod events;
pub mod frontier;
pub mod logging;
pub mod normalize;
pub mod page_extractor;
pub mod robots;
pub mod sinks;
pub mod url_filter;

pub use config::CrawlerConfiguration;
pub use errors::{CrawlError, CrawlResult, SearchSinkError, SearchSinkResult};
pub use events::{CrawlEvent, CrawlEventBus};
pub use frontier::Frontier;
