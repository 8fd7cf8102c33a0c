//! §4.C Page Extractor: given a rendered page and response, produces a
//! `PageData` record.

mod extractors;
pub mod js_scripts;
mod page_data;
pub mod schema;
mod xml_feeds;

pub use page_data::{extract_page_data, install_request_interception};
pub use schema::{PageData, PageLink};
