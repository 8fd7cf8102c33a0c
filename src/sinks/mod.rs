//! §4.F/§4.G record sinks: two independent consumers of the same
//! `PageCrawled` event stream.

pub mod file_sink;
pub mod search_sink;
