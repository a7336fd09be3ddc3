mod fetcher;
mod models;
mod parser;

pub use fetcher::{FeedFetcher, FetchError};
pub use models::{RawItem, Source};
pub use parser::{parse_items, try_parse_items};
