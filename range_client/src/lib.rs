#![cfg_attr(feature = "strict", deny(warnings))]

pub use crate::error::{RangeClientError, Result};
pub use http_client::{build_http_client, build_http_client_with_retry, RetryConfig};
pub use http_range_fetcher::HttpRangeFetcher;
pub use interface::RangeFetcher;
pub use memory_fetcher::MemoryRangeFetcher;

mod content_range;
mod error;
mod http_client;
mod http_range_fetcher;
mod interface;
mod memory_fetcher;
