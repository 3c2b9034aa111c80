#![cfg_attr(feature = "strict", deny(warnings))]

mod blocking;
pub mod errors;
pub mod logging;
mod virtual_file;

pub use blocking::BlockingUrlFile;
pub use chunk_cache::{ChunkStore, ChunkStoreStats};
pub use errors::{Result, UrlFileError};
pub use range_client::{HttpRangeFetcher, MemoryRangeFetcher, RangeClientError, RangeFetcher};
pub use urlfile_config::UrlFileConfig;
pub use virtual_file::{VirtualFile, VirtualFileBuilder};
