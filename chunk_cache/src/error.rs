use range_client::RangeClientError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ChunkCacheError {
    #[error("Fetch Error: {0}")]
    Fetch(#[from] RangeClientError),

    #[error("bad range: chunk {index} starts beyond the end of a {resource_len} byte resource")]
    BadRange { index: u64, resource_len: u64 },

    #[error("Invalid Arguments: {0}")]
    InvalidArguments(String),
}
