use std::io;

use chunk_cache::ChunkCacheError;
use range_client::RangeClientError;
use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum UrlFileError {
    /// Failure reported by the range fetcher, passed through unchanged: transport errors,
    /// unexpected HTTP statuses, short reads, unavailable length.
    #[error(transparent)]
    Fetch(#[from] RangeClientError),

    #[error("Chunk Cache Error: {0}")]
    ChunkCache(ChunkCacheError),

    #[error("Invalid offset {0}: resulting position would be negative or out of range")]
    InvalidOffset(i128),

    #[error("Invalid Arguments: {0}")]
    InvalidArguments(String),

    #[error("I/O operation on closed file")]
    Closed,

    #[error("Runtime Error: {0}")]
    Runtime(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, UrlFileError>;

impl UrlFileError {
    pub fn is_length_unavailable(&self) -> bool {
        matches!(self, UrlFileError::Fetch(RangeClientError::LengthUnavailable(_)))
    }
}

impl From<ChunkCacheError> for UrlFileError {
    fn from(value: ChunkCacheError) -> Self {
        match value {
            ChunkCacheError::Fetch(e) => UrlFileError::Fetch(e),
            e => UrlFileError::ChunkCache(e),
        }
    }
}

impl From<UrlFileError> for io::Error {
    fn from(value: UrlFileError) -> Self {
        let kind = match &value {
            UrlFileError::InvalidOffset(_) | UrlFileError::InvalidArguments(_) => io::ErrorKind::InvalidInput,
            UrlFileError::Fetch(RangeClientError::ShortRead { .. }) => io::ErrorKind::UnexpectedEof,
            UrlFileError::Runtime(e) => e.kind(),
            _ => io::ErrorKind::Other,
        };
        io::Error::new(kind, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_cache_fetch_errors_are_unwrapped() {
        let err: UrlFileError = ChunkCacheError::Fetch(RangeClientError::ShortRead { expected: 10, actual: 3 }).into();
        assert!(matches!(err, UrlFileError::Fetch(RangeClientError::ShortRead { expected: 10, actual: 3 })));

        let err: UrlFileError = ChunkCacheError::InvalidArguments("chunk size must be positive".to_owned()).into();
        assert!(matches!(err, UrlFileError::ChunkCache(ChunkCacheError::InvalidArguments(_))));
    }

    #[test]
    fn test_io_error_kinds() {
        let e: io::Error = UrlFileError::InvalidOffset(-1).into();
        assert_eq!(e.kind(), io::ErrorKind::InvalidInput);

        let e: io::Error = UrlFileError::InvalidArguments("size overflows".to_owned()).into();
        assert_eq!(e.kind(), io::ErrorKind::InvalidInput);

        let e: io::Error = UrlFileError::Fetch(RangeClientError::ShortRead { expected: 2, actual: 1 }).into();
        assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof);

        let e: io::Error = UrlFileError::Closed.into();
        assert_eq!(e.kind(), io::ErrorKind::Other);
        assert!(e.into_inner().unwrap().downcast::<UrlFileError>().is_ok());
    }
}
