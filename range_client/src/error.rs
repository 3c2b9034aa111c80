use std::sync::Arc;

use reqwest::StatusCode;
use thiserror::Error;

/// Errors produced by a range fetcher.
///
/// The error is `Clone` so a single failed fetch can be handed to every caller waiting on it;
/// transport errors are shared behind an `Arc` for that reason.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum RangeClientError {
    #[error("Transport Error: {0}")]
    Transport(Arc<reqwest_middleware::Error>),

    #[error("HTTP status {status} from {url}")]
    HttpStatus { status: StatusCode, url: String },

    #[error("Short read: expected {expected} bytes, received {actual}")]
    ShortRead { expected: u64, actual: u64 },

    #[error("Range requests not supported: {0}")]
    RangeUnsupported(String),

    #[error("Resource length unavailable: {0}")]
    LengthUnavailable(String),

    #[error("Invalid Range: offset {offset}, length {length}")]
    InvalidRange { offset: u64, length: u64 },

    #[error("Parse Error: {0}")]
    ParseError(#[from] url::ParseError),

    #[error("Configuration Error: {0} ")]
    ConfigurationError(String),
}

pub type Result<T> = std::result::Result<T, RangeClientError>;

impl RangeClientError {
    pub fn http_status(status: StatusCode, url: impl ToString) -> Self {
        RangeClientError::HttpStatus {
            status,
            url: url.to_string(),
        }
    }
}

impl PartialEq for RangeClientError {
    fn eq(&self, other: &RangeClientError) -> bool {
        match (self, other) {
            (RangeClientError::HttpStatus { status: a, .. }, RangeClientError::HttpStatus { status: b, .. }) => a == b,
            (
                RangeClientError::ShortRead {
                    expected: e1,
                    actual: a1,
                },
                RangeClientError::ShortRead {
                    expected: e2,
                    actual: a2,
                },
            ) => e1 == e2 && a1 == a2,
            (e1, e2) => std::mem::discriminant(e1) == std::mem::discriminant(e2),
        }
    }
}

impl From<reqwest_middleware::Error> for RangeClientError {
    fn from(value: reqwest_middleware::Error) -> Self {
        RangeClientError::Transport(Arc::new(value))
    }
}

impl From<reqwest::Error> for RangeClientError {
    fn from(value: reqwest::Error) -> Self {
        RangeClientError::Transport(Arc::new(reqwest_middleware::Error::Reqwest(value)))
    }
}
