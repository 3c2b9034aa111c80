use std::fmt::Debug;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// A remote resource that can be read by byte range.
///
/// Implementations own transport concerns: connection reuse, retries, timeouts and
/// progress reporting. Callers never retry on top of a fetcher.
#[async_trait]
pub trait RangeFetcher: Debug + Send + Sync {
    /// Returns exactly `length` bytes starting at `offset`, or fails.
    ///
    /// `length` must be positive. Receiving fewer bytes than requested is a
    /// [`ShortRead`](crate::RangeClientError::ShortRead) failure, never a partial success.
    async fn fetch(&self, offset: u64, length: u64) -> Result<Bytes>;

    /// Discovers the total length of the resource.
    async fn probe_length(&self) -> Result<u64>;

    /// The address of the resource, used as the virtual file's name.
    fn name(&self) -> &str;
}
