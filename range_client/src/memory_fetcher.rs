use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use reqwest::StatusCode;
use tracing::debug;

use crate::error::{RangeClientError, Result};
use crate::interface::RangeFetcher;

/// A range fetcher over an in-memory buffer.
///
/// Besides serving bytes it records every request, which makes it the fetcher of choice for
/// testing caching behavior: fetches and probes are counted, a per-fetch delay can be added to
/// widen race windows, fetches at chosen offsets can be made to fail, and the length can be
/// hidden to emulate a resource that does not expose one.
#[derive(Debug)]
pub struct MemoryRangeFetcher {
    name: String,
    data: Bytes,
    expose_length: bool,
    delay: Option<Duration>,
    fetch_count: AtomicUsize,
    probe_count: AtomicUsize,
    fetched_ranges: Mutex<Vec<(u64, u64)>>,
    failing_offsets: Mutex<HashSet<u64>>,
}

impl MemoryRangeFetcher {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
            expose_length: true,
            delay: None,
            fetch_count: AtomicUsize::new(0),
            probe_count: AtomicUsize::new(0),
            fetched_ranges: Mutex::new(Vec::new()),
            failing_offsets: Mutex::new(HashSet::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// `probe_length` fails with `LengthUnavailable` on the returned fetcher.
    pub fn without_length(mut self) -> Self {
        self.expose_length = false;
        self
    }

    /// Every fetch starting at `offset` fails with a 503 status until cleared.
    pub fn fail_fetches_at(&self, offset: u64) {
        self.failing_offsets.lock().insert(offset);
    }

    pub fn clear_failures(&self) {
        self.failing_offsets.lock().clear();
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    pub fn probe_count(&self) -> usize {
        self.probe_count.load(Ordering::SeqCst)
    }

    /// All `(offset, length)` pairs requested so far, in request order.
    pub fn fetched_ranges(&self) -> Vec<(u64, u64)> {
        self.fetched_ranges.lock().clone()
    }
}

#[async_trait]
impl RangeFetcher for MemoryRangeFetcher {
    async fn fetch(&self, offset: u64, length: u64) -> Result<Bytes> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        self.fetched_ranges.lock().push((offset, length));
        debug!(name = %self.name, offset, length, "memory range fetch");

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if length == 0 {
            return Err(RangeClientError::InvalidRange { offset, length });
        }

        if self.failing_offsets.lock().contains(&offset) {
            return Err(RangeClientError::http_status(StatusCode::SERVICE_UNAVAILABLE, &self.name));
        }

        let total = self.data.len() as u64;
        if offset >= total {
            return Err(RangeClientError::http_status(StatusCode::RANGE_NOT_SATISFIABLE, &self.name));
        }

        let end = offset.saturating_add(length).min(total);
        if end - offset < length {
            return Err(RangeClientError::ShortRead {
                expected: length,
                actual: end - offset,
            });
        }

        Ok(self.data.slice(offset as usize..end as usize))
    }

    async fn probe_length(&self) -> Result<u64> {
        self.probe_count.fetch_add(1, Ordering::SeqCst);
        if self.expose_length {
            Ok(self.data.len() as u64)
        } else {
            Err(RangeClientError::LengthUnavailable(format!("{} does not expose a length", self.name)))
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_exact_ranges() {
        let fetcher = MemoryRangeFetcher::new("mem://a", (0u8..100).collect::<Vec<_>>());

        assert_eq!(&fetcher.fetch(10, 5).await.unwrap()[..], &[10, 11, 12, 13, 14]);
        assert_eq!(fetcher.fetch(90, 10).await.unwrap().len(), 10);
        assert_eq!(fetcher.fetch_count(), 2);
        assert_eq!(fetcher.fetched_ranges(), vec![(10, 5), (90, 10)]);
    }

    #[tokio::test]
    async fn test_fetch_past_end() {
        let fetcher = MemoryRangeFetcher::new("mem://a", vec![0u8; 100]);

        assert_eq!(
            fetcher.fetch(95, 10).await.unwrap_err(),
            RangeClientError::ShortRead { expected: 10, actual: 5 }
        );
        assert!(matches!(
            fetcher.fetch(100, 1).await,
            Err(RangeClientError::HttpStatus { status: StatusCode::RANGE_NOT_SATISFIABLE, .. })
        ));
    }

    #[tokio::test]
    async fn test_injected_failures_and_length() {
        let fetcher = MemoryRangeFetcher::new("mem://a", vec![0u8; 100]).without_length();

        fetcher.fail_fetches_at(20);
        assert!(fetcher.fetch(20, 10).await.is_err());
        assert!(fetcher.fetch(30, 10).await.is_ok());
        fetcher.clear_failures();
        assert!(fetcher.fetch(20, 10).await.is_ok());

        assert!(matches!(fetcher.probe_length().await, Err(RangeClientError::LengthUnavailable(_))));
        assert_eq!(fetcher.probe_count(), 1);
    }
}
