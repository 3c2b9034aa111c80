use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use lru::LruCache;
use parking_lot::Mutex;
use range_client::{RangeClientError, RangeFetcher};
use tracing::debug;
use urlfile_config::groups::cache::ConfigValueGroup as CacheConfig;
use utils::{singleflight, SingleflightError};

use crate::error::ChunkCacheError;
use crate::{ByteRange, Result};

/// Counters describing how a store has been used so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkStoreStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub num_items: usize,
    pub total_bytes: u64,
}

#[derive(Debug)]
struct StoreState {
    // Recency-ordered; LruCache::put inserts as most recently used, so entries that were
    // never re-accessed leave in insertion order.
    chunks: LruCache<u64, Bytes>,
    total_bytes: u64,
    // Bumped by invalidate_all so fetches started before it do not repopulate the store.
    generation: u64,
}

/// An in-memory cache of fixed-size, aligned chunks of one remote resource.
///
/// Chunk `i` covers bytes `[i * chunk_size, min((i + 1) * chunk_size, resource_len))`. The
/// total size of resident chunks is kept at or below `capacity`, evicting least recently used
/// chunks first; a single chunk larger than the capacity is still kept so that a read can
/// always make progress.
///
/// Concurrent requests for the same missing chunk share one fetch. All mutations happen under
/// one lock, so size and recency are never observed half-updated.
///
/// A store may be shared by several files, as long as they read byte-identical resources.
pub struct ChunkStore {
    chunk_size: u64,
    capacity: u64,
    state: Mutex<StoreState>,
    // Keyed by (generation, chunk index).
    in_flight: singleflight::Group<(u64, u64), Bytes, ChunkCacheError>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl std::fmt::Debug for ChunkStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkStore")
            .field("chunk_size", &self.chunk_size)
            .field("capacity", &self.capacity)
            .field("stats", &self.stats())
            .finish()
    }
}

impl ChunkStore {
    pub fn new(chunk_size: u64, capacity: u64) -> Result<Self> {
        if chunk_size == 0 {
            return Err(ChunkCacheError::InvalidArguments("chunk size must be positive".to_owned()));
        }

        Ok(Self {
            chunk_size,
            capacity,
            state: Mutex::new(StoreState {
                chunks: LruCache::unbounded(),
                total_bytes: 0,
                generation: 0,
            }),
            in_flight: singleflight::Group::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        })
    }

    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        Self::new(config.chunk_size_bytes.as_u64(), config.cache_size_bytes.as_u64())
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn num_items(&self) -> usize {
        self.state.lock().chunks.len()
    }

    pub fn total_bytes(&self) -> u64 {
        self.state.lock().total_bytes
    }

    /// Whether chunk `index` is resident. Does not affect recency.
    pub fn contains(&self, index: u64) -> bool {
        self.state.lock().chunks.contains(&index)
    }

    pub fn stats(&self) -> ChunkStoreStats {
        let state = self.state.lock();
        ChunkStoreStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            num_items: state.chunks.len(),
            total_bytes: state.total_bytes,
        }
    }

    /// The chunk index containing byte `offset`.
    pub fn chunk_index(&self, offset: u64) -> u64 {
        offset / self.chunk_size
    }

    /// The inclusive range of chunk indices covering the non-empty byte range `range`.
    pub fn chunk_indices(&self, range: ByteRange) -> RangeInclusive<u64> {
        debug_assert!(!range.is_empty());
        self.chunk_index(range.start)..=self.chunk_index(range.end - 1)
    }

    /// The byte range chunk `index` covers, clamped to `resource_len` when it is known.
    pub fn chunk_range(&self, index: u64, resource_len: Option<u64>) -> Result<ByteRange> {
        let start = index
            .checked_mul(self.chunk_size)
            .ok_or_else(|| ChunkCacheError::InvalidArguments(format!("chunk index {index} is out of range")))?;
        let mut end = start.saturating_add(self.chunk_size);

        if let Some(len) = resource_len {
            if start >= len {
                return Err(ChunkCacheError::BadRange {
                    index,
                    resource_len: len,
                });
            }
            end = end.min(len);
        }

        Ok(ByteRange::new(start, end))
    }

    /// Returns the bytes of chunk `index`, fetching them through `fetcher` on a miss.
    ///
    /// Fetch failures are returned as [`ChunkCacheError::Fetch`] carrying the fetcher's error
    /// unchanged, and nothing is cached for the chunk. A caller waiting on another caller's fetch
    /// takes over when that fetch is cancelled, so it only ever sees its own outcome or the
    /// fetcher's.
    pub async fn get_or_fetch(&self, index: u64, resource_len: Option<u64>, fetcher: &dyn RangeFetcher) -> Result<Bytes> {
        let range = self.chunk_range(index, resource_len)?;

        loop {
            if let Some(data) = self.get(index) {
                debug!(index, "chunk cache hit");
                return Ok(data);
            }

            // Fetches started before an invalidation run under an older generation and are
            // never joined by later callers.
            let generation = self.state.lock().generation;

            let result = self
                .in_flight
                .work(&(generation, index), || async move {
                    // Another leader may have finished between our lookup and taking the lead.
                    if let Some(data) = self.get(index) {
                        return Ok(data);
                    }

                    self.misses.fetch_add(1, Ordering::Relaxed);
                    debug!(index, generation, %range, fetcher = fetcher.name(), "chunk cache miss, fetching");

                    let data = fetcher.fetch(range.start, range.len()).await?;
                    if data.len() as u64 != range.len() {
                        return Err(ChunkCacheError::Fetch(RangeClientError::ShortRead {
                            expected: range.len(),
                            actual: data.len() as u64,
                        }));
                    }

                    self.insert(index, data.clone(), generation);
                    Ok(data)
                })
                .await;

            match result {
                Ok(data) => return Ok(data),
                Err(SingleflightError::InternalError(e)) => return Err(e),
                Err(SingleflightError::LeaderDropped) => {
                    debug!(index, "in-flight chunk fetch was cancelled, retrying");
                },
            }
        }
    }

    /// Drops every resident chunk.
    pub fn invalidate_all(&self) {
        let mut state = self.state.lock();
        state.chunks.clear();
        state.total_bytes = 0;
        state.generation += 1;
        debug!(generation = state.generation, "chunk cache invalidated");
    }

    fn get(&self, index: u64) -> Option<Bytes> {
        let data = self.state.lock().chunks.get(&index).cloned();
        if data.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        data
    }

    fn insert(&self, index: u64, data: Bytes, generation: u64) {
        let mut state = self.state.lock();

        if state.generation != generation {
            debug!(index, "chunk cache invalidated during fetch, not caching result");
            return;
        }

        let len = data.len() as u64;
        if let Some(previous) = state.chunks.put(index, data) {
            state.total_bytes -= previous.len() as u64;
        }
        state.total_bytes += len;

        // The chunk just inserted is the most recently used, so it is the last one standing.
        while state.total_bytes > self.capacity && state.chunks.len() > 1 {
            let Some((evicted_index, evicted)) = state.chunks.pop_lru() else {
                break;
            };
            state.total_bytes -= evicted.len() as u64;
            self.evictions.fetch_add(1, Ordering::Relaxed);
            debug!(evicted_index, bytes = evicted.len(), "chunk evicted");
        }
    }
}
