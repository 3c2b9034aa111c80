use std::io::SeekFrom;
use std::sync::Arc;

use bytes::Bytes;
use chunk_cache::{ByteRange, ChunkStore, ChunkStoreStats};
use error_printer::ErrorPrinter;
use futures::{stream, StreamExt, TryStreamExt};
use range_client::{HttpRangeFetcher, RangeClientError, RangeFetcher};
use tracing::{debug, info, warn};
use urlfile_config::UrlFileConfig;

use crate::errors::{Result, UrlFileError};

const MODE: &str = "rb";

/// Configures and opens a [`VirtualFile`].
///
/// By default the file talks HTTP to `url` with a client built from the config's `client` group
/// and caches chunks in a private [`ChunkStore`] sized by the `cache` group. Either can be
/// replaced: a store shared between files, or any [`RangeFetcher`] as the transport.
pub struct VirtualFileBuilder {
    url: String,
    config: UrlFileConfig,
    length: Option<u64>,
    store: Option<Arc<ChunkStore>>,
    transport: Option<Arc<dyn RangeFetcher>>,
}

impl VirtualFileBuilder {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            config: UrlFileConfig::default(),
            length: None,
            store: None,
            transport: None,
        }
    }

    pub fn config(mut self, config: UrlFileConfig) -> Self {
        self.config = config;
        self
    }

    /// Known resource length; skips the length probe at open.
    pub fn length(mut self, length: u64) -> Self {
        self.length = Some(length);
        self
    }

    /// Cache chunks in `store` instead of a private store. The store's chunk size and capacity
    /// take precedence over the `cache` group of the config.
    pub fn store(mut self, store: Arc<ChunkStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn transport(mut self, fetcher: Arc<dyn RangeFetcher>) -> Self {
        self.transport = Some(fetcher);
        self
    }

    pub async fn open(self) -> Result<VirtualFile> {
        let fetcher: Arc<dyn RangeFetcher> = match self.transport {
            Some(fetcher) => fetcher,
            None => Arc::new(HttpRangeFetcher::new(&self.url, &self.config.client)?),
        };

        let store = match self.store {
            Some(store) => store,
            None => Arc::new(ChunkStore::from_config(&self.config.cache)?),
        };

        let length = match self.length {
            Some(length) => Some(length),
            None => match fetcher.probe_length().await {
                Ok(length) => Some(length),
                Err(RangeClientError::LengthUnavailable(reason)) => {
                    warn!(name = fetcher.name(), %reason, "resource length unavailable; seeking from end is disabled");
                    None
                },
                Err(e) => return Err(e.into()),
            },
        };

        info!(
            name = fetcher.name(),
            ?length,
            chunk_size = store.chunk_size(),
            capacity = store.capacity(),
            "opened virtual file"
        );

        Ok(VirtualFile {
            fetcher,
            store,
            length,
            cursor: 0,
            closed: false,
            num_concurrent_fetches: self.config.cache.num_concurrent_chunk_fetches.max(1),
        })
    }
}

/// A read-only, seekable, file-like view of a remote resource.
///
/// Reads are served from fixed-size aligned chunks held in a [`ChunkStore`]; only the chunks a
/// read touches are fetched, and each missing chunk is fetched once no matter how many handles
/// ask for it concurrently. Handles created with [`VirtualFile::try_clone`] share the transport
/// and the store but keep their own cursor.
pub struct VirtualFile {
    fetcher: Arc<dyn RangeFetcher>,
    store: Arc<ChunkStore>,
    length: Option<u64>,
    cursor: u64,
    closed: bool,
    num_concurrent_fetches: usize,
}

impl std::fmt::Debug for VirtualFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualFile")
            .field("name", &self.fetcher.name())
            .field("length", &self.length)
            .field("cursor", &self.cursor)
            .field("closed", &self.closed)
            .finish()
    }
}

impl VirtualFile {
    pub fn builder(url: impl Into<String>) -> VirtualFileBuilder {
        VirtualFileBuilder::new(url)
    }

    /// Opens `url` over HTTP with the given configuration.
    pub async fn open(url: &str, config: UrlFileConfig) -> Result<Self> {
        VirtualFileBuilder::new(url).config(config).open().await
    }

    /// Opens a file over an arbitrary range fetcher.
    pub async fn from_fetcher(fetcher: Arc<dyn RangeFetcher>, config: UrlFileConfig) -> Result<Self> {
        VirtualFileBuilder::new(fetcher.name())
            .config(config)
            .transport(fetcher)
            .open()
            .await
    }

    /// A new handle on the same resource, sharing transport, store and length. The new handle
    /// starts at this handle's cursor and moves independently afterwards.
    pub fn try_clone(&self) -> Result<Self> {
        self.check_open()?;
        Ok(Self {
            fetcher: self.fetcher.clone(),
            store: self.store.clone(),
            length: self.length,
            cursor: self.cursor,
            closed: false,
            num_concurrent_fetches: self.num_concurrent_fetches,
        })
    }

    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        self.check_open()?;

        let target = match pos {
            SeekFrom::Start(offset) => offset as i128,
            SeekFrom::Current(delta) => self.cursor as i128 + delta as i128,
            SeekFrom::End(delta) => self.length()? as i128 + delta as i128,
        };

        self.cursor = u64::try_from(target).map_err(|_| UrlFileError::InvalidOffset(target))?;
        Ok(self.cursor)
    }

    pub fn tell(&self) -> Result<u64> {
        self.check_open()?;
        Ok(self.cursor)
    }

    /// Reads up to `size` bytes from the cursor and advances it by the number of bytes returned.
    ///
    /// `None` reads to the end of the resource. The result is shorter than requested only when
    /// the end of the resource is reached, and empty when the cursor is at or past the end.
    /// On error the cursor does not move.
    pub async fn read(&mut self, size: Option<u64>) -> Result<Vec<u8>> {
        let data = self.read_at(self.cursor, size).await?;
        self.cursor += data.len() as u64;
        Ok(data)
    }

    /// Reads like [`VirtualFile::read`] starting at `offset`, without touching the cursor.
    pub async fn read_at(&self, offset: u64, size: Option<u64>) -> Result<Vec<u8>> {
        self.check_open()?;

        let end = match (size, self.length) {
            (Some(0), _) => return Ok(Vec::new()),
            (Some(n), Some(length)) => offset.saturating_add(n).min(length),
            (Some(n), None) => offset.checked_add(n).ok_or_else(|| {
                UrlFileError::InvalidArguments(format!("reading {n} bytes at offset {offset} overflows the addressable range"))
            })?,
            (None, Some(length)) => length,
            (None, None) => return Err(self.length_unavailable()),
        };

        if offset >= end {
            return Ok(Vec::new());
        }

        let range = ByteRange::new(offset, end);
        let indices = self.store.chunk_indices(range);
        debug!(name = self.fetcher.name(), %range, chunks = ?indices, "virtual file read");

        let chunks: Vec<(u64, Bytes)> = stream::iter(indices)
            .map(|index| async move {
                let data = self.store.get_or_fetch(index, self.length, self.fetcher.as_ref()).await?;
                Ok::<_, UrlFileError>((index, data))
            })
            .buffered(self.num_concurrent_fetches)
            .try_collect::<Vec<_>>()
            .await
            .warn_error(format_args!("read of {range} from {} failed", self.fetcher.name()))?;

        let chunk_size = self.store.chunk_size();
        let mut out = Vec::with_capacity(range.len() as usize);
        for (index, data) in chunks {
            let chunk_start = index * chunk_size;
            let chunk_end = chunk_start + data.len() as u64;
            let from = range.start.max(chunk_start) - chunk_start;
            let to = range.end.min(chunk_end) - chunk_start;
            out.extend_from_slice(&data[from as usize..to as usize]);
        }

        debug_assert_eq!(out.len() as u64, range.len());
        Ok(out)
    }

    /// Marks the handle closed; every later operation fails with [`UrlFileError::Closed`].
    /// Closing twice is a no-op.
    pub fn close(&mut self) {
        if !self.closed {
            debug!(name = self.fetcher.name(), "closing virtual file");
            self.closed = true;
        }
    }

    /// Total length of the resource.
    pub fn length(&self) -> Result<u64> {
        self.check_open()?;
        self.length.ok_or_else(|| self.length_unavailable())
    }

    pub fn known_length(&self) -> Option<u64> {
        self.length
    }

    pub fn name(&self) -> &str {
        self.fetcher.name()
    }

    pub fn mode(&self) -> &'static str {
        MODE
    }

    pub fn readable(&self) -> bool {
        true
    }

    pub fn seekable(&self) -> bool {
        true
    }

    pub fn writable(&self) -> bool {
        false
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn store(&self) -> &Arc<ChunkStore> {
        &self.store
    }

    pub fn cache_stats(&self) -> ChunkStoreStats {
        self.store.stats()
    }

    fn check_open(&self) -> Result<()> {
        if self.closed {
            return Err(UrlFileError::Closed);
        }
        Ok(())
    }

    fn length_unavailable(&self) -> UrlFileError {
        RangeClientError::LengthUnavailable(format!("length of {} is unknown", self.fetcher.name())).into()
    }
}
