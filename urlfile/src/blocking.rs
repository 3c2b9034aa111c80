use std::io::{self, Read, Seek, SeekFrom};
use std::sync::Arc;

use tokio::runtime::{Builder as TokioRuntimeBuilder, Handle as TokioRuntimeHandle, Runtime};
use urlfile_config::UrlFileConfig;

use crate::errors::{Result, UrlFileError};
use crate::virtual_file::{VirtualFile, VirtualFileBuilder};

const RUNTIME_NUM_WORKERS: usize = 2;
const RUNTIME_THREAD_NAME: &str = "urlfile-io";

/// A synchronous [`VirtualFile`] implementing [`std::io::Read`] and [`std::io::Seek`].
///
/// Each call blocks on a tokio runtime owned by the handle (shared with its clones), so it must
/// not be used from inside an async context.
pub struct BlockingUrlFile {
    inner: VirtualFile,
    runtime: Arc<Runtime>,
}

impl BlockingUrlFile {
    pub fn open(url: &str, config: UrlFileConfig) -> Result<Self> {
        Self::from_builder(VirtualFileBuilder::new(url).config(config))
    }

    pub fn from_builder(builder: VirtualFileBuilder) -> Result<Self> {
        if TokioRuntimeHandle::try_current().is_ok() {
            return Err(UrlFileError::Runtime(io::Error::other(
                "BlockingUrlFile cannot be opened from within a tokio runtime; use VirtualFile instead",
            )));
        }

        let runtime = TokioRuntimeBuilder::new_multi_thread()
            .worker_threads(RUNTIME_NUM_WORKERS)
            .thread_name(RUNTIME_THREAD_NAME)
            .enable_all()
            .build()?;

        let inner = runtime.block_on(builder.open())?;
        Ok(Self {
            inner,
            runtime: Arc::new(runtime),
        })
    }

    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            inner: self.inner.try_clone()?,
            runtime: self.runtime.clone(),
        })
    }

    /// Reads up to `size` bytes, or to the end of the resource when `size` is `None`.
    pub fn read_bytes(&mut self, size: Option<u64>) -> Result<Vec<u8>> {
        self.runtime.block_on(self.inner.read(size))
    }

    pub fn close(&mut self) {
        self.inner.close();
    }

    pub fn get_ref(&self) -> &VirtualFile {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut VirtualFile {
        &mut self.inner
    }
}

impl Read for BlockingUrlFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let data = self.read_bytes(Some(buf.len() as u64))?;
        buf[..data.len()].copy_from_slice(&data);
        Ok(data.len())
    }
}

impl Seek for BlockingUrlFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Ok(self.inner.seek(pos)?)
    }
}
