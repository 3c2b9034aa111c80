use std::fs::File;
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use urlfile::logging::init_logging;
use urlfile::{BlockingUrlFile, UrlFileConfig};
use utils::ByteSize;

/// Reads a byte range of a remote file over HTTP range requests and writes it out.
#[derive(Parser)]
#[clap(version)]
struct CatCommand {
    /// URL of the remote resource. The server must support byte range requests.
    url: String,
    /// Byte offset to start reading at.
    #[clap(long, default_value_t = 0)]
    offset: u64,
    /// Number of bytes to read; reads to the end of the resource if not given.
    #[clap(long)]
    length: Option<u64>,
    /// Size of each cached chunk, e.g. "1mib" or "256kib". Defaults to URLFILE_CACHE_CHUNK_SIZE_BYTES or 1mib.
    #[clap(long)]
    chunk_size: Option<ByteSize>,
    /// Cache capacity, e.g. "10mib". Defaults to URLFILE_CACHE_CACHE_SIZE_BYTES or 10mib.
    #[clap(long)]
    cache_size: Option<ByteSize>,
    /// Log download progress of each chunk.
    #[clap(short, long)]
    verbose: bool,
    /// Write the bytes to this file instead of stdout.
    #[clap(short, long)]
    output: Option<PathBuf>,
}

impl CatCommand {
    fn config(&self) -> UrlFileConfig {
        let mut config = UrlFileConfig::from_env();
        if let Some(chunk_size) = self.chunk_size {
            config = config.with_chunk_size(chunk_size);
        }
        if let Some(cache_size) = self.cache_size {
            config = config.with_cache_size(cache_size);
        }
        if self.verbose {
            config = config.with_verbose(true);
            config.log.level.get_or_insert_with(|| "info".to_owned());
        }
        config
    }

    fn run(self) -> Result<()> {
        let config = self.config();
        init_logging(&config.log);

        let mut file = BlockingUrlFile::open(&self.url, config)?;
        file.seek(SeekFrom::Start(self.offset))?;

        let mut writer: Box<dyn Write> = if let Some(path) = &self.output {
            Box::new(BufWriter::new(File::options().create(true).write(true).truncate(true).open(path)?))
        } else {
            Box::new(BufWriter::new(io::stdout()))
        };

        let copied = match self.length {
            Some(length) => io::copy(&mut (&mut file).take(length), &mut writer)?,
            None => io::copy(&mut file, &mut writer)?,
        };
        writer.flush()?;

        let stats = file.get_ref().cache_stats();
        eprintln!(
            "Copied {copied} bytes from {}: {} chunk fetches, {} cache hits, {} evictions, {} resident",
            file.get_ref().name(),
            stats.misses,
            stats.hits,
            stats.evictions,
            ByteSize::new(stats.total_bytes),
        );

        file.close();
        Ok(())
    }
}

fn main() -> Result<()> {
    CatCommand::parse().run()
}
