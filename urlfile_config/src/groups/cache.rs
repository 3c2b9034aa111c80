use utils::ByteSize;

crate::config_group!({
    /// Size of each aligned range fetched from the remote resource and cached as one unit.
    ///
    /// The default value is 1mib.
    ///
    /// Use the environment variable `URLFILE_CACHE_CHUNK_SIZE_BYTES` to set this value.
    ref chunk_size_bytes: ByteSize = ByteSize::new(1024 * 1024);

    /// Maximum number of chunk bytes resident in memory across all cached chunks.
    ///
    /// The default value is 10mib.
    ///
    /// Use the environment variable `URLFILE_CACHE_CACHE_SIZE_BYTES` to set this value.
    ref cache_size_bytes: ByteSize = ByteSize::new(10 * 1024 * 1024);

    /// Number of chunk fetches a single read keeps in flight at once.
    ///
    /// Use the environment variable `URLFILE_CACHE_NUM_CONCURRENT_CHUNK_FETCHES` to set this value.
    ref num_concurrent_chunk_fetches: usize = 4;
});
