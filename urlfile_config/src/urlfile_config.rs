use utils::ByteSize;

use crate::groups;

/// All configuration for a virtual file, grouped by concern.
///
/// `UrlFileConfig::new()` holds the built-in defaults; `from_env()` additionally applies
/// `URLFILE_<GROUP>_<FIELD>` environment overrides.
#[derive(Debug, Clone, Default)]
pub struct UrlFileConfig {
    pub cache: groups::cache::ConfigValueGroup,
    pub client: groups::client::ConfigValueGroup,
    pub log: groups::log::ConfigValueGroup,
}

impl UrlFileConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let mut config = Self::new();
        config.apply_env_overrides();
        config
    }

    pub fn apply_env_overrides(&mut self) {
        self.cache.apply_env_overrides();
        self.client.apply_env_overrides();
        self.log.apply_env_overrides();
    }

    pub fn with_chunk_size(mut self, chunk_size: impl Into<ByteSize>) -> Self {
        self.cache.chunk_size_bytes = chunk_size.into();
        self
    }

    pub fn with_cache_size(mut self, cache_size: impl Into<ByteSize>) -> Self {
        self.cache.cache_size_bytes = cache_size.into();
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.client.verbose = verbose;
        self
    }

    pub fn chunk_size(&self) -> u64 {
        self.cache.chunk_size_bytes.as_u64()
    }

    pub fn cache_size(&self) -> u64 {
        self.cache.cache_size_bytes.as_u64()
    }
}
