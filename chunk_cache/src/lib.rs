mod byte_range;
mod chunk_store;
pub mod error;

pub use byte_range::ByteRange;
pub use chunk_store::{ChunkStore, ChunkStoreStats};
pub use error::ChunkCacheError;

pub type Result<T> = std::result::Result<T, ChunkCacheError>;
