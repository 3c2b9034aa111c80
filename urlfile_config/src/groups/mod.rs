pub mod cache;
pub mod client;
pub mod log;
