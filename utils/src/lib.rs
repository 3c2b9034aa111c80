#![cfg_attr(feature = "strict", deny(warnings))]

pub mod byte_size;
pub use byte_size::{ByteSize, ByteSizeParseError};

pub mod configuration_utils;
pub use configuration_utils::ParsableConfigValue;

pub mod errors;
pub use errors::SingleflightError;

mod guards;
pub use guards::EnvVarGuard;

pub mod singleflight;
