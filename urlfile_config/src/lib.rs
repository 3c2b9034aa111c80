pub mod groups;
pub mod macros;
mod urlfile_config;

// Re-exported for use inside the config_group macro.
pub use utils::ParsableConfigValue;
pub use urlfile_config::UrlFileConfig;
