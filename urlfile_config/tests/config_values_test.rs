use std::time::Duration;

use serial_test::serial;
use urlfile_config::{config_group, UrlFileConfig};
use utils::{ByteSize, EnvVarGuard};

mod example {
    use super::*;

    config_group!({
        /// Test integer value
        ref test_int: usize = 42;

        /// Test boolean value
        ref test_bool: bool = false;

        /// Test duration value
        ref test_duration: Duration = Duration::from_secs(60);

        /// Test byte size value
        ref test_byte_size: ByteSize = ByteSize::from("1mb");

        /// Test optional value
        ref test_optional: Option<String> = None;
    });
}

#[test]
#[serial(config_env)]
fn test_defaults_without_env() {
    let _g1 = EnvVarGuard::unset("URLFILE_EXAMPLE_TEST_INT");
    let _g2 = EnvVarGuard::unset("URLFILE_EXAMPLE_TEST_OPTIONAL");

    let mut config = example::ConfigValueGroup::new();
    config.apply_env_overrides();
    assert_eq!(config.test_int, 42);
    assert!(!config.test_bool);
    assert_eq!(config.test_duration, Duration::from_secs(60));
    assert_eq!(config.test_byte_size.as_u64(), 1_000_000);
    assert_eq!(config.test_optional, None);
}

#[test]
#[serial(config_env)]
fn test_env_overrides() {
    assert_eq!(example::ConfigValueGroup::env_prefix(), "URLFILE_EXAMPLE_");

    let _g1 = EnvVarGuard::set("URLFILE_EXAMPLE_TEST_INT", "7");
    let _g2 = EnvVarGuard::set("URLFILE_EXAMPLE_TEST_BOOL", "yes");
    let _g3 = EnvVarGuard::set("URLFILE_EXAMPLE_TEST_DURATION", "5s");
    let _g4 = EnvVarGuard::set("URLFILE_EXAMPLE_TEST_BYTE_SIZE", "2mib");
    let _g5 = EnvVarGuard::set("URLFILE_EXAMPLE_TEST_OPTIONAL", "hello");

    let mut config = example::ConfigValueGroup::new();
    config.apply_env_overrides();
    assert_eq!(config.test_int, 7);
    assert!(config.test_bool);
    assert_eq!(config.test_duration, Duration::from_secs(5));
    assert_eq!(config.test_byte_size.as_u64(), 2 << 20);
    assert_eq!(config.test_optional.as_deref(), Some("hello"));
}

#[test]
#[serial(config_env)]
fn test_unparseable_env_keeps_default() {
    let _g = EnvVarGuard::set("URLFILE_EXAMPLE_TEST_INT", "many");

    let mut config = example::ConfigValueGroup::new();
    config.apply_env_overrides();
    assert_eq!(config.test_int, 42);
}

#[test]
#[serial(config_env)]
fn test_urlfile_config_defaults() {
    let config = UrlFileConfig::new();
    assert_eq!(config.chunk_size(), 1024 * 1024);
    assert_eq!(config.cache_size(), 10 * 1024 * 1024);
    assert!(!config.client.verbose);
    assert_eq!(config.cache.num_concurrent_chunk_fetches, 4);
}

#[test]
#[serial(config_env)]
fn test_urlfile_config_from_env() {
    let _g1 = EnvVarGuard::set("URLFILE_CACHE_CHUNK_SIZE_BYTES", "4mib");
    let _g2 = EnvVarGuard::set("URLFILE_CACHE_CACHE_SIZE_BYTES", "64mib");
    let _g3 = EnvVarGuard::set("URLFILE_CLIENT_VERBOSE", "1");

    let config = UrlFileConfig::from_env();
    assert_eq!(config.chunk_size(), 4 << 20);
    assert_eq!(config.cache_size(), 64 << 20);
    assert!(config.client.verbose);
}

#[test]
fn test_builder_helpers() {
    let config = UrlFileConfig::new()
        .with_chunk_size(4096u64)
        .with_cache_size(ByteSize::from("1mib"))
        .with_verbose(true);
    assert_eq!(config.chunk_size(), 4096);
    assert_eq!(config.cache_size(), 1 << 20);
    assert!(config.client.verbose);
}
