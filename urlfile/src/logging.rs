use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};
use urlfile_config::groups::log::ConfigValueGroup as LogConfig;

/// Filter used when neither `RUST_LOG` nor the configured level is set.
const DEFAULT_LOG_LEVEL: &str = "warn";

/// Installs a global console subscriber writing to stderr.
///
/// The filter comes from `RUST_LOG`, then from `config.level`, then defaults to `warn`.
/// Logs are json when `config.format` is "json" and text otherwise. Calling this when a global
/// subscriber is already installed leaves the existing one in place.
pub fn init_logging(config: &LogConfig) {
    let default_level = config.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL);
    let fmt_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    let use_json = config
        .format
        .as_deref()
        .is_some_and(|format| format.trim().eq_ignore_ascii_case("json"));

    let fmt_layer_base = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_line_number(true)
        .with_file(true)
        .with_target(false);

    let registry = tracing_subscriber::registry();
    let result = if use_json {
        registry.with(fmt_layer_base.json().with_filter(fmt_filter)).try_init()
    } else {
        registry.with(fmt_layer_base.with_filter(fmt_filter)).try_init()
    };

    if let Err(e) = result {
        tracing::debug!("logging already initialized: {e}");
    }
}
