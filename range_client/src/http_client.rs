use std::time::Duration;

use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::policies::ExponentialBackoff;
use reqwest_retry::RetryTransientMiddleware;
use tracing::debug;
use urlfile_config::groups::client::ConfigValueGroup as ClientConfig;

use crate::error::{RangeClientError, Result};

/// Retry behavior applied to every request made by the range client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Number of retries after the first attempt; 0 disables retries.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        (&ClientConfig::default()).into()
    }
}

impl From<&ClientConfig> for RetryConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            max_retries: config.retry_max_attempts,
            base_delay: config.retry_base_delay,
            max_delay: config.retry_max_delay,
        }
    }
}

impl RetryConfig {
    pub fn no_retries() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    fn policy(&self) -> ExponentialBackoff {
        // retry_bounds requires min <= max.
        let max_delay = self.max_delay.max(self.base_delay);
        ExponentialBackoff::builder()
            .retry_bounds(self.base_delay, max_delay)
            .build_with_max_retries(self.max_retries)
    }
}

/// Builds the http client used for range requests: a pooled reqwest client with connect and
/// request timeouts, wrapped in the transient-error retry middleware.
pub fn build_http_client(config: &ClientConfig) -> Result<ClientWithMiddleware> {
    build_http_client_with_retry(config, RetryConfig::from(config))
}

pub fn build_http_client_with_retry(config: &ClientConfig, retry_config: RetryConfig) -> Result<ClientWithMiddleware> {
    let reqwest_client = reqwest::Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(config.read_timeout)
        .build()
        .map_err(|e| RangeClientError::ConfigurationError(format!("failed to build http client: {e}")))?;

    debug!(?retry_config, "building range http client");

    let builder = ClientBuilder::new(reqwest_client);
    let client = if retry_config.max_retries > 0 {
        builder
            .with(RetryTransientMiddleware::new_with_policy(retry_config.policy()))
            .build()
    } else {
        builder.build()
    };

    Ok(client)
}
