use std::time::Duration;

crate::config_group!({

    /// Retry at most this many times before permanently failing.
    ref retry_max_attempts : u32 = 5;

    /// On errors that can be retried, delay for this amount of time
    /// before retrying.
    ref retry_base_delay : Duration = Duration::from_millis(3000);

    /// Upper bound on the exponential backoff between retries.
    ref retry_max_delay : Duration = Duration::from_secs(60);

    /// Timeout for establishing a connection.
    ref connect_timeout : Duration = Duration::from_secs(30);

    /// Timeout for a whole request, including reading the body of one range.
    ref read_timeout : Duration = Duration::from_secs(120);

    /// Emit progress indication through the log while range fetches are running.
    ///
    /// Use the environment variable `URLFILE_CLIENT_VERBOSE` to set this value.
    ref verbose : bool = false;
});
