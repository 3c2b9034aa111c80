crate::config_group!({
    /// The format the logs are printed in. If "json", then logs are dumped as json blobs; otherwise they
    /// are treated as text.
    ///
    /// Use the environment variable `URLFILE_LOG_FORMAT` to set this value.
    ref format : Option<String> = None;

    /// Default filter directive when `RUST_LOG` is not set, e.g. "info" or "urlfile=debug".
    ///
    /// Use the environment variable `URLFILE_LOG_LEVEL` to set this value.
    ref level : Option<String> = None;
});
