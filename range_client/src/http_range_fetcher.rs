use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use error_printer::{ErrorPrinter, OptionPrinter};
use progress_tracking::{LoggingProgressUpdater, RangeProgress, TrackingProgressUpdater};
use reqwest::header::{HeaderMap, ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_RANGE, RANGE};
use reqwest::{StatusCode, Url};
use reqwest_middleware::ClientWithMiddleware;
use tracing::{debug, warn};
use urlfile_config::groups::client::ConfigValueGroup as ClientConfig;

use crate::content_range::parse_content_range;
use crate::error::{RangeClientError, Result};
use crate::http_client::build_http_client;
use crate::interface::RangeFetcher;

/// Fetches byte ranges of a single URL with HTTP range requests.
pub struct HttpRangeFetcher {
    client: ClientWithMiddleware,
    url: Url,
    name: String,
    progress_updater: Option<Arc<dyn TrackingProgressUpdater>>,
}

impl fmt::Debug for HttpRangeFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRangeFetcher")
            .field("url", &self.name)
            .field("progress", &self.progress_updater.is_some())
            .finish()
    }
}

impl HttpRangeFetcher {
    /// Creates a fetcher with its own client built from `config`. When `config.verbose` is set,
    /// fetch progress is reported through the log.
    pub fn new(url: &str, config: &ClientConfig) -> Result<Self> {
        let client = build_http_client(config)?;
        let progress_updater = config
            .verbose
            .then(|| Arc::new(LoggingProgressUpdater::default()) as Arc<dyn TrackingProgressUpdater>)
            .debug_none("range fetch progress reporting disabled");

        let mut fetcher = Self::with_client(url, client)?;
        fetcher.progress_updater = progress_updater;
        Ok(fetcher)
    }

    /// Creates a fetcher around an existing client, e.g. one shared between several files.
    pub fn with_client(url: &str, client: ClientWithMiddleware) -> Result<Self> {
        let url = Url::parse(url)?;
        Ok(Self {
            client,
            name: url.to_string(),
            url,
            progress_updater: None,
        })
    }

    pub fn with_progress_updater(mut self, updater: Arc<dyn TrackingProgressUpdater>) -> Self {
        self.progress_updater = Some(updater);
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn probe_length_by_range(&self) -> Result<u64> {
        debug!(url = %self.url, "probing length with a single byte range request");

        let response = self.client.get(self.url.clone()).header(RANGE, "bytes=0-0").send().await?;
        let status = response.status();

        match status {
            StatusCode::PARTIAL_CONTENT | StatusCode::RANGE_NOT_SATISFIABLE => {
                let content_range = header_str(response.headers(), CONTENT_RANGE.as_str())
                    .and_then(parse_content_range)
                    .ok_or_else(|| {
                        RangeClientError::LengthUnavailable(format!("{status} response without a usable Content-Range"))
                    })?;

                content_range.total.ok_or_else(|| {
                    RangeClientError::LengthUnavailable("server reports an unknown total length".to_owned())
                })
            },
            StatusCode::OK => Err(RangeClientError::RangeUnsupported(format!(
                "{} answered a range request with the full resource",
                self.url
            ))),
            s => Err(RangeClientError::http_status(s, &self.url)),
        }
    }
}

#[async_trait]
impl RangeFetcher for HttpRangeFetcher {
    async fn fetch(&self, offset: u64, length: u64) -> Result<Bytes> {
        if length == 0 {
            return Err(RangeClientError::InvalidRange { offset, length });
        }
        let end = offset
            .checked_add(length - 1)
            .ok_or(RangeClientError::InvalidRange { offset, length })?;

        let range = format!("bytes={offset}-{end}");
        debug!(url = %self.url, %range, "range fetch");

        let mut response = self
            .client
            .get(self.url.clone())
            .header(RANGE, &range)
            .send()
            .await
            .log_error(format!("range request {range} to {} failed", self.url))?;

        match response.status() {
            StatusCode::PARTIAL_CONTENT => {
                if let Some(content_range) = header_str(response.headers(), CONTENT_RANGE.as_str()) {
                    match parse_content_range(content_range).and_then(|c| c.range) {
                        Some((start, _)) if start == offset => {},
                        _ => {
                            return Err(RangeClientError::RangeUnsupported(format!(
                                "requested {range}, server answered with Content-Range {content_range}"
                            )));
                        },
                    }
                }
            },
            // A server that ignores Range replies 200 with the whole body. That is only the
            // requested data when the request covered the resource from its start exactly.
            StatusCode::OK if offset == 0 && response.content_length() == Some(length) => {},
            StatusCode::OK => {
                return Err(RangeClientError::RangeUnsupported(format!(
                    "{} ignored the range request {range}",
                    self.url
                )));
            },
            s => return Err(RangeClientError::http_status(s, &self.url)),
        }

        let item_progress = self
            .progress_updater
            .as_ref()
            .map(|p| RangeProgress::new(p.clone(), format!("{} {range}", self.name).into(), length));

        let mut buffer = BytesMut::with_capacity(length as usize);
        while let Some(block) = response.chunk().await? {
            if (buffer.len() + block.len()) as u64 > length {
                return Err(RangeClientError::RangeUnsupported(format!(
                    "server sent more than the {length} bytes requested by {range}"
                )));
            }
            buffer.extend_from_slice(&block);
            if let Some(p) = &item_progress {
                p.record(block.len() as u64).await;
            }
        }

        if (buffer.len() as u64) < length {
            warn!(url = %self.url, %range, received = buffer.len(), "short read");
            return Err(RangeClientError::ShortRead {
                expected: length,
                actual: buffer.len() as u64,
            });
        }

        Ok(buffer.freeze())
    }

    async fn probe_length(&self) -> Result<u64> {
        let response = self.client.head(self.url.clone()).send().await?;
        let status = response.status();

        if status == StatusCode::METHOD_NOT_ALLOWED || status == StatusCode::NOT_IMPLEMENTED {
            return self.probe_length_by_range().await;
        }
        if !status.is_success() {
            return Err(RangeClientError::http_status(status, &self.url));
        }

        let headers = response.headers();
        if let Some(accept_ranges) = header_str(headers, ACCEPT_RANGES.as_str()) {
            if !accept_ranges.split(',').any(|unit| unit.trim().eq_ignore_ascii_case("bytes")) {
                return Err(RangeClientError::RangeUnsupported(format!(
                    "{} advertises Accept-Ranges: {accept_ranges}",
                    self.url
                )));
            }
        }

        // Read the header directly; the body size hint of a HEAD response is always empty.
        match header_str(headers, CONTENT_LENGTH.as_str()).and_then(|v| v.trim().parse::<u64>().ok()) {
            Some(length) => {
                debug!(url = %self.url, length, "probed length");
                Ok(length)
            },
            None => self.probe_length_by_range().await,
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tracing_test::traced_test;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::http_client::build_http_client_with_retry;
    use crate::RetryConfig;

    fn test_data(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    fn fetcher_for(server: &MockServer) -> HttpRangeFetcher {
        let client = build_http_client_with_retry(&ClientConfig::default(), RetryConfig::no_retries()).unwrap();
        HttpRangeFetcher::with_client(&format!("{}/data.bin", server.uri()), client).unwrap()
    }

    #[derive(Debug, Default)]
    struct RecordingUpdater {
        completed: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl TrackingProgressUpdater for RecordingUpdater {
        async fn register_updates(&self, updates: &[progress_tracking::ProgressUpdate]) {
            let mut completed = self.completed.lock().unwrap();
            completed.extend(updates.iter().map(|u| u.completed_count));
        }
    }

    #[tokio::test]
    #[traced_test]
    async fn test_fetch_partial_content() {
        let server = MockServer::start().await;
        let data = test_data(100);

        Mock::given(method("GET"))
            .and(path("/data.bin"))
            .and(header("Range", "bytes=10-19"))
            .respond_with(
                ResponseTemplate::new(206)
                    .insert_header("Content-Range", "bytes 10-19/100")
                    .set_body_bytes(data[10..20].to_vec()),
            )
            .expect(1)
            .mount(&server)
            .await;

        let recorder = Arc::new(RecordingUpdater::default());
        let fetcher = fetcher_for(&server).with_progress_updater(recorder.clone());

        let bytes = fetcher.fetch(10, 10).await.unwrap();
        assert_eq!(&bytes[..], &data[10..20]);
        assert_eq!(recorder.completed.lock().unwrap().last(), Some(&10));
    }

    #[tokio::test]
    async fn test_fetch_short_read() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(header("Range", "bytes=0-9"))
            .respond_with(ResponseTemplate::new(206).set_body_bytes(vec![1u8; 4]))
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server);
        assert_eq!(
            fetcher.fetch(0, 10).await.unwrap_err(),
            RangeClientError::ShortRead { expected: 10, actual: 4 }
        );
    }

    #[tokio::test]
    async fn test_fetch_status_errors() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server);
        match fetcher.fetch(0, 10).await {
            Err(RangeClientError::HttpStatus { status, .. }) => assert_eq!(status, StatusCode::NOT_FOUND),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_range_ignored() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(test_data(100)))
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server);
        assert!(matches!(fetcher.fetch(50, 10).await, Err(RangeClientError::RangeUnsupported(_))));
        assert!(matches!(fetcher.fetch(0, 10).await, Err(RangeClientError::RangeUnsupported(_))));

        // The whole resource requested from the start is fine even without range support.
        assert_eq!(fetcher.fetch(0, 100).await.unwrap().len(), 100);
    }

    #[tokio::test]
    async fn test_fetch_zero_length_is_invalid() {
        let server = MockServer::start().await;
        let fetcher = fetcher_for(&server);
        assert!(matches!(fetcher.fetch(5, 0).await, Err(RangeClientError::InvalidRange { .. })));
    }

    #[tokio::test]
    async fn test_probe_length_head() {
        let server = MockServer::start().await;

        Mock::given(method("HEAD"))
            .and(path("/data.bin"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Accept-Ranges", "bytes")
                    .set_body_bytes(test_data(1234)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server);
        assert_eq!(fetcher.probe_length().await.unwrap(), 1234);
    }

    #[tokio::test]
    async fn test_probe_length_rejects_accept_ranges_none() {
        let server = MockServer::start().await;

        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200).insert_header("Accept-Ranges", "none"))
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server);
        assert!(matches!(fetcher.probe_length().await, Err(RangeClientError::RangeUnsupported(_))));
    }

    #[tokio::test]
    async fn test_probe_length_falls_back_to_range_probe() {
        let server = MockServer::start().await;

        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(405))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(header("Range", "bytes=0-0"))
            .respond_with(
                ResponseTemplate::new(206)
                    .insert_header("Content-Range", "bytes 0-0/5000")
                    .set_body_bytes(vec![0u8]),
            )
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server);
        assert_eq!(fetcher.probe_length().await.unwrap(), 5000);
    }

    #[tokio::test]
    async fn test_probe_length_empty_resource() {
        let server = MockServer::start().await;

        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(405))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(416).insert_header("Content-Range", "bytes */0"))
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server);
        assert_eq!(fetcher.probe_length().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_probe_length_unknown_total() {
        let server = MockServer::start().await;

        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(405))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(206)
                    .insert_header("Content-Range", "bytes 0-0/*")
                    .set_body_bytes(vec![0u8]),
            )
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server);
        assert!(matches!(fetcher.probe_length().await, Err(RangeClientError::LengthUnavailable(_))));
    }

    #[test]
    fn test_invalid_url() {
        let client = build_http_client_with_retry(&ClientConfig::default(), RetryConfig::no_retries()).unwrap();
        assert!(matches!(
            HttpRangeFetcher::with_client("not a url", client),
            Err(RangeClientError::ParseError(_))
        ));
    }
}
