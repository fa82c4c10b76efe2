//! Blocking HTTP implementation of the range fetcher.

use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;

use super::fetch::{FetchError, FetchOpener, RangeFetcher};
use super::retry::RetryPolicy;
use crate::locator::FileLocation;

/// HTTP range fetcher backed by a blocking `reqwest` client.
///
/// `reconnect` rebuilds the client after a backoff delay; the attempt
/// counter resets whenever a range is delivered, so only consecutive
/// failures count against the retry budget.
#[derive(Debug)]
pub struct HttpRangeFetcher {
    client: Client,
    url: String,
    timeout: Duration,
    retry: RetryPolicy,
    reconnect_attempt: u32,
}

impl HttpRangeFetcher {
    /// Create a fetcher for one absolute URL.
    pub fn new(url: impl Into<String>, timeout: Duration, retry: RetryPolicy) -> Result<Self, FetchError> {
        Ok(Self {
            client: Self::build_client(timeout)?,
            url: url.into(),
            timeout,
            retry,
            reconnect_attempt: 0,
        })
    }

    fn build_client(timeout: Duration) -> Result<Client, FetchError> {
        Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(format!("failed to build http client: {}", e)))
    }

    fn classify(e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::NoResponse
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

impl RangeFetcher for HttpRangeFetcher {
    fn resource_size(&mut self) -> Result<u64, FetchError> {
        let response = self
            .client
            .head(&self.url)
            .send()
            .map_err(Self::classify)?;

        if !response.status().is_success() {
            return Err(FetchError::Protocol(format!(
                "size probe failed with status {}",
                response.status()
            )));
        }

        response
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .ok_or_else(|| FetchError::Protocol("no content-length in size probe".to_string()))
    }

    fn fetch_range(&mut self, offset: u64, max_len: usize) -> Result<Vec<u8>, FetchError> {
        let end = offset + max_len as u64 - 1;
        let response = self
            .client
            .get(&self.url)
            .header("Range", format!("bytes={}-{}", offset, end))
            .send()
            .map_err(Self::classify)?;

        let status = response.status();
        if status != StatusCode::PARTIAL_CONTENT {
            if !status.is_success() {
                return Err(FetchError::Protocol(format!(
                    "range request failed with status {}",
                    status
                )));
            }
            // A plain 200 is the whole resource from byte zero; past the
            // first range those are the wrong bytes.
            if offset > 0 {
                return Err(FetchError::Protocol(format!(
                    "server ignored range request at offset {}",
                    offset
                )));
            }
        }

        let body = response
            .bytes()
            .map_err(|_| FetchError::PartialResponse)?;

        let chunk = clamp_range_body(body.to_vec(), max_len)?;
        self.reconnect_attempt = 0;
        Ok(chunk)
    }

    fn reconnect(&mut self) -> Result<(), FetchError> {
        self.reconnect_attempt += 1;

        let delay = self.retry.backoff(self.reconnect_attempt).ok_or_else(|| {
            FetchError::Network(format!(
                "reconnect attempts exhausted after {}",
                self.reconnect_attempt - 1
            ))
        })?;

        tracing::warn!(
            url = %self.url,
            attempt = self.reconnect_attempt,
            delay_ms = delay.as_millis() as u64,
            "reconnecting"
        );
        thread::sleep(delay);

        self.client = Self::build_client(self.timeout)?;
        Ok(())
    }
}

/// Bound a range response body to the requested length.
///
/// A server that ignores the `Range` header answers the first request with
/// the whole resource; keeping only the requested window preserves the
/// per-request memory bound, and the next range resumes past it.
fn clamp_range_body(mut body: Vec<u8>, max_len: usize) -> Result<Vec<u8>, FetchError> {
    if body.is_empty() {
        return Err(FetchError::PartialResponse);
    }
    if body.len() > max_len {
        tracing::warn!(
            received = body.len(),
            requested = max_len,
            "oversized range response, clamping"
        );
        body.truncate(max_len);
    }
    Ok(body)
}

/// Opens [`HttpRangeFetcher`]s for located files.
#[derive(Debug, Clone)]
pub struct HttpOpener {
    timeout: Duration,
    retry: RetryPolicy,
}

impl HttpOpener {
    pub fn new(timeout: Duration, retry: RetryPolicy) -> Self {
        Self { timeout, retry }
    }
}

impl FetchOpener for HttpOpener {
    type Fetcher = HttpRangeFetcher;

    fn open(&mut self, location: &FileLocation<'_>) -> Result<Self::Fetcher, FetchError> {
        let url = format!("http://{}{}", location.host, location.path);
        HttpRangeFetcher::new(url, self.timeout, self.retry.clone())
    }
}
