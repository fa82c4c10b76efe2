//! Transport seam for the chunked downloader.
//!
//! The downloader never talks HTTP directly; it drives a [`RangeFetcher`],
//! which makes the retry/resume loop testable against scripted transports
//! and keeps the HTTP client swappable.

use thiserror::Error;

use crate::locator::FileLocation;

/// Transport-level fetch failure.
///
/// `NoResponse`, `PartialResponse` and `Network` are transient conditions
/// the downloader recovers from by reconnecting and retrying the same
/// offset; `Protocol` aborts the download.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The server did not answer within the timeout.
    #[error("no response from server")]
    NoResponse,

    /// The response ended before the requested range was delivered.
    #[error("partial response from server")]
    PartialResponse,

    /// Connection-reset class transport failure.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with something other than the requested range.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl FetchError {
    /// Whether the downloader should reconnect and retry the same offset.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, FetchError::Protocol(_))
    }
}

/// A connection to a single remote resource, addressable by byte range.
pub trait RangeFetcher {
    /// Total size of the resource, via a size probe (HEAD-equivalent).
    fn resource_size(&mut self) -> Result<u64, FetchError>;

    /// Fetch up to `max_len` bytes starting at `offset`.
    ///
    /// May return fewer bytes than requested near the end of the resource.
    fn fetch_range(&mut self, offset: u64, max_len: usize) -> Result<Vec<u8>, FetchError>;

    /// Tear down and re-establish the connection to the same resource.
    ///
    /// # Errors
    ///
    /// Fails when the transport's reconnect budget is exhausted.
    fn reconnect(&mut self) -> Result<(), FetchError>;
}

/// Opens a [`RangeFetcher`] for a located file.
///
/// The workflow owns an opener rather than a fetcher so each download gets
/// a fresh connection.
pub trait FetchOpener {
    type Fetcher: RangeFetcher;

    fn open(&mut self, location: &FileLocation<'_>) -> Result<Self::Fetcher, FetchError>;
}
