//! Chunked image downloader.
//!
//! This module fetches a remote image of discoverable size in bounded
//! byte-range requests, streaming each chunk to a sink:
//! - Transport seam and error classification (`fetch`)
//! - Blocking HTTP implementation of the seam (`http`)
//! - Exponential backoff with jitter for reconnects (`retry`)
//! - Progress reporting seam (`progress`)
//! - The range-request loop with reconnect-and-resume (`chunked`)
//!
//! # Architecture
//!
//! ```text
//! ChunkedDownloader ──► RangeFetcher (trait) ──► HttpRangeFetcher
//!         │                     │
//!         │                     └── RetryPolicy (reconnect backoff)
//!         ├──► ChunkSink (trait, e.g. the image store)
//!         └──► ProgressSink (trait, optional)
//! ```
//!
//! Range requests keep per-request memory bounded to the chunk size
//! regardless of image size; resuming at the failed offset after a
//! reconnect bounds wasted transfer on flaky links.

mod chunked;
mod fetch;
mod http;
mod progress;
mod retry;

pub use chunked::{ChunkSink, ChunkedDownloader};
pub use fetch::{FetchError, FetchOpener, RangeFetcher};
pub use http::{HttpOpener, HttpRangeFetcher};
pub use progress::{LoggingProgress, ProgressSink};
pub use retry::RetryPolicy;
