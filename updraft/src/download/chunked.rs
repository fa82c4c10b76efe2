//! The range-request download loop.

use super::fetch::{FetchError, RangeFetcher};
use super::progress::ProgressSink;
use crate::error::{AgentError, AgentResult};

/// Receives downloaded chunks in strictly increasing offset order.
///
/// A failed write aborts the download immediately; the downloader never
/// retries a chunk the sink has rejected.
pub trait ChunkSink {
    fn write_chunk(&mut self, offset: u64, data: &[u8], total_size: u64) -> AgentResult<()>;
}

/// Downloads a resource of known total size in bounded range requests.
///
/// Recoverable transport failures (no response, partial response,
/// connection reset) are handled by reconnecting and retrying the same
/// offset; the budget counts consecutive failures and resets after every
/// delivered chunk.
#[derive(Debug, Clone)]
pub struct ChunkedDownloader {
    chunk_size: usize,
    max_reconnects: u32,
}

impl ChunkedDownloader {
    /// Create a downloader.
    ///
    /// `chunk_size` bounds per-request memory; `max_reconnects` bounds how
    /// many consecutive transport failures are tolerated before the
    /// download is abandoned.
    pub fn new(chunk_size: usize, max_reconnects: u32) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            max_reconnects,
        }
    }

    /// Download the whole resource, streaming chunks into `sink`.
    ///
    /// Returns the number of bytes delivered, which equals `total_size` on
    /// success.
    ///
    /// # Errors
    ///
    /// Propagates the sink's error unchanged on a rejected chunk, and
    /// transport errors once the reconnect budget is exhausted or a
    /// non-recoverable protocol error occurs.
    pub fn download<F, S>(
        &self,
        fetcher: &mut F,
        sink: &mut S,
        total_size: u64,
        mut progress: Option<&mut dyn ProgressSink>,
    ) -> AgentResult<u64>
    where
        F: RangeFetcher,
        S: ChunkSink,
    {
        let mut offset: u64 = 0;
        let mut consecutive_failures: u32 = 0;

        while offset < total_size {
            let remaining = (total_size - offset).min(self.chunk_size as u64) as usize;

            match fetcher.fetch_range(offset, remaining) {
                Ok(chunk) => {
                    // An empty chunk makes no progress; treat it like a
                    // partial response so the loop cannot stall.
                    if chunk.is_empty() {
                        if consecutive_failures < self.max_reconnects {
                            consecutive_failures += 1;
                            fetcher.reconnect().map_err(AgentError::from)?;
                            continue;
                        }
                        return Err(FetchError::PartialResponse.into());
                    }

                    sink.write_chunk(offset, &chunk, total_size)?;
                    offset += chunk.len() as u64;
                    consecutive_failures = 0;

                    if let Some(progress) = progress.as_deref_mut() {
                        progress.on_progress(offset, total_size);
                    }
                }
                Err(e) if e.is_recoverable() && consecutive_failures < self.max_reconnects => {
                    consecutive_failures += 1;
                    tracing::warn!(
                        offset,
                        attempt = consecutive_failures,
                        error = %e,
                        "transient fetch failure, reconnecting"
                    );
                    fetcher.reconnect().map_err(AgentError::from)?;
                }
                Err(e) => {
                    tracing::error!(offset, error = %e, "download aborted");
                    return Err(e.into());
                }
            }
        }

        Ok(offset)
    }
}
