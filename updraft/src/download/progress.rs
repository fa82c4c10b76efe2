//! Progress reporting seam.

/// Receives download progress after every accepted chunk.
///
/// Invoked synchronously on the downloader's stack; implementations must
/// return promptly.
pub trait ProgressSink {
    /// `downloaded` bytes of `total` have been written to the sink.
    fn on_progress(&mut self, downloaded: u64, total: u64);
}

/// Progress sink that logs at a coarse granularity.
///
/// Emits one log line per ~10% of the image rather than per chunk.
#[derive(Debug, Default)]
pub struct LoggingProgress {
    last_decile: u64,
}

impl ProgressSink for LoggingProgress {
    fn on_progress(&mut self, downloaded: u64, total: u64) {
        if total == 0 {
            return;
        }
        let decile = downloaded * 10 / total;
        if decile > self.last_decile || downloaded == total {
            self.last_decile = decile;
            tracing::info!(downloaded, total, "download progress");
        }
    }
}
