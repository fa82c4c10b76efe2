//! Agent configuration.
//!
//! This module defines `AgentConfig`, the compile/boot-time configuration
//! surface of the update agent: download chunk size, HTTP timeouts, transport
//! retry limits and the device identity reported to the update service.
//! Nothing here is runtime-mutable once the workflow is constructed.

use std::time::Duration;

use crate::download::RetryPolicy;
use crate::hub::DeviceProperties;

/// Default byte-range size for image downloads (32KB).
///
/// Bounds per-request memory regardless of image size. Small enough for a
/// constrained device, large enough to keep request overhead reasonable.
pub const DEFAULT_CHUNK_SIZE: usize = 32 * 1024;

/// Default timeout for a single HTTP request (30 seconds).
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Default number of reconnect attempts the downloader makes before a
/// transient transport failure is treated as fatal.
pub const DEFAULT_MAX_RECONNECTS: u32 = 5;

/// Agent configuration.
///
/// Built once by the hosting application and handed to
/// [`UpdateWorkflow::new`](crate::workflow::UpdateWorkflow::new).
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// Device identity reported on every agent state.
    pub device: DeviceProperties,

    /// Byte-range size for image downloads.
    pub chunk_size: usize,

    /// Timeout for a single HTTP request/response pair.
    pub http_timeout: Duration,

    /// Reconnect budget for a single download.
    pub max_reconnects: u32,

    /// Backoff policy applied between transport reconnects.
    pub retry: RetryPolicy,
}

impl AgentConfig {
    /// Create a configuration with default download settings.
    pub fn new(device: DeviceProperties) -> Self {
        Self {
            device,
            chunk_size: DEFAULT_CHUNK_SIZE,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            max_reconnects: DEFAULT_MAX_RECONNECTS,
            retry: RetryPolicy::default(),
        }
    }

    /// Set the download chunk size (minimum 512 bytes).
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(512);
        self
    }

    /// Set the HTTP request timeout.
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Set the reconnect budget for a single download.
    pub fn with_max_reconnects(mut self, max_reconnects: u32) -> Self {
        self.max_reconnects = max_reconnects;
        self
    }

    /// Set the transport retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device() -> DeviceProperties {
        DeviceProperties::new("Contoso", "toaster-v2", "1.0.0")
    }

    #[test]
    fn test_agent_config_defaults() {
        let config = AgentConfig::new(device());
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(config.http_timeout.as_secs(), DEFAULT_HTTP_TIMEOUT_SECS);
        assert_eq!(config.max_reconnects, DEFAULT_MAX_RECONNECTS);
    }

    #[test]
    fn test_agent_config_builder() {
        let config = AgentConfig::new(device())
            .with_chunk_size(4096)
            .with_http_timeout(Duration::from_secs(10))
            .with_max_reconnects(2);

        assert_eq!(config.chunk_size, 4096);
        assert_eq!(config.http_timeout.as_secs(), 10);
        assert_eq!(config.max_reconnects, 2);
    }

    #[test]
    fn test_agent_config_chunk_size_floor() {
        let config = AgentConfig::new(device()).with_chunk_size(16);
        assert_eq!(config.chunk_size, 512);
    }
}
