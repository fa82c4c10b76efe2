//! Error types for the update agent.

use std::fmt;

use crate::download::FetchError;
use crate::hub::HubError;
use crate::store::StoreError;

/// Result type for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;

/// Errors that can occur while driving an update through the workflow.
#[derive(Debug)]
pub enum AgentError {
    /// Malformed input: bad URL, missing field, undersized buffer.
    InvalidArgument(String),

    /// Manifest or signature could not be understood or did not validate.
    Protocol(String),

    /// Transport-level failure that exhausted its local retries.
    Network(String),

    /// Erase/write/read fault on the image bank.
    Storage(StoreError),

    /// Downloaded image hash does not match the manifest hash,
    /// or the image is empty.
    VerificationFailed { expected: String, actual: String },

    /// Failure reporting state or decisions to the hub.
    Hub(HubError),

    /// A manifest arrived while a previous update was still in flight.
    Busy,

    /// Internal failure with no more specific classification.
    Failed(String),
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            Self::Protocol(msg) => write!(f, "protocol error: {}", msg),
            Self::Network(msg) => write!(f, "network error: {}", msg),
            Self::Storage(e) => write!(f, "storage error: {}", e),
            Self::VerificationFailed { expected, actual } => {
                write!(
                    f,
                    "image verification failed: expected {}, got {}",
                    expected, actual
                )
            }
            Self::Hub(e) => write!(f, "hub error: {}", e),
            Self::Busy => write!(f, "an update is already in flight"),
            Self::Failed(msg) => write!(f, "update failed: {}", msg),
        }
    }
}

impl std::error::Error for AgentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Storage(e) => Some(e),
            Self::Hub(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for AgentError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::VerificationFailed { expected, actual } => {
                AgentError::VerificationFailed { expected, actual }
            }
            other => AgentError::Storage(other),
        }
    }
}

impl From<HubError> for AgentError {
    fn from(e: HubError) -> Self {
        AgentError::Hub(e)
    }
}

impl From<FetchError> for AgentError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::Protocol(msg) => AgentError::Protocol(msg),
            other => AgentError::Network(other.to_string()),
        }
    }
}
