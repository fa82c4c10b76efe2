//! CLI error types.

use std::fmt;

use updraft::AgentError;

/// Errors surfaced to the CLI user.
#[derive(Debug)]
pub enum CliError {
    /// Bad or missing configuration or arguments.
    Config(String),
    /// Failure reading local files (manifest, storage root).
    Io(String),
    /// The update agent failed.
    Agent(AgentError),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Io(msg) => write!(f, "i/o error: {}", msg),
            Self::Agent(e) => write!(f, "update failed: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Agent(e) => Some(e),
            _ => None,
        }
    }
}

impl From<AgentError> for CliError {
    fn from(e: AgentError) -> Self {
        CliError::Agent(e)
    }
}
