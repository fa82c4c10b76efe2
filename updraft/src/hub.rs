//! Hub collaborator interface.
//!
//! The workflow reports every decision and state change through the [`Hub`]
//! trait: accept/reject acknowledgements and agent-state documents. The
//! property-document encoding and the pub/sub plumbing behind it belong to
//! the hosting application; the library only defines the seam and the
//! payload types the service contract requires.

use thiserror::Error;

use crate::manifest::UpdateRequest;

/// Result code reported for a successful install (HTTP-style).
pub const RESULT_CODE_SUCCESS: i32 = 200;

/// Detail string attached to successful install results.
pub const RESULT_DETAILS_SUCCESS: &str = "device updated";

/// Errors surfaced by a hub implementation.
#[derive(Debug, Error)]
pub enum HubError {
    /// The hub could not deliver the message.
    #[error("failed to publish to hub: {0}")]
    Publish(String),

    /// The hub rejected the payload.
    #[error("hub rejected payload: {0}")]
    Rejected(String),
}

/// The agent's self-reported update-engine status.
///
/// Wire codes follow the device update service contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    /// No deployment in progress.
    Idle,
    /// A deployment is being downloaded or installed.
    DeploymentInProgress,
    /// The last deployment failed.
    Error,
}

impl AgentState {
    /// Service wire code for this state.
    pub fn code(&self) -> u32 {
        match self {
            AgentState::Idle => 0,
            AgentState::DeploymentInProgress => 6,
            AgentState::Error => 255,
        }
    }
}

/// Device response to an update request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestDecision {
    Accept,
    Reject,
}

/// Static device identity reported on every agent state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceProperties {
    pub manufacturer: String,
    pub model: String,
    /// Version identifier of the currently running image.
    pub installed_version: String,
}

impl DeviceProperties {
    pub fn new(
        manufacturer: impl Into<String>,
        model: impl Into<String>,
        installed_version: impl Into<String>,
    ) -> Self {
        Self {
            manufacturer: manufacturer.into(),
            model: model.into(),
            installed_version: installed_version.into(),
        }
    }
}

/// Outcome of a single install step, in manifest instruction order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepResult {
    pub result_code: i32,
    pub extended_result_code: i32,
    pub details: String,
}

/// Install outcome reported after a successful deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallResult {
    pub result_code: i32,
    pub extended_result_code: i32,
    pub details: String,
    /// One entry per manifest install step, in manifest order.
    pub step_results: Vec<StepResult>,
}

impl InstallResult {
    /// Build the all-steps-succeeded result for a request.
    pub fn success_for(request: &UpdateRequest) -> Self {
        let step = StepResult {
            result_code: RESULT_CODE_SUCCESS,
            extended_result_code: RESULT_CODE_SUCCESS,
            details: RESULT_DETAILS_SUCCESS.to_string(),
        };
        Self {
            result_code: RESULT_CODE_SUCCESS,
            extended_result_code: RESULT_CODE_SUCCESS,
            details: RESULT_DETAILS_SUCCESS.to_string(),
            step_results: vec![step; request.step_count],
        }
    }
}

/// Outbound channel to the update service.
pub trait Hub {
    /// Acknowledge an update request with accept or reject.
    fn send_response(
        &mut self,
        decision: RequestDecision,
        property_version: u32,
    ) -> Result<(), HubError>;

    /// Report the agent state, optionally with the request being processed
    /// and the install results of a finished deployment.
    fn send_agent_state(
        &mut self,
        device: &DeviceProperties,
        request: Option<&UpdateRequest>,
        state: AgentState,
        results: Option<&InstallResult>,
    ) -> Result<(), HubError>;
}
