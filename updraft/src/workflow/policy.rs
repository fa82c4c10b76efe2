//! Installation decision policies.

use semver::Version;

use crate::error::{AgentError, AgentResult};
use crate::hub::RequestDecision;
use crate::manifest::UpdateRequest;

/// Caller-supplied veto over otherwise-valid update requests.
///
/// Consulted after signature verification and size gating; a `Reject`
/// here moves the workflow to its reject path.
pub trait DecisionPolicy {
    fn should_install(&mut self, request: &UpdateRequest) -> RequestDecision;
}

/// Accepts only updates whose version is newer than the installed one.
///
/// Guards against the service re-delivering the current deployment after
/// a reboot, which would otherwise reinstall the running image forever.
pub struct VersionGatePolicy {
    installed: Version,
}

impl VersionGatePolicy {
    /// Create a gate for the currently installed version.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `installed_version` is not a semantic
    /// version.
    pub fn new(installed_version: &str) -> AgentResult<Self> {
        let installed = Version::parse(installed_version).map_err(|e| {
            AgentError::InvalidArgument(format!(
                "installed version {:?} is not semver: {}",
                installed_version, e
            ))
        })?;
        Ok(Self { installed })
    }
}

impl DecisionPolicy for VersionGatePolicy {
    fn should_install(&mut self, request: &UpdateRequest) -> RequestDecision {
        let Some(update_id) = &request.update_id else {
            return RequestDecision::Reject;
        };

        match Version::parse(&update_id.version) {
            Ok(offered) if offered > self.installed => RequestDecision::Accept,
            Ok(offered) => {
                tracing::info!(
                    installed = %self.installed,
                    offered = %offered,
                    "offered update is not newer, rejecting"
                );
                RequestDecision::Reject
            }
            Err(e) => {
                tracing::warn!(
                    version = %update_id.version,
                    error = %e,
                    "offered version is not semver, rejecting"
                );
                RequestDecision::Reject
            }
        }
    }
}
