//! Stdout hub for local development.
//!
//! Real deployments implement [`Hub`] over their device-to-cloud channel.
//! This implementation prints each report as one JSON line, so the agent
//! can be exercised against a plain HTTP file server with no cloud
//! connection at all.

use updraft::hub::{AgentState, DeviceProperties, Hub, HubError, InstallResult, RequestDecision};
use updraft::UpdateRequest;

/// [`Hub`] that prints reports as JSON lines on stdout.
#[derive(Debug, Default)]
pub struct JsonHub;

impl Hub for JsonHub {
    fn send_response(
        &mut self,
        decision: RequestDecision,
        property_version: u32,
    ) -> Result<(), HubError> {
        let decision = match decision {
            RequestDecision::Accept => "accept",
            RequestDecision::Reject => "reject",
        };
        println!(
            "{}",
            serde_json::json!({
                "type": "response",
                "decision": decision,
                "propertyVersion": property_version,
            })
        );
        Ok(())
    }

    fn send_agent_state(
        &mut self,
        device: &DeviceProperties,
        request: Option<&UpdateRequest>,
        state: AgentState,
        results: Option<&InstallResult>,
    ) -> Result<(), HubError> {
        let mut doc = serde_json::json!({
            "type": "agentState",
            "state": state.code(),
            "device": {
                "manufacturer": device.manufacturer,
                "model": device.model,
                "installedVersion": device.installed_version,
            },
        });

        if let Some(request) = request {
            doc["workflowId"] = serde_json::json!(request.workflow_id);
        }
        if let Some(results) = results {
            let steps: Vec<_> = results
                .step_results
                .iter()
                .map(|s| {
                    serde_json::json!({
                        "resultCode": s.result_code,
                        "extendedResultCode": s.extended_result_code,
                        "resultDetails": s.details,
                    })
                })
                .collect();
            doc["results"] = serde_json::json!({
                "resultCode": results.result_code,
                "extendedResultCode": results.extended_result_code,
                "resultDetails": results.details,
                "stepResults": steps,
            });
        }

        println!("{}", doc);
        Ok(())
    }
}
