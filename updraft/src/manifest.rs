//! Update manifest model and parsing.
//!
//! The update service delivers manifests as a property-document fragment:
//! an outer envelope carrying the workflow action, the file URLs and the
//! signed manifest, and an inner manifest document (a JSON string inside the
//! envelope) describing the update identity, install steps and file digests.
//!
//! The raw manifest bytes and the detached signature are kept on the parsed
//! [`UpdateRequest`] so the signature can be verified against exactly the
//! bytes the service signed.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::{AgentError, AgentResult};

/// Workflow action requested by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateAction {
    /// Download and apply the update.
    Apply,
    /// Cancel the current deployment.
    Cancel,
    /// Action code this agent does not understand.
    Unknown(u32),
}

impl From<u32> for UpdateAction {
    fn from(code: u32) -> Self {
        match code {
            3 => UpdateAction::Apply,
            255 => UpdateAction::Cancel,
            other => UpdateAction::Unknown(other),
        }
    }
}

/// Identity of an update: provider, name and semantic version.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateId {
    pub provider: String,
    pub name: String,
    pub version: String,
}

/// The single payload file of an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateFile {
    /// Absolute download URL supplied by the service.
    pub url: String,
    /// File name as declared in the manifest.
    pub file_name: String,
    /// Declared size in bytes. Negative means "no content".
    pub size_bytes: i64,
    /// Base64-encoded SHA-256 digest of the file contents.
    pub sha256_base64: String,
}

/// A parsed update manifest, immutable for the duration of one attempt.
///
/// `update_id` and `file` are absent on cancel requests, which carry no
/// usable manifest body.
#[derive(Debug, Clone)]
pub struct UpdateRequest {
    /// Service-side workflow correlation id.
    pub workflow_id: String,
    /// Requested action.
    pub action: UpdateAction,
    /// Retry token echoed back in acknowledgements, if present.
    pub retry_timestamp: Option<String>,
    /// Update identity (provider/name/version).
    pub update_id: Option<UpdateId>,
    /// Number of install steps declared by the manifest instructions.
    pub step_count: usize,
    /// The payload file. This agent handles the single-file manifest shape.
    pub file: Option<UpdateFile>,
    /// Raw inner-manifest bytes, exactly as signed by the service.
    pub manifest_raw: Vec<u8>,
    /// Detached JWS signature over `manifest_raw`.
    pub signature: Vec<u8>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEnvelope {
    workflow: WireWorkflow,
    #[serde(default)]
    update_manifest: String,
    #[serde(default)]
    update_manifest_signature: String,
    #[serde(default)]
    file_urls: BTreeMap<String, String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireWorkflow {
    action: u32,
    id: String,
    #[serde(default)]
    retry_timestamp: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireManifest {
    update_id: UpdateId,
    #[serde(default)]
    instructions: WireInstructions,
    #[serde(default)]
    files: BTreeMap<String, WireFile>,
}

#[derive(Deserialize, Default)]
struct WireInstructions {
    #[serde(default)]
    steps: Vec<WireStep>,
}

#[derive(Deserialize)]
struct WireStep {
    #[serde(default)]
    files: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireFile {
    file_name: String,
    size_in_bytes: i64,
    #[serde(default)]
    hashes: BTreeMap<String, String>,
}

impl UpdateRequest {
    /// Parse a property-document fragment into an `UpdateRequest`.
    ///
    /// The inner manifest is mandatory for apply requests and parsed
    /// leniently for everything else.
    ///
    /// # Errors
    ///
    /// Returns `Protocol` if the envelope is malformed, or if an apply
    /// request is missing its manifest, file URL or sha256 digest.
    pub fn parse(payload: &[u8]) -> AgentResult<Self> {
        let envelope: WireEnvelope = serde_json::from_slice(payload)
            .map_err(|e| AgentError::Protocol(format!("malformed update envelope: {}", e)))?;

        let action = UpdateAction::from(envelope.workflow.action);
        let manifest_raw = envelope.update_manifest.into_bytes();

        let manifest: Option<WireManifest> = match serde_json::from_slice(&manifest_raw) {
            Ok(manifest) => Some(manifest),
            Err(e) if action == UpdateAction::Apply => {
                return Err(AgentError::Protocol(format!(
                    "malformed update manifest: {}",
                    e
                )));
            }
            Err(_) => None,
        };

        let file = match (&manifest, action) {
            (Some(manifest), UpdateAction::Apply) => {
                Some(Self::resolve_file(manifest, &envelope.file_urls)?)
            }
            (Some(manifest), _) => Self::resolve_file(manifest, &envelope.file_urls).ok(),
            (None, _) => None,
        };

        Ok(Self {
            workflow_id: envelope.workflow.id,
            action,
            retry_timestamp: envelope.workflow.retry_timestamp,
            step_count: manifest
                .as_ref()
                .map(|m| m.instructions.steps.len().max(1))
                .unwrap_or(1),
            update_id: manifest.map(|m| m.update_id),
            file,
            manifest_raw,
            signature: envelope.update_manifest_signature.into_bytes(),
        })
    }

    /// Resolve the single payload file from the manifest and the URL map.
    fn resolve_file(
        manifest: &WireManifest,
        file_urls: &BTreeMap<String, String>,
    ) -> AgentResult<UpdateFile> {
        // Prefer the file referenced by the first install step; fall back to
        // the first file entry for manifests without explicit instructions.
        let file_id = manifest
            .instructions
            .steps
            .first()
            .and_then(|s| s.files.first())
            .or_else(|| manifest.files.keys().next())
            .ok_or_else(|| AgentError::InvalidArgument("manifest declares no files".to_string()))?;

        let entry = manifest.files.get(file_id).ok_or_else(|| {
            AgentError::Protocol(format!("manifest references unknown file id {}", file_id))
        })?;

        let url = file_urls
            .get(file_id)
            .ok_or_else(|| AgentError::Protocol(format!("no download url for file id {}", file_id)))?
            .clone();

        let sha256_base64 = entry
            .hashes
            .get("sha256")
            .ok_or_else(|| {
                AgentError::Protocol(format!("file {} has no sha256 hash", entry.file_name))
            })?
            .clone();

        Ok(UpdateFile {
            url,
            file_name: entry.file_name.clone(),
            size_bytes: entry.size_in_bytes,
            sha256_base64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply_payload(size: i64) -> Vec<u8> {
        let inner = serde_json::json!({
            "updateId": {"provider": "Contoso", "name": "Toaster", "version": "1.1.0"},
            "instructions": {"steps": [{"handler": "microsoft/swupdate:1", "files": ["f1"]}]},
            "files": {"f1": {"fileName": "image.bin", "sizeInBytes": size,
                             "hashes": {"sha256": "c29tZS1kaWdlc3Q="}}}
        })
        .to_string();

        serde_json::json!({
            "workflow": {"action": 3, "id": "wf-001"},
            "updateManifest": inner,
            "updateManifestSignature": "sig-bytes",
            "fileUrls": {"f1": "http://updates.example.com/toaster/image.bin"}
        })
        .to_string()
        .into_bytes()
    }

    #[test]
    fn test_parse_apply_request() {
        let request = UpdateRequest::parse(&apply_payload(1_048_576)).unwrap();

        assert_eq!(request.action, UpdateAction::Apply);
        assert_eq!(request.workflow_id, "wf-001");
        assert_eq!(request.update_id.as_ref().unwrap().version, "1.1.0");
        assert_eq!(request.step_count, 1);

        let file = request.file.as_ref().unwrap();
        assert_eq!(file.size_bytes, 1_048_576);
        assert_eq!(file.file_name, "image.bin");
        assert_eq!(file.url, "http://updates.example.com/toaster/image.bin");
        assert_eq!(file.sha256_base64, "c29tZS1kaWdlc3Q=");
        assert_eq!(request.signature, b"sig-bytes");
    }

    #[test]
    fn test_parse_preserves_raw_manifest_bytes() {
        let payload = apply_payload(100);
        let request = UpdateRequest::parse(&payload).unwrap();

        // The raw bytes must be exactly the signed inner document.
        let reparsed: serde_json::Value = serde_json::from_slice(&request.manifest_raw).unwrap();
        assert_eq!(reparsed["updateId"]["name"], "Toaster");
    }

    #[test]
    fn test_parse_cancel_without_manifest_body() {
        let payload = serde_json::json!({
            "workflow": {"action": 255, "id": "wf-cancel"}
        })
        .to_string();

        let request = UpdateRequest::parse(payload.as_bytes()).unwrap();
        assert_eq!(request.action, UpdateAction::Cancel);
        assert!(request.file.is_none());
        assert!(request.update_id.is_none());
    }

    #[test]
    fn test_parse_action_codes() {
        assert_eq!(UpdateAction::from(3), UpdateAction::Apply);
        assert_eq!(UpdateAction::from(255), UpdateAction::Cancel);
        assert_eq!(UpdateAction::from(7), UpdateAction::Unknown(7));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let result = UpdateRequest::parse(b"not json at all");
        assert!(matches!(result, Err(AgentError::Protocol(_))));
    }

    #[test]
    fn test_parse_apply_missing_file_url() {
        let inner = serde_json::json!({
            "updateId": {"provider": "p", "name": "n", "version": "1.0"},
            "instructions": {"steps": [{"files": ["f1"]}]},
            "files": {"f1": {"fileName": "a.bin", "sizeInBytes": 10,
                             "hashes": {"sha256": "aGFzaA=="}}}
        })
        .to_string();
        let payload = serde_json::json!({
            "workflow": {"action": 3, "id": "wf"},
            "updateManifest": inner,
            "fileUrls": {}
        })
        .to_string();

        let result = UpdateRequest::parse(payload.as_bytes());
        assert!(matches!(result, Err(AgentError::Protocol(_))));
    }

    #[test]
    fn test_parse_apply_missing_sha256() {
        let inner = serde_json::json!({
            "updateId": {"provider": "p", "name": "n", "version": "1.0"},
            "instructions": {"steps": [{"files": ["f1"]}]},
            "files": {"f1": {"fileName": "a.bin", "sizeInBytes": 10,
                             "hashes": {"md5": "deadbeef"}}}
        })
        .to_string();
        let payload = serde_json::json!({
            "workflow": {"action": 3, "id": "wf"},
            "updateManifest": inner,
            "fileUrls": {"f1": "http://host/a.bin"}
        })
        .to_string();

        let result = UpdateRequest::parse(payload.as_bytes());
        assert!(matches!(result, Err(AgentError::Protocol(_))));
    }
}
