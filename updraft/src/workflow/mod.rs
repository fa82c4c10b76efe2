//! The update workflow state machine.
//!
//! One [`UpdateWorkflow`] instance drives one device's updates:
//! - `process_update_request` validates an incoming manifest and picks the
//!   accept/reject/cancel path
//! - `process` performs one state's work per call, so the hosting loop
//!   stays responsive
//! - `accept_update` runs the accepted update to completion synchronously
//! - `reject_update` abandons a pending request at any time
//!
//! # Architecture
//!
//! ```text
//!                 ┌──────────── process_update_request ────────────┐
//!                 ▼                    ▼                           ▼
//! Idle ──► Accept ──► Download ──► ReportSuccess ──► Idle       Cancel/
//!              │          │              │                   ActionUnknown
//!              ▼          ▼              ▼                        │
//! Reject ──► Finish ──► Idle          Error ──► Idle ◄────────────┘
//! ```
//!
//! Every state has a defined next state for both success and failure of
//! its action; any step failure routes through `Error`, which reports the
//! failure to the hub and returns to `Idle` without ever looping.
//!
//! A successful install reports its results and returns to `Idle` without
//! sending an idle agent-state: the service counts the deployment as
//! succeeded only when the device reboots into the new image and its next
//! `init` reports idle with the new version. An idle report naming the old
//! version here would mark the deployment failed.

mod policy;

pub use policy::{DecisionPolicy, VersionGatePolicy};

use crate::config::AgentConfig;
use crate::download::{
    ChunkSink, ChunkedDownloader, FetchOpener, ProgressSink, RangeFetcher,
};
use crate::error::{AgentError, AgentResult};
use crate::hub::{AgentState, Hub, InstallResult, RequestDecision};
use crate::locator::parse_file_url;
use crate::manifest::{UpdateAction, UpdateFile, UpdateRequest};
use crate::store::{ImageContext, ImageStore};
use crate::verify::ManifestVerifier;

/// Where the workflow is in the update lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    /// No deployment pending.
    Idle,
    /// Request validated and accepted; the accept ack is owed to the hub.
    Accept,
    /// Image download, verification and bank enable in progress.
    Download,
    /// Image enabled; the install result is owed to the hub.
    ReportSuccess,
    /// Request rejected; the reject ack has been sent.
    Finish,
    /// Request validated and rejected; the reject ack is owed to the hub.
    Reject,
    /// The service cancelled the deployment.
    Cancel,
    /// The request carried an action code this agent does not understand.
    ActionUnknown,
    /// A previous step failed; the error report is owed to the hub.
    Error,
}

/// The update workflow engine.
///
/// Generic over its four collaborators so hosts can swap transports and
/// storage backends, and tests can script all of them.
pub struct UpdateWorkflow<H, S, V, F>
where
    H: Hub,
    S: ImageStore,
    V: ManifestVerifier,
    F: FetchOpener,
{
    config: AgentConfig,
    hub: H,
    store: S,
    verifier: V,
    opener: F,
    state: WorkflowState,
    request: Option<UpdateRequest>,
    property_version: u32,
    policy: Option<Box<dyn DecisionPolicy>>,
    progress: Option<Box<dyn ProgressSink>>,
}

/// Adapts the image store to the downloader's chunk sink.
struct StoreSink<'a, S: ImageStore> {
    store: &'a mut S,
    ctx: &'a mut ImageContext,
}

impl<S: ImageStore> ChunkSink for StoreSink<'_, S> {
    fn write_chunk(&mut self, offset: u64, data: &[u8], _total: u64) -> AgentResult<()> {
        self.store
            .write_block(self.ctx, offset, data)
            .map_err(AgentError::from)
    }
}

impl<H, S, V, F> UpdateWorkflow<H, S, V, F>
where
    H: Hub,
    S: ImageStore,
    V: ManifestVerifier,
    F: FetchOpener,
{
    /// Create a workflow in `Idle` with no pending request.
    pub fn new(config: AgentConfig, hub: H, store: S, verifier: V, opener: F) -> Self {
        Self {
            config,
            hub,
            store,
            verifier,
            opener,
            state: WorkflowState::Idle,
            request: None,
            property_version: 0,
            policy: None,
            progress: None,
        }
    }

    /// Install a decision policy consulted before accepting a request.
    pub fn with_policy(mut self, policy: Box<dyn DecisionPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Install a progress sink invoked after every downloaded chunk.
    pub fn with_progress(mut self, progress: Box<dyn ProgressSink>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Current state.
    pub fn state(&self) -> WorkflowState {
        self.state
    }

    /// The hub collaborator.
    pub fn hub(&self) -> &H {
        &self.hub
    }

    /// The image store collaborator.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutable access to the image store, e.g. for `reset_device`.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// The request currently being processed, if any.
    pub fn current_request(&self) -> Option<&UpdateRequest> {
        self.request.as_ref()
    }

    /// Announce the device to the service with an idle agent state.
    ///
    /// Called once after boot. After an update this carries the new
    /// installed version, which is what confirms the deployment on the
    /// service side.
    ///
    /// # Errors
    ///
    /// Propagates the hub failure; the workflow stays `Idle`.
    pub fn init(&mut self) -> AgentResult<()> {
        tracing::info!(
            manufacturer = %self.config.device.manufacturer,
            model = %self.config.device.model,
            version = %self.config.device.installed_version,
            "announcing device"
        );
        self.hub
            .send_agent_state(&self.config.device, None, AgentState::Idle, None)?;
        Ok(())
    }

    /// Validate an incoming manifest and choose the workflow path.
    ///
    /// Apply requests are signature-verified and then gated on declared
    /// image size, bank capacity and the optional decision policy; all
    /// gates passing moves to `Accept`, any gate failing moves to
    /// `Reject`. Cancel moves to `Cancel`; unrecognized actions move to
    /// `ActionUnknown`. The chosen path is driven by subsequent
    /// [`process`](Self::process) calls.
    ///
    /// # Errors
    ///
    /// Returns `Busy` when a request is already in flight, `Protocol` when
    /// the manifest is malformed or its signature does not validate. On
    /// error the workflow state is untouched.
    pub fn process_update_request(
        &mut self,
        payload: &[u8],
        property_version: u32,
    ) -> AgentResult<()> {
        if self.state != WorkflowState::Idle {
            return Err(AgentError::Busy);
        }

        let request = UpdateRequest::parse(payload)?;
        tracing::info!(
            workflow_id = %request.workflow_id,
            action = ?request.action,
            "update request received"
        );

        let next = match request.action {
            UpdateAction::Apply => {
                self.verifier
                    .verify(&request.manifest_raw, &request.signature)
                    .map_err(|e| AgentError::Protocol(e.to_string()))?;
                self.evaluate_prerequisites(&request)?
            }
            UpdateAction::Cancel => WorkflowState::Cancel,
            UpdateAction::Unknown(code) => {
                tracing::warn!(code, "unrecognized workflow action");
                WorkflowState::ActionUnknown
            }
        };

        self.property_version = property_version;
        self.request = Some(request);
        self.state = next;
        Ok(())
    }

    /// Size and policy gates for a signature-verified apply request.
    fn evaluate_prerequisites(&mut self, request: &UpdateRequest) -> AgentResult<WorkflowState> {
        let file = request
            .file
            .as_ref()
            .ok_or_else(|| AgentError::Protocol("apply request has no file".to_string()))?;

        if file.size_bytes <= 0 {
            tracing::warn!(size = file.size_bytes, "declared image size is empty, rejecting");
            return Ok(WorkflowState::Reject);
        }

        let capacity = self.store.bank_capacity()?;
        if file.size_bytes as u64 > capacity {
            tracing::warn!(
                size = file.size_bytes,
                capacity,
                "image exceeds bank capacity, rejecting"
            );
            return Ok(WorkflowState::Reject);
        }

        if let Some(policy) = self.policy.as_mut() {
            if policy.should_install(request) == RequestDecision::Reject {
                tracing::info!("decision policy rejected the update");
                return Ok(WorkflowState::Reject);
            }
        }

        Ok(WorkflowState::Accept)
    }

    /// Perform one state's work and transition.
    ///
    /// Bounded per call; the hosting loop calls this repeatedly until the
    /// workflow returns to `Idle`.
    ///
    /// # Errors
    ///
    /// Returns the failure that moved the workflow to `Error`; the next
    /// `process` call reports it to the hub and recovers to `Idle`.
    pub fn process(&mut self) -> AgentResult<()> {
        match self.state {
            WorkflowState::Idle => Ok(()),
            WorkflowState::Accept => self.step_accept(),
            WorkflowState::Download => self.step_download(),
            WorkflowState::ReportSuccess => self.step_report_success(),
            WorkflowState::Reject => self.step_reject(),
            WorkflowState::Finish
            | WorkflowState::Cancel
            | WorkflowState::ActionUnknown => self.step_finish(),
            WorkflowState::Error => self.step_error(),
        }
    }

    /// Run an accepted update to completion.
    ///
    /// Explicit-consent entry point: drives `Accept`, `Download` and
    /// `ReportSuccess` synchronously, invoking the progress sink after
    /// every chunk.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when no accepted request is pending, or
    /// the first step failure; the workflow is left in `Error` so the
    /// next `process` call reports it.
    pub fn accept_update(&mut self) -> AgentResult<()> {
        if self.state != WorkflowState::Accept {
            return Err(AgentError::InvalidArgument(
                "no accepted update pending".to_string(),
            ));
        }

        while matches!(
            self.state,
            WorkflowState::Accept | WorkflowState::Download | WorkflowState::ReportSuccess
        ) {
            self.process()?;
        }
        Ok(())
    }

    /// Abandon the pending request, if any.
    ///
    /// Idempotent: with no request pending this is a no-op, so rejection
    /// is reported at most once.
    ///
    /// # Errors
    ///
    /// Propagates the hub failure; the workflow moves to `Error`.
    pub fn reject_update(&mut self) -> AgentResult<()> {
        let Some(request) = self.request.take() else {
            return Ok(());
        };

        tracing::info!(workflow_id = %request.workflow_id, "rejecting pending update");
        let sent = self
            .hub
            .send_response(RequestDecision::Reject, self.property_version)
            .and_then(|_| {
                self.hub.send_agent_state(
                    &self.config.device,
                    Some(&request),
                    AgentState::Idle,
                    None,
                )
            });

        match sent {
            Ok(()) => {
                self.state = WorkflowState::Idle;
                Ok(())
            }
            Err(e) => {
                self.state = WorkflowState::Error;
                Err(e.into())
            }
        }
    }

    fn step_accept(&mut self) -> AgentResult<()> {
        match self
            .hub
            .send_response(RequestDecision::Accept, self.property_version)
        {
            Ok(()) => {
                self.state = WorkflowState::Download;
                Ok(())
            }
            Err(e) => self.fail(e.into()),
        }
    }

    fn step_download(&mut self) -> AgentResult<()> {
        let Some(file) = self.request.as_ref().and_then(|r| r.file.clone()) else {
            return self.fail(AgentError::Failed("download state with no file".to_string()));
        };

        if let Err(e) = self.hub.send_agent_state(
            &self.config.device,
            self.request.as_ref(),
            AgentState::DeploymentInProgress,
            None,
        ) {
            return self.fail(e.into());
        }

        let mut ctx = match self.store.init() {
            Ok(ctx) => ctx,
            Err(e) => return self.fail(e.into()),
        };

        match self.run_download(&file, &mut ctx) {
            Ok(()) => {
                self.state = WorkflowState::ReportSuccess;
                Ok(())
            }
            Err(e) => {
                // Discard the half-written bank; the device stays bootable
                // from its current image.
                self.store.abort(ctx);
                self.fail(e)
            }
        }
    }

    /// Locate, download, verify and enable the image into `ctx`.
    fn run_download(&mut self, file: &UpdateFile, ctx: &mut ImageContext) -> AgentResult<()> {
        let location = parse_file_url(&file.url)?;
        let mut fetcher = self.opener.open(&location)?;

        let total_size = fetcher.resource_size()?;
        if total_size != file.size_bytes as u64 {
            tracing::warn!(
                declared = file.size_bytes,
                actual = total_size,
                "server size differs from manifest size"
            );
        }
        tracing::info!(
            file = %file.file_name,
            total_size,
            chunk_size = self.config.chunk_size,
            "starting image download"
        );

        let downloader =
            ChunkedDownloader::new(self.config.chunk_size, self.config.max_reconnects);
        let mut sink = StoreSink {
            store: &mut self.store,
            ctx: &mut *ctx,
        };
        // Rebuilt element-wise so the trait-object reference coerces to the
        // shorter borrow lifetime.
        let progress: Option<&mut dyn ProgressSink> = match self.progress.as_deref_mut() {
            Some(p) => Some(p),
            None => None,
        };
        downloader.download(&mut fetcher, &mut sink, total_size, progress)?;

        self.store.verify(ctx, &file.sha256_base64)?;
        self.store.enable(ctx)?;
        Ok(())
    }

    fn step_report_success(&mut self) -> AgentResult<()> {
        let Some(request) = self.request.as_ref() else {
            return self.fail(AgentError::Failed("report state with no request".to_string()));
        };

        let results = InstallResult::success_for(request);
        match self.hub.send_agent_state(
            &self.config.device,
            Some(request),
            AgentState::DeploymentInProgress,
            Some(&results),
        ) {
            Ok(()) => {
                tracing::info!(
                    workflow_id = %request.workflow_id,
                    "install result reported, awaiting reboot confirmation"
                );
                // Straight to Idle: the idle report that confirms the
                // deployment must come from the new image after reboot.
                self.request = None;
                self.state = WorkflowState::Idle;
                Ok(())
            }
            Err(e) => self.fail(e.into()),
        }
    }

    fn step_reject(&mut self) -> AgentResult<()> {
        match self
            .hub
            .send_response(RequestDecision::Reject, self.property_version)
        {
            Ok(()) => {
                self.state = WorkflowState::Finish;
                Ok(())
            }
            Err(e) => self.fail(e.into()),
        }
    }

    /// Terminal step for Finish, Cancel and ActionUnknown.
    fn step_finish(&mut self) -> AgentResult<()> {
        match self.hub.send_agent_state(
            &self.config.device,
            self.request.as_ref(),
            AgentState::Idle,
            None,
        ) {
            Ok(()) => {
                self.request = None;
                self.state = WorkflowState::Idle;
                Ok(())
            }
            Err(e) => self.fail(e.into()),
        }
    }

    /// Report the failure and recover. Never loops back into `Error`.
    fn step_error(&mut self) -> AgentResult<()> {
        if let Err(e) = self.hub.send_agent_state(
            &self.config.device,
            self.request.as_ref(),
            AgentState::Error,
            None,
        ) {
            tracing::warn!(error = %e, "failed to report error state");
        }
        self.request = None;
        self.state = WorkflowState::Idle;
        Ok(())
    }

    fn fail(&mut self, error: AgentError) -> AgentResult<()> {
        tracing::error!(state = ?self.state, error = %error, "workflow step failed");
        self.state = WorkflowState::Error;
        Err(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::FetchError;
    use crate::hub::{DeviceProperties, HubError};
    use crate::locator::FileLocation;
    use crate::store::StoreError;
    use crate::verify::VerifyError;

    #[derive(Default)]
    struct MockHub {
        responses: Vec<RequestDecision>,
        states: Vec<AgentState>,
        fail_next: bool,
    }

    impl Hub for MockHub {
        fn send_response(
            &mut self,
            decision: RequestDecision,
            _property_version: u32,
        ) -> Result<(), HubError> {
            if self.fail_next {
                self.fail_next = false;
                return Err(HubError::Publish("down".to_string()));
            }
            self.responses.push(decision);
            Ok(())
        }

        fn send_agent_state(
            &mut self,
            _device: &DeviceProperties,
            _request: Option<&UpdateRequest>,
            state: AgentState,
            _results: Option<&InstallResult>,
        ) -> Result<(), HubError> {
            if self.fail_next {
                self.fail_next = false;
                return Err(HubError::Publish("down".to_string()));
            }
            self.states.push(state);
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockStore {
        capacity: u64,
        inits: u32,
        aborts: u32,
    }

    impl ImageStore for MockStore {
        fn init(&mut self) -> Result<ImageContext, StoreError> {
            self.inits += 1;
            Err(StoreError::NoSecondaryBank)
        }

        fn bank_capacity(&self) -> Result<u64, StoreError> {
            Ok(self.capacity)
        }

        fn write_block(
            &mut self,
            _ctx: &mut ImageContext,
            _offset: u64,
            _data: &[u8],
        ) -> Result<(), StoreError> {
            unreachable!("init always fails in this mock")
        }

        fn verify(
            &mut self,
            _ctx: &mut ImageContext,
            _expected: &str,
        ) -> Result<(), StoreError> {
            unreachable!("init always fails in this mock")
        }

        fn enable(&mut self, _ctx: &mut ImageContext) -> Result<(), StoreError> {
            unreachable!("init always fails in this mock")
        }

        fn abort(&mut self, _ctx: ImageContext) {
            self.aborts += 1;
        }

        fn reset_device(&mut self) -> ! {
            unreachable!("never reached in tests")
        }
    }

    struct AcceptAllVerifier;

    impl ManifestVerifier for AcceptAllVerifier {
        fn verify(&self, _manifest: &[u8], _signature: &[u8]) -> Result<(), VerifyError> {
            Ok(())
        }
    }

    struct RejectAllVerifier;

    impl ManifestVerifier for RejectAllVerifier {
        fn verify(&self, _manifest: &[u8], _signature: &[u8]) -> Result<(), VerifyError> {
            Err(VerifyError::Rejected("untrusted".to_string()))
        }
    }

    struct NeverFetcher;

    impl RangeFetcher for NeverFetcher {
        fn resource_size(&mut self) -> Result<u64, FetchError> {
            unreachable!("never opened in these tests")
        }
        fn fetch_range(&mut self, _offset: u64, _max_len: usize) -> Result<Vec<u8>, FetchError> {
            unreachable!("never opened in these tests")
        }
        fn reconnect(&mut self) -> Result<(), FetchError> {
            unreachable!("never opened in these tests")
        }
    }

    struct NeverOpener;

    impl FetchOpener for NeverOpener {
        type Fetcher = NeverFetcher;

        fn open(&mut self, _location: &FileLocation<'_>) -> Result<Self::Fetcher, FetchError> {
            Err(FetchError::Network("unreachable".to_string()))
        }
    }

    fn apply_payload(size: i64) -> Vec<u8> {
        let inner = serde_json::json!({
            "updateId": {"provider": "p", "name": "n", "version": "2.0.0"},
            "instructions": {"steps": [{"files": ["f1"]}]},
            "files": {"f1": {"fileName": "image.bin", "sizeInBytes": size,
                             "hashes": {"sha256": "aGFzaA=="}}}
        })
        .to_string();
        serde_json::json!({
            "workflow": {"action": 3, "id": "wf-1"},
            "updateManifest": inner,
            "updateManifestSignature": "sig",
            "fileUrls": {"f1": "http://host/image.bin"}
        })
        .to_string()
        .into_bytes()
    }

    fn workflow(
        verifier: impl ManifestVerifier,
        capacity: u64,
    ) -> UpdateWorkflow<MockHub, MockStore, impl ManifestVerifier, NeverOpener> {
        let config = AgentConfig::new(DeviceProperties::new("Contoso", "toaster", "1.0.0"));
        let store = MockStore {
            capacity,
            ..MockStore::default()
        };
        UpdateWorkflow::new(config, MockHub::default(), store, verifier, NeverOpener)
    }

    #[test]
    fn test_accepts_valid_apply_request() {
        let mut wf = workflow(AcceptAllVerifier, 500_000);
        wf.process_update_request(&apply_payload(100_000), 7).unwrap();
        assert_eq!(wf.state(), WorkflowState::Accept);
    }

    #[test]
    fn test_rejects_oversized_image() {
        let mut wf = workflow(AcceptAllVerifier, 500_000);
        wf.process_update_request(&apply_payload(600_000), 7).unwrap();
        assert_eq!(wf.state(), WorkflowState::Reject);
    }

    #[test]
    fn test_rejects_empty_image() {
        let mut wf = workflow(AcceptAllVerifier, 500_000);
        wf.process_update_request(&apply_payload(0), 7).unwrap();
        assert_eq!(wf.state(), WorkflowState::Reject);
    }

    #[test]
    fn test_bad_signature_leaves_state_untouched() {
        let mut wf = workflow(RejectAllVerifier, 500_000);
        let result = wf.process_update_request(&apply_payload(100_000), 7);
        assert!(matches!(result, Err(AgentError::Protocol(_))));
        assert_eq!(wf.state(), WorkflowState::Idle);
        assert!(wf.current_request().is_none());
    }

    #[test]
    fn test_busy_while_request_in_flight() {
        let mut wf = workflow(AcceptAllVerifier, 500_000);
        wf.process_update_request(&apply_payload(100_000), 7).unwrap();

        let result = wf.process_update_request(&apply_payload(100_000), 8);
        assert!(matches!(result, Err(AgentError::Busy)));
        assert_eq!(wf.state(), WorkflowState::Accept);
    }

    #[test]
    fn test_cancel_action_reports_idle() {
        let mut wf = workflow(AcceptAllVerifier, 500_000);
        let payload = serde_json::json!({
            "workflow": {"action": 255, "id": "wf-cancel"}
        })
        .to_string();

        wf.process_update_request(payload.as_bytes(), 3).unwrap();
        assert_eq!(wf.state(), WorkflowState::Cancel);

        wf.process().unwrap();
        assert_eq!(wf.state(), WorkflowState::Idle);
        assert_eq!(wf.hub.states, vec![AgentState::Idle]);
        assert!(wf.current_request().is_none());
    }

    #[test]
    fn test_unknown_action_reports_idle() {
        let mut wf = workflow(AcceptAllVerifier, 500_000);
        let payload = serde_json::json!({
            "workflow": {"action": 42, "id": "wf-odd"}
        })
        .to_string();

        wf.process_update_request(payload.as_bytes(), 3).unwrap();
        assert_eq!(wf.state(), WorkflowState::ActionUnknown);

        wf.process().unwrap();
        assert_eq!(wf.state(), WorkflowState::Idle);
    }

    #[test]
    fn test_reject_path_runs_through_finish() {
        let mut wf = workflow(AcceptAllVerifier, 50);
        wf.process_update_request(&apply_payload(100_000), 7).unwrap();
        assert_eq!(wf.state(), WorkflowState::Reject);

        wf.process().unwrap();
        assert_eq!(wf.state(), WorkflowState::Finish);
        assert_eq!(wf.hub.responses, vec![RequestDecision::Reject]);

        wf.process().unwrap();
        assert_eq!(wf.state(), WorkflowState::Idle);
        assert_eq!(wf.hub.states, vec![AgentState::Idle]);
    }

    #[test]
    fn test_download_failure_aborts_and_recovers() {
        let mut wf = workflow(AcceptAllVerifier, 500_000);
        wf.process_update_request(&apply_payload(100_000), 7).unwrap();

        wf.process().unwrap(); // Accept -> Download
        assert_eq!(wf.state(), WorkflowState::Download);

        // MockStore::init fails, so the download step fails.
        assert!(wf.process().is_err());
        assert_eq!(wf.state(), WorkflowState::Error);

        wf.process().unwrap();
        assert_eq!(wf.state(), WorkflowState::Idle);
        assert!(wf.hub.states.contains(&AgentState::Error));
    }

    #[test]
    fn test_error_step_recovers_even_when_hub_is_down() {
        let mut wf = workflow(AcceptAllVerifier, 500_000);
        wf.process_update_request(&apply_payload(100_000), 7).unwrap();
        wf.hub.fail_next = true;

        assert!(wf.process().is_err()); // Accept ack fails
        assert_eq!(wf.state(), WorkflowState::Error);

        wf.hub.fail_next = true;
        wf.process().unwrap(); // Error report also fails, still recovers
        assert_eq!(wf.state(), WorkflowState::Idle);
    }

    #[test]
    fn test_reject_update_is_idempotent() {
        let mut wf = workflow(AcceptAllVerifier, 500_000);
        wf.process_update_request(&apply_payload(100_000), 7).unwrap();

        wf.reject_update().unwrap();
        assert_eq!(wf.state(), WorkflowState::Idle);
        assert_eq!(wf.hub.responses, vec![RequestDecision::Reject]);

        // Second call is a no-op: no additional reports.
        wf.reject_update().unwrap();
        assert_eq!(wf.hub.responses.len(), 1);
        assert_eq!(wf.hub.states.len(), 1);
    }

    #[test]
    fn test_accept_update_requires_accepted_request() {
        let mut wf = workflow(AcceptAllVerifier, 500_000);
        assert!(matches!(
            wf.accept_update(),
            Err(AgentError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_init_announces_idle() {
        let mut wf = workflow(AcceptAllVerifier, 500_000);
        wf.init().unwrap();
        assert_eq!(wf.hub.states, vec![AgentState::Idle]);
        assert_eq!(wf.state(), WorkflowState::Idle);
    }
}
