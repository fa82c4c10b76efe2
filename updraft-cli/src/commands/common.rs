//! Shared workflow construction for CLI commands.

use std::path::PathBuf;
use std::time::Duration;

use updraft::download::HttpOpener;
use updraft::verify::{ManifestVerifier, VerifyError};
use updraft::workflow::VersionGatePolicy;
use updraft::{AgentConfig, DeviceProperties, FileImageStore, UpdateWorkflow};

use crate::error::CliError;
use crate::hub::JsonHub;

/// Device identity and storage arguments shared by all commands.
#[derive(Debug, clap::Args)]
pub struct DeviceArgs {
    /// Directory holding the image banks and boot markers
    #[arg(long, default_value = "./updraft-storage")]
    pub root: PathBuf,

    /// Device manufacturer reported to the service
    #[arg(long, default_value = "Contoso")]
    pub manufacturer: String,

    /// Device model reported to the service
    #[arg(long, default_value = "updraft-dev")]
    pub model: String,

    /// Version of the currently installed image
    #[arg(long, default_value = "0.1.0")]
    pub installed_version: String,
}

/// Download tuning arguments for the apply command.
#[derive(Debug, clap::Args)]
pub struct DownloadArgs {
    /// Byte-range size for image downloads
    #[arg(long, default_value_t = updraft::config::DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// HTTP request timeout in seconds
    #[arg(long, default_value_t = updraft::config::DEFAULT_HTTP_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Reconnect attempts before a download is abandoned
    #[arg(long, default_value_t = updraft::config::DEFAULT_MAX_RECONNECTS)]
    pub max_reconnects: u32,

    /// Per-bank capacity in bytes used for size gating
    #[arg(long)]
    pub bank_capacity: Option<u64>,
}

/// Accepts every manifest signature.
///
/// Development only: the CLI carries no trusted root keys, so it cannot
/// validate signatures. Production hosts supply a real verifier.
pub struct InsecureVerifier;

impl ManifestVerifier for InsecureVerifier {
    fn verify(&self, _manifest: &[u8], _signature: &[u8]) -> Result<(), VerifyError> {
        tracing::warn!("no trusted root keys configured, accepting manifest unverified");
        Ok(())
    }
}

/// Workflow type the CLI drives.
pub type CliWorkflow = UpdateWorkflow<JsonHub, FileImageStore, InsecureVerifier, HttpOpener>;

/// Build a workflow from CLI arguments.
pub fn build_workflow(
    device: &DeviceArgs,
    download: &DownloadArgs,
    version_gate: bool,
) -> Result<CliWorkflow, CliError> {
    let identity = DeviceProperties::new(
        &device.manufacturer,
        &device.model,
        &device.installed_version,
    );
    let config = AgentConfig::new(identity)
        .with_chunk_size(download.chunk_size)
        .with_http_timeout(Duration::from_secs(download.timeout_secs))
        .with_max_reconnects(download.max_reconnects);

    let mut store = FileImageStore::new(&device.root)
        .map_err(|e| CliError::Io(format!("cannot open storage root: {}", e)))?;
    if let Some(capacity) = download.bank_capacity {
        store = store.with_bank_capacity(capacity);
    }

    let opener = HttpOpener::new(config.http_timeout, config.retry.clone());
    let mut workflow = UpdateWorkflow::new(config, JsonHub, store, InsecureVerifier, opener);

    if version_gate {
        let policy = VersionGatePolicy::new(&device.installed_version)?;
        workflow = workflow.with_policy(Box::new(policy));
    }

    Ok(workflow)
}
