//! Apply command: process one update manifest and drive it to completion.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use updraft::download::LoggingProgress;
use updraft::{ImageStore, WorkflowState};

use super::common::{build_workflow, DeviceArgs, DownloadArgs};
use crate::error::CliError;

/// Arguments for the apply command.
#[derive(Debug, clap::Args)]
pub struct ApplyArgs {
    /// Path to the update request document (property-document JSON)
    pub manifest: PathBuf,

    /// Property version echoed back in acknowledgements
    #[arg(long, default_value_t = 1)]
    pub property_version: u32,

    /// Accept updates regardless of their version
    #[arg(long)]
    pub no_version_gate: bool,

    /// Restart the process after a successful install
    #[arg(long)]
    pub reboot: bool,

    #[command(flatten)]
    pub device: DeviceArgs,

    #[command(flatten)]
    pub download: DownloadArgs,
}

/// Run the apply command.
pub fn run(args: ApplyArgs) -> Result<(), CliError> {
    let payload = fs::read(&args.manifest)
        .map_err(|e| CliError::Io(format!("cannot read {}: {}", args.manifest.display(), e)))?;

    let mut workflow = build_workflow(&args.device, &args.download, !args.no_version_gate)?
        .with_progress(Box::new(LoggingProgress::default()));

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    ctrlc::set_handler(move || {
        println!();
        println!("Received shutdown signal, abandoning update...");
        shutdown_clone.store(true, Ordering::SeqCst);
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    workflow.process_update_request(&payload, args.property_version)?;

    let mut installed = false;
    while workflow.state() != WorkflowState::Idle {
        if shutdown.load(Ordering::SeqCst) {
            workflow.reject_update()?;
            println!("Update abandoned");
            return Ok(());
        }

        if workflow.state() == WorkflowState::ReportSuccess {
            installed = true;
        }

        // A step failure moves the workflow to Error; the next iteration
        // reports it and recovers to Idle, so keep driving.
        if let Err(e) = workflow.process() {
            tracing::error!(error = %e, "update step failed");
            installed = false;
        }
    }

    if installed {
        println!("Update installed; new image boots on next restart");
        if args.reboot {
            workflow.store_mut().reset_device();
        }
    } else {
        println!("No update installed");
    }
    Ok(())
}
