//! Announce command: report the device to the service with an idle state.

use super::common::{build_workflow, DeviceArgs, DownloadArgs};
use crate::error::CliError;

/// Run the announce command.
///
/// After booting into a freshly installed image this is what confirms the
/// deployment: an idle report carrying the new installed version.
pub fn run(device: &DeviceArgs) -> Result<(), CliError> {
    let download = DownloadArgs {
        chunk_size: updraft::config::DEFAULT_CHUNK_SIZE,
        timeout_secs: updraft::config::DEFAULT_HTTP_TIMEOUT_SECS,
        max_reconnects: updraft::config::DEFAULT_MAX_RECONNECTS,
        bank_capacity: None,
    };
    let mut workflow = build_workflow(device, &download, false)?;
    workflow.init()?;

    println!(
        "Announced {} {} at version {}",
        device.manufacturer, device.model, device.installed_version
    );
    Ok(())
}
