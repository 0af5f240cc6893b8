//! Command orchestration helpers from UI actions to backend command queue.

use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;

/// Queues `cmd` for the backend worker. A command that could not be queued is
/// handed back so the caller can fail whatever ticket it carries.
pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
    status: &mut String,
) -> Option<BackendCommand> {
    let cmd_name = cmd.name();

    match cmd_tx.try_send(cmd) {
        Ok(()) => {
            tracing::debug!(command = cmd_name, "queued ui->backend command");
            None
        }
        Err(TrySendError::Full(cmd)) => {
            tracing::warn!(command = cmd_name, "ui->backend queue full");
            *status = "UI command queue is full; please retry".to_string();
            Some(cmd)
        }
        Err(TrySendError::Disconnected(cmd)) => {
            tracing::error!(command = cmd_name, "backend worker disconnected");
            *status =
                "Backend worker disconnected (possible startup/runtime failure); restart the app"
                    .to_string();
            Some(cmd)
        }
    }
}
