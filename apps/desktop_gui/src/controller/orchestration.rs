//! Command orchestration helpers from UI actions to backend command queue.

use client_core::{Session, SessionError};
use crossbeam_channel::{Sender, TrySendError};
use shared::{GenerationError, UploadedImage};

use crate::backend_bridge::commands::BackendCommand;

/// Moves the session into loading and queues the attempt for the backend.
///
/// When the command cannot be queued the attempt fails immediately instead of
/// leaving the session stuck in loading.
pub fn start_generation(
    cmd_tx: &Sender<BackendCommand>,
    session: &mut Session,
    upload: UploadedImage,
) -> Result<(), SessionError> {
    session.begin(&upload)?;

    if let Err(reason) = dispatch_backend_command(cmd_tx, BackendCommand::Generate { upload }) {
        session.complete(Err(GenerationError::service(reason)));
    }
    Ok(())
}

pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
) -> Result<(), String> {
    let cmd_name = cmd.name();
    match cmd_tx.try_send(cmd) {
        Ok(()) => {
            tracing::debug!(command = cmd_name, "queued ui->backend command");
            Ok(())
        }
        Err(TrySendError::Full(_)) => Err("UI command queue is full; please retry".to_string()),
        Err(TrySendError::Disconnected(_)) => Err(
            "Backend command processor disconnected (possible startup/runtime failure)".to_string(),
        ),
    }
}
