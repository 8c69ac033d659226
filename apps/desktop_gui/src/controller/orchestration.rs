//! Command orchestration helpers from UI actions to backend command queue.

use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;

/// Queues `cmd` for the backend worker. On failure the command is handed back so the
/// caller can settle its ticket locally.
pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
    status: &mut String,
) -> Result<(), BackendCommand> {
    let cmd_name = cmd.name();

    match cmd_tx.try_send(cmd) {
        Ok(()) => {
            tracing::debug!(command = cmd_name, "queued ui->backend command");
            Ok(())
        }
        Err(TrySendError::Full(cmd)) => {
            *status = "UI command queue is full; please retry".to_string();
            Err(cmd)
        }
        Err(TrySendError::Disconnected(cmd)) => {
            *status =
                "Backend command processor disconnected (possible startup/runtime failure); restart the app"
                    .to_string();
            Err(cmd)
        }
    }
}

#[cfg(test)]
mod tests {
    use client_core::geolocation::GeolocationAcquirer;
    use crossbeam_channel::bounded;

    use super::*;

    fn locate_command() -> BackendCommand {
        let mut acquirer = GeolocationAcquirer::default();
        BackendCommand::Locate(acquirer.begin(true).expect("supported"))
    }

    #[test]
    fn queued_command_leaves_status_alone() {
        let (tx, rx) = bounded(1);
        let mut status = "Ready".to_string();
        assert!(dispatch_backend_command(&tx, locate_command(), &mut status).is_ok());
        assert_eq!(status, "Ready");
        assert!(matches!(rx.try_recv(), Ok(BackendCommand::Locate(_))));
    }

    #[test]
    fn full_queue_returns_the_command() {
        let (tx, _rx) = bounded(1);
        let mut status = String::new();
        dispatch_backend_command(&tx, locate_command(), &mut status).expect("first fits");

        let returned = dispatch_backend_command(&tx, locate_command(), &mut status);
        assert!(matches!(returned, Err(BackendCommand::Locate(_))));
        assert!(status.contains("full"));
    }

    #[test]
    fn disconnected_worker_returns_the_command() {
        let (tx, rx) = bounded(1);
        drop(rx);
        let mut status = String::new();

        let returned = dispatch_backend_command(&tx, locate_command(), &mut status);
        assert!(matches!(returned, Err(BackendCommand::Locate(_))));
        assert!(status.contains("disconnected"));
    }
}
