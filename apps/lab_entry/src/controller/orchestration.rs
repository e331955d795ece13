//! Command orchestration from form commands to the backend command queue.

use crossbeam_channel::{Sender, TrySendError};
use shared::protocol::FormCommand;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{Toast, ToastKind};

/// Where a form command is carried out.
#[derive(Debug)]
pub enum Route {
    Backend(BackendCommand),
    Toast(Toast),
    ResetSelectedOrder,
}

pub fn route(cmd: FormCommand) -> Route {
    match cmd {
        FormCommand::Draft(draft_cmd) => Route::Backend(BackendCommand::Draft(draft_cmd)),
        FormCommand::LoadConcepts(load) => Route::Backend(BackendCommand::LoadConcepts(load)),
        FormCommand::RefreshOrderList { filter, patient_id } => {
            Route::Backend(BackendCommand::RefreshOrderList { filter, patient_id })
        }
        FormCommand::SubmitOrders {
            attempt,
            patient_id,
            orders,
        } => Route::Backend(BackendCommand::SubmitOrders {
            attempt,
            patient_id,
            orders,
        }),
        FormCommand::ResetSelectedOrder => Route::ResetSelectedOrder,
        FormCommand::NotifySuccess(message) => Route::Toast(Toast {
            kind: ToastKind::Success,
            message,
        }),
        FormCommand::NotifyError(message) => Route::Toast(Toast {
            kind: ToastKind::Error,
            message,
        }),
    }
}

/// Returns `true` when the command was queued.
pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
    status: &mut String,
) -> bool {
    let cmd_name = cmd.name();

    match cmd_tx.try_send(cmd) {
        Ok(()) => {
            tracing::debug!(command = cmd_name, "queued ui->backend command");
            true
        }
        Err(TrySendError::Full(_)) => {
            *status = "UI command queue is full; please retry".to_string();
            false
        }
        Err(TrySendError::Disconnected(_)) => {
            *status = "Backend command processor disconnected (possible startup/runtime failure)"
                .to_string();
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;
    use shared::protocol::DraftCommand;

    #[test]
    fn notifications_become_toasts() {
        match route(FormCommand::NotifyError("boom".into())) {
            Route::Toast(toast) => {
                assert_eq!(toast.kind, ToastKind::Error);
                assert_eq!(toast.message, "boom");
            }
            other => panic!("unexpected route: {other:?}"),
        }
        assert!(matches!(
            route(FormCommand::ResetSelectedOrder),
            Route::ResetSelectedOrder
        ));
    }

    #[test]
    fn full_queue_reports_status() {
        let (tx, _rx) = bounded(1);
        let mut status = String::new();

        assert!(dispatch_backend_command(&tx, BackendCommand::SyncDrafts, &mut status));
        assert!(!dispatch_backend_command(
            &tx,
            BackendCommand::Draft(DraftCommand::DeleteAllDraftLabOrders),
            &mut status
        ));
        assert_eq!(status, "UI command queue is full; please retry");
    }

    #[test]
    fn closed_queue_reports_disconnect() {
        let (tx, rx) = bounded(1);
        drop(rx);
        let mut status = String::new();

        assert!(!dispatch_backend_command(&tx, BackendCommand::SyncDrafts, &mut status));
        assert!(status.contains("disconnected"));
    }
}
