//! Drives a [`LabEntryForm`] against the backend worker: form commands go out
//! over the command queue, backend events come back and are reduced into the
//! form until every queued command has been answered.

use anyhow::{anyhow, Result};
use crossbeam_channel::{Receiver, Sender};
use order_core::{FormEvent, LabEntryForm};
use shared::protocol::FormCommand;
use tracing::{info, warn};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::{
    events::{Toast, ToastKind, UiError, UiErrorContext, UiEvent},
    orchestration::{dispatch_backend_command, route, Route},
};

pub struct FormDriver {
    form: LabEntryForm,
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    in_flight: usize,
    status: String,
    toasts: Vec<Toast>,
    errors: Vec<UiError>,
    selected_order_resets: usize,
}

impl FormDriver {
    /// Takes the commands returned alongside a freshly built form (the initial
    /// concept load) and syncs draft state from the backend.
    pub fn start(
        form: LabEntryForm,
        initial: Vec<FormCommand>,
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
    ) -> Result<Self> {
        let mut driver = Self::new(form, cmd_tx, ui_rx);
        driver.queue(BackendCommand::SyncDrafts);
        driver.dispatch(initial);
        driver.settle()?;
        Ok(driver)
    }

    fn new(form: LabEntryForm, cmd_tx: Sender<BackendCommand>, ui_rx: Receiver<UiEvent>) -> Self {
        Self {
            form,
            cmd_tx,
            ui_rx,
            in_flight: 0,
            status: String::new(),
            toasts: Vec::new(),
            errors: Vec::new(),
            selected_order_resets: 0,
        }
    }

    pub fn form(&self) -> &LabEntryForm {
        &self.form
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn errors(&self) -> &[UiError] {
        &self.errors
    }

    pub fn selected_order_resets(&self) -> usize {
        self.selected_order_resets
    }

    /// Feeds one user interaction and waits for the backend to settle.
    pub fn interact(&mut self, event: FormEvent) -> Result<()> {
        let commands = self.form.handle(event);
        self.dispatch(commands);
        self.settle()
    }

    fn queue(&mut self, cmd: BackendCommand) {
        let submit_attempt = match &cmd {
            BackendCommand::SubmitOrders { attempt, .. } => Some(*attempt),
            _ => None,
        };
        if dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status) {
            self.in_flight += 1;
            return;
        }

        warn!(status = %self.status, "backend command not queued");
        self.errors
            .push(UiError::from_message(UiErrorContext::General, self.status.clone()));
        if let Some(attempt) = submit_attempt {
            let commands = self.form.handle(FormEvent::SubmitDispatchFailed {
                attempt,
                reason: self.status.clone(),
            });
            self.dispatch(commands);
        }
    }

    fn dispatch(&mut self, commands: Vec<FormCommand>) {
        for cmd in commands {
            match route(cmd) {
                Route::Backend(backend_cmd) => self.queue(backend_cmd),
                Route::Toast(toast) => {
                    match toast.kind {
                        ToastKind::Success => info!(message = %toast.message, "success toast"),
                        ToastKind::Error => warn!(message = %toast.message, "error toast"),
                    }
                    self.toasts.push(toast);
                }
                Route::ResetSelectedOrder => {
                    self.selected_order_resets += 1;
                    info!("selected order reset");
                }
            }
        }
    }

    fn settle(&mut self) -> Result<()> {
        while self.in_flight > 0 {
            let in_flight = self.in_flight;
            let event = self.ui_rx.recv().map_err(|_| {
                anyhow!("backend worker stopped with {in_flight} commands in flight")
            })?;
            let commands = match event {
                UiEvent::CommandProcessed => {
                    self.in_flight -= 1;
                    continue;
                }
                UiEvent::DraftChanged(state) => self.form.handle(FormEvent::DraftChanged(state)),
                UiEvent::DrugDraftsChanged(orders) => {
                    self.form.handle(FormEvent::DrugDraftsChanged(orders))
                }
                UiEvent::ConceptsLoaded(catalog) => {
                    self.form.handle(FormEvent::ConceptsLoaded(catalog))
                }
                UiEvent::OutcomeChanged(signal) => {
                    self.form.handle(FormEvent::OutcomeChanged(signal))
                }
                UiEvent::OrdersRefreshed {
                    patient_id,
                    active_orders,
                } => {
                    info!(patient_id = %patient_id, active_orders, "order list refreshed");
                    Vec::new()
                }
                UiEvent::Error(err) => {
                    warn!(
                        context = ?err.context(),
                        category = ?err.category(),
                        "{}",
                        err.message()
                    );
                    self.status = err.message().to_string();
                    self.errors.push(err);
                    Vec::new()
                }
            };
            self.dispatch(commands);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/driver_tests.rs"]
mod tests;
