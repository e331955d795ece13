//! Backend worker: owns the draft store, the concept catalogs and the order
//! service stand-in, and answers every queued command with UI events.

use std::{collections::HashMap, thread};

use chrono::Utc;
use crossbeam_channel::{Receiver, SendError, Sender};
use order_core::{apply, DraftOrderRegistry, InMemoryDraftRegistry};
use shared::{
    domain::{ConceptCatalog, DraftOrderEntry, PatientId},
    error::{ErrorCode, SubmissionError},
    protocol::{LoadConcepts, OutcomeSignal, SubmissionResult},
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

#[derive(Debug, Clone, Default)]
pub struct BackendFixtures {
    pub catalogs: Vec<ConceptCatalog>,
    pub drug_orders: Vec<DraftOrderEntry>,
    /// When set, every submission fails with this message.
    pub reject_submissions: Option<String>,
}

struct Backend {
    registry: InMemoryDraftRegistry,
    drug_orders: Vec<DraftOrderEntry>,
    catalogs: Vec<ConceptCatalog>,
    reject_submissions: Option<String>,
    active_orders: HashMap<PatientId, Vec<Uuid>>,
    ui_tx: Sender<UiEvent>,
}

pub fn launch(
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
    fixtures: BackendFixtures,
) -> thread::JoinHandle<()> {
    let mut backend = Backend {
        registry: InMemoryDraftRegistry::new(),
        drug_orders: fixtures.drug_orders,
        catalogs: fixtures.catalogs,
        reject_submissions: fixtures.reject_submissions,
        active_orders: HashMap::new(),
        ui_tx,
    };

    thread::spawn(move || {
        while let Ok(cmd) = cmd_rx.recv() {
            let cmd_name = cmd.name();
            let handled = backend
                .handle(cmd)
                .and_then(|()| backend.ui_tx.send(UiEvent::CommandProcessed));
            if handled.is_err() {
                warn!(command = cmd_name, "ui event channel closed; stopping backend worker");
                break;
            }
        }
        debug!("backend worker stopped");
    })
}

impl Backend {
    fn handle(&mut self, cmd: BackendCommand) -> Result<(), SendError<UiEvent>> {
        match cmd {
            BackendCommand::SyncDrafts => {
                self.publish_drafts()?;
            }
            BackendCommand::Draft(draft_cmd) => {
                if apply(&mut self.registry, &draft_cmd) {
                    self.ui_tx.send(UiEvent::DraftChanged(self.registry.state()))?;
                }
            }
            BackendCommand::LoadConcepts(load) => self.load_concepts(&load)?,
            BackendCommand::RefreshOrderList { filter, patient_id } => {
                let active_orders = self.active_orders.get(&patient_id).map_or(0, Vec::len);
                debug!(?filter, patient_id = %patient_id, active_orders, "order list refreshed");
                self.ui_tx.send(UiEvent::OrdersRefreshed {
                    patient_id,
                    active_orders,
                })?;
            }
            BackendCommand::SubmitOrders {
                attempt,
                patient_id,
                orders,
            } => self.submit(attempt, patient_id, orders)?,
        }
        Ok(())
    }

    fn publish_drafts(&self) -> Result<(), SendError<UiEvent>> {
        self.ui_tx.send(UiEvent::DraftChanged(self.registry.state()))?;
        self.ui_tx
            .send(UiEvent::DrugDraftsChanged(self.drug_orders.clone()))
    }

    fn load_concepts(&self, load: &LoadConcepts) -> Result<(), SendError<UiEvent>> {
        debug!(query = %load.query_path(), "loading lab concepts");
        let event = match self
            .catalogs
            .iter()
            .find(|catalog| catalog.category_id == load.category_id)
        {
            Some(catalog) => UiEvent::ConceptsLoaded(catalog.clone()),
            None => UiEvent::Error(UiError::from_message(
                UiErrorContext::LoadConcepts,
                format!("no concepts available for category {}", load.category_id),
            )),
        };
        self.ui_tx.send(event)
    }

    fn submit(
        &mut self,
        attempt: u64,
        patient_id: PatientId,
        orders: Vec<DraftOrderEntry>,
    ) -> Result<(), SendError<UiEvent>> {
        let rejection = if orders.is_empty() {
            Some(SubmissionError::new(
                ErrorCode::Validation,
                "cannot submit an empty draft",
            ))
        } else {
            self.reject_submissions
                .as_ref()
                .map(|message| SubmissionError::new(ErrorCode::Internal, message.clone()))
        };

        if let Some(err) = rejection {
            warn!(attempt, error = %err, "order submission rejected");
            return self
                .ui_tx
                .send(UiEvent::OutcomeChanged(OutcomeSignal::failed(attempt, &err)));
        }

        let order_ids: Vec<Uuid> = orders.iter().map(|_| Uuid::new_v4()).collect();
        info!(attempt, patient_id = %patient_id, orders = order_ids.len(), "orders created");
        self.active_orders
            .entry(patient_id)
            .or_default()
            .extend(order_ids.iter().copied());

        self.registry.delete_all_lab_orders();
        self.drug_orders.clear();
        self.publish_drafts()?;

        self.ui_tx.send(UiEvent::OutcomeChanged(OutcomeSignal::succeeded(
            attempt,
            SubmissionResult {
                order_ids,
                submitted_at: Utc::now(),
            },
        )))
    }
}
