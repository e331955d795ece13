//! Backend commands queued from the form controller to the backend worker.

use shared::{
    domain::{DraftOrderEntry, PatientId},
    protocol::{DraftCommand, LoadConcepts},
};

#[derive(Debug)]
pub enum BackendCommand {
    SyncDrafts,
    Draft(DraftCommand),
    LoadConcepts(LoadConcepts),
    RefreshOrderList {
        filter: Option<String>,
        patient_id: PatientId,
    },
    SubmitOrders {
        attempt: u64,
        patient_id: PatientId,
        orders: Vec<DraftOrderEntry>,
    },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::SyncDrafts => "sync_drafts",
            BackendCommand::Draft(cmd) => cmd.name(),
            BackendCommand::LoadConcepts(_) => "load_concepts",
            BackendCommand::RefreshOrderList { .. } => "refresh_order_list",
            BackendCommand::SubmitOrders { .. } => "submit_orders",
        }
    }
}
