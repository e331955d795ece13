use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    domain::{CategoryId, ConceptPanel, ConceptTest, DraftOrderEntry, PatientId},
    error::SubmissionError,
};

/// Mutations accepted by the draft order store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum DraftCommand {
    AddPanel(ConceptPanel),
    RemovePanel(ConceptPanel),
    AddTest(ConceptTest),
    RemoveTest(ConceptTest),
    DeleteAllDraftLabOrders,
    ToggleUrgency(DraftOrderEntry),
}

impl DraftCommand {
    pub fn name(&self) -> &'static str {
        match self {
            DraftCommand::AddPanel(_) => "add_panel",
            DraftCommand::RemovePanel(_) => "remove_panel",
            DraftCommand::AddTest(_) => "add_test",
            DraftCommand::RemoveTest(_) => "remove_test",
            DraftCommand::DeleteAllDraftLabOrders => "delete_all_draft_lab_orders",
            DraftCommand::ToggleUrgency(_) => "toggle_urgency",
        }
    }
}

/// Request to load the concepts of one category. The representation is a
/// fixed configuration value sent with every load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadConcepts {
    pub category_id: CategoryId,
    pub representation: String,
}

impl LoadConcepts {
    pub fn query_path(&self) -> String {
        format!("{}?v={}", self.category_id, self.representation)
    }
}

/// Every side effect the order-entry form can ask its collaborators for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum FormCommand {
    Draft(DraftCommand),
    LoadConcepts(LoadConcepts),
    RefreshOrderList {
        filter: Option<String>,
        patient_id: PatientId,
    },
    ResetSelectedOrder,
    NotifySuccess(String),
    NotifyError(String),
    SubmitOrders {
        attempt: u64,
        patient_id: PatientId,
        orders: Vec<DraftOrderEntry>,
    },
}

impl FormCommand {
    pub fn name(&self) -> &'static str {
        match self {
            FormCommand::Draft(cmd) => cmd.name(),
            FormCommand::LoadConcepts(_) => "load_concepts",
            FormCommand::RefreshOrderList { .. } => "refresh_order_list",
            FormCommand::ResetSelectedOrder => "reset_selected_order",
            FormCommand::NotifySuccess(_) => "notify_success",
            FormCommand::NotifyError(_) => "notify_error",
            FormCommand::SubmitOrders { .. } => "submit_orders",
        }
    }
}

impl From<DraftCommand> for FormCommand {
    fn from(value: DraftCommand) -> Self {
        FormCommand::Draft(value)
    }
}

/// Orders created by a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub order_ids: Vec<Uuid>,
    pub submitted_at: DateTime<Utc>,
}

/// Order-creation outcome as published by the order service. `attempt`
/// increases with every submission (0 before the first one) and is what
/// distinguishes a new outcome from a re-published old one.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OutcomeSignal {
    #[serde(default)]
    pub attempt: u64,
    pub added: bool,
    pub error: bool,
    #[serde(default)]
    pub error_message: String,
    #[serde(default)]
    pub result: Option<SubmissionResult>,
}

impl OutcomeSignal {
    pub fn succeeded(attempt: u64, result: SubmissionResult) -> Self {
        Self {
            attempt,
            added: true,
            error: false,
            error_message: String::new(),
            result: Some(result),
        }
    }

    pub fn failed(attempt: u64, err: &SubmissionError) -> Self {
        Self {
            attempt,
            added: false,
            error: true,
            error_message: err.message.clone(),
            result: None,
        }
    }
}

/// Draft store contents published after every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DraftState {
    pub lab_orders: Vec<DraftOrderEntry>,
    pub selected_panels: Vec<ConceptPanel>,
    pub default_tests: Vec<ConceptTest>,
}
