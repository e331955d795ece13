//! Backend-to-UI events and error modeling for the form controller.

use shared::{
    domain::{ConceptCatalog, DraftOrderEntry, PatientId},
    protocol::{DraftState, OutcomeSignal},
};

#[derive(Debug)]
pub enum UiEvent {
    DraftChanged(DraftState),
    DrugDraftsChanged(Vec<DraftOrderEntry>),
    ConceptsLoaded(ConceptCatalog),
    OrdersRefreshed {
        patient_id: PatientId,
        active_orders: usize,
    },
    OutcomeChanged(OutcomeSignal),
    Error(UiError),
    /// Sent once after every backend command, after the events it caused.
    CommandProcessed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Validation,
    NotFound,
    Transport,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    LoadConcepts,
    General,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("not found")
            || message_lower.contains("unknown")
            || message_lower.contains("no concepts")
        {
            UiErrorCategory::NotFound
        } else if message_lower.contains("invalid")
            || message_lower.contains("missing")
            || message_lower.contains("empty")
        {
            UiErrorCategory::Validation
        } else if message_lower.contains("disconnected")
            || message_lower.contains("unavailable")
            || message_lower.contains("queue")
            || message_lower.contains("timed out")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}
