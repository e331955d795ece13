//! The lab order entry form: one reducer entry point composing category
//! switching, toggle decisions, reconciliation and submission handling.

use serde::Serialize;
use shared::{
    domain::{
        CategoryId, ConceptCatalog, ConceptPanel, ConceptTest, DraftKind, DraftOrderEntry,
        OrderableCategory, PatientId,
    },
    error::InitializationError,
    protocol::{DraftCommand, DraftState, FormCommand, OutcomeSignal},
};
use tracing::{debug, warn};

use crate::{
    category::CategorySwitchController,
    draft_list::{self, DraftListView},
    selection::{ReconciliationEngine, SelectionSnapshot},
    submission::{SubmissionFlowController, SubmissionPhase, DEFAULT_ORDER_CREATED_MESSAGE},
    toggle::{self, ToggleTarget},
};

#[derive(Debug, Clone)]
pub struct FormOptions {
    pub patient_id: PatientId,
    pub locale: String,
    pub concept_representation: String,
    pub order_created_message: String,
}

impl FormOptions {
    pub fn new(patient_id: PatientId, concept_representation: impl Into<String>) -> Self {
        Self {
            patient_id,
            locale: "en".to_string(),
            concept_representation: concept_representation.into(),
            order_created_message: DEFAULT_ORDER_CREATED_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    TogglePanel(ConceptPanel),
    ToggleTest(ConceptTest),
    SwitchCategory {
        category_id: CategoryId,
        display_name: String,
    },
    ConceptsLoaded(ConceptCatalog),
    DraftChanged(DraftState),
    DrugDraftsChanged(Vec<DraftOrderEntry>),
    OutcomeChanged(OutcomeSignal),
    Discard(Option<DraftOrderEntry>),
    ToggleUrgency(DraftOrderEntry),
    Submit,
    /// The submit command for `attempt` could not be handed to the backend.
    SubmitDispatchFailed {
        attempt: u64,
        reason: String,
    },
}

impl FormEvent {
    pub fn name(&self) -> &'static str {
        match self {
            FormEvent::TogglePanel(_) => "toggle_panel",
            FormEvent::ToggleTest(_) => "toggle_test",
            FormEvent::SwitchCategory { .. } => "switch_category",
            FormEvent::ConceptsLoaded(_) => "concepts_loaded",
            FormEvent::DraftChanged(_) => "draft_changed",
            FormEvent::DrugDraftsChanged(_) => "drug_drafts_changed",
            FormEvent::OutcomeChanged(_) => "outcome_changed",
            FormEvent::Discard(_) => "discard",
            FormEvent::ToggleUrgency(_) => "toggle_urgency",
            FormEvent::Submit => "submit",
            FormEvent::SubmitDispatchFailed { .. } => "submit_dispatch_failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelRow {
    pub panel: ConceptPanel,
    pub label: String,
    pub selected: bool,
}

/// `locked` tests are supplied by a selected panel and ignore toggles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestRow {
    pub test: ConceptTest,
    pub label: String,
    pub checked: bool,
    pub locked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSetView {
    pub category_name: String,
    pub panels: Vec<PanelRow>,
    pub tests: Vec<TestRow>,
}

pub struct LabEntryForm {
    orderables: Vec<OrderableCategory>,
    locale: String,
    category: CategorySwitchController,
    catalog: Option<ConceptCatalog>,
    reconciliation: ReconciliationEngine,
    draft: DraftState,
    drug_orders: Vec<DraftOrderEntry>,
    submission: SubmissionFlowController,
}

impl LabEntryForm {
    /// Builds the form on the first orderable category. The returned commands
    /// hold the initial concept load.
    pub fn new(
        orderables: Vec<OrderableCategory>,
        options: FormOptions,
    ) -> Result<(Self, Vec<FormCommand>), InitializationError> {
        let (category, load) = CategorySwitchController::initialise(
            &orderables,
            &options.locale,
            options.concept_representation,
        )?;
        let form = Self {
            orderables,
            locale: options.locale,
            category,
            catalog: None,
            reconciliation: ReconciliationEngine::new(),
            draft: DraftState::default(),
            drug_orders: Vec::new(),
            submission: SubmissionFlowController::new(
                options.patient_id,
                options.order_created_message,
            ),
        };
        Ok((form, vec![FormCommand::LoadConcepts(load)]))
    }

    pub fn handle(&mut self, event: FormEvent) -> Vec<FormCommand> {
        debug!(event = event.name(), "form event");
        match event {
            FormEvent::TogglePanel(panel) => self.toggle(ToggleTarget::Panel(panel)),
            FormEvent::ToggleTest(test) => self.toggle(ToggleTarget::Test(test)),
            FormEvent::SwitchCategory {
                category_id,
                display_name,
            } => self.switch_category(category_id, display_name),
            FormEvent::ConceptsLoaded(catalog) => {
                self.concepts_loaded(catalog);
                Vec::new()
            }
            FormEvent::DraftChanged(state) => {
                self.draft = state;
                self.reconcile(false);
                Vec::new()
            }
            FormEvent::DrugDraftsChanged(orders) => {
                self.drug_orders = orders;
                Vec::new()
            }
            FormEvent::OutcomeChanged(signal) => self.submission.observe(signal),
            FormEvent::Discard(target) => vec![draft_list::discard(target.as_ref()).into()],
            FormEvent::ToggleUrgency(entry) => {
                if entry.kind == DraftKind::Drug {
                    return Vec::new();
                }
                vec![DraftCommand::ToggleUrgency(entry).into()]
            }
            FormEvent::Submit => {
                let orders = self.all_draft_orders();
                self.submission.begin_submission(orders).into_iter().collect()
            }
            FormEvent::SubmitDispatchFailed { attempt, reason } => {
                self.submission.abandon(attempt, &reason)
            }
        }
    }

    fn toggle(&mut self, target: ToggleTarget) -> Vec<FormCommand> {
        let kind = target.kind();
        let decision = toggle::decide(
            &target,
            self.reconciliation.snapshot(),
            &self.draft.lab_orders,
        );
        debug!(?kind, ?decision, "toggle decided");
        decision
            .into_draft_command()
            .map(FormCommand::Draft)
            .into_iter()
            .collect()
    }

    fn switch_category(
        &mut self,
        category_id: CategoryId,
        display_name: String,
    ) -> Vec<FormCommand> {
        if !self.orderables.iter().any(|o| o.id == category_id) {
            warn!(category_id = %category_id, "ignoring switch to unknown lab category");
            return Vec::new();
        }
        match self.category.switch_to(category_id, display_name) {
            Some(load) => {
                self.catalog = None;
                self.reconcile(true);
                vec![FormCommand::LoadConcepts(load)]
            }
            None => Vec::new(),
        }
    }

    fn concepts_loaded(&mut self, catalog: ConceptCatalog) {
        if &catalog.category_id != self.category.active_id() {
            warn!(
                loaded = %catalog.category_id,
                active = %self.category.active_id(),
                "dropping concepts for a superseded category"
            );
            return;
        }
        self.catalog = Some(catalog);
        self.reconcile(true);
    }

    /// Rebuilds the snapshot against the active category. Until its concepts
    /// arrive no panel counts as selected.
    fn reconcile(&mut self, force: bool) {
        let pending;
        let scope = match &self.catalog {
            Some(catalog) => catalog,
            None => {
                pending = ConceptCatalog::empty(self.category.active_id().clone());
                &pending
            }
        };
        let (panels, tests) = (&self.draft.selected_panels, &self.draft.default_tests);
        if force {
            self.reconciliation.refresh(Some(scope), panels, tests);
        } else {
            self.reconciliation
                .on_external_selection_changed(Some(scope), panels, tests);
        }
    }

    pub fn snapshot(&self) -> &SelectionSnapshot {
        self.reconciliation.snapshot()
    }

    pub fn active_category(&self) -> (&CategoryId, &str) {
        (self.category.active_id(), self.category.active_name())
    }

    pub fn orderables(&self) -> &[OrderableCategory] {
        &self.orderables
    }

    pub fn catalog(&self) -> Option<&ConceptCatalog> {
        self.catalog.as_ref()
    }

    pub fn lab_orders(&self) -> &[DraftOrderEntry] {
        &self.draft.lab_orders
    }

    pub fn submission_phase(&self) -> SubmissionPhase {
        self.submission.phase()
    }

    pub fn all_draft_orders(&self) -> Vec<DraftOrderEntry> {
        self.drug_orders
            .iter()
            .chain(&self.draft.lab_orders)
            .cloned()
            .collect()
    }

    pub fn can_return(&self) -> bool {
        draft_list::can_return(&self.drug_orders, &self.draft.lab_orders)
    }

    pub fn draft_list(&self) -> DraftListView {
        DraftListView::build(&self.drug_orders, &self.draft.lab_orders, &self.locale)
    }

    /// Panels and standalone tests of the active category with their checked
    /// state. Empty until the category's concepts have loaded.
    pub fn field_set(&self) -> FieldSetView {
        let snapshot = self.snapshot();
        let (panels, tests) = match &self.catalog {
            Some(catalog) => (catalog.panels.as_slice(), catalog.tests.as_slice()),
            None => (&[][..], &[][..]),
        };

        FieldSetView {
            category_name: self.category.active_name().to_string(),
            panels: panels
                .iter()
                .map(|panel| PanelRow {
                    selected: snapshot.is_panel_selected(&panel.id),
                    label: panel.short_name(&self.locale).to_string(),
                    panel: panel.clone(),
                })
                .collect(),
            tests: tests
                .iter()
                .map(|test| {
                    let locked = snapshot.is_panel_owned(&test.id);
                    let drafted = self
                        .draft
                        .lab_orders
                        .iter()
                        .any(|o| o.matches(&test.id, DraftKind::Single));
                    TestRow {
                        checked: locked || drafted,
                        locked,
                        label: test.short_name(&self.locale).to_string(),
                        test: test.clone(),
                    }
                })
                .collect(),
        }
    }
}

#[cfg(test)]
#[path = "tests/form_tests.rs"]
mod tests;
