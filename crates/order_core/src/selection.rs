//! Selection snapshot and its reconciliation against draft store data.

use std::collections::BTreeSet;

use serde::Serialize;
use shared::domain::{ConceptCatalog, ConceptPanel, ConceptTest, PanelId, TestId};
use tracing::{debug, warn};

/// Which panels, and which tests supplied by those panels, are currently
/// reflected in the draft. Rebuilt wholesale on every reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SelectionSnapshot {
    selected_panel_ids: BTreeSet<PanelId>,
    selected_panel_test_ids: BTreeSet<TestId>,
}

impl SelectionSnapshot {
    pub fn selected_panel_ids(&self) -> &BTreeSet<PanelId> {
        &self.selected_panel_ids
    }

    pub fn selected_panel_test_ids(&self) -> &BTreeSet<TestId> {
        &self.selected_panel_test_ids
    }

    pub fn is_panel_selected(&self, id: &PanelId) -> bool {
        self.selected_panel_ids.contains(id)
    }

    /// A test supplied by a selected panel. Such tests cannot be toggled on
    /// their own.
    pub fn is_panel_owned(&self, id: &TestId) -> bool {
        self.selected_panel_test_ids.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.selected_panel_ids.is_empty() && self.selected_panel_test_ids.is_empty()
    }
}

pub fn reconcile(
    selected_panels: &[ConceptPanel],
    default_tests: &[ConceptTest],
) -> SelectionSnapshot {
    SelectionSnapshot {
        selected_panel_ids: selected_panels
            .iter()
            .map(|panel| panel.id.clone())
            .collect(),
        selected_panel_test_ids: default_tests.iter().map(|test| test.id.clone()).collect(),
    }
}

/// Like [`reconcile`], but drops selected panels the category's catalog does
/// not know about.
pub fn reconcile_within(
    catalog: &ConceptCatalog,
    selected_panels: &[ConceptPanel],
    default_tests: &[ConceptTest],
) -> SelectionSnapshot {
    let mut snapshot = reconcile(selected_panels, default_tests);
    snapshot.selected_panel_ids.retain(|id| {
        let known = catalog.contains_panel(id);
        if !known {
            warn!(
                panel_id = %id,
                category_id = %catalog.category_id,
                "selected panel is not part of the active category; omitting"
            );
        }
        known
    });
    snapshot
}

/// Keeps the current snapshot and rebuilds it only when the draft store
/// reports a different panel or default-test selection.
#[derive(Debug, Default)]
pub struct ReconciliationEngine {
    last_panel_ids: Option<Vec<PanelId>>,
    last_test_ids: Option<Vec<TestId>>,
    snapshot: SelectionSnapshot,
}

impl ReconciliationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> &SelectionSnapshot {
        &self.snapshot
    }

    /// Returns `true` when the snapshot was rebuilt.
    pub fn on_external_selection_changed(
        &mut self,
        catalog: Option<&ConceptCatalog>,
        selected_panels: &[ConceptPanel],
        default_tests: &[ConceptTest],
    ) -> bool {
        let panel_ids: Vec<PanelId> = selected_panels.iter().map(|p| p.id.clone()).collect();
        let test_ids: Vec<TestId> = default_tests.iter().map(|t| t.id.clone()).collect();

        if self.last_panel_ids.as_ref() == Some(&panel_ids)
            && self.last_test_ids.as_ref() == Some(&test_ids)
        {
            return false;
        }

        self.snapshot = match catalog {
            Some(catalog) => reconcile_within(catalog, selected_panels, default_tests),
            None => reconcile(selected_panels, default_tests),
        };
        self.last_panel_ids = Some(panel_ids);
        self.last_test_ids = Some(test_ids);
        debug!(
            panels = self.snapshot.selected_panel_ids.len(),
            panel_tests = self.snapshot.selected_panel_test_ids.len(),
            "selection snapshot rebuilt"
        );
        true
    }

    /// Rebuilds from the last reported selection, e.g. once the active
    /// category's catalog becomes available.
    pub fn refresh(
        &mut self,
        catalog: Option<&ConceptCatalog>,
        selected_panels: &[ConceptPanel],
        default_tests: &[ConceptTest],
    ) {
        self.last_panel_ids = None;
        self.last_test_ids = None;
        self.on_external_selection_changed(catalog, selected_panels, default_tests);
    }
}
