//! Draft order store seam and the executor that applies draft commands to it.

use shared::{
    domain::{ConceptPanel, ConceptTest, DraftKind, DraftOrderEntry},
    protocol::{DraftCommand, DraftState},
};
use tracing::debug;

/// The store holding drafted lab orders and the panel selection derived from
/// them. Every mutator returns `true` when the store changed.
pub trait DraftOrderRegistry {
    fn add_panel(&mut self, panel: &ConceptPanel) -> bool;
    fn remove_panel(&mut self, panel: &ConceptPanel) -> bool;
    fn add_test(&mut self, test: &ConceptTest) -> bool;
    fn remove_test(&mut self, test: &ConceptTest) -> bool;
    fn delete_all_lab_orders(&mut self) -> bool;
    fn toggle_urgency(&mut self, entry: &DraftOrderEntry) -> bool;

    fn lab_orders(&self) -> &[DraftOrderEntry];
    fn selected_panels(&self) -> &[ConceptPanel];
    fn default_tests(&self) -> &[ConceptTest];

    fn state(&self) -> DraftState {
        DraftState {
            lab_orders: self.lab_orders().to_vec(),
            selected_panels: self.selected_panels().to_vec(),
            default_tests: self.default_tests().to_vec(),
        }
    }
}

pub fn apply(registry: &mut dyn DraftOrderRegistry, cmd: &DraftCommand) -> bool {
    let changed = match cmd {
        DraftCommand::AddPanel(panel) => registry.add_panel(panel),
        DraftCommand::RemovePanel(panel) => registry.remove_panel(panel),
        DraftCommand::AddTest(test) => registry.add_test(test),
        DraftCommand::RemoveTest(test) => registry.remove_test(test),
        DraftCommand::DeleteAllDraftLabOrders => registry.delete_all_lab_orders(),
        DraftCommand::ToggleUrgency(entry) => registry.toggle_urgency(entry),
    };
    debug!(command = cmd.name(), changed, "applied draft command");
    changed
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryDraftRegistry {
    orders: Vec<DraftOrderEntry>,
    selected_panels: Vec<ConceptPanel>,
    default_tests: Vec<ConceptTest>,
}

impl InMemoryDraftRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn contains(&self, entry: &DraftOrderEntry) -> bool {
        self.orders.iter().any(|o| o.matches(&entry.id, entry.kind))
    }

    fn insert(&mut self, entry: DraftOrderEntry) -> bool {
        if self.contains(&entry) {
            debug!(id = %entry.id, kind = entry.kind.as_str(), "draft entry already present");
            return false;
        }
        self.orders.push(entry);
        true
    }

    fn rebuild_default_tests(&mut self) {
        let mut tests: Vec<ConceptTest> = Vec::new();
        for member in self.selected_panels.iter().flat_map(|p| p.members.iter()) {
            if !tests.iter().any(|t| t.id == member.id) {
                tests.push(member.clone());
            }
        }
        self.default_tests = tests;
    }
}

impl DraftOrderRegistry for InMemoryDraftRegistry {
    /// Adding a panel folds any standalone drafts of its member tests into it.
    fn add_panel(&mut self, panel: &ConceptPanel) -> bool {
        if self.selected_panels.iter().any(|p| p.id == panel.id) {
            return false;
        }
        self.orders
            .retain(|o| !(o.kind == DraftKind::Single && panel.has_member(&o.id)));
        self.insert(DraftOrderEntry::panel(panel));
        self.selected_panels.push(panel.clone());
        self.rebuild_default_tests();
        true
    }

    fn remove_panel(&mut self, panel: &ConceptPanel) -> bool {
        let before = self.orders.len() + self.selected_panels.len();
        self.orders.retain(|o| !o.matches(&panel.id, DraftKind::Panel));
        self.selected_panels.retain(|p| p.id != panel.id);
        self.rebuild_default_tests();
        before != self.orders.len() + self.selected_panels.len()
    }

    fn add_test(&mut self, test: &ConceptTest) -> bool {
        self.insert(DraftOrderEntry::single(test))
    }

    fn remove_test(&mut self, test: &ConceptTest) -> bool {
        let before = self.orders.len();
        self.orders.retain(|o| !o.matches(&test.id, DraftKind::Single));
        before != self.orders.len()
    }

    fn delete_all_lab_orders(&mut self) -> bool {
        let changed = !self.orders.is_empty() || !self.selected_panels.is_empty();
        self.orders.clear();
        self.selected_panels.clear();
        self.default_tests.clear();
        changed
    }

    fn toggle_urgency(&mut self, entry: &DraftOrderEntry) -> bool {
        match self.orders.iter_mut().find(|o| o.matches(&entry.id, entry.kind)) {
            Some(order) => {
                order.urgency = Some(order.urgency.unwrap_or_default().toggled());
                true
            }
            None => false,
        }
    }

    fn lab_orders(&self) -> &[DraftOrderEntry] {
        &self.orders
    }

    fn selected_panels(&self) -> &[ConceptPanel] {
        &self.selected_panels
    }

    fn default_tests(&self) -> &[ConceptTest] {
        &self.default_tests
    }
}

#[cfg(test)]
#[path = "tests/registry_tests.rs"]
mod tests;
