//! Draft list view model and the discard contract.

use serde::Serialize;
use shared::{
    domain::{ConceptId, ConceptPanel, ConceptTest, DraftKind, DraftOrderEntry, Urgency},
    protocol::DraftCommand,
};

/// Discard one entry, or every lab draft when `target` is `None`.
pub fn discard(target: Option<&DraftOrderEntry>) -> DraftCommand {
    let Some(entry) = target else {
        return DraftCommand::DeleteAllDraftLabOrders;
    };
    match entry.kind {
        DraftKind::Single => DraftCommand::RemoveTest(ConceptTest::new(
            entry.id.as_str(),
            entry.name.as_str(),
        )),
        DraftKind::Panel => DraftCommand::RemovePanel(ConceptPanel::new(
            entry.id.as_str(),
            entry.name.as_str(),
            Vec::new(),
        )),
        DraftKind::Drug => DraftCommand::DeleteAllDraftLabOrders,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryAction {
    ToggleUrgency,
    EditDrug,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DraftListItem {
    pub id: ConceptId,
    pub draft_type: DraftKind,
    pub status: String,
    pub name: String,
    pub urgency: Urgency,
    pub action: EntryAction,
}

impl DraftListItem {
    pub fn from_entry(entry: &DraftOrderEntry, locale: &str) -> Self {
        Self {
            id: entry.id.clone(),
            draft_type: entry.kind,
            status: entry
                .action
                .map(|action| action.as_str().to_string())
                .unwrap_or_else(|| "NEW".to_string()),
            name: entry.label(locale).to_lowercase(),
            urgency: entry.urgency.unwrap_or_default(),
            action: if entry.kind.is_lab() {
                EntryAction::ToggleUrgency
            } else {
                EntryAction::EditDrug
            },
        }
    }

    pub fn is_stat(&self) -> bool {
        self.urgency == Urgency::Stat
    }
}

/// Everything the unsaved-draft panel shows: drug drafts first, then lab
/// drafts, with the footer state derived from the combined count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DraftListView {
    pub items: Vec<DraftListItem>,
    pub discard_label: &'static str,
    pub actions_enabled: bool,
}

impl DraftListView {
    pub fn build(
        drug_orders: &[DraftOrderEntry],
        lab_orders: &[DraftOrderEntry],
        locale: &str,
    ) -> Self {
        let items: Vec<DraftListItem> = drug_orders
            .iter()
            .chain(lab_orders)
            .map(|entry| DraftListItem::from_entry(entry, locale))
            .collect();
        Self {
            discard_label: if items.len() > 1 { "Discard All" } else { "Discard" },
            actions_enabled: !items.is_empty(),
            items,
        }
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }
}

/// Leaving the form is blocked while anything is drafted.
pub fn can_return(drug_orders: &[DraftOrderEntry], lab_orders: &[DraftOrderEntry]) -> bool {
    drug_orders.is_empty() && lab_orders.is_empty()
}
